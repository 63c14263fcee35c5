//! Synthetic traffic tooling for a metrics analytics service.
//!
//! Two front ends share this library: `metric-generator`, a sequential
//! generator that posts one synthetic metric record per tick, and
//! `load-profile`, which runs a weighted mix of submission and read
//! behaviors across many simulated users.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod behavior;
pub mod client;
pub mod config;
pub mod errors;
pub mod generator;
pub mod metrics;
pub mod payload;
pub mod report;
pub mod worker;

//! Production tracker for puzzle hunts.
//!
//! The [`workflow`] module holds the status registry, the transition table
//! and the engine that applies status changes. Every change lands in the
//! append-only [`audit`] log, which [`stats`] replays for dashboards.
//! [`tracker::Tracker`] ties them together with the post-transition
//! [`hooks`] and the JSON [`store`].

pub mod audit;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod notify;
pub mod stats;
pub mod store;
pub mod testsolve;
pub mod tracker;
pub mod workflow;

pub use error::{HuntdeskError, IntegrityViolation, Result};

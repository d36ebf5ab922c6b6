//! # Engine Module
//!
//! Stateful orchestration of telescope sweeps on top of the stateless
//! [`crate::core`] physics.
//!
//! - **Configuration** ([`config`]) - setup and sweep builders, detector geometry
//! - **Sweeps** ([`sweep`]) - per-channel pipeline from beam transport to the telescope response
//! - **State** ([`state`]) - sweep lifecycle, curve samples and scatter points
//! - **Worker** ([`worker`]) - background thread running a batch of setups
//! - **Progress and cancellation** ([`progress`], [`cancel`])
//! - **Errors** ([`error`]) - conditions that abort an entire sweep

pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod state;
pub mod sweep;
pub mod worker;

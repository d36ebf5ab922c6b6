//! # Telekin Core Library
//!
//! Energy-loss and two-body kinematics engine for a particle-telescope
//! experiment: a beam strikes a layered target, a reaction ejectile leaves at
//! a fixed angle, and its energy is degraded through a dE/E detector stack.
//!
//! ## Architecture
//!
//! - **[`core`]: Physics and data.** Element stopping coefficients and nuclear
//!   masses, layer and particle models, stopping power, range integration,
//!   straggling and non-relativistic kinematics.
//!
//! - **[`engine`]: Sweeps.** Turns a setup into kinematic curves (dE vs. E as a
//!   function of excitation energy) and scatter points with straggling error
//!   bars, with progress reporting, cancellation and a background worker.
//!
//! - **[`workflows`]: The Public API.** One call runs every configured
//!   reaction channel of a setup.

pub mod core;
pub mod engine;
pub mod workflows;

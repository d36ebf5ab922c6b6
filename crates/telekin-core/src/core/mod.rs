//! # Core Module
//!
//! Stateless physics and data for the telescope simulation.
//!
//! - **Tables** ([`tables`]) - compiled-in element coefficients and nuclear mass excesses
//! - **Models** ([`models`]) - particles, layers, reaction channels and the layer stack
//! - **Physics** ([`physics`]) - stopping power, range integration, straggling,
//!   two-body kinematics and locus fitting
//!
//! Nothing in this module holds mutable state; every function can be called
//! concurrently from any thread.

pub mod models;
pub mod physics;
pub mod tables;

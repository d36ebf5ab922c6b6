//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::engine`] and [`crate::core`]
//! layers together. [`telescope::run`] computes the complete telescope
//! response of one setup for every configured reaction channel.

pub mod telescope;

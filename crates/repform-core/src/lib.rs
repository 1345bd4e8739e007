//! # Repform-Core
//!
//! Core types for turning pose-estimation landmarks into exercise form
//! signals: the 33-point landmark layout, joint-angle extraction, temporal
//! smoothing, and per-session summary statistics.
//!
//! Everything in this crate is a pure function or an explicitly owned value;
//! there is no process-wide state.

pub mod aggregate;
pub mod angles;
pub mod error;
pub mod geometry;
pub mod smoothing;
pub mod synthetic;
pub mod types;

pub use aggregate::*;
pub use angles::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use smoothing::*;
pub use types::*;

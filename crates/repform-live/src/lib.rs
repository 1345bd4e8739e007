//! # Repform-Live
//!
//! Real-time form feedback over a single capture stream.
//!
//! Each frame goes through pose estimation, joint-angle extraction,
//! exponential smoothing and a per-frame scorer. The score maps to a
//! feedback tier, and a cooldown gate decides whether the tier's message
//! is spoken. Speech runs on a worker thread so audio never stalls scoring.

pub mod feedback;
pub mod live;
pub mod scorer;
pub mod source;
pub mod speech;

pub use feedback::*;
pub use live::*;
pub use scorer::*;
pub use source::*;
pub use speech::*;

//! # Repform-Rules
//!
//! Rule-based exercise form evaluation on top of `repform-core` aggregates.
//!
//! ## Pipeline
//!
//! 1. **Standards** - versioned, validated threshold tables
//! 2. **Policy** - squat or generic scoring, chosen once per exercise
//! 3. **Issues** - per-dimension deviations with severity and frame span
//! 4. **Report** - metric comparisons, strengths and recommendations
//!
//! The [`SessionAnalyzer`] runs the whole pipeline over recorded landmark
//! streams, one session at a time or many in parallel.

pub mod analyzer;
pub mod issues;
pub mod policy;
pub mod posture;
pub mod report;
pub mod signals;
pub mod sink;
pub mod standards;

pub use analyzer::*;
pub use issues::*;
pub use policy::*;
pub use posture::*;
pub use report::*;
pub use signals::*;
pub use sink::*;
pub use standards::*;

//! Output data model
//!
//! The structured score produced by conversion: a `Score` holds global
//! measure data plus parts, parts hold measures, measures hold per-voice
//! sequences whose content lists nest tuplets and grace groups.

pub mod directions;
pub mod event;
pub mod rhythm;
pub mod score;

// Re-export commonly used types
pub use directions::*;
pub use event::*;
pub use rhythm::*;
pub use score::*;

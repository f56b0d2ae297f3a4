//! Core dispatch layer
//!
//! Query classification, the dispatcher and the engine contract it talks
//! to. The engine itself lives in `crate::engine`.

pub mod dispatcher;
pub mod query;
pub mod traits;

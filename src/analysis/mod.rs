//! Analysis and result aggregation modules
//!
//! Turns the per-window key timeline into the final recommendation:
//! - Vote aggregation and stability
//! - Circle-of-fifths relationships
//! - Music-theory resolution and confidence scoring
//! - Result types and assembly

pub mod aggregation;
pub mod assembler;
pub mod confidence;
pub mod harmony;
pub mod resolver;
pub mod result;

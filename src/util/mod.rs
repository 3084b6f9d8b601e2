//! Small helpers shared across layers

pub mod format;
pub mod path;
pub mod testing;

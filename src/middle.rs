//! The middle-end: dependency analysis (C3) and optimization (C4).

pub mod dependency;
pub mod optimize;

pub use dependency::analyze;
pub use optimize::optimize;

//! The back-end: workload-balanced assignment to PEs (C5), dependency-
//! respecting cycle-accurate synchronization (C6), and per-PE text emission
//! (C7).

pub mod assign;
pub mod emit;
pub mod sync;

pub use assign::{assign, Assignment};
pub use emit::emit_pe_files;
pub use sync::{synchronize, Schedule};

//! `pesched`: an optimizing compiler and cycle-level functional simulator for
//! a straight-line three-address register machine, scheduled across one or
//! more processing elements (PEs).
//!
//! The pipeline mirrors the classic front/middle/back split: [`front`] turns
//! source text into typed IR, [`middle`] analyzes dependencies and optimizes
//! the IR in place, and [`back`] assigns IR to PEs and synthesizes a
//! cycle-accurate, dependency-respecting schedule for each one. [`sim`]
//! interprets the emitted per-PE streams against a shared memory image.

pub mod back;
pub mod common;
pub mod config;
pub mod error;
pub mod front;
pub mod middle;
pub mod sim;

pub use common::{ArithOp, Id, Instruction, Listing, OpKind};
pub use error::{Error, Result};
pub use sim::{compare, Comparison, CycleSnapshot, PeSnapshot, SimResult};

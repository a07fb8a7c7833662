//! Error types for every subsystem boundary named in the error design (§7).
//!
//! Each variant carries enough context (the offending token, line, or
//! instruction) to produce a human-readable diagnostic; nothing here is
//! retried and no partial output is promised on failure.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    #[error("memory image error: {0}")]
    MemoryFormat(#[from] MemoryFormatError),

    #[error("register format error: {0}")]
    RegisterFormat(#[from] RegisterFormatError),

    #[error("unknown memory address: {0}")]
    UnknownMemoryAddress(String),

    #[error("unknown register: {0}")]
    UnknownRegister(String),

    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("scheduler produced mismatched PE stream lengths: {0:?}")]
    StreamLengthMismatch(Vec<usize>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed latency table: {0}")]
    LatencyTable(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("missing required argument: {0}")]
    Missing(&'static str),

    #[error("PE count must be a positive integer, got {0:?}")]
    InvalidPeCount(String),

    #[error("input file does not exist: {0}")]
    MissingFile(String),
}

#[derive(Debug, Error)]
pub enum MemoryFormatError {
    #[error("line {line} is not of the form `addr = value`: {text:?}")]
    BadLine { line: usize, text: String },

    #[error("line {line}: value {value:?} is not numeric")]
    NonNumericValue { line: usize, value: String },
}

#[derive(Debug, Error)]
pub enum RegisterFormatError {
    #[error("operand {operand:?} in instruction {instruction:?} is not a proper register")]
    NotARegister { operand: String, instruction: String },
}

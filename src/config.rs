//! Typed loaders for the external interfaces named in §6: source text, the
//! memory-image format, and the operation-latency table. Filesystem layout
//! and CLI parsing otherwise stay in `src/bin/pesched.rs`, the one place
//! this crate treats as an external collaborator (§1).

use std::collections::BTreeMap;
use std::path::Path;

use crate::common::is_number;
use crate::error::{ArgumentError, Error, MemoryFormatError, Result};

/// Read UTF-8 source text from `path`.
pub fn load_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ArgumentError::MissingFile(path.display().to_string()).into());
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse a memory-image file: one `<addr> = <number>` entry per line,
/// whitespace stripped (§6).
pub fn load_memory_image(path: impl AsRef<Path>) -> Result<BTreeMap<String, f64>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ArgumentError::MissingFile(path.display().to_string()).into());
    }
    let text = std::fs::read_to_string(path)?;
    parse_memory_image(&text)
}

/// Parse memory-image text directly (exposed for tests and in-memory use).
pub fn parse_memory_image(text: &str) -> Result<BTreeMap<String, f64>> {
    let mut mem = BTreeMap::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let stripped: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let mut parts = stripped.splitn(2, '=');
        let (addr, value) = match (parts.next(), parts.next()) {
            (Some(a), Some(v)) if !a.is_empty() && !v.is_empty() => (a, v),
            _ => {
                return Err(MemoryFormatError::BadLine { line: idx + 1, text: raw_line.to_string() }
                    .into())
            }
        };
        if !is_number(value) {
            return Err(MemoryFormatError::NonNumericValue {
                line: idx + 1,
                value: value.to_string(),
            }
            .into());
        }
        mem.insert(addr.to_string(), value.parse::<f64>().expect("checked by is_number"));
    }
    Ok(mem)
}

/// The built-in latency table, used when no `--latencies` file is given and
/// by every test in this crate. Recovered from
/// `original_source/lib.py`'s `operation_latency.json` companion file.
pub fn default_latency_table() -> BTreeMap<String, u64> {
    [
        ("LOAD", 2),
        ("STORE", 2),
        ("ADD", 1),
        ("SUB", 1),
        ("MUL", 3),
        ("DIV", 4),
        ("SQRT", 5),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Load a JSON latency table (kind name -> positive cycle count). `NOP` is
/// not expected here: the simulator and synchronizer both hardcode its
/// latency to 1 regardless of what this table says (§4.8, Open Questions).
pub fn load_latency_table(path: impl AsRef<Path>) -> Result<BTreeMap<String, u64>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ArgumentError::MissingFile(path.display().to_string()).into());
    }
    let text = std::fs::read_to_string(path)?;
    let table: BTreeMap<String, u64> = serde_json::from_str(&text).map_err(Error::from)?;
    Ok(table)
}

/// Parse and validate the PE-count CLI argument.
pub fn parse_pe_count(raw: &str) -> Result<usize> {
    match raw.parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n as usize),
        _ => Err(ArgumentError::InvalidPeCount(raw.to_string()).into()),
    }
}

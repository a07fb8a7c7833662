//! The emitter (C7): expands a [`Schedule`] into per-cycle text lines and
//! writes one file per PE (§4.7).
//!
//! Expansion rule: a dispatched instruction occupies `latency` lines — the
//! first carries its rendered textual form, the rest are blank filler that
//! represent the cycles it spends executing. A padded idle cycle is a single
//! `NOP` line.

use std::fs;
use std::path::Path;

use crate::back::sync::{Schedule, ScheduleEntry};
use crate::common::{kind_latency, Listing, Map};
use crate::error::Result;

/// Expand `schedule` against `listing` and `latencies` into one line-vector
/// per PE, without touching the filesystem. Exposed separately from
/// [`emit_pe_files`] so the driver can also print this to stdout (§6) and so
/// the simulator can consume it directly without a round trip through disk.
pub fn expand(listing: &Listing, schedule: &Schedule, latencies: &Map<String, u64>) -> Vec<Vec<String>> {
    schedule
        .pes
        .iter()
        .map(|events| {
            let mut lines = Vec::new();
            for event in events {
                match event {
                    ScheduleEntry::Instr(idx) => {
                        let instr = &listing.insns[*idx];
                        let latency = kind_latency(instr.kind(), latencies).max(1);
                        lines.push(instr.render());
                        for _ in 1..latency {
                            lines.push(String::new());
                        }
                    }
                    ScheduleEntry::Nop => lines.push("NOP".to_string()),
                }
            }
            lines
        })
        .collect()
}

/// Write each PE's expanded line stream to `<out_dir>/PE_<p>_code.txt`,
/// creating `out_dir` if it does not already exist.
pub fn emit_pe_files(
    listing: &Listing,
    schedule: &Schedule,
    latencies: &Map<String, u64>,
    out_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    for (pe, lines) in expand(listing, schedule, latencies).into_iter().enumerate() {
        let path = out_dir.join(format!("PE_{pe}_code.txt"));
        fs::write(path, lines.join("\n") + "\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::back::assign::Assignment;
    use crate::back::sync::synchronize;
    use crate::common::{id, Instruction};

    fn latencies() -> Map<String, u64> {
        [("LOAD", 2u64), ("STORE", 2)].into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn load_expands_to_two_lines() {
        let insns = vec![Instruction::Load { dst: id("t0"), addr: id("a") }];
        let analysis = crate::middle::dependency::analyze(&insns);
        let mut listing = Listing::new(insns);
        listing.deps = analysis.preds;

        let assignment = Assignment { pes: vec![vec![0]], costs: vec![2], imbalance_log: vec![0] };
        let schedule = synchronize(&listing, &assignment, &latencies());
        let expanded = expand(&listing, &schedule, &latencies());

        assert_eq!(expanded[0], vec!["LOAD,t0,a".to_string(), String::new()]);
    }

    #[test]
    fn nop_expands_to_single_line() {
        let insns = vec![
            Instruction::Load { dst: id("t0"), addr: id("a") },
            Instruction::Store { addr: id("b"), src: id("t0") },
        ];
        let analysis = crate::middle::dependency::analyze(&insns);
        let mut listing = Listing::new(insns);
        listing.deps = analysis.preds;

        let assignment = Assignment { pes: vec![vec![0], vec![1]], costs: vec![2, 2], imbalance_log: vec![0] };
        let schedule = synchronize(&listing, &assignment, &latencies());
        let expanded = expand(&listing, &schedule, &latencies());

        assert_eq!(expanded[1].iter().filter(|l| *l == "NOP").count(), 2);
    }

    #[test]
    fn writes_one_file_per_pe() {
        let insns = vec![Instruction::Load { dst: id("t0"), addr: id("a") }];
        let analysis = crate::middle::dependency::analyze(&insns);
        let mut listing = Listing::new(insns);
        listing.deps = analysis.preds;

        let assignment = Assignment { pes: vec![vec![0]], costs: vec![2], imbalance_log: vec![0] };
        let schedule = synchronize(&listing, &assignment, &latencies());

        let dir = tempfile::tempdir().unwrap();
        emit_pe_files(&listing, &schedule, &latencies(), dir.path()).unwrap();
        let contents = fs::read_to_string(dir.path().join("PE_0_code.txt")).unwrap();
        assert_eq!(contents, "LOAD,t0,a\n\n");
    }
}

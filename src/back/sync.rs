//! The synchronizer (C6): turns a per-PE assignment into a lockstep,
//! dependency-respecting schedule (§4.6).
//!
//! Every host cycle runs the same three steps across all PEs: retire
//! whatever finished last cycle, dispatch whatever is now ready, then pad
//! any PE that stayed idle with an explicit `NOP`. The loop terminates once
//! every instruction index has retired.

use crate::back::assign::Assignment;
use crate::common::{kind_latency, Listing, Map, Set};

/// One growth event in a PE's schedule: either the dispatch of IR
/// instruction `insns[idx]`, or an explicit idle cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScheduleEntry {
    Instr(usize),
    Nop,
}

/// The per-PE schedules produced by [`synchronize`], pre-emission: each
/// entry is one *event*, not one cycle — a multi-cycle instruction occupies
/// a single [`ScheduleEntry::Instr`] here and is only expanded to multiple
/// lines by [`crate::back::emit`].
#[derive(Clone, Debug)]
pub struct Schedule {
    pub pes: Vec<Vec<ScheduleEntry>>,
}

/// Build the lockstep schedule for `assignment` over `listing`.
///
/// Each PE scans its *entire* assigned task list, in assignment order, every
/// time it goes idle — not just the tasks it hasn't attempted yet. This lets
/// a PE skip over a task still waiting on another PE's producer and dispatch
/// a later-assigned one that is already ready, exactly as the rebalance step
/// left them ordered (§4.5, §4.6).
pub fn synchronize(listing: &Listing, assignment: &Assignment, latencies: &Map<String, u64>) -> Schedule {
    let pe_count = assignment.pes.len();
    let n = listing.len();

    let mut current: Vec<Option<usize>> = vec![None; pe_count];
    let mut remaining: Vec<u64> = vec![0; pe_count];
    let mut done: Set<usize> = Set::new();
    let mut schedule: Vec<Vec<ScheduleEntry>> = vec![Vec::new(); pe_count];

    let mut cycle = 0u64;
    while done.len() < n {
        // 1. Retire whatever is finishing this cycle.
        for pe in 0..pe_count {
            if let Some(idx) = current[pe] {
                if remaining[pe] <= 1 {
                    done.insert(idx);
                    current[pe] = None;
                } else {
                    remaining[pe] -= 1;
                }
            }
        }

        // 2. Dispatch whatever is now ready onto every idle PE.
        for pe in 0..pe_count {
            if current[pe].is_some() {
                continue;
            }
            let ready = assignment.pes[pe].iter().copied().find(|idx| {
                !done.contains(idx) && listing.deps[*idx].iter().all(|p| done.contains(p))
            });
            if let Some(idx) = ready {
                let latency = kind_latency(listing.insns[idx].kind(), latencies);
                current[pe] = Some(idx);
                remaining[pe] = latency;
                schedule[pe].push(ScheduleEntry::Instr(idx));
            }
        }

        // 3. Pad every PE that is still idle and has nothing left to wait for.
        for pe in 0..pe_count {
            if current[pe].is_none() && done.len() < n {
                schedule[pe].push(ScheduleEntry::Nop);
            }
        }

        cycle += 1;
        assert!(
            cycle <= 10 * (n as u64 + pe_count as u64) + 16,
            "synchronizer failed to make progress; assignment or dependency data is malformed"
        );
    }

    tracing::debug!(cycles = cycle, pes = pe_count, "synchronized schedule");
    Schedule { pes: schedule }
}

//! The dependency analyzer (C3): computes RAW and WAR predecessors for
//! every instruction in a listing, plus the bookkeeping arrays (`writes`,
//! `reads`) and edge list that downstream passes and external tooling
//! (dataflow-graph export) consume.
//!
//! This is rerun after every structural edit to the listing (dedup, DCE,
//! fold, propagate) per §4.4 and the design note in §9: predecessor sets are
//! an attribute of an instruction *within one specific listing*.

use crate::common::{Id, Instruction, Listing, Set};

/// The full output of one dependency-analysis pass over a listing.
#[derive(Debug, Default)]
pub struct Analysis {
    /// `writes[i]`: the register `insns[i]` writes, or `None` for `STORE`
    /// and `NOP` (the "empty marker" of §4.3).
    pub writes: Vec<Option<Id>>,
    /// `reads[i]`: the unique set of operand registers at `i` that resolved
    /// to a prior write (i.e. `i`'s RAW-matched operands, by name).
    pub reads: Vec<Set<Id>>,
    /// `raw_preds[i]`: RAW predecessor indices of `i` ("write_depend" in the
    /// design notes) — used by DCE's reachability walk.
    pub raw_preds: Vec<Set<usize>>,
    /// `war_preds[i]`: WAR predecessor indices of `i`.
    pub war_preds: Vec<Set<usize>>,
    /// `preds[i]`: `raw_preds[i] ∪ war_preds[i]`, the predecessor set
    /// attached to each decorated instruction.
    pub preds: Vec<Set<usize>>,
    /// `(producer, consumer)` pairs, one per RAW dependency, for external
    /// dataflow-graph rendering (§4.3, §10.1).
    pub edges: Vec<(usize, usize)>,
}

/// Run dependency analysis over `insns` in source order.
pub fn analyze(insns: &[Instruction]) -> Analysis {
    let n = insns.len();
    let mut writes: Vec<Option<Id>> = Vec::with_capacity(n);
    let mut reads: Vec<Set<Id>> = Vec::with_capacity(n);
    let mut raw_preds: Vec<Set<usize>> = Vec::with_capacity(n);

    for instr in insns {
        let mut matched: Set<Id> = Set::new();
        let mut producers: Set<usize> = Set::new();

        // RAW: for each operand, the nearest (highest-index) prior writer.
        for operand in instr.operands() {
            if let Some(pos) = writes.iter().rposition(|w| *w == Some(operand)) {
                matched.insert(operand);
                producers.insert(pos);
            }
        }

        raw_preds.push(producers);
        reads.push(matched);
        writes.push(instr.dest());
    }

    // WAR: i depends on j iff i's destination appears in reads[j].
    let mut war_preds: Vec<Set<usize>> = vec![Set::new(); n];
    for (i, instr) in insns.iter().enumerate() {
        if let Some(dst) = instr.dest() {
            for (j, r) in reads.iter().enumerate().take(i) {
                if r.contains(&dst) {
                    war_preds[i].insert(j);
                }
            }
        }
    }

    let preds: Vec<Set<usize>> = (0..n)
        .map(|i| raw_preds[i].union(&war_preds[i]).copied().collect())
        .collect();

    let mut edges = Vec::new();
    for (i, producers) in raw_preds.iter().enumerate() {
        for &j in producers {
            edges.push((j, i));
        }
    }

    Analysis { writes, reads, raw_preds, war_preds, preds, edges }
}

/// Analyze `listing.insns` and overwrite `listing.deps` with the resulting
/// predecessor sets, discarding whatever analysis the listing previously
/// carried.
pub fn decorate(listing: &mut Listing) -> Analysis {
    let analysis = analyze(&listing.insns);
    listing.deps = analysis.preds.clone();
    analysis
}

/// The dataflow-graph edge list for a listing, for external rendering
/// (§10.1). Exposed directly so callers don't need the full [`Analysis`].
pub fn edge_list(insns: &[Instruction]) -> Vec<(usize, usize)> {
    analyze(insns).edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{id, ArithOp};

    fn load(dst: &str, addr: &str) -> Instruction {
        Instruction::Load { dst: id(dst), addr: id(addr) }
    }

    fn add(dst: &str, lhs: &str, rhs: &str) -> Instruction {
        Instruction::Arith { op: ArithOp::Add, dst: id(dst), lhs: id(lhs), rhs: id(rhs) }
    }

    fn store(addr: &str, src: &str) -> Instruction {
        Instruction::Store { addr: id(addr), src: id(src) }
    }

    #[test]
    fn raw_chain_is_topological() {
        let insns = vec![load("t0", "a"), load("t1", "b"), add("t2", "t0", "t1"), store("c", "t2")];
        let a = analyze(&insns);
        assert_eq!(a.preds[2], [0, 1].into_iter().collect());
        assert_eq!(a.preds[3], [2].into_iter().collect());
        for (i, preds) in a.preds.iter().enumerate() {
            assert!(preds.iter().all(|&p| p < i));
        }
    }

    #[test]
    fn store_writes_nothing() {
        let insns = vec![load("t0", "a"), store("c", "t0")];
        let a = analyze(&insns);
        assert_eq!(a.writes[1], None);
    }

    #[test]
    fn numeric_operands_contribute_no_predecessor() {
        let insns =
            vec![Instruction::Arith { op: ArithOp::Add, dst: id("t0"), lhs: id("2"), rhs: id("3") }];
        let a = analyze(&insns);
        assert!(a.preds[0].is_empty());
    }

    #[test]
    fn store_address_spelled_like_a_register_is_not_a_dependency_source() {
        // a STORE's address slot is a memory location, never a dependency
        // operand, even when it happens to be spelled like a register.
        let insns = vec![load("t0", "a"), store("t0", "5")];
        let a = analyze(&insns);
        assert!(a.preds[1].is_empty());
    }

    #[test]
    fn war_dependency_on_later_redefinition() {
        // t0 = LOAD(a); t1 = t0 + t0; t0 = LOAD(b);  -- the second LOAD must
        // not retire before the consumer at index 1 has read the old t0.
        let insns = vec![
            load("t0", "a"),
            Instruction::Arith { op: ArithOp::Add, dst: id("t1"), lhs: id("t0"), rhs: id("t0") },
            load("t0", "b"),
        ];
        let a = analyze(&insns);
        assert!(a.war_preds[2].contains(&1));
        assert!(a.preds[2].contains(&1));
    }
}

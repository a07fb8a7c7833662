//! The optimizer (C4): duplicate elimination, dead-code elimination, then a
//! fixed-point loop of constant folding and constant propagation (§4.4).
//!
//! Dependency bookkeeping is regenerated between phases (and once per
//! fixed-point iteration) so every pass sees a [`dependency::Analysis`]
//! consistent with the listing it is about to transform.

use std::collections::HashSet;

use crate::common::{id, is_number, Instruction, Listing, OpKind};
use crate::middle::dependency::{self, Analysis};

/// Run the full C4 pipeline and return the optimized, fully decorated
/// listing.
pub fn optimize(insns: Vec<Instruction>) -> Listing {
    let insns = dedup(insns);
    let analysis = dependency::analyze(&insns);
    let mut insns = dead_code_elimination(insns, &analysis);

    let mut analysis = dependency::analyze(&insns);
    loop {
        fold_constants(&mut insns);
        let changed = propagate_and_drop_eq(&mut insns, &analysis);
        analysis = dependency::analyze(&insns);
        if !changed {
            break;
        }
    }

    let mut listing = Listing::new(insns);
    listing.deps = analysis.preds;
    listing
}

/// 4.4.1: keep the first occurrence of each (kind, operands) tuple, drop
/// later exact duplicates, preserving relative order.
fn dedup(insns: Vec<Instruction>) -> Vec<Instruction> {
    let mut seen: HashSet<Instruction> = HashSet::new();
    insns.into_iter().filter(|instr| seen.insert(instr.clone())).collect()
}

/// 4.4.2: a node is kept if it has no RAW predecessors at all (a leaf —
/// e.g. `LOAD`, or an unused constant; §9's "DCE leaf-keep" quirk) or if it
/// is backward-reachable, via RAW edges, from some `STORE`.
fn dead_code_elimination(insns: Vec<Instruction>, analysis: &Analysis) -> Vec<Instruction> {
    let n = insns.len();
    let mut store_reachable = vec![false; n];
    let mut stack: Vec<usize> =
        insns.iter().enumerate().filter(|(_, i)| i.kind() == OpKind::Store).map(|(i, _)| i).collect();

    while let Some(idx) = stack.pop() {
        if store_reachable[idx] {
            continue;
        }
        store_reachable[idx] = true;
        for &p in &analysis.raw_preds[idx] {
            if !store_reachable[p] {
                stack.push(p);
            }
        }
    }

    let keep: Vec<bool> =
        (0..n).map(|i| analysis.raw_preds[i].is_empty() || store_reachable[i]).collect();

    insns.into_iter().zip(keep).filter(|(_, k)| *k).map(|(i, _)| i).collect()
}

/// 4.4.3, folding half: evaluate binary ops and `SQRT` whose operands are
/// all numeric literals, replacing them in place with `EQ`.
fn fold_constants(insns: &mut [Instruction]) {
    for instr in insns.iter_mut() {
        match instr {
            Instruction::Arith { op, dst, lhs, rhs } => {
                let (l, r) = (lhs.to_string(), rhs.to_string());
                if is_number(&l) && is_number(&r) {
                    let result = op.eval(l.parse().unwrap(), r.parse().unwrap());
                    *instr = Instruction::Eq { dst: *dst, value: id(result.to_string()) };
                }
            }
            Instruction::Sqrt { dst, src } => {
                let s = src.to_string();
                if is_number(&s) {
                    let result = s.parse::<f64>().unwrap().sqrt();
                    *instr = Instruction::Eq { dst: *dst, value: id(result.to_string()) };
                }
            }
            _ => {}
        }
    }
}

/// 4.4.3, propagation half: inline every `EQ`-producing RAW predecessor's
/// literal into its consumers, then drop all `EQ` instructions. Returns
/// whether any substitution occurred.
///
/// Substitutes in place, reading each producer straight out of `insns`
/// rather than a pre-pass snapshot: since a RAW predecessor's index `p` is
/// always less than the consumer's index `idx`, `insns[p]` has already been
/// visited and updated earlier in this same pass. That lets a multi-hop copy
/// chain (`t0 = 5; t1 = t0; STORE(x, t1);`) collapse to its literal in one
/// pass instead of needing another fixed-point iteration, matching the
/// original's in-place `IR[idx]` updates.
///
/// `analysis` is computed once per fixed-point iteration, *before* folding:
/// folding only ever turns an all-numeric `Arith`/`Sqrt` (which already had
/// an empty RAW predecessor set) into an `EQ` with the same destination, so
/// it never invalidates predecessor indices computed earlier in the same
/// iteration.
fn propagate_and_drop_eq(insns: &mut Vec<Instruction>, analysis: &Analysis) -> bool {
    let mut changed = false;

    for idx in 0..insns.len() {
        if insns[idx].kind() == OpKind::Load {
            continue;
        }
        for &p in &analysis.raw_preds[idx] {
            let (producer, value) = match &insns[p] {
                Instruction::Eq { dst, value } => (*dst, *value),
                _ => continue,
            };

            match &mut insns[idx] {
                Instruction::Store { src, .. } | Instruction::Sqrt { src, .. } => {
                    if *src == producer {
                        *src = value;
                        changed = true;
                    }
                }
                Instruction::Eq { value: v, .. } => {
                    if *v == producer {
                        *v = value;
                        changed = true;
                    }
                }
                Instruction::Arith { lhs, rhs, .. } => {
                    if *lhs == producer {
                        *lhs = value;
                        changed = true;
                    }
                    if *rhs == producer {
                        *rhs = value;
                        changed = true;
                    }
                }
                Instruction::Load { .. } | Instruction::Nop => {}
            }
        }
    }

    insns.retain(|i| !matches!(i, Instruction::Eq { .. }));
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{id, ArithOp};
    use crate::front;

    fn optimize_source(src: &str) -> Listing {
        let insns = front::build(&front::tokenize(src)).unwrap();
        optimize(insns)
    }

    #[test]
    fn fold_then_store() {
        let listing = optimize_source("t0 = 2 + 3; STORE(x, t0);");
        assert_eq!(listing.insns, vec![Instruction::Store { addr: id("x"), src: id("5") }]);
    }

    #[test]
    fn propagate_through_chain() {
        let listing = optimize_source("t0 = 4; t1 = t0 * 2; STORE(y, t1);");
        assert_eq!(listing.insns, vec![Instruction::Store { addr: id("y"), src: id("8") }]);
    }

    #[test]
    fn sqrt_fold() {
        let listing = optimize_source("t0 = ^ 16; STORE(z, t0);");
        assert_eq!(listing.insns, vec![Instruction::Store { addr: id("z"), src: id("4") }]);
    }

    #[test]
    fn dead_code_with_leaf_keep_quirk() {
        let listing =
            optimize_source("t0 = LOAD(a); t1 = t0 * t0; t2 = LOAD(b); STORE(c, t1);");
        // the unused LOAD(b) survives DCE (leaf-keep quirk, §9) but the
        // STORE's value chain is otherwise intact.
        assert!(listing.insns.iter().any(|i| matches!(i,
            Instruction::Load { addr, .. } if *addr == id("b"))));
        assert!(listing.insns.iter().any(|i| matches!(i,
            Instruction::Store { addr, src } if *addr == id("c") && *src == id("t1"))));
    }

    #[test]
    fn genuinely_dead_arithmetic_is_removed() {
        let listing = optimize_source("t0 = LOAD(a); t1 = LOAD(b); t2 = t0 + t1; STORE(c, t0);");
        assert!(!listing.insns.iter().any(|i| matches!(i, Instruction::Arith { .. })));
    }

    #[test]
    fn no_eq_survives_optimization() {
        // a multi-hop copy chain must fully collapse to the literal in one
        // pass, not leave a dangling reference to a dropped `EQ`'s register.
        let listing = optimize_source("t0 = 4; t1 = t0; STORE(y, t1);");
        assert_eq!(listing.insns, vec![Instruction::Store { addr: id("y"), src: id("4") }]);
    }

    #[test]
    fn duplicate_elimination_keeps_first_occurrence() {
        let insns = vec![
            Instruction::Arith { op: ArithOp::Add, dst: id("t0"), lhs: id("1"), rhs: id("2") },
            Instruction::Arith { op: ArithOp::Add, dst: id("t0"), lhs: id("1"), rhs: id("2") },
            Instruction::Store { addr: id("x"), src: id("t0") },
        ];
        let deduped = dedup(insns);
        assert_eq!(deduped.len(), 2);
    }
}

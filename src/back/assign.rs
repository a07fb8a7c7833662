//! The assigner (C5): round-robin initial assignment, then greedy
//! imbalance-reducing rebalance (§4.5). Deliberately monotone-greedy, not
//! globally optimal (§9 "Assigner quirk").

use crate::common::{kind_latency, Instruction, Listing, Map};

/// A `P`-way partition of IR indices, one ordered sub-sequence per PE, plus
/// the imbalance trace the driver reports (§6).
#[derive(Clone, Debug)]
pub struct Assignment {
    /// `pes[p]` is PE `p`'s task list, in the order tasks were appended.
    pub pes: Vec<Vec<usize>>,
    /// Per-PE total execution cost at the moment this assignment was
    /// accepted (parallel to `pes`).
    pub costs: Vec<u64>,
    /// Imbalance (`max_cost - min_cost`) after each accepted step, starting
    /// with the initial round-robin assignment's imbalance.
    pub imbalance_log: Vec<u64>,
}

fn pe_cost(pe: &[usize], insns: &[Instruction], latencies: &Map<String, u64>) -> u64 {
    pe.iter().map(|&i| kind_latency(insns[i].kind(), latencies)).sum()
}

fn all_costs(pes: &[Vec<usize>], insns: &[Instruction], latencies: &Map<String, u64>) -> Vec<u64> {
    pes.iter().map(|pe| pe_cost(pe, insns, latencies)).collect()
}

fn imbalance(costs: &[u64]) -> u64 {
    let max = *costs.iter().max().unwrap_or(&0);
    let min = *costs.iter().min().unwrap_or(&0);
    max - min
}

/// Earliest-index argmax/argmin over per-PE costs.
fn argmax(costs: &[u64]) -> usize {
    costs.iter().enumerate().max_by_key(|&(i, &c)| (c, std::cmp::Reverse(i))).map(|(i, _)| i).unwrap()
}

fn argmin(costs: &[u64]) -> usize {
    costs.iter().enumerate().min_by_key(|&(i, &c)| (c, i)).map(|(i, _)| i).unwrap()
}

fn initial_assignment(n: usize, pe_count: usize) -> Vec<Vec<usize>> {
    let mut pes = vec![Vec::new(); pe_count];
    for i in 0..n {
        pes[i % pe_count].push(i);
    }
    pes
}

/// Assign `listing`'s instructions to `pe_count` PEs and rebalance.
pub fn assign(listing: &Listing, latencies: &Map<String, u64>, pe_count: usize) -> Assignment {
    assert!(pe_count >= 1, "PE count must be positive");

    let mut pes = initial_assignment(listing.len(), pe_count);
    let mut costs = all_costs(&pes, &listing.insns, latencies);
    let mut cur_imbalance = imbalance(&costs);
    let mut imbalance_log = vec![cur_imbalance];

    tracing::debug!(imbalance = cur_imbalance, "initial assignment");

    loop {
        if cur_imbalance == 0 {
            break;
        }
        let hi = argmax(&costs);
        let lo = argmin(&costs);
        if pes[hi].is_empty() {
            break;
        }

        let mut candidate = pes.clone();
        let task = candidate[hi].remove(0);
        candidate[lo].push(task);
        let candidate_costs = all_costs(&candidate, &listing.insns, latencies);
        let new_imbalance = imbalance(&candidate_costs);

        tracing::debug!(from = hi, to = lo, new_imbalance, cur_imbalance, "rebalance step");

        if new_imbalance >= cur_imbalance {
            break;
        }

        pes = candidate;
        costs = candidate_costs;
        cur_imbalance = new_imbalance;
        imbalance_log.push(cur_imbalance);
    }

    Assignment { pes, costs, imbalance_log }
}

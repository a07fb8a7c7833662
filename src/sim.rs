//! The simulator (C8): a cycle-stepped functional interpreter over a shared
//! `RG`/`MEM` state (§3, §4.8).
//!
//! Per-PE line streams are whatever [`crate::back::emit::expand`] (or a file
//! loaded back off disk) produced: latency filler already collapsed out by
//! the caller, one real instruction or `NOP` per non-blank line.

use crate::common::{id, is_register, ArithOp, Id, Instruction, Map, Set};
use crate::error::{Error, Result};

/// One PE's status at a single simulated cycle, captured for the integration
/// tests and for richer console narration than a bare cycle count (§10.2).
#[derive(Clone, Debug)]
pub struct PeSnapshot {
    /// The textual form of the instruction this PE is currently executing,
    /// or `None` if it hasn't dispatched anything yet.
    pub current: Option<String>,
    pub remaining: u64,
}

#[derive(Clone, Debug)]
pub struct CycleSnapshot {
    pub cycle: u64,
    pub pes: Vec<PeSnapshot>,
}

/// The outcome of one simulator run: the final memory image, the total
/// elapsed cycle count, and the per-cycle trace.
#[derive(Clone, Debug)]
pub struct SimResult {
    pub mem: Map<String, f64>,
    pub cycles: u64,
    pub trace: Vec<CycleSnapshot>,
}

/// Run all PEs in lockstep to completion. `streams[p]` is PE `p`'s line
/// stream; all streams must carry the same number of lines — a well-formed
/// C6 schedule always produces this, so unequal lengths are treated as a
/// scheduler bug (§9's REDESIGN FLAG) rather than tolerated with the
/// shortest-wins behavior of the original implementation.
pub fn run(streams: &[Vec<String>], latencies: &Map<String, u64>, mem: Map<String, f64>) -> Result<SimResult> {
    let lengths: Vec<usize> = streams.iter().map(Vec::len).collect();
    if let Some(&first) = lengths.first() {
        if lengths.iter().any(|&l| l != first) {
            return Err(Error::StreamLengthMismatch(lengths));
        }
    }

    let pe_count = streams.len();
    let mut rg: Map<String, f64> = Map::new();
    let mut mem = mem;
    let mut pc = vec![0usize; pe_count];
    let mut remaining = vec![0u64; pe_count];
    let mut current_text: Vec<Option<String>> = vec![None; pe_count];
    let mut cycle = 0u64;
    let mut trace = Vec::new();

    while (0..pe_count).all(|p| pc[p] < streams[p].len()) {
        for p in 0..pe_count {
            if remaining[p] == 0 {
                let line = &streams[p][pc[p]];
                pc[p] += 1;
                let instr = parse_line(line)?;
                remaining[p] = crate::common::kind_latency(instr.kind(), latencies);
                current_text[p] = Some(line.clone());
                execute(&instr, &mut rg, &mut mem)?;
            }
        }

        trace.push(CycleSnapshot {
            cycle,
            pes: (0..pe_count)
                .map(|p| PeSnapshot { current: current_text[p].clone(), remaining: remaining[p] })
                .collect(),
        });
        tracing::info!(cycle, "simulated cycle");

        for r in remaining.iter_mut() {
            *r = r.saturating_sub(1);
        }
        cycle += 1;
    }

    Ok(SimResult { mem, cycles: cycle, trace })
}

/// Parse one emitted line back into an [`Instruction`]. Blank filler lines
/// must already have been dropped by the caller (§4.8: "splitting on
/// newline and dropping empty lines").
fn parse_line(line: &str) -> Result<Instruction> {
    if line == "NOP" {
        return Ok(Instruction::Nop);
    }
    let parts: Vec<&str> = line.split(',').collect();
    let tok = |i: usize| -> Id { id(parts[i]) };
    match parts.first().copied() {
        Some("LOAD") => Ok(Instruction::Load { dst: tok(1), addr: tok(2) }),
        Some("STORE") => Ok(Instruction::Store { addr: tok(1), src: tok(2) }),
        Some("EQ") => Ok(Instruction::Eq { dst: tok(1), value: tok(2) }),
        Some("SQRT") => Ok(Instruction::Sqrt { dst: tok(1), src: tok(2) }),
        Some("ADD") => Ok(Instruction::Arith { op: ArithOp::Add, dst: tok(1), lhs: tok(2), rhs: tok(3) }),
        Some("SUB") => Ok(Instruction::Arith { op: ArithOp::Sub, dst: tok(1), lhs: tok(2), rhs: tok(3) }),
        Some("MUL") => Ok(Instruction::Arith { op: ArithOp::Mul, dst: tok(1), lhs: tok(2), rhs: tok(3) }),
        Some("DIV") => Ok(Instruction::Arith { op: ArithOp::Div, dst: tok(1), lhs: tok(2), rhs: tok(3) }),
        _ => Err(Error::UnknownInstruction(line.to_string())),
    }
}

/// Resolve an operand token to a value: a register lookup if it starts with
/// `t`, otherwise a numeric literal.
fn resolve(token: &Id, rg: &Map<String, f64>) -> Result<f64> {
    let token = token.to_string();
    if is_register(&token) {
        rg.get(&token).copied().ok_or(Error::UnknownRegister(token))
    } else {
        Ok(token.parse::<f64>().expect("IR guarantees non-register operands are numeric"))
    }
}

fn execute(instr: &Instruction, rg: &mut Map<String, f64>, mem: &mut Map<String, f64>) -> Result<()> {
    match instr {
        Instruction::Load { dst, addr } => {
            let addr = addr.to_string();
            let value = *mem.get(&addr).ok_or_else(|| Error::UnknownMemoryAddress(addr.clone()))?;
            rg.insert(dst.to_string(), value);
        }
        Instruction::Store { addr, src } => {
            let value = resolve(src, rg)?;
            mem.insert(addr.to_string(), value);
        }
        Instruction::Eq { dst, value } => {
            let v = resolve(value, rg)?;
            rg.insert(dst.to_string(), v);
        }
        Instruction::Arith { op, dst, lhs, rhs } => {
            let l = resolve(lhs, rg)?;
            let r = resolve(rhs, rg)?;
            rg.insert(dst.to_string(), op.eval(l, r));
        }
        Instruction::Sqrt { dst, src } => {
            let s = resolve(src, rg)?;
            rg.insert(dst.to_string(), s.sqrt());
        }
        Instruction::Nop => {}
    }
    Ok(())
}

/// A mismatching memory address between two runs: `(address, single_pe,
/// multi_pe)`.
pub type Mismatch = (String, f64, f64);

/// Compares a single-PE run against an N-PE run of the same program (§6,
/// §7, §10.3). Purely additive over the Python original's plain-dict
/// equality check: it names every differing address instead of only
/// reporting a global yes/no.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub single_cycles: u64,
    pub multi_cycles: u64,
    pub equal: bool,
    pub mismatches: Vec<Mismatch>,
}

pub fn compare(single: &SimResult, multi: &SimResult) -> Comparison {
    let addrs: Set<String> = single.mem.keys().chain(multi.mem.keys()).cloned().collect();
    let mismatches: Vec<Mismatch> = addrs
        .into_iter()
        .filter_map(|addr| {
            let a = single.mem.get(&addr).copied().unwrap_or(0.0);
            let b = multi.mem.get(&addr).copied().unwrap_or(0.0);
            (a != b).then_some((addr, a, b))
        })
        .collect();

    Comparison {
        single_cycles: single.cycles,
        multi_cycles: multi.cycles,
        equal: mismatches.is_empty(),
        mismatches,
    }
}

//! Common definitions that are shared between different parts of the compiler.

// Use sorted sets and maps for consistent output
pub use std::collections::{BTreeMap as Map, BTreeSet as Set};

use derive_more::Display;

/// Identifiers: register names (`t0`, `t17`, ...), memory addresses, and
/// numeric-literal operands are all represented as interned strings. The
/// language's only type is scalar float, so "is this a register" is purely
/// syntactic (§3: "a non-empty identifier beginning with `t`").
pub type Id = internment::Intern<String>;

/// Intern a string into an [`Id`].
pub fn id(s: impl Into<String>) -> Id {
    internment::Intern::new(s.into())
}

/// Is this operand a register (as opposed to a numeric literal or a memory
/// address)? Registers are the only identifiers the language reserves a
/// sigil for: anything spelled `tN...`.
pub fn is_register(s: &str) -> bool {
    s.starts_with('t')
}

/// Does this token parse as a numeric literal?
pub fn is_number(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ArithOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
}

impl ArithOp {
    /// The IR mnemonic for this operator (`ADD`, `SUB`, ...).
    pub fn kind_name(self) -> &'static str {
        match self {
            ArithOp::Add => "ADD",
            ArithOp::Sub => "SUB",
            ArithOp::Mul => "MUL",
            ArithOp::Div => "DIV",
        }
    }

    /// Parse a source-level operator token (`+`, `-`, `*`, `/`).
    pub fn from_token(tok: &str) -> Option<ArithOp> {
        match tok {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" => Some(ArithOp::Mul),
            "/" => Some(ArithOp::Div),
            _ => None,
        }
    }

    /// Evaluate this operator over host floating-point operands.
    pub fn eval(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }
}

/// The closed set of operation kinds (§3).
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum OpKind {
    #[display("LOAD")]
    Load,
    #[display("STORE")]
    Store,
    #[display("EQ")]
    Eq,
    #[display("{}", _0.kind_name())]
    Arith(ArithOp),
    #[display("SQRT")]
    Sqrt,
    #[display("NOP")]
    Nop,
}

impl OpKind {
    /// Look a kind up by its mnemonic, as used in the latency table and the
    /// on-disk per-PE text format.
    pub fn from_name(name: &str) -> Option<OpKind> {
        Some(match name {
            "LOAD" => OpKind::Load,
            "STORE" => OpKind::Store,
            "EQ" => OpKind::Eq,
            "ADD" => OpKind::Arith(ArithOp::Add),
            "SUB" => OpKind::Arith(ArithOp::Sub),
            "MUL" => OpKind::Arith(ArithOp::Mul),
            "DIV" => OpKind::Arith(ArithOp::Div),
            "SQRT" => OpKind::Sqrt,
            "NOP" => OpKind::Nop,
            _ => return None,
        })
    }

    pub fn name(self) -> String {
        self.to_string()
    }
}

/// Look up `kind`'s cycle cost in `latencies`. `NOP` is always 1 cycle
/// regardless of what (if anything) the table says for it (§4.8, Open
/// Questions); any other kind missing from the table contributes 0 (§4.5).
pub fn kind_latency(kind: OpKind, latencies: &Map<String, u64>) -> u64 {
    if matches!(kind, OpKind::Nop) {
        return 1;
    }
    *latencies.get(&kind.name()).unwrap_or(&0)
}

/// One IR instruction (§3). Operands that are not numeric literals are
/// always registers (`Id`s starting with `t`); this is enforced at
/// construction time by [`crate::front::ir::build`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Instruction {
    Load { dst: Id, addr: Id },
    Store { addr: Id, src: Id },
    /// Synthetic "copy constant into register", produced only by the
    /// optimizer's constant-folding pass (or, degenerately, by a
    /// single-token source assignment).
    Eq { dst: Id, value: Id },
    Arith { op: ArithOp, dst: Id, lhs: Id, rhs: Id },
    Sqrt { dst: Id, src: Id },
    Nop,
}

impl Instruction {
    pub fn kind(&self) -> OpKind {
        match self {
            Instruction::Load { .. } => OpKind::Load,
            Instruction::Store { .. } => OpKind::Store,
            Instruction::Eq { .. } => OpKind::Eq,
            Instruction::Arith { op, .. } => OpKind::Arith(*op),
            Instruction::Sqrt { .. } => OpKind::Sqrt,
            Instruction::Nop => OpKind::Nop,
        }
    }

    /// The register this instruction writes, if any. `STORE` and `NOP`
    /// write no register (§4.3: `STORE`'s `writes[i]` is the empty marker).
    pub fn dest(&self) -> Option<Id> {
        match self {
            Instruction::Load { dst, .. } => Some(*dst),
            Instruction::Store { .. } => None,
            Instruction::Eq { dst, .. } => Some(*dst),
            Instruction::Arith { dst, .. } => Some(*dst),
            Instruction::Sqrt { dst, .. } => Some(*dst),
            Instruction::Nop => None,
        }
    }

    /// Dependency-bearing operand tokens (§4.3): the tokens a RAW scan
    /// should search prior writers for. For `STORE` this is `src` only —
    /// the address slot is a memory location, not a register, and is never
    /// itself a dependency source even when spelled like a register.
    pub fn operands(&self) -> Vec<Id> {
        match self {
            Instruction::Load { addr, .. } => vec![*addr],
            Instruction::Store { src, .. } => vec![*src],
            Instruction::Eq { value, .. } => vec![*value],
            Instruction::Arith { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instruction::Sqrt { src, .. } => vec![*src],
            Instruction::Nop => vec![],
        }
    }

    /// Render as the comma-separated textual form used both by the emitter
    /// (§4.6) and by the simulator's loader (§4.8): kind, then operands, no
    /// parentheses, no predecessor metadata.
    pub fn render(&self) -> String {
        match self {
            Instruction::Load { dst, addr } => format!("LOAD,{dst},{addr}"),
            Instruction::Store { addr, src } => format!("STORE,{addr},{src}"),
            Instruction::Eq { dst, value } => format!("EQ,{dst},{value}"),
            Instruction::Arith { op, dst, lhs, rhs } => {
                format!("{},{dst},{lhs},{rhs}", op.kind_name())
            }
            Instruction::Sqrt { dst, src } => format!("SQRT,{dst},{src}"),
            Instruction::Nop => "NOP".to_string(),
        }
    }
}

/// An ordered IR listing together with, once [`crate::middle::dependency`]
/// has run, each instruction's predecessor set. The predecessor set is an
/// attribute of an instruction *within this listing*: any structural edit
/// (delete, reorder, fold) invalidates it until dependency analysis is
/// rerun (§9, design note on predecessor-set decoration).
#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub insns: Vec<Instruction>,
    /// `deps[i]` is the sorted-unique predecessor-index set for `insns[i]`.
    /// Empty (and possibly stale) until [`crate::middle::dependency::analyze`]
    /// has populated it.
    pub deps: Vec<Set<usize>>,
}

impl Listing {
    pub fn new(insns: Vec<Instruction>) -> Self {
        let n = insns.len();
        Listing { insns, deps: vec![Set::new(); n] }
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}

//! The IR builder (C2): pattern-matches each statement's token list against
//! the language's three recognized shapes and produces a typed
//! [`Instruction`] for each, then checks the register-shape invariant (§3,
//! §4.2).

use crate::common::{id, is_number, is_register, ArithOp, Instruction};
use crate::error::{Error, RegisterFormatError, Result};

/// Build one [`Instruction`] per statement's token list, in source order.
pub fn build(statements: &[Vec<String>]) -> Result<Vec<Instruction>> {
    statements
        .iter()
        .map(|tokens| {
            let instr = build_one(tokens)?;
            validate(&instr)?;
            Ok(instr)
        })
        .collect()
}

fn build_one(tokens: &[String]) -> Result<Instruction> {
    // Load: `dst = LOAD ( addr )` -> 6 tokens, addr at index 4.
    if tokens.iter().any(|t| t == "LOAD") {
        let dst = tokens.first().ok_or_else(|| unrecognized(tokens))?;
        let addr = tokens.get(4).ok_or_else(|| unrecognized(tokens))?;
        return Ok(Instruction::Load { dst: id(dst.clone()), addr: id(addr.clone()) });
    }

    if tokens.iter().any(|t| t == "=") {
        return match tokens.len() {
            // `dst = src` (a bare copy; not produced by real source programs
            // but accepted, per §4.2).
            3 => Ok(Instruction::Eq { dst: id(tokens[0].clone()), value: id(tokens[2].clone()) }),
            // `dst = a OP b`
            5 if tokens[2] != "^" => {
                let op = ArithOp::from_token(&tokens[3]).ok_or_else(|| unrecognized(tokens))?;
                Ok(Instruction::Arith {
                    op,
                    dst: id(tokens[0].clone()),
                    lhs: id(tokens[2].clone()),
                    rhs: id(tokens[4].clone()),
                })
            }
            // `dst = ^ a`
            4 if tokens[2] == "^" => {
                Ok(Instruction::Sqrt { dst: id(tokens[0].clone()), src: id(tokens[3].clone()) })
            }
            _ => Err(unrecognized(tokens)),
        };
    }

    // Store: `STORE ( addr , src )` -> 6 tokens, addr at index 2, src at index 4.
    if tokens.iter().any(|t| t == "STORE") {
        let addr = tokens.get(2).ok_or_else(|| unrecognized(tokens))?;
        let src = tokens.get(4).ok_or_else(|| unrecognized(tokens))?;
        return Ok(Instruction::Store { addr: id(addr.clone()), src: id(src.clone()) });
    }

    Err(unrecognized(tokens))
}

fn unrecognized(tokens: &[String]) -> Error {
    RegisterFormatError::NotARegister {
        operand: tokens.join(" "),
        instruction: "<unrecognized statement shape>".to_string(),
    }
    .into()
}

/// Every operand that is not a numeric literal must be a register, and
/// every non-`NOP`, non-`STORE` instruction's destination must be a
/// register (§3 invariants).
fn validate(instr: &Instruction) -> Result<()> {
    let check = |operand: crate::common::Id| -> Result<()> {
        let text = operand.to_string();
        if !is_number(&text) && !is_register(&text) {
            return Err(RegisterFormatError::NotARegister {
                operand: text,
                instruction: instr.render(),
            }
            .into());
        }
        Ok(())
    };

    match instr {
        Instruction::Load { dst, .. } => check(*dst),
        Instruction::Store { src, .. } => check(*src),
        Instruction::Eq { dst, value } => {
            check(*dst)?;
            check(*value)
        }
        Instruction::Arith { dst, lhs, rhs, .. } => {
            check(*dst)?;
            check(*lhs)?;
            check(*rhs)
        }
        Instruction::Sqrt { dst, src } => {
            check(*dst)?;
            check(*src)
        }
        Instruction::Nop => Ok(()),
    }
}

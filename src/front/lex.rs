//! The lexer (C1): turns source text into one token list per statement.
//!
//! Statements are separated by `;`; the trailing segment after the last `;`
//! is discarded (§4.1), so a well-formed program always ends with `;`.
//! Tokenization is a single left-to-right scan per statement rather than a
//! regex match: `(`, `)`, `=`, and `,` each break the current token and are
//! themselves emitted; the arithmetic operators break and are emitted too; a
//! bare space breaks the current token but is dropped; everything else
//! accumulates into the current token.
//!
//! `,` is treated as an emitted delimiter alongside `(`, `)`, `=` even
//! though it is not separately called out in the source grammar: the
//! `STORE(addr, src)` shape only produces the right operand positions if the
//! comma is its own token (see `front::ir` for the indices this assumes).

const EMITTED_DELIMS: [char; 4] = ['(', ')', '=', ','];
const OPERATORS: [char; 5] = ['*', '/', '+', '-', '^'];

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Tokenize one statement's worth of source text.
fn tokenize_statement(stmt: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in stmt.chars() {
        if ch == ' ' {
            flush(&mut current, &mut tokens);
        } else if EMITTED_DELIMS.contains(&ch) || OPERATORS.contains(&ch) {
            flush(&mut current, &mut tokens);
            tokens.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Tokenize a full source program into one token list per statement,
/// preserving source order.
pub fn tokenize(source: &str) -> Vec<Vec<String>> {
    let mut statements: Vec<&str> = source.split(';').collect();
    statements.pop();
    statements.iter().map(|s| tokenize_statement(s)).collect()
}

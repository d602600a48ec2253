//! Lexical tokenizer for SMILES strings.

use compact_str::CompactString;

use crate::constants::NGRAM_SEPARATOR;

/// Ordered tokens of one input string.
pub type TokenizedMolecule = Vec<CompactString>;

/// Tokenize a SMILES string into atom, bond and bracket tokens.
///
/// Single left-to-right scan that never fails:
/// - Bracket groups (`[C@@H]`, `[nH]`, `[O-]`) are emitted whole
/// - `Cl` and `Br` are recognised by deferring a bare `C`/`B` by one character
/// - Every other character is its own token
///
/// Bracket groups win over halogen lookahead. An unterminated bracket absorbs
/// the rest of the input and is never emitted, so the output can be shorter
/// than the input suggests. This is lexical only: nothing is validated.
pub fn tokenize(smiles: &str) -> TokenizedMolecule {
    let mut tokens = Vec::new();
    let mut bracket = CompactString::default();
    let mut in_bracket = false;
    let mut maybe_chlorine = false;
    let mut maybe_bromine = false;

    for ch in smiles.chars() {
        if maybe_chlorine {
            maybe_chlorine = false;
            if ch == 'l' {
                tokens.push(CompactString::const_new("Cl"));
                continue;
            }
            tokens.push(CompactString::const_new("C"));
        }
        if maybe_bromine {
            maybe_bromine = false;
            if ch == 'r' {
                tokens.push(CompactString::const_new("Br"));
                continue;
            }
            tokens.push(CompactString::const_new("B"));
        }

        if ch == ']' {
            bracket.push(ch);
            tokens.push(std::mem::take(&mut bracket));
            in_bracket = false;
        } else if ch == '[' || in_bracket {
            bracket.push(ch);
            in_bracket = true;
        } else if ch == 'C' {
            maybe_chlorine = true;
        } else if ch == 'B' {
            maybe_bromine = true;
        } else {
            let mut buf = [0u8; 4];
            tokens.push(CompactString::from(ch.encode_utf8(&mut buf) as &str));
        }
    }

    if maybe_chlorine {
        tokens.push(CompactString::const_new("C"));
    }
    if maybe_bromine {
        tokens.push(CompactString::const_new("B"));
    }
    tokens
}

/// Tokenize and join with single spaces ("chemical language" sentence form).
pub fn tokenize_to_string(smiles: &str) -> String {
    let tokens = tokenize(smiles);
    let mut sentence = String::with_capacity(smiles.len() * 2);
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            sentence.push(NGRAM_SEPARATOR);
        }
        sentence.push_str(token);
    }
    sentence
}

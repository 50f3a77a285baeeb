// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prerequisite expression parsing.
//!
//! The grammar, informally:
//!
//! ```text
//! expr    := or_expr
//! or_expr := and_expr (("OR"|"|") and_expr)*
//! and_expr:= not_expr (("AND"|","|";"|"&") not_expr)*
//! not_expr:= ("NOT"|"!"|"~")? atom
//! atom    := IDENT | "*" IDENT | "(" expr ")" | STRING
//! ```
//!
//! `*` marks the following identifier as optional. Parsing never fails:
//! a structurally broken expression falls back to its verbatim form with
//! `mandatory` computed from `*` presence alone.

use serde::{Deserialize, Serialize};

/// A lexical token of a prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrereqToken {
    /// An identifier, possibly marked optional with `*`.
    Identifier {
        /// The (unquoted) identifier text.
        name: String,
        /// `true` when the identifier was prefixed with `*`.
        optional: bool,
    },
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Logical negation.
    Not,
    /// `(`.
    LeftParen,
    /// `)`.
    RightParen,
}

/// A node of the parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrereqNode {
    /// A referenced lesson or block.
    Identifier {
        /// The identifier text.
        name: String,
        /// `true` when the reference is optional.
        optional: bool,
    },
    /// Negation of a sub-expression.
    Not(Box<PrereqNode>),
    /// Conjunction of two sub-expressions.
    And(Box<PrereqNode>, Box<PrereqNode>),
    /// Disjunction of two sub-expressions.
    Or(Box<PrereqNode>, Box<PrereqNode>),
}

/// A parsed (or best-effort retained) prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccPrerequisiteExpression {
    /// The expression exactly as it appeared in the table.
    pub raw: String,
    /// `true` iff the raw expression contains no `*` marker.
    pub mandatory: bool,
    /// Every referenced identifier, ordered, first occurrence only.
    pub referenced: Vec<String>,
    /// The optional subset of [`referenced`](Self::referenced), ordered.
    pub optional: Vec<String>,
    /// The token stream.
    pub tokens: Vec<PrereqToken>,
    /// The postfix form; empty when the expression did not parse.
    pub postfix: Vec<PrereqToken>,
    /// The expression tree; `None` when the expression did not parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<PrereqNode>,
}

impl AiccPrerequisiteExpression {
    /// Parse an expression. Never fails; see the module docs for the
    /// fallback semantics.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let tokens = tokenize(raw);
        let mandatory = !raw.contains('*');

        let mut referenced = Vec::new();
        let mut optional = Vec::new();
        for token in &tokens {
            if let PrereqToken::Identifier { name, optional: opt } = token {
                if !referenced.contains(name) {
                    referenced.push(name.clone());
                }
                if *opt && !optional.contains(name) {
                    optional.push(name.clone());
                }
            }
        }

        let (postfix, ast) = match to_postfix(&tokens).and_then(|postfix| {
            build_ast(&postfix).map(|ast| (postfix, ast))
        }) {
            Some((postfix, ast)) => (postfix, Some(ast)),
            None => (Vec::new(), None),
        };

        Self {
            raw: raw.to_string(),
            mandatory,
            referenced,
            optional,
            tokens,
            postfix,
            ast,
        }
    }
}

// ── Tokenizer ───────────────────────────────────────────────────────────

fn is_symbol(c: char) -> bool {
    matches!(c, '&' | ',' | ';' | '|' | '!' | '~' | '(' | ')' | '*' | '"' | '\'')
}

fn tokenize(raw: &str) -> Vec<PrereqToken> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();
    let mut next_optional = false;

    while let Some(&c) = chars.peek() {
        match c {
            _ if c.is_whitespace() => {
                chars.next();
            }
            '&' | ',' | ';' => {
                chars.next();
                tokens.push(PrereqToken::And);
            }
            '|' => {
                chars.next();
                tokens.push(PrereqToken::Or);
            }
            '!' | '~' => {
                chars.next();
                tokens.push(PrereqToken::Not);
            }
            '(' => {
                chars.next();
                tokens.push(PrereqToken::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(PrereqToken::RightParen);
            }
            '*' => {
                chars.next();
                next_optional = true;
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut name = String::new();
                for inner in chars.by_ref() {
                    if inner == quote {
                        break;
                    }
                    name.push(inner);
                }
                tokens.push(PrereqToken::Identifier {
                    name,
                    optional: std::mem::take(&mut next_optional),
                });
            }
            _ => {
                let mut word = String::new();
                while let Some(&w) = chars.peek() {
                    if w.is_whitespace() || is_symbol(w) {
                        break;
                    }
                    word.push(w);
                    chars.next();
                }
                match word.to_ascii_uppercase().as_str() {
                    "AND" => tokens.push(PrereqToken::And),
                    "OR" => tokens.push(PrereqToken::Or),
                    "NOT" => tokens.push(PrereqToken::Not),
                    _ => tokens.push(PrereqToken::Identifier {
                        name: word,
                        optional: std::mem::take(&mut next_optional),
                    }),
                }
            }
        }
    }
    tokens
}

// ── Shunting-yard ───────────────────────────────────────────────────────

fn precedence(token: &PrereqToken) -> u8 {
    match token {
        PrereqToken::Not => 3,
        PrereqToken::And => 2,
        PrereqToken::Or => 1,
        _ => 0,
    }
}

/// Infix → postfix. `None` on mismatched parentheses or a trailing
/// operator state the builder cannot repair.
fn to_postfix(tokens: &[PrereqToken]) -> Option<Vec<PrereqToken>> {
    let mut output = Vec::new();
    let mut operators: Vec<PrereqToken> = Vec::new();

    for token in tokens {
        match token {
            PrereqToken::Identifier { .. } => output.push(token.clone()),
            PrereqToken::Not => operators.push(token.clone()),
            PrereqToken::And | PrereqToken::Or => {
                while let Some(top) = operators.last() {
                    if matches!(top, PrereqToken::LeftParen) {
                        break;
                    }
                    if precedence(top) >= precedence(token) {
                        output.push(operators.pop()?);
                    } else {
                        break;
                    }
                }
                operators.push(token.clone());
            }
            PrereqToken::LeftParen => operators.push(token.clone()),
            PrereqToken::RightParen => loop {
                match operators.pop() {
                    Some(PrereqToken::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return None,
                }
            },
        }
    }
    while let Some(op) = operators.pop() {
        if matches!(op, PrereqToken::LeftParen) {
            return None;
        }
        output.push(op);
    }
    Some(output)
}

/// Postfix → tree. `None` on wrong arity or leftover stack entries.
fn build_ast(postfix: &[PrereqToken]) -> Option<PrereqNode> {
    let mut stack: Vec<PrereqNode> = Vec::new();
    for token in postfix {
        match token {
            PrereqToken::Identifier { name, optional } => {
                stack.push(PrereqNode::Identifier {
                    name: name.clone(),
                    optional: *optional,
                });
            }
            PrereqToken::Not => {
                let operand = stack.pop()?;
                stack.push(PrereqNode::Not(Box::new(operand)));
            }
            PrereqToken::And => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                stack.push(PrereqNode::And(Box::new(lhs), Box::new(rhs)));
            }
            PrereqToken::Or => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                stack.push(PrereqNode::Or(Box::new(lhs), Box::new(rhs)));
            }
            _ => return None,
        }
    }
    let root = stack.pop()?;
    stack.is_empty().then_some(root)
}

//! Enable predicates.
//!
//! A predicate is a literal or a boolean expression over opaque condition atoms:
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | "true" | "false" | atom
//! ```
//!
//! An atom is any other run of text, trimmed, so C-style conditions such as
//! `device->rad_info.chip_class >= CIK` or `HAVE_LLVM >= 0x0700` are single atoms.
//! What an atom means is up to the [`Conditions`] the predicate is evaluated against.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use epgen_registry_spec::EnableSpec;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
	#[error("empty predicate")]
	Empty,
	#[error("unbalanced parentheses in {0:?}")]
	Unbalanced(String),
	#[error("unexpected {token} in {input:?}")]
	Unexpected { token: String, input: String },
}

/// Environment that decides whether an atom holds.
pub trait Conditions {
	fn holds(&self, atom: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Conditions for F {
	fn holds(&self, atom: &str) -> bool {
		self(atom)
	}
}

/// Set of atoms that hold; everything else does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
	atoms: FxHashSet<String>,
}

impl ConditionSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, atom: impl Into<String>) {
		self.atoms.insert(atom.into());
	}

	pub fn len(&self) -> usize {
		self.atoms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.atoms.is_empty()
	}
}

impl<S: Into<String>> FromIterator<S> for ConditionSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self {
			atoms: iter.into_iter().map(Into::into).collect(),
		}
	}
}

impl Conditions for ConditionSet {
	fn holds(&self, atom: &str) -> bool {
		self.atoms.contains(atom)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
	Literal(bool),
	Atom(Box<str>),
	Not(Box<Expr>),
	And(Box<Expr>, Box<Expr>),
	Or(Box<Expr>, Box<Expr>),
}

impl Expr {
	fn eval(&self, env: &dyn Conditions) -> bool {
		match self {
			Expr::Literal(b) => *b,
			Expr::Atom(a) => env.holds(a),
			Expr::Not(e) => !e.eval(env),
			Expr::And(a, b) => a.eval(env) && b.eval(env),
			Expr::Or(a, b) => a.eval(env) || b.eval(env),
		}
	}

	fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a str>) {
		match self {
			Expr::Literal(_) => {}
			Expr::Atom(a) => out.push(a),
			Expr::Not(e) => e.collect_atoms(out),
			Expr::And(a, b) | Expr::Or(a, b) => {
				a.collect_atoms(out);
				b.collect_atoms(out);
			}
		}
	}
}

/// A parsed enable predicate that remembers its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Predicate {
	source: Box<str>,
	expr: Expr,
}

impl Predicate {
	pub fn always() -> Self {
		Self::literal(true)
	}

	pub fn never() -> Self {
		Self::literal(false)
	}

	pub fn literal(b: bool) -> Self {
		Self {
			source: if b { "true".into() } else { "false".into() },
			expr: Expr::Literal(b),
		}
	}

	pub fn parse(source: &str) -> Result<Self, PredicateError> {
		let tokens = tokenize(source)?;
		if tokens.is_empty() {
			return Err(PredicateError::Empty);
		}
		let mut parser = Parser {
			source,
			tokens: &tokens,
			pos: 0,
		};
		let expr = parser.or()?;
		if let Some(tok) = parser.peek() {
			return Err(parser.unexpected(tok));
		}
		Ok(Self {
			source: source.trim().into(),
			expr,
		})
	}

	pub fn from_spec(spec: &EnableSpec) -> Result<Self, PredicateError> {
		match spec {
			EnableSpec::Bool(b) => Ok(Self::literal(*b)),
			EnableSpec::Expr(s) => Self::parse(s),
		}
	}

	pub fn eval(&self, env: &dyn Conditions) -> bool {
		self.expr.eval(env)
	}

	/// Returns the literal value if the predicate does not depend on any atom.
	pub fn as_literal(&self) -> Option<bool> {
		match self.expr {
			Expr::Literal(b) => Some(b),
			_ => None,
		}
	}

	/// Atoms referenced by the predicate, in source order.
	pub fn atoms(&self) -> Vec<&str> {
		let mut out = Vec::new();
		self.expr.collect_atoms(&mut out);
		out
	}

	pub fn source(&self) -> &str {
		&self.source
	}
}

impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

impl TryFrom<String> for Predicate {
	type Error = PredicateError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		Self::parse(&s)
	}
}

impl From<Predicate> for String {
	fn from(p: Predicate) -> Self {
		p.source.into()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
	LParen,
	RParen,
	Not,
	And,
	Or,
	Atom(&'a str),
}

impl fmt::Display for Token<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::LParen => f.write_str("'('"),
			Token::RParen => f.write_str("')'"),
			Token::Not => f.write_str("'!'"),
			Token::And => f.write_str("'&&'"),
			Token::Or => f.write_str("'||'"),
			Token::Atom(a) => write!(f, "atom {a:?}"),
		}
	}
}

fn is_operator_start(rest: &str) -> bool {
	rest.starts_with("&&")
		|| rest.starts_with("||")
		|| rest.starts_with('(')
		|| rest.starts_with(')')
		|| (rest.starts_with('!') && !rest.starts_with("!="))
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, PredicateError> {
	let mut tokens = Vec::new();
	let mut pos = 0;
	let mut depth = 0usize;

	while pos < source.len() {
		let rest = &source[pos..];
		let trimmed = rest.trim_start();
		pos += rest.len() - trimmed.len();
		if trimmed.is_empty() {
			break;
		}

		let (tok, len) = if trimmed.starts_with("&&") {
			(Token::And, 2)
		} else if trimmed.starts_with("||") {
			(Token::Or, 2)
		} else if trimmed.starts_with('(') {
			depth += 1;
			(Token::LParen, 1)
		} else if trimmed.starts_with(')') {
			depth = depth.checked_sub(1).ok_or_else(|| PredicateError::Unbalanced(source.to_string()))?;
			(Token::RParen, 1)
		} else if is_operator_start(trimmed) {
			(Token::Not, 1)
		} else {
			let mut end = trimmed.len();
			for (i, _) in trimmed.char_indices().skip(1) {
				if is_operator_start(&trimmed[i..]) {
					end = i;
					break;
				}
			}
			(Token::Atom(trimmed[..end].trim_end()), end)
		};

		tokens.push(tok);
		pos += len;
	}

	if depth != 0 {
		return Err(PredicateError::Unbalanced(source.to_string()));
	}
	Ok(tokens)
}

struct Parser<'s, 't> {
	source: &'s str,
	tokens: &'t [Token<'s>],
	pos: usize,
}

impl<'s> Parser<'s, '_> {
	fn peek(&self) -> Option<&Token<'s>> {
		self.tokens.get(self.pos)
	}

	fn next(&mut self) -> Option<&Token<'s>> {
		let tok = self.tokens.get(self.pos);
		self.pos += 1;
		tok
	}

	fn unexpected(&self, tok: &Token<'_>) -> PredicateError {
		PredicateError::Unexpected {
			token: tok.to_string(),
			input: self.source.to_string(),
		}
	}

	fn end_of_input(&self) -> PredicateError {
		PredicateError::Unexpected {
			token: "end of input".to_string(),
			input: self.source.to_string(),
		}
	}

	fn or(&mut self) -> Result<Expr, PredicateError> {
		let mut lhs = self.and()?;
		while self.peek() == Some(&Token::Or) {
			self.pos += 1;
			let rhs = self.and()?;
			lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn and(&mut self) -> Result<Expr, PredicateError> {
		let mut lhs = self.unary()?;
		while self.peek() == Some(&Token::And) {
			self.pos += 1;
			let rhs = self.unary()?;
			lhs = Expr::And(Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn unary(&mut self) -> Result<Expr, PredicateError> {
		if self.peek() == Some(&Token::Not) {
			self.pos += 1;
			return Ok(Expr::Not(Box::new(self.unary()?)));
		}
		self.primary()
	}

	fn primary(&mut self) -> Result<Expr, PredicateError> {
		let tok = self.next().cloned().ok_or_else(|| self.end_of_input())?;
		match tok {
			Token::LParen => {
				let inner = self.or()?;
				match self.next().cloned() {
					Some(Token::RParen) => Ok(inner),
					Some(other) => Err(self.unexpected(&other)),
					None => Err(self.end_of_input()),
				}
			}
			Token::Atom("true") => Ok(Expr::Literal(true)),
			Token::Atom("false") => Ok(Expr::Literal(false)),
			Token::Atom(a) => Ok(Expr::Atom(a.into())),
			other => Err(self.unexpected(&other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn env(atoms: &[&str]) -> ConditionSet {
		atoms.iter().copied().collect()
	}

	#[test]
	fn literals() {
		assert_eq!(Predicate::always().as_literal(), Some(true));
		assert_eq!(Predicate::parse("false").unwrap().as_literal(), Some(false));
		assert!(Predicate::parse("true").unwrap().eval(&env(&[])));
	}

	#[test]
	fn single_atom_keeps_c_text() {
		let p = Predicate::parse("device->rad_info.chip_class >= CIK").unwrap();
		assert_eq!(p.atoms(), vec!["device->rad_info.chip_class >= CIK"]);
		assert!(p.eval(&env(&["device->rad_info.chip_class >= CIK"])));
		assert!(!p.eval(&env(&[])));
	}

	#[test]
	fn not_equal_is_part_of_atom() {
		let p = Predicate::parse("version != 0").unwrap();
		assert_eq!(p.atoms(), vec!["version != 0"]);
	}

	#[test]
	fn precedence_and_binds_tighter_than_or() {
		let p = Predicate::parse("A || B && C").unwrap();
		assert!(p.eval(&env(&["A"])));
		assert!(!p.eval(&env(&["B"])));
		assert!(p.eval(&env(&["B", "C"])));
	}

	#[test]
	fn negation_and_parentheses() {
		let p = Predicate::parse("!ANDROID && (HAS_X || HAS_Y)").unwrap();
		assert_eq!(p.atoms(), vec!["ANDROID", "HAS_X", "HAS_Y"]);
		assert!(p.eval(&env(&["HAS_Y"])));
		assert!(!p.eval(&env(&["ANDROID", "HAS_Y"])));
		assert!(!p.eval(&env(&[])));
	}

	#[test]
	fn closures_are_conditions() {
		let p = Predicate::parse("a && b").unwrap();
		assert!(p.eval(&|_: &str| true));
		assert!(!p.eval(&|atom: &str| atom == "a"));
	}

	#[test]
	fn malformed_expressions_are_rejected() {
		assert_eq!(Predicate::parse("   "), Err(PredicateError::Empty));
		assert!(matches!(Predicate::parse("(A && B"), Err(PredicateError::Unbalanced(_))));
		assert!(matches!(Predicate::parse("A)"), Err(PredicateError::Unbalanced(_))));
		assert!(matches!(Predicate::parse("A &&"), Err(PredicateError::Unexpected { .. })));
		assert!(matches!(Predicate::parse("&& A"), Err(PredicateError::Unexpected { .. })));
		assert!(matches!(Predicate::parse("()"), Err(PredicateError::Unexpected { .. })));
	}

	#[test]
	fn from_spec() {
		assert_eq!(Predicate::from_spec(&EnableSpec::Bool(false)).unwrap(), Predicate::never());
		let p = Predicate::from_spec(&EnableSpec::Expr("X".into())).unwrap();
		assert_eq!(p.to_string(), "X");
	}
}

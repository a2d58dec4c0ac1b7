//! Keyword-anchored slicing of a flat token stream.
//!
//! WHERE, SET, FROM, ORDER BY and GROUP BY all live in the same token
//! sequence. The resolver finds the first occurrence of each anchor a grammar
//! asks for and hands out the tokens between it and the next anchor.

use crate::ast::Condition;
use crate::coerce::strip_quotes;
use crate::error::{DbError, Result};
use crate::tokenizer::{Keyword, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Where,
    Set,
    From,
    OrderBy,
    GroupBy,
}

impl Anchor {
    pub fn name(self) -> &'static str {
        match self {
            Anchor::Where => "WHERE",
            Anchor::Set => "SET",
            Anchor::From => "FROM",
            Anchor::OrderBy => "ORDER BY",
            Anchor::GroupBy => "GROUP BY",
        }
    }

    fn width(self) -> usize {
        match self {
            Anchor::OrderBy | Anchor::GroupBy => 2,
            _ => 1,
        }
    }

    fn matches_at(self, tokens: &[Token], i: usize) -> bool {
        let next_is_by = || tokens.get(i + 1).is_some_and(|t| t.is(Keyword::By));
        match self {
            Anchor::Where => tokens[i].is(Keyword::Where),
            Anchor::Set => tokens[i].is(Keyword::Set),
            Anchor::From => tokens[i].is(Keyword::From),
            Anchor::OrderBy => tokens[i].is(Keyword::Order) && next_is_by(),
            Anchor::GroupBy => tokens[i].is(Keyword::Group) && next_is_by(),
        }
    }
}

#[derive(Debug)]
pub struct Clauses<'a> {
    head: &'a [Token],
    bodies: Vec<(Anchor, &'a [Token])>,
}

impl<'a> Clauses<'a> {
    /// Partitions `tokens` around the first occurrence of each anchor.
    /// Anchors that do not occur are simply absent from the result.
    pub fn resolve(tokens: &'a [Token], anchors: &[Anchor]) -> Self {
        let mut found: Vec<(usize, Anchor)> = anchors
            .iter()
            .filter_map(|&anchor| {
                (0..tokens.len())
                    .find(|&i| anchor.matches_at(tokens, i))
                    .map(|i| (i, anchor))
            })
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        let head_end = found.first().map_or(tokens.len(), |(pos, _)| *pos);
        let bodies = found
            .iter()
            .enumerate()
            .map(|(k, &(pos, anchor))| {
                let end = found.get(k + 1).map_or(tokens.len(), |(next, _)| *next);
                let start = (pos + anchor.width()).min(end);
                (anchor, &tokens[start..end])
            })
            .collect();

        Clauses { head: &tokens[..head_end], bodies }
    }

    /// Tokens before the first anchor.
    pub fn head(&self) -> &'a [Token] {
        self.head
    }

    pub fn body(&self, anchor: Anchor) -> Option<&'a [Token]> {
        self.bodies.iter().find(|(a, _)| *a == anchor).map(|(_, body)| *body)
    }

    pub fn require(&self, anchor: Anchor) -> Result<&'a [Token]> {
        self.body(anchor).ok_or_else(|| DbError::ClauseSyntax {
            clause: anchor.name(),
            reason: "clause is required".to_string(),
        })
    }
}

pub fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>().join(" ")
}

/// The stretch of `source` a run of tokens was cut from, spacing intact.
pub fn raw<'s>(source: &'s str, tokens: &[Token]) -> &'s str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => source.get(first.offset..last.offset + last.value.len()).unwrap_or(""),
        _ => "",
    }
}

/// Splits a `field = value` clause body on its single `=`.
///
/// `source` is the line `body` was tokenized from.
pub fn split_condition(source: &str, body: &[Token], anchor: Anchor) -> Result<Condition> {
    let text = raw(source, body);
    let fail = |reason: &str| DbError::ClauseSyntax {
        clause: anchor.name(),
        reason: reason.to_string(),
    };

    let mut parts = text.split('=');
    let (left, right) = match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) => (left.trim(), right.trim()),
        (_, None, _) => return Err(fail("expected 'field = value'")),
        _ => return Err(fail("only one '=' is allowed")),
    };

    if left.is_empty() || left.split_whitespace().count() != 1 {
        return Err(fail("expected a single field name before '='"));
    }
    if right.is_empty() {
        return Err(fail("expected a value after '='"));
    }

    Ok(Condition {
        field: left.to_string(),
        value: strip_quotes(right).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_resolve_orders_clauses_by_position() {
        let tokens = tokenize("name, age WHERE age = 30 GROUP BY city ORDER BY name desc").unwrap();
        let clauses = Clauses::resolve(&tokens, &[Anchor::Where, Anchor::OrderBy, Anchor::GroupBy]);
        assert_eq!(join(clauses.head()), "name, age");
        assert_eq!(join(clauses.body(Anchor::Where).unwrap()), "age = 30");
        assert_eq!(join(clauses.body(Anchor::GroupBy).unwrap()), "city");
        assert_eq!(join(clauses.body(Anchor::OrderBy).unwrap()), "name desc");
    }

    #[test]
    fn test_missing_anchor_is_not_an_error() {
        let tokens = tokenize("users").unwrap();
        let clauses = Clauses::resolve(&tokens, &[Anchor::Where]);
        assert!(clauses.body(Anchor::Where).is_none());
        assert!(clauses.require(Anchor::Where).is_err());
    }

    #[test]
    fn test_order_needs_by() {
        let tokens = tokenize("order = 5").unwrap();
        let clauses = Clauses::resolve(&tokens, &[Anchor::OrderBy]);
        assert!(clauses.body(Anchor::OrderBy).is_none());
        assert_eq!(clauses.head().len(), 3);
    }

    #[test]
    fn test_split_condition() {
        let line = "name = 'Alice Smith'";
        let tokens = tokenize(line).unwrap();
        let cond = split_condition(line, &tokens, Anchor::Where).unwrap();
        assert_eq!(cond.field, "name");
        assert_eq!(cond.value, "Alice Smith");

        let tokens = tokenize("age=30").unwrap();
        let cond = split_condition("age=30", &tokens, Anchor::Where).unwrap();
        assert_eq!((cond.field.as_str(), cond.value.as_str()), ("age", "30"));
    }

    #[test]
    fn test_split_condition_keeps_inner_spacing() {
        let line = "users WHERE name = 'a  b' ORDER BY name;";
        let tokens = tokenize(line).unwrap();
        let clauses = Clauses::resolve(&tokens, &[Anchor::Where, Anchor::OrderBy]);
        let body = clauses.body(Anchor::Where).unwrap();
        assert_eq!(raw(line, body), "name = 'a  b'");
        assert_eq!(split_condition(line, body, Anchor::Where).unwrap().value, "a  b");

        let line = "t WHERE id = 3;";
        let tokens = tokenize(line).unwrap();
        let clauses = Clauses::resolve(&tokens, &[Anchor::Where]);
        assert_eq!(raw(line, clauses.body(Anchor::Where).unwrap()), "id = 3");
    }

    #[test]
    fn test_split_condition_rejects_bad_bodies() {
        for body in ["age 30", "a = b = c", "= 3", "age =", "first name = x"] {
            let tokens = tokenize(body).unwrap();
            assert!(
                matches!(split_condition(body, &tokens, Anchor::Set), Err(DbError::ClauseSyntax { clause: "SET", .. })),
                "{body}"
            );
        }
    }
}

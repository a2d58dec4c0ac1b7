use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{DbError, Result};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Where,
    Set,
    From,
    Order,
    Group,
    By,
    Asc,
    Desc,
    As,
    In,
    Database,
    Databases,
    Tables,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        let kw = match word.to_ascii_lowercase().as_str() {
            "where" => Keyword::Where,
            "set" => Keyword::Set,
            "from" => Keyword::From,
            "order" => Keyword::Order,
            "group" => Keyword::Group,
            "by" => Keyword::By,
            "asc" => Keyword::Asc,
            "desc" => Keyword::Desc,
            "as" => Keyword::As,
            "in" => Keyword::In,
            "database" => Keyword::Database,
            "databases" => Keyword::Databases,
            "tables" => Keyword::Tables,
            _ => return None,
        };
        Some(kw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Word,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Byte offset of the token in the input line.
    pub offset: usize,
}

impl Token {
    pub fn is(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn lowercase(&self) -> String {
        self.value.to_ascii_lowercase()
    }
}

/// Splits a command line on whitespace, dropping one trailing `;`.
///
/// Keywords are classified regardless of case; every token keeps its
/// original spelling in `value`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = WORD
        .find_iter(input)
        .map(|m| {
            let value = m.as_str().to_string();
            let kind = Keyword::lookup(&value).map_or(TokenKind::Word, TokenKind::Keyword);
            Token { kind, value, offset: m.start() }
        })
        .collect();

    if let Some(last) = tokens.last_mut() {
        if let Some(stripped) = last.value.strip_suffix(';') {
            last.value = stripped.to_string();
            last.kind = Keyword::lookup(&last.value).map_or(TokenKind::Word, TokenKind::Keyword);
            if last.value.is_empty() {
                tokens.pop();
            }
        }
    }

    if tokens.is_empty() {
        return Err(DbError::EmptyCommand);
    }
    Ok(tokens)
}

//! Formula tokenizer
//!
//! Splits the body of a formula (the text after `=`) into tokens tagged
//! with their byte offset.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::BinaryOp;
use crate::error::{FormulaError, FormulaResult};

const ERROR_CONSTANTS: &[&str] = &[
    "#NULL!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
    "#GETTING_DATA",
    "#SPILL!",
    "#CALC!",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(String),
    /// Function or defined name
    Ident(String),
    /// A1-style cell, `$` markers included
    Cell(String),
    /// Sheet qualifier, without the trailing `!`
    Sheet(String),
    Compare(BinaryOp),
    /// Any other single-character symbol: `+ - * / ^ & % : , ; ( ) { }`
    Punct(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Text(s) => write!(f, "string \"{s}\""),
            Token::Bool(true) => f.write_str("TRUE"),
            Token::Bool(false) => f.write_str("FALSE"),
            Token::Error(e) => f.write_str(e),
            Token::Ident(s) | Token::Cell(s) => write!(f, "'{s}'"),
            Token::Sheet(s) => write!(f, "sheet '{s}'"),
            Token::Compare(op) => write!(f, "'{}'", op.symbol()),
            Token::Punct(c) => write!(f, "'{c}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn parse_error(message: impl fmt::Display, offset: usize) -> FormulaError {
    FormulaError::Parse(format!("{message} at offset {offset}"))
}

/// Tokenize a formula body
pub(crate) fn tokenize(src: &str) -> FormulaResult<Vec<Spanned>> {
    let mut lexer = Lexer {
        src,
        chars: src.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    while let Some(spanned) = lexer.next_token()? {
        tokens.push(spanned);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> FormulaResult<Option<Spanned>> {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}

        let Some(&(offset, c)) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '+' | '-' | '*' | '/' | '^' | '&' | '%' | ':' | ',' | ';' | '(' | ')' | '{'
            | '}' => {
                self.chars.next();
                Token::Punct(c)
            }
            '=' => {
                self.chars.next();
                Token::Compare(BinaryOp::Eq)
            }
            '<' => {
                self.chars.next();
                if self.eat('=') {
                    Token::Compare(BinaryOp::Le)
                } else if self.eat('>') {
                    Token::Compare(BinaryOp::Ne)
                } else {
                    Token::Compare(BinaryOp::Lt)
                }
            }
            '>' => {
                self.chars.next();
                if self.eat('=') {
                    Token::Compare(BinaryOp::Ge)
                } else {
                    Token::Compare(BinaryOp::Gt)
                }
            }
            '"' => self.text(offset)?,
            '\'' => self.quoted_sheet(offset)?,
            '#' => self.error_constant(offset)?,
            c if c.is_ascii_digit() || c == '.' => self.number(offset)?,
            c if c.is_alphabetic() || c == '_' || c == '$' => self.word(offset),
            other => return Err(parse_error(format!("unexpected character '{other}'"), offset)),
        };

        Ok(Some(Spanned { token, offset }))
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    /// Consume characters matching `pred`, returning the end offset
    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> usize {
        let mut end = start;
        while let Some((i, c)) = self.chars.next_if(|&(_, c)| pred(c)) {
            end = i + c.len_utf8();
        }
        end
    }

    /// Body of a delimited literal where a doubled delimiter escapes itself
    fn delimited(&mut self, delimiter: char, start: usize) -> FormulaResult<String> {
        self.chars.next();
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == delimiter => {
                    if self.eat(delimiter) {
                        value.push(delimiter);
                    } else {
                        return Ok(value);
                    }
                }
                Some((_, c)) => value.push(c),
                None => return Err(parse_error(format!("unterminated {delimiter}"), start)),
            }
        }
    }

    fn text(&mut self, start: usize) -> FormulaResult<Token> {
        self.delimited('"', start).map(Token::Text)
    }

    fn quoted_sheet(&mut self, start: usize) -> FormulaResult<Token> {
        let name = self.delimited('\'', start)?;
        if self.eat('!') {
            Ok(Token::Sheet(name))
        } else {
            Err(parse_error("quoted name without '!'", start))
        }
    }

    fn error_constant(&mut self, start: usize) -> FormulaResult<Token> {
        let end = self.take_while(start, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '#' | '/' | '!' | '?' | '_')
        });
        let upper = self.src[start..end].to_ascii_uppercase();
        if ERROR_CONSTANTS.contains(&upper.as_str()) {
            Ok(Token::Error(upper))
        } else {
            Err(parse_error(format!("unknown error constant '{upper}'"), start))
        }
    }

    fn number(&mut self, start: usize) -> FormulaResult<Token> {
        let mut end = self.take_while(start, |c| c.is_ascii_digit() || c == '.');
        if let Some((i, _)) = self.chars.next_if(|&(_, c)| c == 'e' || c == 'E') {
            end = i + 1;
            if let Some((i, _)) = self.chars.next_if(|&(_, c)| c == '+' || c == '-') {
                end = i + 1;
            }
            end = self.take_while(end, |c| c.is_ascii_digit());
        }
        let text = &self.src[start..end];
        text.parse()
            .map(Token::Number)
            .map_err(|_| parse_error(format!("invalid number '{text}'"), start))
    }

    fn word(&mut self, start: usize) -> Token {
        let end = self.take_while(start, |c| {
            c.is_alphanumeric() || matches!(c, '_' | '.' | '$')
        });
        let text = &self.src[start..end];

        if self.eat('!') {
            return Token::Sheet(text.to_string());
        }

        // LOG10( and TRUE( are calls, not a cell or a constant
        let is_call = matches!(self.chars.peek(), Some(&(_, '(')));
        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Bool(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Bool(false);
            }
            if looks_like_cell(text) {
                return Token::Cell(text.to_string());
            }
        }
        Token::Ident(text.to_string())
    }
}

/// `[$]letters[$]digits` with one to three column letters
fn looks_like_cell(text: &str) -> bool {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters = rest.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let rest = &rest[letters..];
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

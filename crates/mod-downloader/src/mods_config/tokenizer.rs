//! Token stream for the mods config language

use super::parser::ParseError;
use super::reader::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word made of `[A-Za-z0-9_.-]`
    Keyword,
    /// Text inside `"..."` or `'...'`
    Quoted,
    /// Text inside `(...)`
    Parenthesized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }
}

/// Splits config text into tokens with one token of lookahead
#[derive(Debug)]
pub struct Tokenizer {
    file_name: String,
    reader: Reader,
    lookahead: Option<Option<Token>>,
}

impl Tokenizer {
    pub fn new(file_name: impl Into<String>, body: &str) -> Self {
        Self {
            file_name: file_name.into(),
            reader: Reader::new(body),
            lookahead: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn line(&self) -> usize {
        self.reader.line()
    }

    /// Look at the next token without consuming it; `None` at end of input
    pub fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        if self.lookahead.is_none() {
            let token = self.scan()?;
            self.lookahead = Some(token);
        }
        Ok(self.lookahead.as_ref().and_then(Option::as_ref))
    }

    /// Consume the next token
    pub fn next(&mut self) -> Result<Option<Token>, ParseError> {
        self.peek()?;
        Ok(self.lookahead.take().flatten())
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, &self.file_name, self.reader.line())
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.reader.read() {
            if c == '#' {
                self.reader.read_until(|c| c == '\r' || c == '\n');
            } else if !c.is_whitespace() {
                self.reader.back();
                break;
            }
        }
    }

    fn scan(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_whitespace_and_comments();

        let Some(first) = self.reader.read() else {
            return Ok(None);
        };

        let token = match first {
            '(' => Token {
                kind: TokenKind::Parenthesized,
                text: self.read_closed(')')?,
            },
            '"' | '\'' => Token {
                kind: TokenKind::Quoted,
                text: self.read_closed(first)?,
            },
            _ => {
                self.reader.back();
                let text = self.reader.read_until(|c| !is_keyword_part(c));
                if text.is_empty() {
                    return Err(self.error(format!("expected keyword but was '{first}'")));
                }
                Token {
                    kind: TokenKind::Keyword,
                    text,
                }
            }
        };

        Ok(Some(token))
    }

    fn read_closed(&mut self, close: char) -> Result<String, ParseError> {
        let text = self.reader.read_until(|c| c == close);
        if self.reader.read() != Some(close) {
            return Err(self.error("unexpected EOF"));
        }
        Ok(text)
    }
}

fn is_keyword_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

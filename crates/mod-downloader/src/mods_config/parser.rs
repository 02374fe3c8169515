//! Recursive-descent parser for mods config files
//!
//! ```text
//! version 0.4.0
//!
//! optional client mod journeymap
//!   from curse journeymap
//!   version 2916002 (5.5.5)
//! mod fixrtm
//!   from url "https://example.com/fixRtm-$version.jar"
//!   version 2.0.20
//! ```

use thiserror::Error;

use super::tokenizer::{Token, TokenKind, Tokenizer};
use super::{ModEntry, ModSide, ModsConfig};
use crate::downloader::sources::{
    CurseSource, DownloadSource, DriveSource, OptifineSource, UrlSource, ZipSource,
};
use crate::version::Version;

/// Syntax or semantic error in a config file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing error at {file} line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub file: String,
    pub line: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            line,
        }
    }
}

type ParseResult<T> = std::result::Result<T, ParseError>;

pub struct Parser {
    tokens: Tokenizer,
    tool_version: Version,
}

impl Parser {
    pub fn new(file_name: impl Into<String>, body: &str) -> Self {
        Self {
            tokens: Tokenizer::new(file_name, body),
            tool_version: Version::CURRENT,
        }
    }

    /// Compare declared config versions against `tool_version` instead of [`Version::CURRENT`]
    pub fn with_tool_version(mut self, tool_version: Version) -> Self {
        self.tool_version = tool_version;
        self
    }

    pub fn parse(mut self) -> ParseResult<ModsConfig> {
        let version = self.parse_version_decl()?;
        let mut mods = Vec::new();
        while self.tokens.peek()?.is_some() {
            mods.push(self.parse_mod()?);
        }
        Ok(ModsConfig { version, mods })
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.tokens.error(message)
    }

    fn peek_keyword(&mut self) -> ParseResult<Option<String>> {
        Ok(self
            .tokens
            .peek()?
            .filter(|token| token.kind == TokenKind::Keyword)
            .map(|token| token.text.clone()))
    }

    fn keyword(&mut self) -> ParseResult<String> {
        match self.tokens.next()? {
            Some(Token {
                kind: TokenKind::Keyword,
                text,
            }) => Ok(text),
            _ => Err(self.error("expected keyword")),
        }
    }

    fn keyword_or_quoted(&mut self) -> ParseResult<String> {
        match self.tokens.next()? {
            Some(Token {
                kind: TokenKind::Keyword | TokenKind::Quoted,
                text,
            }) => Ok(text),
            _ => Err(self.error("expected keyword or quoted")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        match self.tokens.next()? {
            Some(token)
                if token.kind == TokenKind::Keyword && token.text.to_lowercase() == keyword =>
            {
                Ok(())
            }
            _ => Err(self.error(format!("expected '{keyword}'"))),
        }
    }

    fn try_parenthesized(&mut self) -> ParseResult<Option<String>> {
        let is_parenthesized = matches!(
            self.tokens.peek()?,
            Some(token) if token.kind == TokenKind::Parenthesized
        );
        if !is_parenthesized {
            return Ok(None);
        }
        Ok(self.tokens.next()?.map(|token| token.text))
    }

    fn parse_version_decl(&mut self) -> ParseResult<Option<Version>> {
        let is_decl = matches!(self.tokens.peek()?, Some(token) if token.is_keyword("version"));
        if !is_decl {
            return Ok(None);
        }
        self.tokens.next()?;

        let name = self.keyword_or_quoted()?;
        let version =
            Version::parse(&name).map_err(|_| self.error(format!("invalid version name: {name}")))?;
        if !version.is_supported(self.tool_version) {
            return Err(self.error(format!(
                "config file for unsupported version found! Please upgrade mod downloader! :{version}"
            )));
        }
        Ok(Some(version))
    }

    fn parse_mod(&mut self) -> ParseResult<ModEntry> {
        let mut optional = false;
        let mut side = None;
        loop {
            let Some(modifier) = self.peek_keyword()? else {
                return Err(self.error("expected 'mod' or mod modifier"));
            };
            match modifier.as_str() {
                "mod" => {
                    self.tokens.next()?;
                    break;
                }
                "optional" => {
                    if optional {
                        return Err(self.error("multiple optional"));
                    }
                    optional = true;
                }
                "server" | "client" => {
                    if side.is_some() {
                        return Err(self.error("multiple server or client"));
                    }
                    side = Some(if modifier == "server" {
                        ModSide::Server
                    } else {
                        ModSide::Client
                    });
                }
                other => return Err(self.error(format!("unknown mod modifier: {other}"))),
            }
            self.tokens.next()?;
        }

        let id = self.keyword_or_quoted()?;
        let mut source = None;
        let mut version = None;
        while let Some(clause) = self.peek_keyword()? {
            match clause.as_str() {
                "from" => {
                    if source.is_some() {
                        return Err(self.error("multiple from"));
                    }
                    self.tokens.next()?;
                    source = Some(self.parse_source()?);
                }
                "version" => {
                    if version.is_some() {
                        return Err(self.error("multiple version"));
                    }
                    self.tokens.next()?;
                    let version_id = self.keyword_or_quoted()?;
                    let version_name = self.try_parenthesized()?;
                    version = Some((version_id, version_name));
                }
                _ => break,
            }
        }

        let Some(source) = source else {
            return Err(self.error("expected 'from'"));
        };
        let Some((version_id, version_name)) = version else {
            return Err(self.error("expected 'version'"));
        };

        Ok(ModEntry {
            id,
            source,
            version_id,
            version_name,
            optional,
            side,
        })
    }

    fn parse_source(&mut self) -> ParseResult<DownloadSource> {
        let kind = self.keyword()?.to_lowercase();
        let source = match kind.as_str() {
            "curse" => {
                let slug = self.keyword_or_quoted()?;
                let file_name = match self.peek_keyword()? {
                    Some(keyword) if keyword.to_lowercase() == "filename" => {
                        self.tokens.next()?;
                        Some(self.keyword_or_quoted()?)
                    }
                    _ => None,
                };
                DownloadSource::Curse(CurseSource { slug, file_name })
            }
            "url" => DownloadSource::Url(UrlSource::new(self.keyword_or_quoted()?)),
            "optifine" => DownloadSource::Optifine(OptifineSource),
            "drive" => DownloadSource::Drive(DriveSource::new(self.keyword_or_quoted()?)),
            "zip" => {
                self.expect_keyword("from")?;
                let inner = self.parse_source()?;
                let path_in_zip = match self.peek_keyword()? {
                    Some(keyword) if keyword.to_lowercase() == "of" => {
                        self.tokens.next()?;
                        self.keyword_or_quoted()?
                    }
                    _ => String::new(),
                };
                self.expect_keyword("into")?;
                let dest_path = self.keyword_or_quoted()?;
                DownloadSource::Zip(ZipSource::new(inner, path_in_zip, dest_path))
            }
            _ => return Err(self.error(format!("unexpected mod source kind: '{kind}'"))),
        };
        Ok(source)
    }
}

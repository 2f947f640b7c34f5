/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive-descent parser building a setting tree from text.
//!
//! ```text
//! document   := item*
//! item       := assignment | '@' 'include' string ';'?
//! assignment := name ('=' | ':') value (';' | ',')?
//! value      := scalar | '{' item* '}' | '[' scalars? ']' | '(' values? ')'
//! ```

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::Options;
use crate::resolver::IncludeResolver;
use crate::tree::{NodeId, Tree};
use crate::value::{Format, Kind, Value};
use hconf_source_map::{FileId, Range, SourceContext, SourceInfo};
use std::path::{Path, PathBuf};

/// Maximum nesting depth for `@include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Maximum nesting depth of groups, arrays and lists, counted across
/// included files.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Document state the parser needs besides the tree it builds.
pub(crate) struct ParseContext<'r> {
    pub resolver: &'r dyn IncludeResolver,
    pub include_dir: Option<&'r Path>,
    pub options: Options,
    /// Format given to decimal integer literals
    pub default_format: Format,
    pub sources: &'r mut SourceContext,
    /// Files currently being read, outermost first
    pub stack: Vec<PathBuf>,
    /// Include nesting
    pub depth: usize,
    /// Aggregate nesting
    pub nesting: usize,
}

/// Parse `text` into the root group of `tree`.
///
/// `text` must already be registered in `ctx.sources` under `file_id`.
pub(crate) fn parse_document(
    tree: &mut Tree,
    text: &str,
    file: &str,
    file_id: FileId,
    ctx: &mut ParseContext<'_>,
) -> Result<()> {
    tracing::debug!(file, bytes = text.len(), "parsing document");
    let root = tree.root();
    let mut parser = Parser::new(Lexer::new(text, file, file_id), tree, ctx)?;
    parser.parse_items(root, &TokenKind::Eof)?;
    tracing::debug!(file, settings = parser.tree.live_count(), "parsed document");
    Ok(())
}

struct Parser<'s, 'a, 'r> {
    lexer: Lexer<'s>,
    lookahead: Token,
    tree: &'a mut Tree,
    ctx: &'a mut ParseContext<'r>,
}

impl<'s, 'a, 'r> Parser<'s, 'a, 'r> {
    fn new(mut lexer: Lexer<'s>, tree: &'a mut Tree, ctx: &'a mut ParseContext<'r>) -> Result<Self> {
        let lookahead = lexer.next_token()?;
        Ok(Parser {
            lexer,
            lookahead,
            tree,
            ctx,
        })
    }

    fn bump(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn error_at(&self, range: Range, message: impl Into<String>) -> Error {
        Error::Parse {
            file: self.lexer.file().to_string(),
            line: range.start.row + 1,
            message: message.into(),
            location: Some(SourceInfo::new(self.lexer.file_id(), range)),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_at(
            self.lookahead.range,
            format!("expected {}, found {}", expected, self.lookahead.kind.describe()),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.lookahead.kind == kind {
            self.bump()
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parse assignments and includes into `group` until `end` is next.
    fn parse_items(&mut self, group: NodeId, end: &TokenKind) -> Result<()> {
        loop {
            if &self.lookahead.kind == end {
                return Ok(());
            }
            match self.lookahead.kind {
                TokenKind::At => self.parse_include(group)?,
                TokenKind::Name(_) | TokenKind::Bool(_) => self.parse_assignment(group)?,
                TokenKind::Eof => return Err(self.unexpected("'}'")),
                _ => return Err(self.unexpected("setting name")),
            }
        }
    }

    fn parse_assignment(&mut self, group: NodeId) -> Result<()> {
        let name_token = self.bump()?;
        let name = self.lexer.text(&name_token.range);

        let assign = match self.lookahead.kind {
            TokenKind::Equals => '=',
            TokenKind::Colon => ':',
            _ => return Err(self.unexpected("'=' or ':'")),
        };
        let assign_token = self.bump()?;

        if self.ctx.options.contains(Options::STRICT_ASSIGNMENT) {
            let is_group = self.lookahead.kind == TokenKind::LeftBrace;
            let required = self.ctx.options.assignment_char(is_group);
            if assign != required {
                return Err(self.error_at(
                    assign_token.range,
                    format!("expected '{}' after `{}`", required, name),
                ));
            }
        }

        self.parse_value(group, Some(name), name_token.range)?;

        if matches!(self.lookahead.kind, TokenKind::Semicolon | TokenKind::Comma) {
            self.bump()?;
        }
        Ok(())
    }

    /// Create a child of `parent`, mapping tree errors to parse errors at `at`.
    fn add_node(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        kind: Kind,
        format: Format,
        at: Range,
    ) -> Result<NodeId> {
        let overrides = self.ctx.options.contains(Options::ALLOW_OVERRIDES);
        let id = match self.tree.add(parent, name, kind, format, overrides) {
            Ok(id) => id,
            Err(Error::NameConflict { name, .. }) => {
                return Err(self.error_at(at, format!("duplicate setting name `{}`", name)));
            }
            Err(Error::ArrayKindConflict {
                expected, actual, ..
            }) => {
                let expected = expected.map_or("scalar".to_string(), |k| k.to_string());
                return Err(self.error_at(
                    at,
                    format!(
                        "mismatched element type in array: expected {}, found {}",
                        expected, actual
                    ),
                ));
            }
            Err(Error::InvalidName { name }) => {
                return Err(self.error_at(at, format!("invalid setting name `{}`", name)));
            }
            Err(e) => return Err(e),
        };
        self.tree.get_mut(id)?.source = Some(SourceInfo::new(self.lexer.file_id(), at));
        Ok(id)
    }

    /// The scalar the lookahead token denotes, if any.
    fn scalar(&self) -> Option<(Value, Format)> {
        let default_format = self.ctx.default_format;
        Some(match &self.lookahead.kind {
            TokenKind::Int(v, Format::Decimal) => (Value::Int(*v), default_format),
            TokenKind::Int(v, format) => (Value::Int(*v), *format),
            TokenKind::Int64(v, Format::Decimal) => (Value::Int64(*v), default_format),
            TokenKind::Int64(v, format) => (Value::Int64(*v), *format),
            TokenKind::Float(v) => (Value::Float(*v), Format::Decimal),
            TokenKind::Str(s) => (Value::String(s.clone()), Format::Decimal),
            TokenKind::Bool(b) => (Value::Bool(*b), Format::Decimal),
            _ => return None,
        })
    }

    fn parse_scalar(&mut self, parent: NodeId, name: Option<&str>, at: Option<Range>) -> Result<NodeId> {
        let Some((value, format)) = self.scalar() else {
            return Err(self.unexpected("value"));
        };
        let at = at.unwrap_or(self.lookahead.range);
        let id = self.add_node(parent, name, value.kind(), format, at)?;
        self.tree.set_value(id, value)?;
        self.bump()?;
        Ok(id)
    }

    /// Parse one value as a child of `parent`.
    ///
    /// `name_range` locates the member name for named settings; elements are
    /// located at their own first token.
    fn parse_value(&mut self, parent: NodeId, name: Option<&str>, name_range: Range) -> Result<NodeId> {
        let at = if name.is_some() {
            name_range
        } else {
            self.lookahead.range
        };

        match self.lookahead.kind {
            TokenKind::LeftBrace | TokenKind::LeftBracket | TokenKind::LeftParen => {
                if self.ctx.nesting >= MAX_NESTING_DEPTH {
                    return Err(self.error_at(
                        self.lookahead.range,
                        format!("settings nested more than {} levels deep", MAX_NESTING_DEPTH),
                    ));
                }
                self.ctx.nesting += 1;
                let result = self.parse_aggregate(parent, name, at);
                self.ctx.nesting -= 1;
                result
            }
            _ => self.parse_scalar(parent, name, Some(at)),
        }
    }

    fn parse_aggregate(&mut self, parent: NodeId, name: Option<&str>, at: Range) -> Result<NodeId> {
        match self.lookahead.kind {
            TokenKind::LeftBrace => {
                let id = self.add_node(parent, name, Kind::Group, Format::Decimal, at)?;
                self.bump()?;
                self.parse_items(id, &TokenKind::RightBrace)?;
                self.expect(TokenKind::RightBrace, "'}'")?;
                Ok(id)
            }
            TokenKind::LeftBracket => {
                let id = self.add_node(parent, name, Kind::Array, Format::Decimal, at)?;
                self.bump()?;
                if self.lookahead.kind != TokenKind::RightBracket {
                    loop {
                        if self.scalar().is_none() {
                            return Err(self.unexpected("scalar value in array"));
                        }
                        self.parse_scalar(id, None, None)?;
                        if self.lookahead.kind != TokenKind::Comma {
                            break;
                        }
                        self.bump()?;
                    }
                }
                self.expect(TokenKind::RightBracket, "',' or ']'")?;
                Ok(id)
            }
            TokenKind::LeftParen => {
                let id = self.add_node(parent, name, Kind::List, Format::Decimal, at)?;
                self.bump()?;
                if self.lookahead.kind != TokenKind::RightParen {
                    loop {
                        let range = self.lookahead.range;
                        self.parse_value(id, None, range)?;
                        if self.lookahead.kind != TokenKind::Comma {
                            break;
                        }
                        self.bump()?;
                    }
                }
                self.expect(TokenKind::RightParen, "',' or ')'")?;
                Ok(id)
            }
            _ => Err(self.unexpected("'{', '[' or '('")),
        }
    }

    fn parse_include(&mut self, group: NodeId) -> Result<()> {
        let at = self.bump()?;
        if !matches!(&self.lookahead.kind, TokenKind::Name(word) if word == "include") {
            return Err(self.unexpected("`include` after '@'"));
        }
        self.bump()?;
        let TokenKind::Str(name) = self.lookahead.kind.clone() else {
            return Err(self.unexpected("file name string"));
        };
        let name_token = self.bump()?;
        let range = Range {
            start: at.range.start,
            end: name_token.range.end,
        };

        if self.ctx.depth >= MAX_INCLUDE_DEPTH {
            return Err(self.error_at(
                range,
                format!("include nesting too deep while including `{}`", name),
            ));
        }

        let source = self
            .ctx
            .resolver
            .load(&name, self.ctx.include_dir)
            .map_err(|e| self.error_at(range, format!("cannot open include file `{}`: {}", name, e)))?;

        if self.ctx.stack.contains(&source.path) {
            return Err(self.error_at(
                range,
                format!("include cycle: `{}` is already being read", name),
            ));
        }

        tracing::debug!(
            name = %name,
            path = %source.path.display(),
            depth = self.ctx.depth + 1,
            "resolving include"
        );

        let display = source.path.display().to_string();
        let file_id = self
            .ctx
            .sources
            .add_file(display.clone(), Some(source.content.clone()));

        self.ctx.stack.push(source.path.clone());
        self.ctx.depth += 1;
        let result = Parser::new(
            Lexer::new(&source.content, display, file_id),
            &mut *self.tree,
            &mut *self.ctx,
        )
        .and_then(|mut nested| nested.parse_items(group, &TokenKind::Eof));
        self.ctx.depth -= 1;
        self.ctx.stack.pop();
        result?;

        if self.lookahead.kind == TokenKind::Semicolon {
            self.bump()?;
        }
        Ok(())
    }
}

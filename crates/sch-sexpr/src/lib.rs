//! A span-tracking S-expression parser built for surgical text edits.
//!
//! Every node carries the exact `[start, end)` byte range it occupies in the
//! original buffer, so callers can locate an atom or list and patch just those
//! bytes. There is deliberately no tree serializer: bytes that no edit touches
//! are reproduced from the source buffer, never re-encoded, which is what
//! keeps round-trips byte-identical for constructs the tree does not model.
//!
//! - [`parse`] - build a span-annotated tree from source text
//! - [`Sexpr::walk`] / [`Sexpr::walk_strings`] - depth-first traversal with
//!   ancestor context
//! - [`PatchSet`] - queue byte-range replacements and splice them on apply
//! - [`Value`] - render replacement scalars in the target lexical conventions

pub mod patch;
pub mod value;

pub use patch::{Patch, PatchError, PatchSet};
pub use value::Value;

use thiserror::Error;

/// Context provided while walking the S-expression tree.
#[derive(Debug, Clone)]
pub struct WalkCtx<'a> {
    /// Ancestors from root to parent of the current node (root first).
    pub ancestors: &'a [&'a Sexpr],
    /// Index of this node in its parent list, if it has a parent.
    pub index_in_parent: Option<usize>,
}

impl<'a> WalkCtx<'a> {
    /// Get the parent node (last ancestor).
    pub fn parent(&self) -> Option<&'a Sexpr> {
        self.ancestors.last().copied()
    }

    /// Get the grandparent node (second-to-last ancestor).
    pub fn grandparent(&self) -> Option<&'a Sexpr> {
        if self.ancestors.len() >= 2 {
            Some(self.ancestors[self.ancestors.len() - 2])
        } else {
            None
        }
    }

    /// Check if parent list has the given tag (first element symbol).
    pub fn parent_tag(&self) -> Option<&'a str> {
        self.parent()?.head()
    }

    /// Check if grandparent list has the given tag.
    pub fn grandparent_tag(&self) -> Option<&'a str> {
        self.grandparent()?.head()
    }
}

/// Byte span in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The kind of S-expression value.
///
/// Unquoted atoms are stored as their exact source lexeme; whether one reads
/// as a number is up to the consumer (see [`Sexpr::as_int`] / [`Sexpr::as_f64`]).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SexprKind {
    /// A symbol - unquoted atom, kept verbatim
    Symbol(String),
    /// A string - quoted text, stored in decoded form
    String(String),
    /// A list of S-expressions
    List(Vec<Sexpr>),
}

/// An S-expression value with source span.
///
/// For lists the span runs from the opening `(` to one past the matching `)`.
/// For atoms it covers the token's exact bytes, including the quotes of a
/// quoted string.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sexpr {
    /// The kind of S-expression
    pub kind: SexprKind,
    /// Source span (byte offsets)
    pub span: Span,
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        // Compare only the kind, not the span
        self.kind == other.kind
    }
}

impl Sexpr {
    fn with_span(kind: SexprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Check if this is a list
    pub fn is_list(&self) -> bool {
        matches!(self.kind, SexprKind::List(_))
    }

    /// Get the symbol name if this is a symbol
    pub fn as_sym(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get the string content if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read an unquoted atom as an integer, if its lexeme parses as one
    pub fn as_int(&self) -> Option<i64> {
        self.as_sym()?.parse().ok()
    }

    /// Read an unquoted atom as a float, if its lexeme parses as one
    pub fn as_f64(&self) -> Option<f64> {
        self.as_sym()?.parse().ok()
    }

    /// Get the list items if this is a list
    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match &self.kind {
            SexprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the head symbol of a list (its first element)
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// Find the first child list with the given head
    pub fn find_list(&self, name: &str) -> Option<&Sexpr> {
        self.as_list()?
            .iter()
            .find(|item| item.head() == Some(name))
    }

    /// Find all child lists with the given head, in source order
    pub fn find_all_lists(&self, name: &str) -> Vec<&Sexpr> {
        match self.as_list() {
            Some(items) => items.iter().filter(|item| item.head() == Some(name)).collect(),
            None => Vec::new(),
        }
    }

    /// Depth-first traversal of the tree, visiting every node once.
    ///
    /// The callback receives each node along with a [`WalkCtx`] containing
    /// the ancestor stack and index within its parent list.
    ///
    /// # Example
    ///
    /// ```
    /// use sch_sexpr::{parse, SexprKind};
    ///
    /// let sexpr = parse("(a (b c) d)").unwrap();
    /// let mut symbols = Vec::new();
    /// sexpr.walk(|node, _ctx| {
    ///     if let SexprKind::Symbol(s) = &node.kind {
    ///         symbols.push(s.clone());
    ///     }
    /// });
    /// assert_eq!(symbols, vec!["a", "b", "c", "d"]);
    /// ```
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&Sexpr, WalkCtx<'_>),
    {
        fn walk_recursive<'a, F>(
            node: &'a Sexpr,
            stack: &mut Vec<&'a Sexpr>,
            f: &mut F,
            index_in_parent: Option<usize>,
        ) where
            F: FnMut(&Sexpr, WalkCtx<'_>),
        {
            let ctx = WalkCtx {
                ancestors: stack,
                index_in_parent,
            };
            f(node, ctx);

            if let Some(children) = node.as_list() {
                stack.push(node);
                for (i, child) in children.iter().enumerate() {
                    walk_recursive(child, stack, f, Some(i));
                }
                stack.pop();
            }
        }

        let mut stack = Vec::new();
        walk_recursive(self, &mut stack, &mut f, None);
    }

    /// Walk all string literals in the tree.
    ///
    /// Convenience method that visits only [`SexprKind::String`] nodes,
    /// providing the decoded value, source span, and walk context.
    ///
    /// # Example
    ///
    /// ```
    /// use sch_sexpr::parse;
    ///
    /// let sexpr = parse(r#"(net 1 "VCC")"#).unwrap();
    /// sexpr.walk_strings(|value, span, ctx| {
    ///     assert_eq!(value, "VCC");
    ///     assert_eq!(ctx.index_in_parent, Some(2));
    /// });
    /// ```
    pub fn walk_strings<F>(&self, mut f: F)
    where
        F: FnMut(&str, Span, WalkCtx<'_>),
    {
        self.walk(|node, ctx| {
            if let SexprKind::String(ref s) = node.kind {
                f(s, node.span, ctx);
            }
        });
    }
}

/// Errors that can occur during parsing.
///
/// Each variant carries the byte offset it was detected at. A failed parse
/// never yields a partial tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// EOF inside a quoted string; offset is the opening quote
    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),
    /// EOF with an unclosed list; offset is the unmatched `(`
    #[error("unmatched '(' at byte {0}")]
    UnmatchedOpen(usize),
    /// A `)` with no list open
    #[error("unmatched ')' at byte {0}")]
    UnmatchedClose(usize),
    /// Input is not valid UTF-8; offset is the first invalid byte
    #[error("invalid UTF-8 at byte {0}")]
    InvalidUtf8(usize),
    /// Non-trivia bytes remain after the root expression
    #[error("unexpected trailing content at byte {0}")]
    TrailingContent(usize),
    /// Input contains no expression at all
    #[error("empty input")]
    EmptyInput,
}

impl ParseError {
    /// The byte offset the error was detected at, when one applies.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnterminatedString(at)
            | Self::UnmatchedOpen(at)
            | Self::UnmatchedClose(at)
            | Self::InvalidUtf8(at)
            | Self::TrailingContent(at) => Some(*at),
            Self::EmptyInput => None,
        }
    }
}

/// Parser for S-expressions
pub struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            chars: input.char_indices().peekable(),
            current_pos: 0,
        }
    }

    /// Parse a single expression and require only trivia after it.
    pub fn parse(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_trivia();
        let expr = match self.peek_char() {
            None => return Err(ParseError::EmptyInput),
            Some(')') => return Err(ParseError::UnmatchedClose(self.current_pos)),
            Some('(') => self.parse_list()?,
            Some('"') => self.parse_string()?,
            Some(_) => self.parse_symbol()?,
        };
        self.skip_trivia();
        match self.peek_char() {
            None => Ok(expr),
            Some(')') => Err(ParseError::UnmatchedClose(self.current_pos)),
            Some(_) => Err(ParseError::TrailingContent(self.current_pos)),
        }
    }

    fn parse_list(&mut self) -> Result<Sexpr, ParseError> {
        let start_pos = self.current_pos;
        self.advance(); // consume '('
        let mut items = Vec::new();

        loop {
            self.skip_trivia();

            match self.peek_char() {
                None => return Err(ParseError::UnmatchedOpen(start_pos)),
                Some(')') => {
                    self.advance();
                    break;
                }
                Some('(') => items.push(self.parse_list()?),
                Some('"') => items.push(self.parse_string()?),
                Some(_) => items.push(self.parse_symbol()?),
            }
        }

        let end_pos = self.current_pos;
        Ok(Sexpr::with_span(
            SexprKind::List(items),
            Span::new(start_pos, end_pos),
        ))
    }

    fn parse_symbol(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.current_pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | ';') {
                break;
            }
            self.advance();
        }

        let end = self.current_pos;
        Ok(Sexpr::with_span(
            SexprKind::Symbol(self.input[start..end].to_string()),
            Span::new(start, end),
        ))
    }

    fn parse_string(&mut self) -> Result<Sexpr, ParseError> {
        let start_pos = self.current_pos;
        self.advance(); // consume opening '"'
        let mut result = String::new();

        loop {
            match self.peek_char() {
                None => return Err(ParseError::UnterminatedString(start_pos)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => {
                            result.push('\n');
                            self.advance();
                        }
                        Some('r') => {
                            result.push('\r');
                            self.advance();
                        }
                        Some('t') => {
                            result.push('\t');
                            self.advance();
                        }
                        Some('\\') => {
                            result.push('\\');
                            self.advance();
                        }
                        Some('"') => {
                            result.push('"');
                            self.advance();
                        }
                        Some(ch) => {
                            // Unknown escape: both bytes pass through literally
                            result.push('\\');
                            result.push(ch);
                            self.advance();
                        }
                        None => return Err(ParseError::UnterminatedString(start_pos)),
                    }
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        let end_pos = self.current_pos;
        Ok(Sexpr::with_span(
            SexprKind::String(result),
            Span::new(start_pos, end_pos),
        ))
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                // Line comment: skip until end of line
                self.advance();
                while let Some(ch) = self.peek_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos + ch.len_utf8();
        }
    }
}

/// Parse a string into a span-annotated S-expression.
///
/// The input must hold exactly one expression; trailing whitespace and
/// comments are allowed. A trailing `)` is [`ParseError::UnmatchedClose`],
/// anything else after the expression is [`ParseError::TrailingContent`].
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("parsing S-expression from {} bytes of input", input.len());
    let result = Parser::new(input).parse();
    if let Err(e) = &result {
        log::trace!("failed to parse S-expression: {e}");
    }
    result
}

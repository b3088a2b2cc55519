//! The parser adapter: a hand-written recursive-descent parser for the
//! hybrid HTML/Mustache grammar.
//!
//! Every parsed node gets a [`Span`]; constructs that are present in the
//! tree but occupy no text (an empty block body, an empty hash) get
//! zero-width spans so the reprinter can still derive region boundaries
//! from child locations. The parser also caches the two boundaries the
//! reprinter cannot recover from child spans alone: the end of an
//! element's open tag and the start of its close tag, and the span of an
//! `as |...|` clause.
//!
//! The core never re-tokenizes: everything downstream of this module
//! addresses text purely through spans.

pub mod errors;

use std::collections::HashMap;

use crate::ast::{
    Attr, Block, BooleanLiteral, Comment, Concat, Element, Hash, HashPair, Mustache, Node, NodeId,
    NumberLiteral, PathExpression, Program, StringLiteral, SubExpression, Template, Text,
};
use crate::source::{Position, Span};

pub use errors::{ParseError, ParseErrorKind};

/// Tags that never take children or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Open/close tag boundaries of an element, cached at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ElementBounds {
    /// Position just past the `>` (or `/>`) of the open tag.
    pub open_end: Position,
    /// Position of the `<` of the close tag; absent for self-closing and
    /// void elements.
    pub close_start: Option<Position>,
}

/// Everything the tracked-tree layer needs to take ownership of a parse.
#[derive(Debug)]
pub(crate) struct ParseOutput {
    pub nodes: Vec<Node>,
    pub spans: Vec<Option<Span>>,
    pub root: NodeId,
    pub element_bounds: HashMap<NodeId, ElementBounds>,
    pub block_param_spans: HashMap<NodeId, Span>,
}

/// Parse `source` into a located tree.
pub(crate) fn preprocess(source: &str) -> Result<ParseOutput, ParseError> {
    let mut parser = Parser::new(source);
    let root = parser.parse_template()?;
    Ok(ParseOutput {
        nodes: parser.nodes,
        spans: parser.spans,
        root,
        element_bounds: parser.element_bounds,
        block_param_spans: parser.block_param_spans,
    })
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Current line number (1-indexed).
    line: usize,
    /// Byte offset of the start of the current line.
    line_start: usize,
    nodes: Vec<Node>,
    spans: Vec<Option<Span>>,
    element_bounds: HashMap<NodeId, ElementBounds>,
    block_param_spans: HashMap<NodeId, Span>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
            nodes: Vec::new(),
            spans: Vec::new(),
            element_bounds: HashMap::new(),
            block_param_spans: HashMap::new(),
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.pos - self.line_start)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let at = self.position();
        ParseError {
            line: at.line,
            column: at.column,
            kind,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advance past one character, keeping line accounting straight.
    fn advance_char(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos + c.len_utf8();
        }
        self.pos += c.len_utf8();
    }

    /// Advance `len` bytes, walking characters so newlines are counted.
    fn advance_bytes(&mut self, len: usize) {
        let target = self.pos + len;
        while self.pos < target {
            let c = self.rest().chars().next().expect("advance past end");
            self.advance_char(c);
        }
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.peek(s) {
            self.advance_bytes(s.len());
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str, expected: &'static str) -> Result<(), ParseError> {
        if self.consume(s) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::Expected { expected }))
        }
    }

    fn consume_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_whitespace() {
                self.advance_char(c);
            } else {
                break;
            }
        }
    }

    /// Consume characters up to (not including) `token`. `None` at EOF.
    fn scan_until(&mut self, token: &str) -> Option<String> {
        let start = self.pos;
        while !self.eof() {
            if self.peek(token) {
                return Some(self.input[start..self.pos].to_string());
            }
            let c = self.rest().chars().next().expect("scan past end");
            self.advance_char(c);
        }
        None
    }

    fn push(&mut self, node: Node, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.spans.push(Some(span));
        id
    }

    fn node_span(&self, id: NodeId) -> Span {
        self.spans[id.index()].expect("parsed node without span")
    }

    // ---- grammar ----------------------------------------------------------

    fn parse_template(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let body = self.parse_body()?;
        if !self.eof() {
            let found = if self.peek("</") {
                "</"
            } else if self.peek("{{/") {
                "{{/"
            } else {
                "{{else"
            };
            return Err(self.error(ParseErrorKind::UnexpectedCloser {
                found: found.to_string(),
            }));
        }
        let span = Span::new(start, self.position());
        Ok(self.push(Node::Template(Template { body }), span))
    }

    /// Statements until EOF, a closing tag, a block close, or an `{{else`.
    fn parse_body(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut body = Vec::new();
        while !self.at_body_end() {
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn at_body_end(&self) -> bool {
        self.eof() || self.peek("</") || self.peek("{{/") || self.peek_else()
    }

    /// `{{else` followed by whitespace or `}}`, but not `{{elsewhere}}`.
    fn peek_else(&self) -> bool {
        let rest = self.rest();
        match rest.strip_prefix("{{else") {
            Some(after) => matches!(after.chars().next(), Some(c) if c.is_ascii_whitespace() || c == '}'),
            None => false,
        }
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        if self.peek("{{!") {
            return self.parse_mustache_comment();
        }
        if self.peek("{{#") {
            return self.parse_block();
        }
        if self.peek("{{") {
            return self.parse_mustache();
        }
        if self.peek("<!--") {
            return self.parse_html_comment();
        }
        if self.at_element_start() {
            return self.parse_element();
        }
        Ok(self.parse_text())
    }

    fn at_element_start(&self) -> bool {
        let rest = self.rest();
        rest.starts_with('<')
            && matches!(rest[1..].chars().next(), Some(c) if c.is_ascii_alphabetic())
    }

    fn parse_text(&mut self) -> NodeId {
        let start = self.position();
        let start_byte = self.pos;
        while !self.eof() {
            if self.peek("{{") || self.peek("<!--") || self.at_element_start() || self.peek("</") {
                break;
            }
            let c = self.rest().chars().next().expect("text scan past end");
            self.advance_char(c);
        }
        let chars = self.input[start_byte..self.pos].to_string();
        let span = Span::new(start, self.position());
        self.push(Node::Text(Text { chars }), span)
    }

    fn parse_mustache_comment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let close = if self.consume("{{!--") {
            "--}}"
        } else {
            self.expect("{{!", "a mustache comment")?;
            "}}"
        };
        let value = self
            .scan_until(close)
            .ok_or_else(|| self.error(ParseErrorKind::UnclosedComment))?;
        self.advance_bytes(close.len());
        let span = Span::new(start, self.position());
        Ok(self.push(Node::MustacheComment(Comment { value }), span))
    }

    fn parse_html_comment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        self.expect("<!--", "an HTML comment")?;
        let value = self
            .scan_until("-->")
            .ok_or_else(|| self.error(ParseErrorKind::UnclosedComment))?;
        self.advance_bytes(3);
        let span = Span::new(start, self.position());
        Ok(self.push(Node::HtmlComment(Comment { value }), span))
    }

    fn parse_mustache(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let trusting = self.peek("{{{");
        let close = if trusting { "}}}" } else { "}}" };
        self.advance_bytes(if trusting { 3 } else { 2 });
        self.consume_ws();
        let path = self.parse_expression()?;
        let (params, hash) = self.parse_call_tail(close, false)?;
        self.expect(close, "a closing mustache")?;
        let span = Span::new(start, self.position());
        Ok(self.push(
            Node::Mustache(Mustache {
                path,
                params,
                hash,
                trusting,
            }),
            span,
        ))
    }

    /// Params and hash pairs up to `close` (or an `as |...|` clause when
    /// `block` is set, which the caller owns).
    fn parse_call_tail(
        &mut self,
        close: &str,
        block: bool,
    ) -> Result<(Vec<NodeId>, NodeId), ParseError> {
        let mut params = Vec::new();
        let mut pairs: Vec<NodeId> = Vec::new();
        loop {
            self.consume_ws();
            if self.eof() {
                return Err(self.error(ParseErrorKind::UnclosedMustache));
            }
            if self.peek(close) {
                break;
            }
            if block && self.peek_block_params() {
                break;
            }
            if self.peek_hash_pair() {
                pairs.push(self.parse_hash_pair()?);
            } else if pairs.is_empty() {
                params.push(self.parse_expression()?);
            } else {
                return Err(self.error(ParseErrorKind::Expected {
                    expected: "a hash pair",
                }));
            }
        }
        let hash_span = if pairs.is_empty() {
            Span::collapsed(self.position())
        } else {
            Span::new(
                self.node_span(pairs[0]).start,
                self.node_span(pairs[pairs.len() - 1]).end,
            )
        };
        let hash = self.push(Node::Hash(Hash { pairs }), hash_span);
        Ok((params, hash))
    }

    /// An identifier directly followed by `=` starts a hash pair.
    fn peek_hash_pair(&self) -> bool {
        let rest = self.rest();
        let key_len = rest
            .char_indices()
            .take_while(|&(_, c)| is_ident_char(c))
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        key_len > 0 && rest[key_len..].starts_with('=')
    }

    fn parse_hash_pair(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let key = self.parse_ident("a hash key")?;
        self.expect("=", "'=' after hash key")?;
        let value = self.parse_expression()?;
        let span = Span::new(start, self.position());
        Ok(self.push(Node::HashPair(HashPair { key, value }), span))
    }

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_char() {
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
            Some('(') => self.parse_sub_expression(),
            Some('"') | Some('\'') => self.parse_string_literal(),
            Some(c) if c.is_ascii_digit() => self.parse_number_literal(),
            Some('-') if matches!(self.rest()[1..].chars().next(), Some(d) if d.is_ascii_digit()) =>
            {
                self.parse_number_literal()
            }
            Some(_) => self.parse_keyword_or_path(),
        }
    }

    fn parse_sub_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        self.expect("(", "a sub-expression")?;
        self.consume_ws();
        let path = self.parse_expression()?;
        let (params, hash) = self.parse_call_tail(")", false)?;
        self.expect(")", "a closing ')'")?;
        let span = Span::new(start, self.position());
        Ok(self.push(
            Node::SubExpression(SubExpression { path, params, hash }),
            span,
        ))
    }

    fn parse_string_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let quote = self.peek_char().expect("caller checked quote");
        self.advance_char(quote);
        let mut value = String::new();
        loop {
            let c = match self.peek_char() {
                Some(c) => c,
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
            };
            self.advance_char(c);
            if c == quote {
                break;
            }
            if c == '\\' {
                let escaped = match self.peek_char() {
                    Some(e) => e,
                    None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                };
                self.advance_char(escaped);
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\\' | '"' | '\'' => value.push(escaped),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(c);
            }
        }
        let span = Span::new(start, self.position());
        Ok(self.push(Node::StringLiteral(StringLiteral { value }), span))
    }

    fn parse_number_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let start_byte = self.pos;
        if self.peek("-") {
            self.advance_bytes(1);
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.advance_bytes(1);
        }
        if self.peek(".") {
            self.advance_bytes(1);
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.advance_bytes(1);
            }
        }
        let raw = &self.input[start_byte..self.pos];
        let value = raw
            .parse::<f64>()
            .map_err(|_| self.error(ParseErrorKind::InvalidNumber { raw: raw.to_string() }))?;
        let span = Span::new(start, self.position());
        Ok(self.push(Node::NumberLiteral(NumberLiteral { value }), span))
    }

    fn parse_keyword_or_path(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let start_byte = self.pos;
        while matches!(self.peek_char(), Some(c) if is_path_char(c)) {
            let c = self.peek_char().expect("checked above");
            self.advance_char(c);
        }
        let token = &self.input[start_byte..self.pos];
        if token.is_empty() {
            return Err(self.error(ParseErrorKind::Expected {
                expected: "an expression",
            }));
        }
        let span = Span::new(start, self.position());
        let node = match token {
            "true" => Node::BooleanLiteral(BooleanLiteral { value: true }),
            "false" => Node::BooleanLiteral(BooleanLiteral { value: false }),
            "null" => Node::Null,
            "undefined" => Node::Undefined,
            _ => Node::Path(PathExpression {
                original: token.to_string(),
                parts: token.split('.').map(str::to_string).collect(),
            }),
        };
        Ok(self.push(node, span))
    }

    fn parse_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        let start_byte = self.pos;
        while matches!(self.peek_char(), Some(c) if is_ident_char(c)) {
            let c = self.peek_char().expect("checked above");
            self.advance_char(c);
        }
        if self.pos == start_byte {
            return Err(self.error(ParseErrorKind::Expected { expected }));
        }
        Ok(self.input[start_byte..self.pos].to_string())
    }

    // ---- blocks -----------------------------------------------------------

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        self.expect("{{#", "a block opening")?;
        self.consume_ws();
        let path = self.parse_keyword_or_path()?;
        let open_original = self.path_original(path);
        let (params, hash) = self.parse_call_tail("}}", true)?;
        let block_params = self.parse_block_params_opt()?;
        self.consume_ws();
        self.expect("}}", "a closing mustache")?;

        let program = self.parse_program()?;
        let inverse = self.parse_inverse()?;

        self.parse_block_close(&open_original)?;
        let span = Span::new(start, self.position());
        let id = self.push(
            Node::Block(Block {
                path,
                params,
                hash,
                program,
                inverse,
                block_params: block_params.clone().map(|(names, _)| names).unwrap_or_default(),
                chained: false,
            }),
            span,
        );
        if let Some((_, bp_span)) = block_params {
            self.block_param_spans.insert(id, bp_span);
        }
        Ok(id)
    }

    fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let body = self.parse_body()?;
        let span = Span::new(start, self.position());
        Ok(self.push(Node::Program(Program { body }), span))
    }

    /// `{{else}}` or a chained `{{else helper ...}}` continuation.
    fn parse_inverse(&mut self) -> Result<Option<NodeId>, ParseError> {
        if !self.peek_else() {
            return Ok(None);
        }
        let else_start = self.position();
        self.expect("{{else", "'{{else'")?;
        self.consume_ws();
        if self.consume("}}") {
            let program = self.parse_program()?;
            return Ok(Some(program));
        }

        // A chained block: `{{else if cond}}...`. It owns everything up to
        // the outer close tag, which only the outermost block emits.
        let path = self.parse_keyword_or_path()?;
        let (params, hash) = self.parse_call_tail("}}", true)?;
        let block_params = self.parse_block_params_opt()?;
        self.consume_ws();
        self.expect("}}", "a closing mustache")?;
        let program = self.parse_program()?;
        let inverse = self.parse_inverse()?;
        let end = self.position();
        let nested = self.push(
            Node::Block(Block {
                path,
                params,
                hash,
                program,
                inverse,
                block_params: block_params.clone().map(|(names, _)| names).unwrap_or_default(),
                chained: true,
            }),
            Span::new(else_start, end),
        );
        if let Some((_, bp_span)) = block_params {
            self.block_param_spans.insert(nested, bp_span);
        }
        let wrapper = self.push(
            Node::Program(Program { body: vec![nested] }),
            Span::new(else_start, end),
        );
        Ok(Some(wrapper))
    }

    fn parse_block_close(&mut self, open_original: &str) -> Result<(), ParseError> {
        if !self.consume("{{/") {
            return Err(self.error(ParseErrorKind::Expected {
                expected: "a block close",
            }));
        }
        self.consume_ws();
        let start_byte = self.pos;
        while matches!(self.peek_char(), Some(c) if is_path_char(c)) {
            let c = self.peek_char().expect("checked above");
            self.advance_char(c);
        }
        let found = self.input[start_byte..self.pos].to_string();
        self.consume_ws();
        self.expect("}}", "a closing mustache")?;
        if found != open_original {
            return Err(self.error(ParseErrorKind::MismatchedBlockClose {
                expected: open_original.to_string(),
                found,
            }));
        }
        Ok(())
    }

    fn path_original(&self, id: NodeId) -> String {
        match &self.nodes[id.index()] {
            Node::Path(p) => p.original.clone(),
            other => other.kind_name().to_string(),
        }
    }

    /// `as` then whitespace-separated names between pipes.
    fn peek_block_params(&self) -> bool {
        let rest = self.rest();
        match rest.strip_prefix("as") {
            Some(after) => after.trim_start().starts_with('|'),
            None => false,
        }
    }

    fn parse_block_params_opt(&mut self) -> Result<Option<(Vec<String>, Span)>, ParseError> {
        self.consume_ws();
        if !self.peek_block_params() {
            return Ok(None);
        }
        let start = self.position();
        self.expect("as", "'as'")?;
        self.consume_ws();
        self.expect("|", "'|'")?;
        let mut names = Vec::new();
        loop {
            self.consume_ws();
            if self.consume("|") {
                break;
            }
            if self.eof() {
                return Err(self.error(ParseErrorKind::UnclosedBlockParams));
            }
            names.push(self.parse_ident("a block param name")?);
        }
        Ok(Some((names, Span::new(start, self.position()))))
    }

    // ---- elements ---------------------------------------------------------

    fn parse_element(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        self.expect("<", "'<'")?;
        let tag = self.parse_tag_name()?;
        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut comments = Vec::new();
        let mut block_params: Option<(Vec<String>, Span)> = None;
        let mut self_closing = false;
        loop {
            self.consume_ws();
            if self.eof() {
                return Err(self.error(ParseErrorKind::UnclosedTag { tag }));
            }
            if self.consume("/>") {
                self_closing = true;
                break;
            }
            if self.consume(">") {
                break;
            }
            if self.peek("{{!") {
                comments.push(self.parse_mustache_comment()?);
            } else if self.peek("{{") {
                modifiers.push(self.parse_mustache()?);
            } else if self.peek_block_params() {
                block_params = self.parse_block_params_opt()?;
            } else {
                attributes.push(self.parse_attribute(&tag)?);
            }
        }
        let open_end = self.position();

        let (children, close_start) = if self_closing || is_void_tag(&tag) {
            (Vec::new(), None)
        } else {
            let body = self.parse_body()?;
            let close_start = self.position();
            if !self.consume("</") {
                return Err(self.error(ParseErrorKind::UnclosedTag { tag }));
            }
            self.consume_ws();
            let close_tag = self.parse_tag_name()?;
            if close_tag != tag {
                return Err(self.error(ParseErrorKind::MismatchedClosingTag {
                    expected: tag,
                    found: close_tag,
                }));
            }
            self.consume_ws();
            self.expect(">", "'>'")?;
            (body, Some(close_start))
        };

        let span = Span::new(start, self.position());
        let id = self.push(
            Node::Element(Element {
                tag,
                attributes,
                modifiers,
                comments,
                children,
                block_params: block_params
                    .clone()
                    .map(|(names, _)| names)
                    .unwrap_or_default(),
                self_closing,
            }),
            span,
        );
        self.element_bounds.insert(
            id,
            ElementBounds {
                open_end,
                close_start,
            },
        );
        if let Some((_, bp_span)) = block_params {
            self.block_param_spans.insert(id, bp_span);
        }
        Ok(id)
    }

    fn parse_tag_name(&mut self) -> Result<String, ParseError> {
        let start_byte = self.pos;
        if !matches!(self.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
            return Err(self.error(ParseErrorKind::Expected {
                expected: "a tag name",
            }));
        }
        while matches!(self.peek_char(), Some(c) if is_tag_char(c)) {
            let c = self.peek_char().expect("checked above");
            self.advance_char(c);
        }
        Ok(self.input[start_byte..self.pos].to_string())
    }

    fn parse_attribute(&mut self, tag: &str) -> Result<NodeId, ParseError> {
        let start = self.position();
        let start_byte = self.pos;
        while matches!(self.peek_char(), Some(c) if is_attr_name_char(c)) {
            let c = self.peek_char().expect("checked above");
            self.advance_char(c);
        }
        if self.pos == start_byte {
            return Err(self.error(ParseErrorKind::UnclosedTag {
                tag: tag.to_string(),
            }));
        }
        let name = self.input[start_byte..self.pos].to_string();

        let value = if self.consume("=") {
            self.parse_attr_value()?
        } else {
            // A bare attribute still carries an (empty) text value so the
            // tree shape is uniform.
            let at = self.position();
            self.push(
                Node::Text(Text {
                    chars: String::new(),
                }),
                Span::collapsed(at),
            )
        };
        let span = Span::new(start, self.position());
        Ok(self.push(Node::Attr(Attr { name, value }), span))
    }

    fn parse_attr_value(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_char() {
            Some('"') | Some('\'') => self.parse_quoted_attr_value(),
            Some('{') if self.peek("{{") => self.parse_mustache(),
            Some(_) => self.parse_unquoted_attr_value(),
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
        }
    }

    /// A quoted value is a plain text node when it contains no mustaches;
    /// otherwise it is a concat whose span (and quotes) cover the whole
    /// quoted region.
    fn parse_quoted_attr_value(&mut self) -> Result<NodeId, ParseError> {
        let quote_start = self.position();
        let quote = self.peek_char().expect("caller checked quote");
        self.advance_char(quote);
        let quote_str = quote.to_string();

        let mut parts = Vec::new();
        let mut saw_mustache = false;
        loop {
            match self.peek_char() {
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                Some(c) if c == quote => break,
                Some('{') if self.peek("{{") => {
                    saw_mustache = true;
                    parts.push(self.parse_mustache()?);
                }
                Some(_) => {
                    let text_start = self.position();
                    let start_byte = self.pos;
                    while let Some(c) = self.peek_char() {
                        if c == quote || self.peek("{{") {
                            break;
                        }
                        self.advance_char(c);
                    }
                    let chars = self.input[start_byte..self.pos].to_string();
                    let span = Span::new(text_start, self.position());
                    parts.push(self.push(Node::Text(Text { chars }), span));
                }
            }
        }
        self.expect(&quote_str, "a closing quote")?;
        let quote_end = self.position();

        if !saw_mustache {
            if let [single] = parts[..] {
                return Ok(single);
            }
            if parts.is_empty() {
                // `a=""`: an empty text value positioned inside the quotes.
                let inside = Position::new(quote_end.line, quote_end.column - 1);
                return Ok(self.push(
                    Node::Text(Text {
                        chars: String::new(),
                    }),
                    Span::collapsed(inside),
                ));
            }
        }
        Ok(self.push(
            Node::Concat(Concat { parts }),
            Span::new(quote_start, quote_end),
        ))
    }

    fn parse_unquoted_attr_value(&mut self) -> Result<NodeId, ParseError> {
        let start = self.position();
        let start_byte = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_whitespace() || c == '>' {
                break;
            }
            if c == '/' && self.peek("/>") {
                break;
            }
            self.advance_char(c);
        }
        if self.pos == start_byte {
            return Err(self.error(ParseErrorKind::Expected {
                expected: "an attribute value",
            }));
        }
        let chars = self.input[start_byte..self.pos].to_string();
        let span = Span::new(start, self.position());
        Ok(self.push(Node::Text(Text { chars }), span))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '@' | '$')
}

fn is_path_char(c: char) -> bool {
    is_ident_char(c) || c == '.'
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '_')
}

fn is_attr_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.' | '@')
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceIndex;

    fn parse(source: &str) -> ParseOutput {
        preprocess(source).expect("parse failed")
    }

    fn node<'a>(output: &'a ParseOutput, id: NodeId) -> &'a Node {
        &output.nodes[id.index()]
    }

    fn find(output: &ParseOutput, pred: impl Fn(&Node) -> bool) -> NodeId {
        (0..output.nodes.len())
            .map(NodeId)
            .find(|id| pred(&output.nodes[id.index()]))
            .expect("no matching node")
    }

    #[test]
    fn template_span_covers_source() {
        let source = "hello {{name}}!";
        let output = parse(source);
        let index = SourceIndex::new(source);
        let span = output.spans[output.root.index()].unwrap();
        assert_eq!(index.slice(span), source);
    }

    #[test]
    fn mustache_shape_and_spans() {
        let source = "{{foo-bar baz=\"stuff\"}}";
        let output = parse(source);
        let index = SourceIndex::new(source);

        let mustache = find(&output, |n| matches!(n, Node::Mustache(_)));
        assert_eq!(index.slice(output.spans[mustache.index()].unwrap()), source);

        let pair = find(&output, |n| matches!(n, Node::HashPair(_)));
        assert_eq!(
            index.slice(output.spans[pair.index()].unwrap()),
            "baz=\"stuff\""
        );
    }

    #[test]
    fn empty_hash_gets_collapsed_span() {
        let output = parse("{{foo}}");
        let hash = find(&output, |n| matches!(n, Node::Hash(_)));
        assert!(output.spans[hash.index()].unwrap().is_empty());
    }

    #[test]
    fn trusting_mustache() {
        let output = parse("{{{raw}}}");
        let mustache = find(&output, |n| matches!(n, Node::Mustache(_)));
        match node(&output, mustache) {
            Node::Mustache(m) => assert!(m.trusting),
            _ => unreachable!(),
        }
    }

    #[test]
    fn element_with_attribute_and_bounds() {
        let source = "<div class=\"lol\">x</div>";
        let output = parse(source);
        let element = find(&output, |n| matches!(n, Node::Element(_)));
        let bounds = output.element_bounds[&element];
        assert_eq!(bounds.open_end, Position::new(1, 17));
        assert_eq!(bounds.close_start, Some(Position::new(1, 18)));

        let index = SourceIndex::new(source);
        let value = find(&output, |n| matches!(n, Node::Text(t) if t.chars == "lol"));
        assert_eq!(index.slice(output.spans[value.index()].unwrap()), "lol");
    }

    #[test]
    fn self_closing_element_has_no_close_bound() {
        let output = parse("<Foo bar=\"baz\" />");
        let element = find(&output, |n| matches!(n, Node::Element(_)));
        match node(&output, element) {
            Node::Element(e) => {
                assert!(e.self_closing);
                assert_eq!(e.attributes.len(), 1);
            }
            _ => unreachable!(),
        }
        assert_eq!(output.element_bounds[&element].close_start, None);
    }

    #[test]
    fn void_elements_take_no_children() {
        let output = parse("<br>after");
        let element = find(&output, |n| matches!(n, Node::Element(_)));
        match node(&output, element) {
            Node::Element(e) => assert!(e.children.is_empty()),
            _ => unreachable!(),
        }
        assert!((0..output.nodes.len())
            .map(NodeId)
            .any(|id| matches!(&output.nodes[id.index()], Node::Text(t) if t.chars == "after")));
    }

    #[test]
    fn quoted_value_with_mustache_is_concat() {
        let source = "<a href=\"x{{y}}\"></a>";
        let output = parse(source);
        let concat = find(&output, |n| matches!(n, Node::Concat(_)));
        let index = SourceIndex::new(source);
        assert_eq!(
            index.slice(output.spans[concat.index()].unwrap()),
            "\"x{{y}}\""
        );
    }

    #[test]
    fn modifiers_and_comments_stay_out_of_attributes() {
        let output = parse("<div {{action}} {{! note }} data-x=\"1\"></div>");
        let element = find(&output, |n| matches!(n, Node::Element(_)));
        match node(&output, element) {
            Node::Element(e) => {
                assert_eq!(e.modifiers.len(), 1);
                assert_eq!(e.comments.len(), 1);
                assert_eq!(e.attributes.len(), 1);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn block_with_else_chain() {
        let source = "{{#if a}}A{{else if b}}B{{else}}C{{/if}}";
        let output = parse(source);
        let outer = find(
            &output,
            |n| matches!(n, Node::Block(b) if !b.chained),
        );
        let (program, inverse) = match node(&output, outer) {
            Node::Block(b) => (b.program, b.inverse.unwrap()),
            _ => unreachable!(),
        };
        match node(&output, program) {
            Node::Program(p) => assert_eq!(p.body.len(), 1),
            _ => unreachable!(),
        }
        let nested = match node(&output, inverse) {
            Node::Program(p) => p.body[0],
            _ => unreachable!(),
        };
        match node(&output, nested) {
            Node::Block(b) => {
                assert!(b.chained);
                assert!(b.inverse.is_some());
            }
            _ => unreachable!(),
        }

        let index = SourceIndex::new(source);
        let nested_span = output.spans[nested.index()].unwrap();
        assert_eq!(index.slice(nested_span), "{{else if b}}B{{else}}C");
    }

    #[test]
    fn block_params_are_recorded_with_span() {
        let source = "{{#each items as |item idx|}}{{item}}{{/each}}";
        let output = parse(source);
        let block = find(&output, |n| matches!(n, Node::Block(_)));
        match node(&output, block) {
            Node::Block(b) => assert_eq!(b.block_params, vec!["item", "idx"]),
            _ => unreachable!(),
        }
        let index = SourceIndex::new(source);
        assert_eq!(
            index.slice(output.block_param_spans[&block]),
            "as |item idx|"
        );
    }

    #[test]
    fn elsewhere_is_a_path_not_an_else() {
        let output = parse("{{#if a}}{{elsewhere}}{{/if}}");
        assert!((0..output.nodes.len()).map(NodeId).any(
            |id| matches!(&output.nodes[id.index()], Node::Path(p) if p.original == "elsewhere")
        ));
    }

    #[test]
    fn mismatched_close_tag_errors() {
        let err = preprocess("<div></span>").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MismatchedClosingTag { .. }
        ));
    }

    #[test]
    fn mismatched_block_close_errors() {
        let err = preprocess("{{#foo}}{{/bar}}").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MismatchedBlockClose { .. }));
    }

    #[test]
    fn unclosed_mustache_errors() {
        let err = preprocess("{{foo").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnclosedMustache));
    }

    #[test]
    fn stray_closer_errors() {
        let err = preprocess("hello {{/foo}}").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedCloser { .. }));
    }

    #[test]
    fn doctype_stays_text() {
        let output = parse("<!DOCTYPE html>\n<p>x</p>");
        assert!((0..output.nodes.len()).map(NodeId).any(
            |id| matches!(&output.nodes[id.index()], Node::Text(t) if t.chars.contains("DOCTYPE"))
        ));
    }

    #[test]
    fn sub_expression_param() {
        let source = "{{foo (concat a b) x=1}}";
        let output = parse(source);
        let sub = find(&output, |n| matches!(n, Node::SubExpression(_)));
        let index = SourceIndex::new(source);
        assert_eq!(
            index.slice(output.spans[sub.index()].unwrap()),
            "(concat a b)"
        );
    }

    #[test]
    fn literals_parse() {
        let output = parse("{{foo true 1.5 \"str\" null undefined}}");
        let mustache = find(&output, |n| matches!(n, Node::Mustache(_)));
        match node(&output, mustache) {
            Node::Mustache(m) => assert_eq!(m.params.len(), 5),
            _ => unreachable!(),
        }
    }
}

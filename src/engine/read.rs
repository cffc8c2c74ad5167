//! DOT text reader.
//!
//! Input is consumed as a stream: [`mem_read`] with `Some(text)` starts a new
//! stream and returns its first graph; with `None` it returns the next graph
//! of the current stream, or `None` once the stream is exhausted. A syntax
//! error reports a diagnostic and discards the rest of the stream.

use std::ffi::CStr;
use std::fmt;
use std::sync::Mutex;

use super::diag;
use super::graph::{Desc, Graph, NodeId, ObjKind, ObjRef, SubgraphId, Value};
use super::html;

static STREAM: Mutex<Option<Cursor>> = Mutex::new(None);

/// Deepest subgraph nesting the reader accepts.
pub const MAX_SUBGRAPH_DEPTH: usize = 200;

/// Read one graph from the process-wide input stream.
pub fn mem_read(text: Option<&CStr>) -> Option<Graph> {
    let mut stream = STREAM.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(text) = text {
        *stream = Some(Cursor::new(&text.to_string_lossy()));
    }
    let cursor = stream.as_mut()?;

    cursor.skip_ws_and_comments();
    if cursor.eof() {
        *stream = None;
        return None;
    }

    let parsed = Parser::new(cursor).parse_graph();
    match parsed {
        Ok(graph) => {
            cursor.skip_ws_and_comments();
            if cursor.eof() {
                *stream = None;
            }
            Some(graph)
        }
        Err(err) => {
            diag::error(err.to_string());
            *stream = None;
            None
        }
    }
}

/// Whether unread input is still pending in the stream.
#[cfg(test)]
pub(crate) fn stream_pending() -> bool {
    STREAM.lock().unwrap_or_else(|e| e.into_inner()).is_some()
}

/// Parse every graph in `text` without touching the shared stream.
#[cfg(test)]
pub(crate) fn read_all(text: &str) -> Result<Vec<Graph>, SyntaxError> {
    let mut cursor = Cursor::new(text);
    let mut graphs = Vec::new();
    loop {
        cursor.skip_ws_and_comments();
        if cursor.eof() {
            return Ok(graphs);
        }
        graphs.push(Parser::new(&mut cursor).parse_graph()?);
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub near: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error in line {} near '{}'", self.line, self.near)
    }
}

impl std::error::Error for SyntaxError {}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Character cursor over DOT source.
#[derive(Debug)]
pub struct Cursor {
    pub src: Vec<char>,
    pub pos: usize,
}

impl Cursor {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn current(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    /// Peek whether the next chars match `s`.
    pub fn peek(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.src.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Consume `s` if it matches; returns true if consumed.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.peek(s) {
            self.pos += s.chars().count();
            true
        } else {
            false
        }
    }

    /// 1-based line number of `pos`.
    pub fn line_at(&self, pos: usize) -> usize {
        self.src[..pos.min(self.src.len())]
            .iter()
            .filter(|&&c| c == '\n')
            .count()
            + 1
    }

    fn at_line_start(&self) -> bool {
        let mut i = self.pos;
        while i > 0 {
            match self.src[i - 1] {
                '\n' => return true,
                ' ' | '\t' | '\r' => i -= 1,
                _ => return false,
            }
        }
        true
    }

    /// Skip whitespace, `//` and `/* */` comments, and `#` lines.
    pub fn skip_ws_and_comments(&mut self) {
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('#') if self.at_line_start() => self.skip_line(),
                Some('/') if self.at(1) == Some('/') => self.skip_line(),
                Some('/') if self.at(1) == Some('*') => {
                    self.pos += 2;
                    while !self.eof() && !self.peek("*/") {
                        self.pos += 1;
                    }
                    self.consume("*/");
                }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Quoted(String),
    Html(String),
    Punct(char),
    Arrow,
    Line,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) | Token::Quoted(s) => s.clone(),
            Token::Html(s) => format!("<{s}>"),
            Token::Punct(c) => c.to_string(),
            Token::Arrow => "->".to_string(),
            Token::Line => "--".to_string(),
            Token::Eof => String::new(),
        }
    }

    fn keyword(&self) -> Option<String> {
        match self {
            Token::Ident(s) => {
                let lower = s.to_ascii_lowercase();
                matches!(
                    lower.as_str(),
                    "graph" | "digraph" | "node" | "edge" | "subgraph" | "strict"
                )
                .then_some(lower)
            }
            _ => None,
        }
    }

    fn is_id(&self) -> bool {
        match self {
            Token::Ident(_) => self.keyword().is_none(),
            Token::Quoted(_) | Token::Html(_) => true,
            _ => false,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// An edge operand: a node (with optional port) or every node of a subgraph.
enum Operand {
    Node(NodeId, Option<String>),
    Sub(SubgraphId),
}

struct Parser<'c> {
    cur: &'c mut Cursor,
    peeked: Option<(Token, usize)>,
    graph: Option<Graph>,
    depth: usize,
}

type ParseResult<T> = Result<T, SyntaxError>;

impl<'c> Parser<'c> {
    fn new(cur: &'c mut Cursor) -> Self {
        Self {
            cur,
            peeked: None,
            graph: None,
            depth: 0,
        }
    }

    // ── Lexing ───────────────────────────────────────────────────────────────

    fn lex(&mut self) -> ParseResult<(Token, usize)> {
        self.cur.skip_ws_and_comments();
        let pos = self.cur.pos;
        let Some(c) = self.cur.current() else {
            return Ok((Token::Eof, pos));
        };

        if self.cur.consume("->") {
            return Ok((Token::Arrow, pos));
        }
        if self.cur.consume("--") {
            return Ok((Token::Line, pos));
        }
        if c == '"' {
            return self.lex_quoted().map(|t| (t, pos));
        }
        if c == '<' {
            return self.lex_html().map(|t| (t, pos));
        }
        if c.is_ascii_digit() || c == '.' || (c == '-' && self.next_is_numeral()) {
            return Ok((self.lex_numeral(), pos));
        }
        if is_ident_start(c) {
            let start = self.cur.pos;
            while self.cur.current().is_some_and(is_ident_char) {
                self.cur.pos += 1;
            }
            let text: String = self.cur.src[start..self.cur.pos].iter().collect();
            return Ok((Token::Ident(text), pos));
        }
        if "{}[]=;,:+".contains(c) {
            self.cur.pos += 1;
            return Ok((Token::Punct(c), pos));
        }
        Err(self.error_at(pos, c.to_string()))
    }

    fn error_at(&self, pos: usize, near: String) -> SyntaxError {
        SyntaxError {
            line: self.cur.line_at(pos),
            near,
        }
    }

    fn next_is_numeral(&self) -> bool {
        match self.cur.at(1) {
            Some(d) if d.is_ascii_digit() => true,
            Some('.') => self.cur.at(2).is_some_and(|d| d.is_ascii_digit()),
            _ => false,
        }
    }

    fn lex_numeral(&mut self) -> Token {
        let start = self.cur.pos;
        if self.cur.current() == Some('-') {
            self.cur.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(c) = self.cur.current() {
            if c.is_ascii_digit() {
                self.cur.pos += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.cur.pos += 1;
            } else {
                break;
            }
        }
        Token::Ident(self.cur.src[start..self.cur.pos].iter().collect())
    }

    fn lex_quoted(&mut self) -> ParseResult<Token> {
        let start = self.cur.pos;
        self.cur.pos += 1;
        let mut out = String::new();
        loop {
            match self.cur.current() {
                None => return Err(self.error_at(start, format!("\"{out}"))),
                Some('"') => {
                    self.cur.pos += 1;
                    return Ok(Token::Quoted(out));
                }
                Some('\\') => match self.cur.at(1) {
                    Some('"') => {
                        out.push('"');
                        self.cur.pos += 2;
                    }
                    Some('\n') => self.cur.pos += 2,
                    Some('\r') if self.cur.at(2) == Some('\n') => self.cur.pos += 3,
                    _ => {
                        out.push('\\');
                        self.cur.pos += 1;
                    }
                },
                Some(c) => {
                    out.push(c);
                    self.cur.pos += 1;
                }
            }
        }
    }

    fn lex_html(&mut self) -> ParseResult<Token> {
        let open = self.cur.pos;
        self.cur.pos += 1;
        let start = self.cur.pos;
        let mut depth = 1usize;
        while let Some(c) = self.cur.current() {
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        let text: String = self.cur.src[start..self.cur.pos].iter().collect();
                        self.cur.pos += 1;
                        return Ok(Token::Html(text));
                    }
                }
                _ => {}
            }
            self.cur.pos += 1;
        }
        Err(self.error_at(open, "<".to_string()))
    }

    fn peek(&mut self) -> ParseResult<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex()?);
        }
        match &self.peeked {
            Some((tok, _)) => Ok(tok),
            None => Ok(&Token::Eof),
        }
    }

    fn next(&mut self) -> ParseResult<(Token, usize)> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self.lex(),
        }
    }

    fn unexpected<T>(&mut self) -> ParseResult<T> {
        let (tok, pos) = self.next()?;
        Err(self.error_at(pos, tok.describe()))
    }

    fn eat_punct(&mut self, c: char) -> ParseResult<bool> {
        if *self.peek()? == Token::Punct(c) {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.eat_punct(c)? {
            Ok(())
        } else {
            self.unexpected()
        }
    }

    fn graph(&mut self) -> &mut Graph {
        self.graph.get_or_insert_with(|| Graph::open("", Desc::default()))
    }

    // ── Grammar ──────────────────────────────────────────────────────────────

    fn parse_graph(mut self) -> ParseResult<Graph> {
        let mut strict = false;
        if self.peek()?.keyword().as_deref() == Some("strict") {
            self.next()?;
            strict = true;
        }
        let directed = match self.peek()?.keyword().as_deref() {
            Some("graph") => false,
            Some("digraph") => true,
            _ => return self.unexpected(),
        };
        self.next()?;

        let name = if self.peek()?.is_id() {
            self.parse_id()?.text
        } else {
            "%1".to_string()
        };
        self.graph = Some(Graph::open(&name, Desc { directed, strict }));

        self.expect_punct('{')?;
        self.parse_stmt_list(SubgraphId::ROOT)?;
        self.expect_punct('}')?;

        // The closing brace was the last token lexed, so the cursor is ready
        // for the next graph in the stream.
        Ok(self
            .graph
            .take()
            .unwrap_or_else(|| Graph::open(&name, Desc { directed, strict })))
    }

    fn parse_stmt_list(&mut self, sub: SubgraphId) -> ParseResult<()> {
        loop {
            match self.peek()?.clone() {
                Token::Punct('}') | Token::Eof => return Ok(()),
                Token::Punct(';') => {
                    self.next()?;
                }
                _ => self.parse_stmt(sub)?,
            }
        }
    }

    fn parse_stmt(&mut self, sub: SubgraphId) -> ParseResult<()> {
        let tok = self.peek()?.clone();
        match tok.keyword().as_deref() {
            Some("graph") | Some("node") | Some("edge") => {
                self.next()?;
                let kind = match tok.keyword().as_deref() {
                    Some("graph") => ObjKind::Graph,
                    Some("node") => ObjKind::Node,
                    _ => ObjKind::Edge,
                };
                if *self.peek()? != Token::Punct('[') {
                    return self.unexpected();
                }
                for (name, value) in self.parse_attr_lists()? {
                    self.graph().declare(sub, kind, &name, value);
                }
                return Ok(());
            }
            Some("subgraph") => {
                let operand = self.parse_subgraph(sub)?;
                return self.finish_operand_stmt(sub, operand);
            }
            Some(_) => return self.unexpected(),
            None => {}
        }

        if tok == Token::Punct('{') {
            let operand = self.parse_subgraph(sub)?;
            return self.finish_operand_stmt(sub, operand);
        }
        if !tok.is_id() {
            return self.unexpected();
        }

        let id = self.parse_id()?;
        if self.eat_punct('=')? {
            let value = self.parse_id()?;
            self.graph().declare(sub, ObjKind::Graph, &id.text, value);
            return Ok(());
        }

        let port = self.parse_port()?;
        match self.graph().node(sub, &id.text, true) {
            Some(n) => self.finish_operand_stmt(sub, Operand::Node(n, port)),
            None => self.unexpected(),
        }
    }

    /// After a leading node or subgraph: either an edge chain or a node statement.
    fn finish_operand_stmt(&mut self, sub: SubgraphId, first: Operand) -> ParseResult<()> {
        if matches!(self.peek()?, Token::Arrow | Token::Line) {
            return self.parse_edge_chain(sub, first);
        }
        if let Operand::Node(n, _) = first {
            if *self.peek()? == Token::Punct('[') {
                for (name, value) in self.parse_attr_lists()? {
                    self.graph().set(ObjRef::Node(n), &name, value);
                }
            }
        }
        Ok(())
    }

    fn parse_edge_chain(&mut self, sub: SubgraphId, first: Operand) -> ParseResult<()> {
        let directed = self.graph().is_directed();
        let mut operands = vec![first];
        loop {
            let op = self.peek()?.clone();
            match op {
                Token::Arrow if directed => {}
                Token::Line if !directed => {}
                Token::Arrow | Token::Line => return self.unexpected(),
                _ => break,
            }
            self.next()?;

            let tok = self.peek()?.clone();
            let operand = if tok.keyword().as_deref() == Some("subgraph") || tok == Token::Punct('{') {
                self.parse_subgraph(sub)?
            } else if tok.is_id() {
                let id = self.parse_id()?;
                let port = self.parse_port()?;
                match self.graph().node(sub, &id.text, true) {
                    Some(n) => Operand::Node(n, port),
                    None => return self.unexpected(),
                }
            } else {
                return self.unexpected();
            };
            operands.push(operand);
        }

        let attrs = if *self.peek()? == Token::Punct('[') {
            self.parse_attr_lists()?
        } else {
            Vec::new()
        };
        let key = attrs
            .iter()
            .find(|(name, _)| name == "key")
            .map(|(_, v)| v.text.clone());

        for pair in operands.windows(2) {
            let tails = self.members(&pair[0]);
            let heads = self.members(&pair[1]);
            for (t, tport) in &tails {
                for (h, hport) in &heads {
                    let graph = self.graph();
                    let Some(e) = graph.edge(sub, *t, *h, key.as_deref(), true) else {
                        continue;
                    };
                    if let Some(p) = tport {
                        graph.set(ObjRef::Edge(e), "tailport", Value::plain(p.as_str()));
                    }
                    if let Some(p) = hport {
                        graph.set(ObjRef::Edge(e), "headport", Value::plain(p.as_str()));
                    }
                    for (name, value) in attrs.iter().filter(|(name, _)| name != "key") {
                        graph.set(ObjRef::Edge(e), name, value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn members(&mut self, operand: &Operand) -> Vec<(NodeId, Option<String>)> {
        match operand {
            Operand::Node(n, port) => vec![(*n, port.clone())],
            Operand::Sub(s) => {
                let s = *s;
                self.graph()
                    .subgraph_nodes(s)
                    .iter()
                    .map(|&n| (n, None))
                    .collect()
            }
        }
    }

    fn parse_subgraph(&mut self, parent: SubgraphId) -> ParseResult<Operand> {
        let mut name = None;
        if self.peek()?.keyword().as_deref() == Some("subgraph") {
            self.next()?;
            if self.peek()?.is_id() {
                name = Some(self.parse_id()?.text);
            }
        }

        let sub = match &name {
            Some(name) => self.graph().subgraph(parent, name, true),
            None => self.graph().anonymous_subgraph(parent),
        };
        let Some(sub) = sub else {
            return self.unexpected();
        };

        if *self.peek()? == Token::Punct('{') {
            let (_, pos) = self.next()?;
            if self.depth >= MAX_SUBGRAPH_DEPTH {
                return Err(self.error_at(pos, "{".to_string()));
            }
            self.depth += 1;
            self.parse_stmt_list(sub)?;
            self.depth -= 1;
            self.expect_punct('}')?;
        } else if name.is_none() {
            return self.unexpected();
        }
        Ok(Operand::Sub(sub))
    }

    fn parse_port(&mut self) -> ParseResult<Option<String>> {
        if !self.eat_punct(':')? {
            return Ok(None);
        }
        let mut port = self.parse_id()?.text;
        if self.eat_punct(':')? {
            port.push(':');
            port.push_str(&self.parse_id()?.text);
        }
        Ok(Some(port))
    }

    /// One or more `[ ... ]` blocks.
    fn parse_attr_lists(&mut self) -> ParseResult<Vec<(String, Value)>> {
        let mut attrs = Vec::new();
        while self.eat_punct('[')? {
            loop {
                if self.eat_punct(']')? {
                    break;
                }
                if self.eat_punct(',')? || self.eat_punct(';')? {
                    continue;
                }
                let name = self.parse_id()?.text;
                let value = if self.eat_punct('=')? {
                    self.parse_id()?
                } else {
                    Value::plain("true")
                };
                attrs.push((name, value));
            }
        }
        Ok(attrs)
    }

    /// An ID, with `"a" + "b"` concatenation for quoted strings.
    fn parse_id(&mut self) -> ParseResult<Value> {
        let (tok, pos) = self.next()?;
        match tok {
            Token::Ident(s) if tok_is_plain_id(&s) => Ok(Value::plain(s)),
            Token::Html(s) => Ok(html::strdup_html(&s)),
            Token::Quoted(mut s) => {
                while *self.peek()? == Token::Punct('+') {
                    self.next()?;
                    match self.next()? {
                        (Token::Quoted(more), _) => s.push_str(&more),
                        (other, pos) => return Err(self.error_at(pos, other.describe())),
                    }
                }
                Ok(Value::plain(s))
            }
            other => Err(self.error_at(pos, other.describe())),
        }
    }
}

fn tok_is_plain_id(s: &str) -> bool {
    Token::Ident(s.to_string()).keyword().is_none()
}

#[cfg(test)]
#[path = "../../tests/rust/test_engine_read.rs"]
mod tests;

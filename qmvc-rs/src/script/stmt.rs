//! Statement tree and the `.pro` / `.pri` file parser.
//!
//! A project file is a block of guarded statements.  Each entry pairs a
//! condition (a conjunction of disjunctions of predicate calls) with one
//! statement: an assignment, a directive call, or a nested block.  An entry
//! without a guard carries an empty condition, which is always true.
//!
//! ```text
//! TEMPLATE = app
//! SOURCES += main.cpp
//! win32:CONFIG(debug, debug|release) {
//!     DEFINES += TRACE
//! } else {
//!     DEFINES -= TRACE
//! }
//! unix|macx: include(common.pri)
//! ```
//!
//! `else` is not special to the parser: it is an ordinary predicate that
//! starts a new sibling entry of the enclosing block.

use crate::error::{Error, Result};

// ── Tree ──────────────────────────────────────────────────────────────────────

/// A function-call shaped node: `name(arg, arg, ...)` or a bare `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FnCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FnCall {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        FnCall { name: name.into(), args }
    }
}

/// One atomic predicate, optionally negated with `!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub invert: bool,
    pub call: FnCall,
}

/// Conjunction (outer) of disjunctions (inner) of predicates.
pub type Condition = Vec<Vec<Cond>>;

/// Assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Replace,
    /// `+=`
    Append,
    /// `-=`
    Remove,
    /// `*=`
    AppendUnique,
    /// `~=`
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub op: AssignOp,
    /// Raw operands; expanded by the evaluator.
    pub values: Vec<String>,
}

/// A guarded block: entries are evaluated in order with `else` chaining.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<CondStmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondStmt {
    pub cond: Condition,
    pub stmt: Stmt,
}

impl CondStmt {
    /// An entry with no guard.
    pub fn always(stmt: Stmt) -> Self {
        CondStmt { cond: Vec::new(), stmt }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assign(Assignment),
    Call(FnCall),
    Block(Block),
}

// ── Incremental front end ─────────────────────────────────────────────────────

/// Accepts file contents in chunks and produces the tree on [`finish`].
///
/// [`finish`]: ProParser::finish
#[derive(Debug, Default)]
pub struct ProParser {
    label: String,
    buf: Vec<u8>,
}

impl ProParser {
    /// `label` names the source in error messages (usually the file path).
    pub fn new(label: impl Into<String>) -> Self {
        ProParser { label: label.into(), buf: Vec::new() }
    }

    pub fn push_data(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn finish(self) -> Result<Block> {
        let src = String::from_utf8_lossy(&self.buf);
        parse_project(&src, &self.label)
    }
}

/// Parse a complete project file.
pub fn parse_project(src: &str, label: &str) -> Result<Block> {
    let mut p = Parser {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        label,
    };
    p.parse_block(false)
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    label: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            path: self.label.to_owned(),
            line: self.line,
            message: message.into(),
        }
    }

    /// `\` followed by optional blanks and a newline.
    fn at_continuation(&self) -> bool {
        if self.peek() != Some('\\') {
            return false;
        }
        let mut i = 1;
        while let Some(c) = self.peek_at(i) {
            match c {
                ' ' | '\t' | '\r' => i += 1,
                '\n' => return true,
                _ => return false,
            }
        }
        true
    }

    fn skip_continuation(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.peek(), None | Some('\n')) {
            self.pos += 1;
        }
    }

    /// Skip blanks, comments and continuations, stopping at a newline.
    fn skip_inline_ws(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.pos += 1;
                }
                Some('#') => self.skip_comment(),
                Some('\\') if self.at_continuation() => self.skip_continuation(),
                _ => break,
            }
        }
    }

    fn skip_blank(&mut self) {
        loop {
            self.skip_inline_ws();
            if self.peek() == Some('\n') {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn parse_block(&mut self, nested: bool) -> Result<Block> {
        let mut block = Block::default();
        loop {
            self.skip_blank();
            match self.peek() {
                None if nested => return Err(self.error("missing '}'")),
                None => break,
                Some('}') if nested => {
                    self.bump();
                    break;
                }
                Some('}') => return Err(self.error("unexpected '}'")),
                Some(_) => block.stmts.push(self.parse_entry()?),
            }
        }
        Ok(block)
    }

    /// One guarded entry: `[cond ':']* (assignment | call | cond '{' block '}')`.
    fn parse_entry(&mut self) -> Result<CondStmt> {
        let mut cond: Condition = Vec::new();
        let mut disj: Vec<Cond> = Vec::new();

        loop {
            self.skip_inline_ws();
            let invert = self.peek() == Some('!');
            if invert {
                self.bump();
                self.skip_inline_ws();
            }

            let name = self.read_name();
            if name.is_empty() {
                return Err(match self.peek() {
                    Some(c) if c != '\n' => self.error(format!("unexpected '{c}'")),
                    _ => self.error("expected a name"),
                });
            }
            self.skip_inline_ws();

            let args = if self.peek() == Some('(') {
                self.bump();
                Some(self.read_call_args()?)
            } else {
                None
            };
            self.skip_inline_ws();

            if args.is_none() && !invert {
                if let Some(op) = self.read_assign_op() {
                    if !disj.is_empty() {
                        return Err(self.error(format!("assignment to {name} after '|'")));
                    }
                    let values = self.read_values()?;
                    return Ok(CondStmt {
                        cond,
                        stmt: Stmt::Assign(Assignment { name, op, values }),
                    });
                }
            }

            let has_args = args.is_some();
            let call = FnCall::new(name, args.unwrap_or_default());
            match self.peek() {
                Some(':') => {
                    self.bump();
                    disj.push(Cond { invert, call });
                    cond.push(std::mem::take(&mut disj));
                }
                Some('|') => {
                    self.bump();
                    disj.push(Cond { invert, call });
                }
                Some('{') => {
                    self.bump();
                    disj.push(Cond { invert, call });
                    cond.push(disj);
                    let body = self.parse_block(true)?;
                    return Ok(CondStmt { cond, stmt: Stmt::Block(body) });
                }
                None | Some('\n') | Some('}') => {
                    if invert || !disj.is_empty() || !has_args {
                        return Err(self.error(format!(
                            "expected ':', '{{' or an assignment after {}",
                            call.name
                        )));
                    }
                    return Ok(CondStmt { cond, stmt: Stmt::Call(call) });
                }
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }
    }

    fn is_name_char(&self, c: char) -> bool {
        match c {
            c if c.is_whitespace() => false,
            ':' | '|' | '{' | '}' | '(' | ')' | '!' | '#' | '"' | ',' | '=' => false,
            '+' | '-' | '*' | '~' => self.peek_at(1) != Some('='),
            _ => true,
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !self.is_name_char(c) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name
    }

    fn read_assign_op(&mut self) -> Option<AssignOp> {
        let (op, len) = match (self.peek()?, self.peek_at(1)) {
            ('=', _) => (AssignOp::Replace, 1),
            ('+', Some('=')) => (AssignOp::Append, 2),
            ('-', Some('=')) => (AssignOp::Remove, 2),
            ('*', Some('=')) => (AssignOp::AppendUnique, 2),
            ('~', Some('=')) => (AssignOp::Regex, 2),
            _ => return None,
        };
        self.pos += len;
        Some(op)
    }

    /// Read `a, b, c)` after the opening parenthesis.
    fn read_call_args(&mut self) -> Result<Vec<String>> {
        let mut args = Vec::new();
        let mut cur = String::new();
        let mut depth = 0usize;
        let mut in_str = false;
        let mut saw_comma = false;

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated '('"));
            };
            match c {
                '\n' => return Err(self.error("unterminated '('")),
                '\\' if !in_str && self.at_continuation() => {
                    self.skip_continuation();
                    cur.push(' ');
                    continue;
                }
                '"' => in_str = !in_str,
                '(' if !in_str => depth += 1,
                ')' if !in_str && depth == 0 => {
                    self.bump();
                    break;
                }
                ')' if !in_str => depth -= 1,
                ',' if !in_str && depth == 0 => {
                    self.bump();
                    args.push(unquote(cur.trim()));
                    cur.clear();
                    saw_comma = true;
                    continue;
                }
                _ => {}
            }
            cur.push(c);
            self.bump();
        }

        if saw_comma || !cur.trim().is_empty() {
            args.push(unquote(cur.trim()));
        }
        Ok(args)
    }

    /// Whitespace-separated operands up to end of line (or a closing `}`).
    fn read_values(&mut self) -> Result<Vec<String>> {
        let mut values = Vec::new();
        let mut cur = String::new();
        let mut quoted = false;
        let mut in_str = false;
        let mut depth = 0usize;

        let flush = |cur: &mut String, quoted: &mut bool, values: &mut Vec<String>| {
            if !cur.is_empty() || *quoted {
                values.push(std::mem::take(cur));
            }
            *quoted = false;
        };

        while let Some(c) = self.peek() {
            match c {
                '\n' if in_str => return Err(self.error("unterminated string")),
                '\n' => break,
                '"' => {
                    in_str = !in_str;
                    quoted = true;
                    self.bump();
                }
                '\\' if in_str => {
                    self.bump();
                    match self.peek() {
                        Some('"') | Some('\\') => {
                            cur.push(self.bump().unwrap_or_default());
                        }
                        _ => cur.push('\\'),
                    }
                }
                _ if in_str => {
                    cur.push(c);
                    self.bump();
                }
                '#' => self.skip_comment(),
                '\\' if self.at_continuation() => {
                    self.skip_continuation();
                    flush(&mut cur, &mut quoted, &mut values);
                }
                '}' if depth == 0 => break,
                c if c.is_whitespace() && depth == 0 => {
                    self.bump();
                    flush(&mut cur, &mut quoted, &mut values);
                }
                _ => {
                    match c {
                        '(' | '{' | '[' => depth += 1,
                        ')' | '}' | ']' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    cur.push(c);
                    self.bump();
                }
            }
        }
        if in_str {
            return Err(self.error("unterminated string"));
        }
        flush(&mut cur, &mut quoted, &mut values);
        Ok(values)
    }
}

fn unquote(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

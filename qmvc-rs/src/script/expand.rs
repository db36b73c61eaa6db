//! Variable expansion in raw operands.
//!
//! | Sequence     | Meaning                                           |
//! |--------------|---------------------------------------------------|
//! | `$$name`     | Values of variable `name`, space-joined           |
//! | `$${name}`   | Same, with an explicit end                        |
//! | `$$[name]`   | Built-in property (install paths etc.)            |
//! | `$$(name)`   | Process environment variable                      |
//!
//! Text outside these forms, including a lone `$`, is copied unchanged.
//! Substituted text is never expanded again.  A `$$name` reference running
//! to the end of the input is resolved with the characters consumed so far;
//! an unterminated `$${`, `$$[` or `$$(` is copied literally.

/// Lookups the expansion engine needs from its caller.
pub trait ExpandContext {
    /// Space-joined values of a variable (empty when unset).
    fn var(&self, name: &str) -> String;

    /// Built-in property value (empty when unknown).
    fn property(&self, name: &str) -> String;

    /// Environment variable value (empty when undefined).
    fn env_var(&self, name: &str) -> String;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Seen one `$`.
    Dollar,
    /// Seen `$$`; collecting an identifier.
    DollarDollar,
    Brace,
    Bracket,
    Paren,
}

/// Expand all reference forms in `src`.
pub fn expand(src: &str, ctx: &dyn ExpandContext) -> String {
    let mut out = String::with_capacity(src.len());
    let bytes = src.as_bytes();

    // Byte offsets into `src`.  Every sigil and delimiter is ASCII, so each
    // offset below sits on a char boundary.
    let mut last_store = 0;
    let mut first = 0;
    let mut cur = 0;
    let mut state = State::Idle;

    while cur < bytes.len() {
        let c = bytes[cur];
        match state {
            State::Idle => {
                if c == b'$' {
                    out.push_str(&src[last_store..cur]);
                    last_store = cur;
                    state = State::Dollar;
                }
                cur += 1;
            }
            State::Dollar => {
                if c == b'$' {
                    state = State::DollarDollar;
                    first = cur + 1;
                } else {
                    state = State::Idle;
                }
                cur += 1;
            }
            State::DollarDollar => {
                if matches!(c, b'{' | b'[' | b'(') {
                    if first == cur {
                        state = match c {
                            b'{' => State::Brace,
                            b'[' => State::Bracket,
                            _ => State::Paren,
                        };
                        cur += 1;
                    } else {
                        // `$$name{` is not a reference; copied as text.
                        state = State::Idle;
                    }
                } else if c.is_ascii_alphanumeric() || c == b'_' {
                    cur += 1;
                } else {
                    if first != cur {
                        out.push_str(&ctx.var(&src[first..cur]));
                        last_store = cur;
                    }
                    // Re-examine `c` in the idle state.
                    state = State::Idle;
                }
            }
            State::Brace | State::Bracket | State::Paren => {
                let close = match state {
                    State::Brace => b'}',
                    State::Bracket => b']',
                    _ => b')',
                };
                if c == close {
                    let name = &src[first + 1..cur];
                    let value = match state {
                        State::Brace => ctx.var(name),
                        State::Bracket => ctx.property(name),
                        _ => ctx.env_var(name),
                    };
                    out.push_str(&value);
                    last_store = cur + 1;
                    state = State::Idle;
                }
                cur += 1;
            }
        }
    }

    if state == State::DollarDollar && first != cur {
        out.push_str(&ctx.var(&src[first..]));
    } else {
        out.push_str(&src[last_store..]);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Variable environment.
//!
//! Every variable holds an ordered list of strings.  Order matters: values
//! are space-joined on expansion and `-=` removes the first match only.
//! Names are kept sorted so that dumps are deterministic.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Error, Result};
use crate::script::stmt::AssignOp;

/// Feature-flag variable consulted by condition predicates.
pub const CONFIG: &str = "CONFIG";
/// Directory of the file currently being walked.
pub const PWD: &str = "PWD";

/// Ordered multi-valued variable store for one evaluation session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, Vec<String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the variable's values.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.vars.insert(name.into(), values);
    }

    /// Append values, keeping order and duplicates.
    pub fn append(&mut self, name: &str, values: impl IntoIterator<Item = String>) {
        self.vars.entry(name.to_owned()).or_default().extend(values);
    }

    /// Remove the first occurrence of each value, in the order given.
    pub fn remove(&mut self, name: &str, values: &[String]) {
        let list = self.vars.entry(name.to_owned()).or_default();
        for v in values {
            if let Some(pos) = list.iter().position(|x| x == v) {
                list.remove(pos);
            }
        }
    }

    /// The `*=` operator.
    ///
    /// NOTE: appends a value only when it is *already* present, which is the
    /// opposite of what the operator's name promises.  Existing projects were
    /// generated with this behaviour, so it is kept until someone decides
    /// otherwise; `append_unique_keeps_observed_behaviour` pins it.
    pub fn append_unique(&mut self, name: &str, values: &[String]) {
        let list = self.vars.entry(name.to_owned()).or_default();
        for v in values {
            if list.contains(v) {
                list.push(v.clone());
            }
        }
    }

    /// The `~=` operator: apply each `s/regex/replacement/[g]` operand to
    /// every stored value.
    pub fn substitute(&mut self, name: &str, ops: &[String]) -> Result<()> {
        let compiled = ops.iter().map(|op| Substitution::parse(op)).collect::<Result<Vec<_>>>()?;
        if let Some(list) = self.vars.get_mut(name) {
            for sub in &compiled {
                for value in list.iter_mut() {
                    *value = sub.apply(value);
                }
            }
        }
        Ok(())
    }

    /// Apply an assignment operator to already-expanded values as one step.
    pub fn apply(&mut self, name: &str, op: AssignOp, values: Vec<String>) -> Result<()> {
        match op {
            AssignOp::Replace => self.set(name, values),
            AssignOp::Append => self.append(name, values),
            AssignOp::Remove => self.remove(name, &values),
            AssignOp::AppendUnique => self.append_unique(name, &values),
            AssignOp::Regex => self.substitute(name, &values)?,
        }
        Ok(())
    }

    /// Delete a variable entirely, returning its previous values.
    pub fn unset(&mut self, name: &str) -> Option<Vec<String>> {
        self.vars.remove(name)
    }

    /// Raw access; `None` when the variable was never assigned.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    /// All values, or an empty slice when unset.
    pub fn values(&self, name: &str) -> &[String] {
        self.get(name).unwrap_or(&[])
    }

    /// The single value of `name`; anything but exactly one value is an error.
    pub fn get_one(&self, name: &str) -> Result<&str> {
        match self.values(name) {
            [one] => Ok(one),
            other => Err(Error::Arity { name: name.to_owned(), count: other.len() }),
        }
    }

    /// Values joined by single spaces (empty when unset).
    pub fn joined(&self, name: &str) -> String {
        self.values(name).join(" ")
    }

    /// `true` if `value` is one of the variable's values.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.values(name).iter().any(|v| v == value)
    }

    /// `true` if the variable is unset or has no values.
    pub fn is_empty_var(&self, name: &str) -> bool {
        self.values(name).is_empty()
    }

    /// Iterate over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── `~=` operand ──────────────────────────────────────────────────────────────

/// A parsed `s/regex/replacement/flags` operand.
struct Substitution {
    re: Regex,
    replacement: String,
    global: bool,
}

impl Substitution {
    fn parse(op: &str) -> Result<Self> {
        let bad = |reason: &str| Error::InvalidSubstitution {
            op: op.to_owned(),
            reason: reason.to_owned(),
        };

        let rest = op.strip_prefix('s').ok_or_else(|| bad("must start with 's'"))?;
        let mut chars = rest.chars();
        let delim = chars.next().ok_or_else(|| bad("missing delimiter"))?;
        let parts: Vec<&str> = chars.as_str().split(delim).collect();
        let [pattern, replacement, flags] = parts.as_slice() else {
            return Err(bad("expected s<d>regex<d>replacement<d>[flags]"));
        };

        let re = Regex::new(pattern).map_err(|e| bad(&e.to_string()))?;
        Ok(Substitution {
            re,
            replacement: backrefs_to_groups(replacement),
            global: flags.contains('g'),
        })
    }

    fn apply(&self, value: &str) -> String {
        if self.global {
            self.re.replace_all(value, self.replacement.as_str()).into_owned()
        } else {
            self.re.replace(value, self.replacement.as_str()).into_owned()
        }
    }
}

/// Rewrite `\1`-style back-references into the `${1}` form `regex` expects,
/// escaping any literal `$`.
fn backrefs_to_groups(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    chars.next();
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some(other) => {
                    chars.next();
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '$' => out.push_str("$$"),
            other => out.push(other),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

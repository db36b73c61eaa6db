//! Condition evaluation.
//!
//! A condition is a conjunction of disjunctions.  Evaluation short-circuits
//! in both directions: the first false disjunction ends the conjunction and
//! the first true predicate ends its disjunction.
//!
//! Predicates:
//!
//! | Predicate                  | True when                                         |
//! |----------------------------|---------------------------------------------------|
//! | `else`                     | the previous sibling entry was not enabled        |
//! | `name`                     | `name` is in `CONFIG`                             |
//! | `CONFIG(value)`            | `value` is in `CONFIG`                            |
//! | `CONFIG(value, a\|b\|...)` | the last `CONFIG` entry among `a\|b\|...` is `value` |
//! | `isEmpty(var)`             | `var` is unset or has no values                   |
//! | `contains(var, value)`     | `value` is one of `var`'s values                  |
//! | `exists(path)`             | `path`, relative to `PWD`, exists                 |
//! | `infile(file, var, value)` | evaluating `file` on its own yields `var == value`|

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::var::{Environment, CONFIG};

use super::stmt::{Cond, Condition};

/// What predicates need from the surrounding evaluation.
pub trait CondContext {
    /// The environment of the file being walked.
    fn env(&self) -> &Environment;

    /// Expand a raw predicate argument.
    fn expand(&self, raw: &str) -> String;

    /// `true` if `path` (relative to the current `PWD`) exists.
    fn exists(&self, path: &str) -> bool;

    /// Evaluate `path` (relative to `PWD`) as an independent root file and
    /// return the space-joined value of `name` in the result.
    fn infile_var(&mut self, path: &str, name: &str) -> Result<String>;
}

/// Evaluate `cond` given whether the previous sibling entry was enabled.
pub fn check_condition(
    cond: &Condition,
    last_enabled: bool,
    ctx: &mut dyn CondContext,
) -> Result<bool> {
    for disjunction in cond {
        let mut any = false;
        for pred in disjunction {
            if check_predicate(pred, last_enabled, ctx)? {
                any = true;
                break;
            }
        }
        if !any {
            return Ok(false);
        }
    }
    Ok(true)
}

fn check_predicate(pred: &Cond, last_enabled: bool, ctx: &mut dyn CondContext) -> Result<bool> {
    let name = pred.call.name.as_str();
    let args: Vec<String> = pred.call.args.iter().map(|a| ctx.expand(a)).collect();

    let result = match (name, args.as_slice()) {
        ("else", []) => !last_enabled,
        (flag, []) => ctx.env().contains(CONFIG, flag),
        ("CONFIG", [value]) => ctx.env().contains(CONFIG, value),
        ("CONFIG", [value, universe]) => config_selects(ctx.env().values(CONFIG), value, universe),
        ("isEmpty", [var]) => ctx.env().is_empty_var(var),
        ("contains", [var, value]) => ctx.env().contains(var, value),
        ("exists", [path]) => ctx.exists(path),
        ("infile", [path, var, value]) => ctx.infile_var(path, var)? == *value,
        _ => {
            return Err(Error::UnknownDirective {
                name: name.to_owned(),
                args: args.len(),
            })
        }
    };
    Ok(result != pred.invert)
}

/// `CONFIG(value, universe)`: the last `CONFIG` entry that belongs to the
/// `|`-separated universe decides.  An empty universe admits every entry.
fn config_selects(config: &[String], value: &str, universe: &str) -> bool {
    let universe: HashSet<&str> = universe.split('|').filter(|s| !s.is_empty()).collect();
    config
        .iter()
        .filter(|entry| universe.is_empty() || universe.contains(entry.as_str()))
        .last()
        .is_some_and(|entry| entry == value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::stmt::FnCall;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestCtx {
        env: Environment,
        files: Vec<String>,
        infiles: HashMap<String, Environment>,
        infile_calls: usize,
    }

    impl TestCtx {
        fn with_config(flags: &[&str]) -> Self {
            let mut ctx = TestCtx::default();
            ctx.env.set(CONFIG, flags.iter().map(|s| s.to_string()).collect());
            ctx
        }
    }

    impl CondContext for TestCtx {
        fn env(&self) -> &Environment {
            &self.env
        }
        fn expand(&self, raw: &str) -> String {
            raw.replace("$$NAME", "SOURCES")
        }
        fn exists(&self, path: &str) -> bool {
            self.files.iter().any(|f| f == path)
        }
        fn infile_var(&mut self, path: &str, name: &str) -> Result<String> {
            self.infile_calls += 1;
            Ok(self.infiles.get(path).map(|e| e.joined(name)).unwrap_or_default())
        }
    }

    fn pred(name: &str, args: &[&str]) -> Cond {
        Cond {
            invert: false,
            call: FnCall::new(name, args.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn not(mut c: Cond) -> Cond {
        c.invert = true;
        c
    }

    fn check(cond: Condition, last: bool, ctx: &mut TestCtx) -> bool {
        check_condition(&cond, last, ctx).expect("condition failed")
    }

    #[test]
    fn empty_condition_is_true() {
        let mut ctx = TestCtx::default();
        assert!(check(vec![], false, &mut ctx));
    }

    #[test]
    fn else_reacts_to_previous_sibling() {
        let mut ctx = TestCtx::default();
        assert!(check(vec![vec![pred("else", &[])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("else", &[])]], true, &mut ctx));
    }

    #[test]
    fn bare_name_checks_config() {
        let mut ctx = TestCtx::with_config(&["debug", "win32"]);
        assert!(check(vec![vec![pred("win32", &[])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("unix", &[])]], false, &mut ctx));
        assert!(check(vec![vec![pred("CONFIG", &["debug"])]], false, &mut ctx));
    }

    #[test]
    fn config_universe_last_qualifying_entry_wins() {
        let mut ctx = TestCtx::with_config(&["win32", "msvc-x64", "release"]);
        let c = |v: &str| vec![vec![pred("CONFIG", &[v, "msvc-x64|msvc-x86"])]];
        assert!(check(c("msvc-x64"), false, &mut ctx));
        assert!(!check(c("win32"), false, &mut ctx));
        assert!(!check(c("msvc-x86"), false, &mut ctx));
    }

    #[test]
    fn config_universe_debug_release_toggle() {
        let mut ctx = TestCtx::with_config(&["debug", "win32", "release"]);
        let c = |v: &str| vec![vec![pred("CONFIG", &[v, "debug|release"])]];
        assert!(check(c("release"), false, &mut ctx));
        assert!(!check(c("debug"), false, &mut ctx));
    }

    #[test]
    fn config_empty_universe_admits_all_entries() {
        let mut ctx = TestCtx::with_config(&["debug", "win32"]);
        assert!(check(vec![vec![pred("CONFIG", &["win32", ""])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("CONFIG", &["debug", ""])]], false, &mut ctx));
    }

    #[test]
    fn config_universe_without_config_is_false() {
        let mut ctx = TestCtx::default();
        assert!(!check(vec![vec![pred("CONFIG", &["debug", "debug|release"])]], false, &mut ctx));
    }

    #[test]
    fn is_empty_and_contains() {
        let mut ctx = TestCtx::default();
        ctx.env.set("SOURCES", vec!["a.cpp".into()]);
        ctx.env.set("EMPTY", vec![]);
        assert!(check(vec![vec![pred("isEmpty", &["EMPTY"])]], false, &mut ctx));
        assert!(check(vec![vec![pred("isEmpty", &["UNSET"])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("isEmpty", &["SOURCES"])]], false, &mut ctx));
        assert!(check(vec![vec![pred("contains", &["SOURCES", "a.cpp"])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("contains", &["SOURCES", "b.cpp"])]], false, &mut ctx));
    }

    #[test]
    fn arguments_are_expanded() {
        let mut ctx = TestCtx::default();
        ctx.env.set("SOURCES", vec!["a.cpp".into()]);
        assert!(check(vec![vec![pred("contains", &["$$NAME", "a.cpp"])]], false, &mut ctx));
    }

    #[test]
    fn exists_uses_context() {
        let mut ctx = TestCtx::default();
        ctx.files.push("config.h".into());
        assert!(check(vec![vec![pred("exists", &["config.h"])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("exists", &["other.h"])]], false, &mut ctx));
    }

    #[test]
    fn infile_compares_joined_value() {
        let mut ctx = TestCtx::default();
        let mut nested = Environment::new();
        nested.set("TEMPLATE", vec!["lib".into()]);
        nested.set("QT", vec!["core".into(), "gui".into()]);
        ctx.infiles.insert("sub.pro".into(), nested);
        assert!(check(vec![vec![pred("infile", &["sub.pro", "TEMPLATE", "lib"])]], false, &mut ctx));
        assert!(check(vec![vec![pred("infile", &["sub.pro", "QT", "core gui"])]], false, &mut ctx));
        assert!(!check(vec![vec![pred("infile", &["sub.pro", "QT", "core"])]], false, &mut ctx));
    }

    #[test]
    fn negation_inverts_predicate() {
        let mut ctx = TestCtx::with_config(&["win32"]);
        assert!(!check(vec![vec![not(pred("win32", &[]))]], false, &mut ctx));
        assert!(check(vec![vec![not(pred("unix", &[]))]], false, &mut ctx));
    }

    #[test]
    fn conjunction_and_disjunction_short_circuit() {
        let mut ctx = TestCtx::with_config(&["unix"]);
        ctx.infiles.insert("x.pro".into(), Environment::new());
        let infile = pred("infile", &["x.pro", "A", ""]);

        // First disjunction false: the infile predicate is never reached.
        assert!(!check(vec![vec![pred("win32", &[])], vec![infile.clone()]], false, &mut ctx));
        assert_eq!(ctx.infile_calls, 0);

        // First predicate true: the rest of the disjunction is skipped.
        assert!(check(vec![vec![pred("unix", &[]), infile.clone()]], false, &mut ctx));
        assert_eq!(ctx.infile_calls, 0);

        assert!(check(vec![vec![pred("win32", &[]), infile]], false, &mut ctx));
        assert_eq!(ctx.infile_calls, 1);
    }

    #[test]
    fn unknown_predicate_is_fatal() {
        let mut ctx = TestCtx::default();
        let err = check_condition(&vec![vec![pred("equals", &["A", "B"])]], false, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownDirective { ref name, args: 2 } if name == "equals"));
    }

    #[test]
    fn wrong_arity_is_fatal() {
        let mut ctx = TestCtx::default();
        assert!(check_condition(&vec![vec![pred("isEmpty", &["A", "B"])]], false, &mut ctx).is_err());
        assert!(check_condition(&vec![vec![pred("exists", &["a", "b", "c"])]], false, &mut ctx).is_err());
    }
}

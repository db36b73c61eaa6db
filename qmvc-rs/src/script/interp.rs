//! Statement-tree walker.
//!
//! The [`Evaluator`] reads project files through a [`Host`], parses them and
//! applies their statements to an [`Environment`].  `PWD` always names the
//! directory of the file being walked: it is saved before a file is entered
//! and restored when the walk leaves it, whether or not the walk succeeded.
//!
//! Includes share the includer's environment.  Root sessions (the top-level
//! file, `infile` checks, subprojects) each start from a fresh environment
//! seeded from [`Settings`].

use std::io::Read;

use tracing::{debug, trace};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::relpath;
use crate::var::{Environment, CONFIG, PWD};

use super::cond::{check_condition, CondContext};
use super::expand::{expand, ExpandContext};
use super::stmt::{Assignment, Block, FnCall, ProParser, Stmt};

/// Variable naming the root project file of a session.
pub const ROOT_FILE: &str = "ROOT_FILE";
/// qmake's spelling of the root project file.
pub const PRO_FILE: &str = "_PRO_FILE_";
/// Directory of the root project file.
pub const PRO_FILE_PWD: &str = "_PRO_FILE_PWD_";

const READ_CHUNK: usize = 1024;

// ── Expansion scope ───────────────────────────────────────────────────────────

/// Expansion lookups against one environment.
pub struct Scope<'a> {
    pub env: &'a Environment,
    pub settings: &'a Settings,
    pub host: &'a dyn Host,
}

impl ExpandContext for Scope<'_> {
    fn var(&self, name: &str) -> String {
        self.env.joined(name)
    }

    fn property(&self, name: &str) -> String {
        self.settings.property(name).to_owned()
    }

    fn env_var(&self, name: &str) -> String {
        self.host.env_var(name).unwrap_or_default()
    }
}

impl Scope<'_> {
    pub fn expand(&self, raw: &str) -> String {
        expand(raw, self)
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

pub struct Evaluator<'h> {
    host: &'h dyn Host,
    settings: &'h Settings,
    /// Extra `CONFIG` flags appended after the defaults in every root session.
    extra_config: Vec<String>,
    depth: usize,
}

impl<'h> Evaluator<'h> {
    pub fn new(host: &'h dyn Host, settings: &'h Settings) -> Self {
        Evaluator { host, settings, extra_config: Vec::new(), depth: 0 }
    }

    /// Add `CONFIG` flags to every root session (e.g. from the command line).
    pub fn with_config(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.extra_config.extend(flags);
        self
    }

    pub fn host(&self) -> &'h dyn Host {
        self.host
    }

    pub fn settings(&self) -> &'h Settings {
        self.settings
    }

    /// Expansion scope over `env`.
    pub fn scope<'a>(&'a self, env: &'a Environment) -> Scope<'a> {
        Scope { env, settings: self.settings, host: self.host }
    }

    /// The environment a root session starts from.
    pub fn seed_environment(&self, root_file: &str) -> Environment {
        let mut env = Environment::new();
        let mut config = self.settings.default_config.clone();
        config.extend(self.extra_config.iter().cloned());
        env.set(CONFIG, config);
        env.set(ROOT_FILE, vec![root_file.to_owned()]);
        env.set(PRO_FILE, vec![root_file.to_owned()]);
        env.set(PRO_FILE_PWD, vec![relpath::parent(root_file).to_owned()]);
        env
    }

    /// Evaluate `fname` as an independent root session.
    pub fn process_root_file(&mut self, fname: &str) -> Result<Environment> {
        let fname = relpath::absolutize(fname, "");
        let mut env = self.seed_environment(&fname);
        self.process_file(&fname, &mut env)?;
        Ok(env)
    }

    /// Walk `fname` into `env`, with `PWD` set to the file's directory for
    /// the duration.
    pub fn process_file(&mut self, fname: &str, env: &mut Environment) -> Result<()> {
        self.enter(fname)?;
        let saved_pwd = env.unset(PWD);
        env.set(PWD, vec![relpath::parent(fname).to_owned()]);

        let result = self.load(fname).and_then(|block| self.walk_block(&block, env));

        match saved_pwd {
            Some(pwd) => env.set(PWD, pwd),
            None => {
                env.unset(PWD);
            }
        }
        self.leave();
        result
    }

    /// Count one level of nesting, failing past the configured bound.
    pub fn enter(&mut self, path: &str) -> Result<()> {
        if self.depth >= self.settings.max_depth {
            return Err(Error::RecursionLimit {
                path: path.to_owned(),
                limit: self.settings.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn load(&self, fname: &str) -> Result<Block> {
        debug!(file = fname, depth = self.depth, "processing");
        let missing = |source| Error::MissingFile { path: fname.to_owned(), source };

        let mut reader = self.host.open(fname).map_err(missing)?;
        let mut parser = ProParser::new(fname);
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf).map_err(missing)?;
            if n == 0 {
                break;
            }
            parser.push_data(&buf[..n]);
        }
        parser.finish()
    }

    // ── Walking ───────────────────────────────────────────────────────────────

    /// Run a guarded block.  `else` sees only the entry directly before it.
    pub fn walk_block(&mut self, block: &Block, env: &mut Environment) -> Result<()> {
        let mut last_enabled = false;
        for entry in &block.stmts {
            last_enabled = {
                let mut ctx = CondScope { eval: self, env: &*env };
                check_condition(&entry.cond, last_enabled, &mut ctx)?
            };
            if last_enabled {
                self.exec_stmt(&entry.stmt, env)?;
            }
        }
        Ok(())
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt, env: &mut Environment) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.walk_block(block, env),
            Stmt::Assign(assign) => self.exec_assign(assign, env),
            Stmt::Call(call) => self.exec_call(call, env),
        }
    }

    fn exec_assign(&mut self, a: &Assignment, env: &mut Environment) -> Result<()> {
        let values: Vec<String> = {
            let scope = self.scope(env);
            a.values.iter().map(|v| scope.expand(v)).collect()
        };
        trace!(name = %a.name, op = ?a.op, ?values, "assign");
        env.apply(&a.name, a.op, values)
    }

    fn exec_call(&mut self, call: &FnCall, env: &mut Environment) -> Result<()> {
        match (call.name.as_str(), call.args.as_slice()) {
            ("include", [arg]) => {
                let target = self.scope(env).expand(arg);
                let path = relpath::absolutize(&target, &env.joined(PWD));
                debug!(file = %path, "include");
                self.process_file(&path, env)
            }
            (name, args) => Err(Error::UnknownDirective {
                name: name.to_owned(),
                args: args.len(),
            }),
        }
    }
}

// ── Condition context ─────────────────────────────────────────────────────────

struct CondScope<'a, 'h> {
    eval: &'a mut Evaluator<'h>,
    env: &'a Environment,
}

impl CondScope<'_, '_> {
    fn resolve(&self, path: &str) -> String {
        relpath::absolutize(path, &self.env.joined(PWD))
    }
}

impl CondContext for CondScope<'_, '_> {
    fn env(&self) -> &Environment {
        self.env
    }

    fn expand(&self, raw: &str) -> String {
        self.eval.scope(self.env).expand(raw)
    }

    fn exists(&self, path: &str) -> bool {
        self.eval.host.exists(&self.resolve(path))
    }

    fn infile_var(&mut self, path: &str, name: &str) -> Result<String> {
        let path = self.resolve(path);
        let nested = self.eval.process_root_file(&path)?;
        Ok(nested.joined(name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

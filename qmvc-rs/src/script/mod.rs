//! Project-file language.
//!
//! - [`stmt`]: statement tree and the streaming parser that builds it
//! - [`expand`]: `$$name`, `$${name}`, `$$[prop]` and `$$(ENV)` substitution
//! - [`cond`]: condition predicates (`CONFIG`, `isEmpty`, `exists`, ...)
//! - [`interp`]: the tree walker that applies statements to an environment
//!
//! # Quick start
//!
//! ```rust
//! use qmvc::config::Settings;
//! use qmvc::host::MemHost;
//! use qmvc::script::Evaluator;
//!
//! let host = MemHost::new();
//! host.add_file("/p/app.pro", "win32: SOURCES += main.cpp\n");
//! let settings = Settings::default();
//! let env = Evaluator::new(&host, &settings).process_root_file("/p/app.pro").unwrap();
//! assert_eq!(env.values("SOURCES"), ["main.cpp"]);
//! ```

pub mod cond;
pub mod expand;
pub mod interp;
pub mod stmt;

pub use interp::Evaluator;
pub use stmt::{parse_project, Block, Stmt};

//! qmake project evaluation and Visual Studio project generation.
//!
//! A root `.pro` file is parsed and walked into an [`var::Environment`]
//! ([`script`]), its `TEMPLATE` decides what happens next ([`project`]), and
//! `app` projects become `.vcxproj` / `.vcxproj.filters` documents
//! ([`vcxproj`]).  All file and environment access goes through
//! [`host::Host`].

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod project;
pub mod relpath;
pub mod script;
pub mod var;
pub mod vcxproj;
pub mod xml;

pub use error::{Error, Result};

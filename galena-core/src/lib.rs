//! Galena Core - SMT-LIB v2 front end for the Galena bit-vector solver
//!
//! This crate parses SMT-LIB v2 scripts and drives a solver through the
//! opaque [`Backend`] capability:
//! - a byte [`lexer`](crate::lexer) with `(line, column)` provenance,
//! - a scoped [`symbol table`](crate::symtab) with shadowing semantics,
//! - a shift/reduce [`term parser`](crate::term) with an integrated type
//!   checker for the combined BV/Array/FP/UF theory,
//! - a [`command driver`](crate::script) covering assertions, declarations,
//!   `push`/`pop`, `check-sat-assuming`, `get-value` and model parsing,
//! - an SMT-LIB v2 [`response printer`](crate::emit).
//!
//! The crate ships [`NodeBackend`], a reference backend that builds and
//! type-checks the term graph without deciding anything; a real solver
//! plugs in by implementing [`Backend`].
//!
//! # Examples
//!
//! ## Parsing a script
//!
//! ```
//! use galena_core::{NodeBackend, Parser};
//!
//! let script = "\
//! (set-logic QF_BV)
//! (declare-const x (_ BitVec 8))
//! (assert (= x #x2a))
//! (exit)
//! ";
//! let mut backend = NodeBackend::new();
//! let mut out = Vec::new();
//! let result = Parser::new(&mut backend, script, "<demo>", &mut out)
//!     .parse()
//!     .unwrap();
//! assert_eq!(result.logic.to_string(), "QF_BV");
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "success\nsuccess\nsuccess\nsuccess\n"
//! );
//! ```
//!
//! ## Driving a decision procedure
//!
//! ```
//! use galena_core::{NodeBackend, Parser, SatResult};
//!
//! let mut backend = NodeBackend::new();
//! backend.queue_result(SatResult::Sat);
//! let mut out = Vec::new();
//! let script = "(declare-const p (_ BitVec 1))\n(assert p)\n(check-sat)\n";
//! let result = Parser::new(&mut backend, script, "<demo>", &mut out)
//!     .parse()
//!     .unwrap();
//! assert_eq!(result.nsatcalls, 1);
//! assert!(String::from_utf8(out).unwrap().ends_with("sat\n"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod node;
pub mod script;
pub mod sort;
pub mod symtab;
pub mod term;
pub mod token;

pub use backend::{Backend, NodeId, RoundingMode, SatResult, SortId};
pub use emit::Printer;
pub use error::{Coo, GalenaError, Result};
pub use lexer::Lexer;
pub use node::NodeBackend;
pub use script::{ParseResult, Parser, ParserOpts};
pub use symtab::{SymbolId, SymbolTable};
pub use token::{Logic, Tag, TagClass};

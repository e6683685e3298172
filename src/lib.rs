// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SQL lexer and parser for a MySQL-flavored dialect.
//!
//! [`parse`] turns one statement into a typed syntax tree; formatting any
//! node (or just `to_string`) emits its canonical SQL, which re-parses to a
//! structurally equal tree:
//!
//! ```
//! use mysqlparse::parse;
//!
//! let sql = "SELECT a, b FROM t WHERE a = 1";
//! let ast = parse(sql).unwrap();
//! assert_eq!(ast.to_string(), "select a, b from t where a = 1");
//! ```
//!
//! The dialect covers `select` (with set operations), `insert`, `update`,
//! `delete`, `set`, a shallow form of table DDL, and opaque
//! `show`/`describe`/`explain`. Named bind variables use `:name` for
//! scalars and `::name` for lists; [`format::format_with_list_args`] can
//! rewrite literal `in (:a, :b)` tuples into list arguments for execution
//! with varying cardinalities.

#![warn(clippy::all)]

pub mod ast;
pub mod format;
pub mod keywords;
pub mod parser;
pub mod tokenizer;

#[doc(hidden)]
pub mod test_utils;

pub use crate::parser::{parse, parse_bytes, ParserError};

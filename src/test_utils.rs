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

//! Helpers for the test suite. Not part of the public API; the layout of
//! this module may change between patch releases.

use crate::ast::{ColName, Expr, SelectExpr, Statement, ValExpr};
use crate::format::to_sql_string;
use crate::parser::parse;

/// Parses `sql`, checks that its canonical form is exactly `canonical`,
/// and that the canonical form re-parses to a structurally equal tree
/// whose canonical form is again `canonical` (the formatter fixed point).
pub fn one_statement_parses_to(sql: &str, canonical: &str) -> Statement {
    let stmt = parse(sql).unwrap_or_else(|e| panic!("parse failed for {sql:?}: {e}"));
    assert_eq!(to_sql_string(&stmt), canonical, "canonical form of {sql:?}");
    let reparsed =
        parse(canonical).unwrap_or_else(|e| panic!("reparse failed for {canonical:?}: {e}"));
    assert_eq!(stmt, reparsed, "round-trip of {sql:?}");
    assert_eq!(to_sql_string(&reparsed), canonical);
    reparsed
}

/// Ensures that `sql` is already in canonical form and round-trips.
pub fn verified_stmt(sql: &str) -> Statement {
    one_statement_parses_to(sql, sql)
}

/// A bare column reference.
pub fn col(name: &str) -> ValExpr {
    ValExpr::ColName(ColName {
        name: name.as_bytes().to_vec(),
        qualifier: None,
    })
}

/// A qualified column reference.
pub fn qual_col(qualifier: &str, name: &str) -> ValExpr {
    ValExpr::ColName(ColName {
        name: name.as_bytes().to_vec(),
        qualifier: Some(qualifier.as_bytes().to_vec()),
    })
}

/// A numeric literal.
pub fn num(text: &str) -> ValExpr {
    ValExpr::NumVal(text.as_bytes().to_vec())
}

/// A string literal.
pub fn sval(text: &str) -> ValExpr {
    ValExpr::StrVal(text.as_bytes().to_vec())
}

/// An unaliased select expression.
pub fn select_expr(expr: ValExpr) -> SelectExpr {
    SelectExpr::Expr {
        expr: Expr::Val(expr),
        alias: None,
    }
}

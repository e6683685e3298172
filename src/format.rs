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

//! Canonical SQL formatting.
//!
//! Every AST node knows how to write its canonical form into a
//! [`TrackedBuffer`]; [`to_bytes`] and [`to_sql_string`] run that from a
//! fresh buffer. The buffer output is bytes, not a `String`, because
//! identifiers and literals may carry non-UTF-8 bytes that must be echoed
//! bit-exactly.
//!
//! The buffer records where bind variables land in the output
//! ([`TrackedBuffer::bind_locations`]) and can optionally rewrite
//! all-bind-variable value tuples into fresh list arguments
//! ([`format_with_list_args`]), so `in (:a, :b)` becomes `in ::arg1` with a
//! side table mapping `arg1` back to the original tuple.

use std::collections::BTreeMap;

use crate::ast::{ValExpr, ValTuple};
use crate::keywords;

/// A node of the syntax tree that can emit its canonical SQL form.
pub trait SqlNode {
    fn fmt(&self, buf: &mut TrackedBuffer);
}

impl<T: SqlNode + ?Sized> SqlNode for &T {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        (**self).fmt(buf)
    }
}

impl<T: SqlNode> SqlNode for Box<T> {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        (**self).fmt(buf)
    }
}

/// Position of a bind variable in the formatted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindLocation {
    pub offset: usize,
    pub length: usize,
}

/// An output sink for canonical SQL that tracks bind-variable positions.
#[derive(Debug, Default)]
pub struct TrackedBuffer {
    buf: Vec<u8>,
    bind_locations: Vec<BindLocation>,
    rewrite: Option<ListArgRewrite>,
}

#[derive(Debug, Default)]
struct ListArgRewrite {
    next: usize,
    bindings: BTreeMap<String, ValTuple>,
}

impl TrackedBuffer {
    pub fn new() -> Self {
        TrackedBuffer::default()
    }

    /// A buffer that replaces every all-bind-variable [`ValTuple`] with a
    /// fresh list argument (`::arg1`, `::arg2`, ...) as it formats.
    pub fn rewriting_list_args() -> Self {
        TrackedBuffer {
            rewrite: Some(ListArgRewrite::default()),
            ..TrackedBuffer::default()
        }
    }

    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_node(&mut self, node: &impl SqlNode) {
        node.fmt(self);
    }

    pub fn write_comma_separated<T: SqlNode>(&mut self, nodes: &[T]) {
        let mut delim = "";
        for node in nodes {
            self.write_str(delim);
            delim = ", ";
            node.fmt(self);
        }
    }

    /// Writes a bind variable (`:name` or `::name` bytes) and records its
    /// position for callers that splice values in later.
    pub fn write_arg(&mut self, arg: &[u8]) {
        self.bind_locations.push(BindLocation {
            offset: self.buf.len(),
            length: arg.len(),
        });
        self.write_bytes(arg);
    }

    /// Writes a bare identifier, backtick-escaping it when it collides with
    /// the keyword table or is not identifier-shaped.
    pub fn write_identifier(&mut self, ident: &[u8]) {
        if keywords::is_keyword(ident) || !is_identifier_shaped(ident) {
            self.write_byte(b'`');
            for &b in ident {
                if b == b'`' {
                    self.write_byte(b'`');
                }
                self.write_byte(b);
            }
            self.write_byte(b'`');
        } else {
            self.write_bytes(ident);
        }
    }

    /// Writes a string literal, re-encoded with the minimal escape set.
    pub fn write_string_literal(&mut self, value: &[u8]) {
        self.write_byte(b'\'');
        for &b in value {
            match b {
                0x00 => self.write_str("\\0"),
                b'\n' => self.write_str("\\n"),
                b'\r' => self.write_str("\\r"),
                0x1a => self.write_str("\\Z"),
                b'\t' => self.write_str("\\t"),
                0x08 => self.write_str("\\b"),
                b'\\' => self.write_str("\\\\"),
                b'\'' => self.write_str("''"),
                other => self.write_byte(other),
            }
        }
        self.write_byte(b'\'');
    }

    /// Intercepts a [`ValTuple`] when list-argument rewriting is on.
    /// Returns true if the tuple was replaced by a generated list argument.
    pub(crate) fn rewrite_tuple(&mut self, tuple: &ValTuple) -> bool {
        let all_args = !tuple.0.is_empty()
            && tuple.0.iter().all(|v| matches!(v, ValExpr::ValArg(_)));
        if !all_args {
            return false;
        }
        let rewrite = match &mut self.rewrite {
            Some(r) => r,
            None => return false,
        };
        rewrite.next += 1;
        let name = format!("arg{}", rewrite.next);
        rewrite.bindings.insert(name.clone(), tuple.clone());
        let mut arg = Vec::with_capacity(name.len() + 2);
        arg.extend_from_slice(b"::");
        arg.extend_from_slice(name.as_bytes());
        self.write_arg(&arg);
        true
    }

    pub fn bind_locations(&self) -> &[BindLocation] {
        &self.bind_locations
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Consumes the buffer, returning the formatted bytes and the side table
    /// of generated list arguments.
    pub fn into_parts(self) -> (Vec<u8>, BTreeMap<String, ValTuple>) {
        let bindings = self.rewrite.map(|r| r.bindings).unwrap_or_default();
        (self.buf, bindings)
    }
}

fn is_identifier_shaped(ident: &[u8]) -> bool {
    let first = match ident.first() {
        Some(b) => *b,
        None => return false,
    };
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return false;
    }
    ident[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

/// Canonical SQL bytes of any AST node.
pub fn to_bytes(node: &impl SqlNode) -> Vec<u8> {
    let mut buf = TrackedBuffer::new();
    node.fmt(&mut buf);
    buf.into_bytes()
}

/// Canonical SQL of any AST node, lossily decoded as UTF-8.
pub fn to_sql_string(node: &impl SqlNode) -> String {
    String::from_utf8_lossy(&to_bytes(node)).into_owned()
}

/// Formats `node` with list-argument rewriting on: every value tuple whose
/// elements are all scalar bind variables is replaced by a generated
/// `::argN` placeholder, returned in the side table alongside the SQL.
pub fn format_with_list_args(node: &impl SqlNode) -> (Vec<u8>, BTreeMap<String, ValTuple>) {
    let mut buf = TrackedBuffer::rewriting_list_args();
    node.fmt(&mut buf);
    buf.into_parts()
}

/// Implements `fmt::Display` (lossy UTF-8 over the canonical bytes) for AST
/// node types.
macro_rules! impl_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl core::fmt::Display for $ty {
                fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.write_str(&$crate::format::to_sql_string(self))
                }
            }
        )*
    };
}
pub(crate) use impl_display;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_colliding_with_keywords_are_escaped() {
        let mut buf = TrackedBuffer::new();
        buf.write_identifier(b"name");
        buf.write_byte(b' ');
        buf.write_identifier(b"order");
        buf.write_byte(b' ');
        buf.write_identifier(b"odd name");
        assert_eq!(buf.into_bytes(), b"name `order` `odd name`");
    }

    #[test]
    fn backticks_inside_identifiers_are_doubled() {
        let mut buf = TrackedBuffer::new();
        buf.write_identifier(b"a`b");
        assert_eq!(buf.into_bytes(), b"`a``b`");
    }

    #[test]
    fn string_literals_use_the_minimal_escape_set() {
        let mut buf = TrackedBuffer::new();
        buf.write_string_literal(b"don't\n\\x\x1a");
        assert_eq!(buf.into_bytes(), b"'don''t\\n\\\\x\\Z'");
    }

    #[test]
    fn bind_locations_are_recorded() {
        let mut buf = TrackedBuffer::new();
        buf.write_str("select * from t where id = ");
        buf.write_arg(b":id");
        assert_eq!(
            buf.bind_locations(),
            &[BindLocation {
                offset: 27,
                length: 3
            }]
        );
        assert_eq!(buf.into_bytes(), b"select * from t where id = :id");
    }

    #[test]
    fn tuple_rewriting_only_touches_all_bind_var_tuples() {
        let mixed = ValTuple(vec![
            ValExpr::ValArg(b":a".to_vec()),
            ValExpr::NumVal(b"1".to_vec()),
        ]);
        let args = ValTuple(vec![
            ValExpr::ValArg(b":a".to_vec()),
            ValExpr::ValArg(b":b".to_vec()),
        ]);

        let mut buf = TrackedBuffer::rewriting_list_args();
        assert!(!buf.rewrite_tuple(&mixed));
        assert!(buf.rewrite_tuple(&args));
        let (sql, bindings) = buf.into_parts();
        assert_eq!(sql, b"::arg1");
        assert_eq!(bindings.get("arg1"), Some(&args));

        // without the rewriting mode nothing is intercepted
        let mut buf = TrackedBuffer::new();
        assert!(!buf.rewrite_tuple(&args));
    }
}

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

//! DDL nodes.
//!
//! DDL parsing is deliberately shallow: a [`Ddl`] names the action and the
//! tables involved and nothing else. The one richer form is
//! [`CreateTable`], built when a `create table` carries a column list.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::format::{impl_display, SqlNode, TrackedBuffer};

/// A shallow DDL statement.
///
/// Which name fields are populated depends on the action:
///
/// | action   | `table`     | `new_name`   |
/// |----------|-------------|--------------|
/// | `create` | unset       | created name |
/// | `alter`  | target name | target name  |
/// | `drop`   | target name | unset        |
/// | `rename` | old name    | new name     |
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ddl {
    pub action: DdlAction,
    pub table: Option<Vec<u8>>,
    pub new_name: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DdlAction {
    Create,
    Alter,
    Drop,
    Rename,
}

impl SqlNode for Ddl {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self.action {
            DdlAction::Create => {
                buf.write_str("create table ");
                if let Some(new_name) = &self.new_name {
                    buf.write_identifier(new_name);
                }
            }
            DdlAction::Alter => {
                buf.write_str("alter table ");
                if let Some(table) = &self.table {
                    buf.write_identifier(table);
                }
            }
            DdlAction::Drop => {
                buf.write_str("drop table ");
                if let Some(table) = &self.table {
                    buf.write_identifier(table);
                }
            }
            DdlAction::Rename => {
                buf.write_str("rename table ");
                if let Some(table) = &self.table {
                    buf.write_identifier(table);
                }
                buf.write_str(" to ");
                if let Some(new_name) = &self.new_name {
                    buf.write_identifier(new_name);
                }
            }
        }
    }
}

/// A `create table` with a column list.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CreateTable {
    pub name: Vec<u8>,
    pub columns: Vec<ColumnDefinition>,
}

impl SqlNode for CreateTable {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_str("create table ");
        buf.write_identifier(&self.name);
        buf.write_str(" (");
        buf.write_comma_separated(&self.columns);
        buf.write_byte(b')');
    }
}

/// One column of a [`CreateTable`]: a name, a type keyword, and a flat list
/// of canonicalized attribute strings (`not null`, `default 'x'`,
/// `auto_increment`, ...).
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnDefinition {
    pub name: Vec<u8>,
    pub col_type: Vec<u8>,
    pub attrs: Vec<Vec<u8>>,
}

impl SqlNode for ColumnDefinition {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_identifier(&self.name);
        buf.write_byte(b' ');
        buf.write_bytes(&self.col_type);
        for attr in &self.attrs {
            buf.write_byte(b' ');
            buf.write_bytes(attr);
        }
    }
}

impl_display!(Ddl, CreateTable, ColumnDefinition);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_display_per_action() {
        let create = Ddl {
            action: DdlAction::Create,
            table: None,
            new_name: Some(b"t".to_vec()),
        };
        assert_eq!("create table t", create.to_string());

        let alter = Ddl {
            action: DdlAction::Alter,
            table: Some(b"t".to_vec()),
            new_name: Some(b"t".to_vec()),
        };
        assert_eq!("alter table t", alter.to_string());

        let drop = Ddl {
            action: DdlAction::Drop,
            table: Some(b"t".to_vec()),
            new_name: None,
        };
        assert_eq!("drop table t", drop.to_string());

        let rename = Ddl {
            action: DdlAction::Rename,
            table: Some(b"a".to_vec()),
            new_name: Some(b"b".to_vec()),
        };
        assert_eq!("rename table a to b", rename.to_string());
    }

    #[test]
    fn create_table_display() {
        let create = CreateTable {
            name: b"t".to_vec(),
            columns: vec![
                ColumnDefinition {
                    name: b"id".to_vec(),
                    col_type: b"bigint".to_vec(),
                    attrs: vec![b"not null".to_vec(), b"auto_increment".to_vec()],
                },
                ColumnDefinition {
                    name: b"name".to_vec(),
                    col_type: b"varchar".to_vec(),
                    attrs: vec![b"default 'x'".to_vec()],
                },
            ],
        };
        assert_eq!(
            "create table t (id bigint not null auto_increment, name varchar default 'x')",
            create.to_string()
        );
    }
}

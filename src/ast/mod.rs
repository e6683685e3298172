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

//! SQL Abstract Syntax Tree (AST) types
//!
//! Nodes are built by the parser and are immutable afterwards. Identifier
//! and literal text is raw bytes (`Vec<u8>`), never decoded: SQL literals
//! may contain non-UTF-8 bytes and the formatter echoes them bit-exactly.
//!
//! Every node implements [`SqlNode`], writing its canonical SQL form into a
//! [`TrackedBuffer`], and `fmt::Display` (lossy UTF-8) on top of that. The
//! canonical form lowercases keywords, separates list elements with `", "`,
//! and backtick-escapes identifiers that collide with the keyword table;
//! re-parsing it yields a structurally equal tree.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::format::{impl_display, SqlNode, TrackedBuffer};
use crate::parser::ParserError;

pub use self::ddl::{ColumnDefinition, CreateTable, Ddl, DdlAction};

mod ddl;

/// A SQL statement, the root of every parse.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Statement {
    Select(Box<Select>),
    Union(Box<Union>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    Set(Box<Set>),
    Ddl(Box<Ddl>),
    CreateTable(Box<CreateTable>),
    /// `show`/`describe`/`explain`: recognized but kept opaque, no payload
    Other,
}

impl SqlNode for Statement {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            Statement::Select(s) => s.fmt(buf),
            Statement::Union(u) => u.fmt(buf),
            Statement::Insert(i) => i.fmt(buf),
            Statement::Update(u) => u.fmt(buf),
            Statement::Delete(d) => d.fmt(buf),
            Statement::Set(s) => s.fmt(buf),
            Statement::Ddl(d) => d.fmt(buf),
            Statement::CreateTable(c) => c.fmt(buf),
            // no payload is retained, so the canonical form is the shortest
            // statement that parses back to `Other`
            Statement::Other => buf.write_str("show"),
        }
    }
}

/// A statement that can stand on either side of a set operation and inside
/// a subquery: a plain `select` or a nested `union`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectStatement {
    Select(Box<Select>),
    Union(Box<Union>),
}

impl SqlNode for SelectStatement {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            SelectStatement::Select(s) => s.fmt(buf),
            SelectStatement::Union(u) => u.fmt(buf),
        }
    }
}

impl From<SelectStatement> for Statement {
    fn from(stmt: SelectStatement) -> Statement {
        match stmt {
            SelectStatement::Select(s) => Statement::Select(s),
            SelectStatement::Union(u) => Statement::Union(u),
        }
    }
}

/// Leading comments of a statement, raw bytes with delimiters included.
#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Comments(pub Vec<Vec<u8>>);

impl SqlNode for Comments {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        for comment in &self.0 {
            buf.write_bytes(comment);
            // line comments keep their newline; anything else needs a
            // separator so the statement verb is not swallowed
            if !comment.ends_with(b"\n") {
                buf.write_byte(b' ');
            }
        }
    }
}

/// A `select` statement.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Select {
    pub comments: Comments,
    pub distinct: bool,
    pub select_exprs: Vec<SelectExpr>,
    pub from: Vec<TableExpr>,
    pub where_clause: Option<Where>,
    pub time_range: Option<TimeRange>,
    pub group_by: Vec<ValExpr>,
    pub having: Option<Where>,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
    pub lock: Lock,
}

impl SqlNode for Select {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.comments.fmt(buf);
        buf.write_str("select ");
        if self.distinct {
            buf.write_str("distinct ");
        }
        buf.write_comma_separated(&self.select_exprs);
        buf.write_str(" from ");
        buf.write_comma_separated(&self.from);
        if let Some(w) = &self.where_clause {
            w.fmt(buf);
        }
        if let Some(t) = &self.time_range {
            t.fmt(buf);
        }
        if !self.group_by.is_empty() {
            buf.write_str(" group by ");
            buf.write_comma_separated(&self.group_by);
        }
        if let Some(h) = &self.having {
            h.fmt(buf);
        }
        if !self.order_by.is_empty() {
            buf.write_str(" order by ");
            buf.write_comma_separated(&self.order_by);
        }
        if let Some(l) = &self.limit {
            l.fmt(buf);
        }
        self.lock.fmt(buf);
    }
}

/// A set operation over two select statements. Chains nest into the left
/// operand, so `a union b union c` is `union(union(a, b), c)`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Union {
    pub op: UnionOp,
    pub left: SelectStatement,
    pub right: SelectStatement,
}

impl SqlNode for Union {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.left.fmt(buf);
        buf.write_byte(b' ');
        buf.write_str(self.op.as_str());
        buf.write_byte(b' ');
        self.right.fmt(buf);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnionOp {
    Union,
    UnionAll,
    Minus,
    Except,
    Intersect,
}

impl UnionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnionOp::Union => "union",
            UnionOp::UnionAll => "union all",
            UnionOp::Minus => "minus",
            UnionOp::Except => "except",
            UnionOp::Intersect => "intersect",
        }
    }
}

/// An `insert` statement.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Insert {
    pub comments: Comments,
    pub table: TableName,
    pub columns: Option<Columns>,
    pub rows: InsertRows,
    pub on_dup: Vec<UpdateExpr>,
}

impl SqlNode for Insert {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.comments.fmt(buf);
        buf.write_str("insert into ");
        self.table.fmt(buf);
        if let Some(columns) = &self.columns {
            columns.fmt(buf);
        }
        buf.write_byte(b' ');
        self.rows.fmt(buf);
        if !self.on_dup.is_empty() {
            buf.write_str(" on duplicate key update ");
            buf.write_comma_separated(&self.on_dup);
        }
    }
}

/// The row source of an `insert`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InsertRows {
    Select(Box<Select>),
    Union(Box<Union>),
    Values(Vec<RowTuple>),
}

impl SqlNode for InsertRows {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            InsertRows::Select(s) => s.fmt(buf),
            InsertRows::Union(u) => u.fmt(buf),
            InsertRows::Values(rows) => {
                buf.write_str("values ");
                buf.write_comma_separated(rows);
            }
        }
    }
}

/// One row of a `values` list.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RowTuple {
    Tuple(ValTuple),
    Subquery(Subquery),
}

impl SqlNode for RowTuple {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            RowTuple::Tuple(t) => t.fmt(buf),
            RowTuple::Subquery(s) => s.fmt(buf),
        }
    }
}

/// An `update` statement.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Update {
    pub comments: Comments,
    pub table: TableName,
    pub exprs: Vec<UpdateExpr>,
    pub where_clause: Option<Where>,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
}

impl SqlNode for Update {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.comments.fmt(buf);
        buf.write_str("update ");
        self.table.fmt(buf);
        buf.write_str(" set ");
        buf.write_comma_separated(&self.exprs);
        if let Some(w) = &self.where_clause {
            w.fmt(buf);
        }
        if !self.order_by.is_empty() {
            buf.write_str(" order by ");
            buf.write_comma_separated(&self.order_by);
        }
        if let Some(l) = &self.limit {
            l.fmt(buf);
        }
    }
}

/// A `delete` statement.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Delete {
    pub comments: Comments,
    pub table: TableName,
    pub where_clause: Option<Where>,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
}

impl SqlNode for Delete {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.comments.fmt(buf);
        buf.write_str("delete from ");
        self.table.fmt(buf);
        if let Some(w) = &self.where_clause {
            w.fmt(buf);
        }
        if !self.order_by.is_empty() {
            buf.write_str(" order by ");
            buf.write_comma_separated(&self.order_by);
        }
        if let Some(l) = &self.limit {
            l.fmt(buf);
        }
    }
}

/// A `set` statement: a list of `name = value` assignments.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Set {
    pub comments: Comments,
    pub exprs: Vec<UpdateExpr>,
}

impl SqlNode for Set {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.comments.fmt(buf);
        buf.write_str("set ");
        buf.write_comma_separated(&self.exprs);
    }
}

/// One `column = value` assignment in `update`, `set`, or
/// `on duplicate key update`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateExpr {
    pub name: ColName,
    pub expr: ValExpr,
}

impl SqlNode for UpdateExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.name.fmt(buf);
        buf.write_str(" = ");
        self.expr.fmt(buf);
    }
}

/// A `where` or `having` clause. The contained expression always exists:
/// an absent clause is `Option::None`, never an empty node.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Where {
    pub typ: WhereType,
    pub expr: BoolExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WhereType {
    Where,
    Having,
}

impl SqlNode for Where {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self.typ {
            WhereType::Where => buf.write_str(" where "),
            WhereType::Having => buf.write_str(" having "),
        }
        self.expr.fmt(buf);
    }
}

/// The nonstandard `timerange from [, to]` clause.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    pub from: ValExpr,
    pub to: Option<ValExpr>,
}

impl SqlNode for TimeRange {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_str(" timerange ");
        self.from.fmt(buf);
        if let Some(to) = &self.to {
            buf.write_str(", ");
            to.fmt(buf);
        }
    }
}

/// One element of an `order by` list. The direction is always explicit in
/// the canonical form, `asc` being the default.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    pub expr: ValExpr,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl SqlNode for Order {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.expr.fmt(buf);
        match self.direction {
            OrderDirection::Asc => buf.write_str(" asc"),
            OrderDirection::Desc => buf.write_str(" desc"),
        }
    }
}

/// A `limit [offset,] rowcount` clause. The grammar admits arbitrary value
/// expressions here; [`Limit::limits`] is the checked extraction.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limit {
    pub offset: Option<ValExpr>,
    pub rowcount: ValExpr,
}

impl SqlNode for Limit {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_str(" limit ");
        if let Some(offset) = &self.offset {
            offset.fmt(buf);
            buf.write_str(", ");
        }
        self.rowcount.fmt(buf);
    }
}

/// An extracted limit value: a non-negative number or a bind-variable name
/// (without the leading `:`).
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitVal {
    Number(i64),
    Arg(Vec<u8>),
}

impl Limit {
    /// Extracts the offset and rowcount as numbers or bind-variable names.
    ///
    /// Negative numbers and any expression that is neither a plain integer
    /// nor a scalar bind variable are errors.
    pub fn limits(&self) -> Result<(Option<LimitVal>, LimitVal), ParserError> {
        let offset = match &self.offset {
            Some(v) => Some(extract_limit_val(v, "offset")?),
            None => None,
        };
        let rowcount = extract_limit_val(&self.rowcount, "limit")?;
        Ok((offset, rowcount))
    }
}

fn extract_limit_val(val: &ValExpr, what: &str) -> Result<LimitVal, ParserError> {
    let node = if what == "limit" { "rowcount" } else { what };
    match val {
        ValExpr::NumVal(bytes) => {
            let text = std::str::from_utf8(bytes).ok();
            match text.and_then(|t| t.parse::<i64>().ok()) {
                Some(n) if n >= 0 => Ok(LimitVal::Number(n)),
                Some(n) => Err(ParserError::ParserError(format!("negative {what}: {n}"))),
                None => Err(ParserError::ParserError(format!(
                    "unexpected node for {node}"
                ))),
            }
        }
        ValExpr::ValArg(arg) => Ok(LimitVal::Arg(arg[1..].to_vec())),
        _ => Err(ParserError::ParserError(format!(
            "unexpected node for {node}"
        ))),
    }
}

/// The locking clause of a `select`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Lock {
    #[default]
    None,
    ForUpdate,
    ShareMode,
}

impl SqlNode for Lock {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            Lock::None => {}
            Lock::ForUpdate => buf.write_str(" for update"),
            Lock::ShareMode => buf.write_str(" lock in share mode"),
        }
    }
}

/// One element of a select list.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectExpr {
    /// `*` or `table.*`
    Star { table: Option<Vec<u8>> },
    /// Any expression, optionally aliased
    Expr { expr: Expr, alias: Option<Vec<u8>> },
}

impl SqlNode for SelectExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            SelectExpr::Star { table } => {
                if let Some(table) = table {
                    buf.write_identifier(table);
                    buf.write_byte(b'.');
                }
                buf.write_byte(b'*');
            }
            SelectExpr::Expr { expr, alias } => {
                expr.fmt(buf);
                if let Some(alias) = alias {
                    buf.write_str(" as ");
                    buf.write_identifier(alias);
                }
            }
        }
    }
}

/// An insert column list: bare column names only, by construction. The
/// conversion to select expressions exists so the list can be formatted by
/// the select-expression printer.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Columns(pub Vec<ColName>);

impl Columns {
    pub fn as_select_exprs(&self) -> Vec<SelectExpr> {
        self.0
            .iter()
            .map(|col| SelectExpr::Expr {
                expr: Expr::Val(ValExpr::ColName(col.clone())),
                alias: None,
            })
            .collect()
    }
}

impl SqlNode for Columns {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_byte(b'(');
        buf.write_comma_separated(&self.as_select_exprs());
        buf.write_byte(b')');
    }
}

/// One element of a `from` clause.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TableExpr {
    Aliased(AliasedTableExpr),
    Paren(Box<TableExpr>),
    Join(Box<JoinTableExpr>),
}

impl SqlNode for TableExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            TableExpr::Aliased(a) => a.fmt(buf),
            TableExpr::Paren(t) => {
                buf.write_byte(b'(');
                t.fmt(buf);
                buf.write_byte(b')');
            }
            TableExpr::Join(j) => j.fmt(buf),
        }
    }
}

/// A table or subquery with optional alias and index hints.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AliasedTableExpr {
    pub expr: SimpleTableExpr,
    pub alias: Option<Vec<u8>>,
    pub hints: Option<IndexHints>,
}

impl SqlNode for AliasedTableExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.expr.fmt(buf);
        if let Some(alias) = &self.alias {
            buf.write_str(" as ");
            buf.write_identifier(alias);
        }
        if let Some(hints) = &self.hints {
            hints.fmt(buf);
        }
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SimpleTableExpr {
    Table(TableName),
    Subquery(Subquery),
}

impl SimpleTableExpr {
    /// The unqualified table name, if this is a plain unqualified table.
    pub fn table_name(&self) -> Option<&[u8]> {
        match self {
            SimpleTableExpr::Table(TableName {
                name,
                qualifier: None,
            }) => Some(name),
            _ => None,
        }
    }
}

impl SqlNode for SimpleTableExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            SimpleTableExpr::Table(t) => t.fmt(buf),
            SimpleTableExpr::Subquery(s) => s.fmt(buf),
        }
    }
}

/// A possibly-qualified table name: `t` or `db.t`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableName {
    pub name: Vec<u8>,
    pub qualifier: Option<Vec<u8>>,
}

impl SqlNode for TableName {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        if let Some(qualifier) = &self.qualifier {
            buf.write_identifier(qualifier);
            buf.write_byte(b'.');
        }
        buf.write_identifier(&self.name);
    }
}

/// A join between two table expressions.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JoinTableExpr {
    pub left: TableExpr,
    pub join: JoinKind,
    pub right: TableExpr,
    pub on: Option<BoolExpr>,
}

impl SqlNode for JoinTableExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        self.left.fmt(buf);
        buf.write_byte(b' ');
        buf.write_str(self.join.as_str());
        buf.write_byte(b' ');
        self.right.fmt(buf);
        if let Some(on) = &self.on {
            buf.write_str(" on ");
            on.fmt(buf);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinKind {
    /// `join`; `inner join` normalizes to this
    Join,
    StraightJoin,
    /// `left join`; `left outer join` normalizes to this
    LeftJoin,
    /// `right join`; `right outer join` normalizes to this
    RightJoin,
    CrossJoin,
    NaturalJoin,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Join => "join",
            JoinKind::StraightJoin => "straight_join",
            JoinKind::LeftJoin => "left join",
            JoinKind::RightJoin => "right join",
            JoinKind::CrossJoin => "cross join",
            JoinKind::NaturalJoin => "natural join",
        }
    }
}

/// `use`/`ignore`/`force index (...)` hints on an aliased table.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexHints {
    pub typ: IndexHintType,
    pub indexes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IndexHintType {
    Use,
    Ignore,
    Force,
}

impl SqlNode for IndexHints {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self.typ {
            IndexHintType::Use => buf.write_str(" use index ("),
            IndexHintType::Ignore => buf.write_str(" ignore index ("),
            IndexHintType::Force => buf.write_str(" force index ("),
        }
        let mut delim = "";
        for index in &self.indexes {
            buf.write_str(delim);
            delim = ", ";
            buf.write_identifier(index);
        }
        buf.write_byte(b')');
    }
}

/// Any expression: the boolean and value arms are kept apart because the
/// grammar only admits each kind in certain positions.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    Bool(BoolExpr),
    Val(ValExpr),
}

impl SqlNode for Expr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            Expr::Bool(b) => b.fmt(buf),
            Expr::Val(v) => v.fmt(buf),
        }
    }
}

/// An expression of boolean shape.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoolExpr {
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
    Not(Box<BoolExpr>),
    Paren(Box<BoolExpr>),
    Comparison {
        left: ValExpr,
        op: ComparisonOp,
        right: ValExpr,
    },
    /// `left [not] between from and to`
    Range {
        left: ValExpr,
        negated: bool,
        from: ValExpr,
        to: ValExpr,
    },
    /// `expr is [not] null`
    NullCheck { expr: ValExpr, negated: bool },
    Exists(Subquery),
}

impl SqlNode for BoolExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            BoolExpr::And(l, r) => {
                l.fmt(buf);
                buf.write_str(" and ");
                r.fmt(buf);
            }
            BoolExpr::Or(l, r) => {
                l.fmt(buf);
                buf.write_str(" or ");
                r.fmt(buf);
            }
            BoolExpr::Not(e) => {
                buf.write_str("not ");
                e.fmt(buf);
            }
            BoolExpr::Paren(e) => {
                buf.write_byte(b'(');
                e.fmt(buf);
                buf.write_byte(b')');
            }
            BoolExpr::Comparison { left, op, right } => {
                left.fmt(buf);
                buf.write_byte(b' ');
                buf.write_str(op.as_str());
                buf.write_byte(b' ');
                right.fmt(buf);
            }
            BoolExpr::Range {
                left,
                negated,
                from,
                to,
            } => {
                left.fmt(buf);
                buf.write_str(if *negated {
                    " not between "
                } else {
                    " between "
                });
                from.fmt(buf);
                buf.write_str(" and ");
                to.fmt(buf);
            }
            BoolExpr::NullCheck { expr, negated } => {
                expr.fmt(buf);
                buf.write_str(if *negated { " is not null" } else { " is null" });
            }
            BoolExpr::Exists(subquery) => {
                buf.write_str("exists ");
                subquery.fmt(buf);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComparisonOp {
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// `!=`; `<>` normalizes to this
    Neq,
    /// `<=>`
    NullSafeEq,
    In,
    NotIn,
    Like,
    NotLike,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Neq => "!=",
            ComparisonOp::NullSafeEq => "<=>",
            ComparisonOp::In => "in",
            ComparisonOp::NotIn => "not in",
            ComparisonOp::Like => "like",
            ComparisonOp::NotLike => "not like",
        }
    }
}

/// An expression of value shape.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValExpr {
    /// A string literal, raw unescaped bytes
    StrVal(Vec<u8>),
    /// A numeric literal, textual and unparsed
    NumVal(Vec<u8>),
    /// A scalar bind variable, bytes include the leading `:`
    ValArg(Vec<u8>),
    /// A list bind variable, bytes include the leading `::`
    ListArg(Vec<u8>),
    Null,
    ColName(ColName),
    Tuple(ValTuple),
    Subquery(Subquery),
    BinaryExpr {
        left: Box<ValExpr>,
        op: BinaryOp,
        right: Box<ValExpr>,
    },
    UnaryExpr {
        op: UnaryOp,
        expr: Box<ValExpr>,
    },
    FuncExpr(FuncExpr),
    CaseExpr(CaseExpr),
}

impl ValExpr {
    /// True for literals and scalar bind variables: anything that stands
    /// for a single concrete value.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            ValExpr::StrVal(_) | ValExpr::NumVal(_) | ValExpr::ValArg(_)
        )
    }
}

impl SqlNode for ValExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        match self {
            ValExpr::StrVal(v) => buf.write_string_literal(v),
            ValExpr::NumVal(v) => buf.write_bytes(v),
            ValExpr::ValArg(v) => buf.write_arg(v),
            ValExpr::ListArg(v) => buf.write_arg(v),
            ValExpr::Null => buf.write_str("null"),
            ValExpr::ColName(c) => c.fmt(buf),
            ValExpr::Tuple(t) => t.fmt(buf),
            ValExpr::Subquery(s) => s.fmt(buf),
            ValExpr::BinaryExpr { left, op, right } => {
                left.fmt(buf);
                buf.write_str(op.as_str());
                right.fmt(buf);
            }
            ValExpr::UnaryExpr { op, expr } => {
                buf.write_str(op.as_str());
                expr.fmt(buf);
            }
            ValExpr::FuncExpr(f) => f.fmt(buf),
            ValExpr::CaseExpr(c) => c.fmt(buf),
        }
    }
}

/// A possibly-qualified column name: `a` or `t.a`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColName {
    pub name: Vec<u8>,
    pub qualifier: Option<Vec<u8>>,
}

impl SqlNode for ColName {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        if let Some(qualifier) = &self.qualifier {
            buf.write_identifier(qualifier);
            buf.write_byte(b'.');
        }
        buf.write_identifier(&self.name);
    }
}

/// A parenthesized list of value expressions. A parenthesized single value
/// is a one-element tuple, which is also how plain grouping parentheses
/// are represented on the value side.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValTuple(pub Vec<ValExpr>);

impl ValTuple {
    /// True when every element is a single concrete value.
    pub fn is_simple(&self) -> bool {
        self.0.iter().all(ValExpr::is_value)
    }
}

impl SqlNode for ValTuple {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        if buf.rewrite_tuple(self) {
            return;
        }
        buf.write_byte(b'(');
        buf.write_comma_separated(&self.0);
        buf.write_byte(b')');
    }
}

/// A parenthesized select or union.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Subquery(pub Box<SelectStatement>);

impl SqlNode for Subquery {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_byte(b'(');
        self.0.fmt(buf);
        buf.write_byte(b')');
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    BitAnd,
    BitOr,
    BitXor,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    ShiftLeft,
    ShiftRight,
    /// `||`; this dialect reads it as string concatenation
    Concat,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    Plus,
    Minus,
    Tilde,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Tilde => "~",
        }
    }
}

/// A function call. The argument list reuses the select-expression grammar
/// so `count(*)` and `count(distinct x)` parse uniformly.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuncExpr {
    pub name: Vec<u8>,
    pub distinct: bool,
    pub exprs: Vec<SelectExpr>,
}

impl FuncExpr {
    /// True for the aggregate functions of the dialect.
    pub fn is_aggregate(&self) -> bool {
        const AGGREGATES: &[&[u8]] = &[b"avg", b"count", b"max", b"min", b"sum"];
        AGGREGATES
            .iter()
            .any(|agg| self.name.eq_ignore_ascii_case(agg))
    }
}

impl SqlNode for FuncExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_identifier(&self.name);
        buf.write_byte(b'(');
        if self.distinct {
            buf.write_str("distinct ");
        }
        buf.write_comma_separated(&self.exprs);
        buf.write_byte(b')');
    }
}

/// A `case` expression.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaseExpr {
    pub expr: Option<Box<ValExpr>>,
    pub whens: Vec<When>,
    pub else_expr: Option<Box<ValExpr>>,
}

impl SqlNode for CaseExpr {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_str("case ");
        if let Some(expr) = &self.expr {
            expr.fmt(buf);
            buf.write_byte(b' ');
        }
        for when in &self.whens {
            when.fmt(buf);
            buf.write_byte(b' ');
        }
        if let Some(else_expr) = &self.else_expr {
            buf.write_str("else ");
            else_expr.fmt(buf);
            buf.write_byte(b' ');
        }
        buf.write_str("end");
    }
}

/// One `when cond then val` arm of a `case`. With a scrutinee the
/// condition is a value to compare against; without one it is boolean.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct When {
    pub cond: Expr,
    pub val: ValExpr,
}

impl SqlNode for When {
    fn fmt(&self, buf: &mut TrackedBuffer) {
        buf.write_str("when ");
        self.cond.fmt(buf);
        buf.write_str(" then ");
        self.val.fmt(buf);
    }
}

impl_display!(
    Statement,
    SelectStatement,
    Comments,
    Select,
    Union,
    Insert,
    InsertRows,
    RowTuple,
    Update,
    Delete,
    Set,
    UpdateExpr,
    Where,
    TimeRange,
    Order,
    Limit,
    Lock,
    SelectExpr,
    Columns,
    TableExpr,
    AliasedTableExpr,
    SimpleTableExpr,
    TableName,
    JoinTableExpr,
    IndexHints,
    Expr,
    BoolExpr,
    ValExpr,
    ColName,
    ValTuple,
    Subquery,
    FuncExpr,
    CaseExpr,
    When,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> ValExpr {
        ValExpr::ColName(ColName {
            name: name.as_bytes().to_vec(),
            qualifier: None,
        })
    }

    #[test]
    fn display_comparison() {
        let expr = BoolExpr::And(
            Box::new(BoolExpr::Comparison {
                left: col("a"),
                op: ComparisonOp::Eq,
                right: ValExpr::NumVal(b"1".to_vec()),
            }),
            Box::new(BoolExpr::Comparison {
                left: col("b"),
                op: ComparisonOp::Neq,
                right: ValExpr::NumVal(b"2".to_vec()),
            }),
        );
        assert_eq!("a = 1 and b != 2", expr.to_string());
    }

    #[test]
    fn display_case() {
        let case = CaseExpr {
            expr: Some(Box::new(col("x"))),
            whens: vec![When {
                cond: Expr::Val(ValExpr::NumVal(b"1".to_vec())),
                val: ValExpr::StrVal(b"one".to_vec()),
            }],
            else_expr: Some(Box::new(ValExpr::StrVal(b"other".to_vec()))),
        };
        assert_eq!(
            "case x when 1 then 'one' else 'other' end",
            case.to_string()
        );
    }

    #[test]
    fn binary_arithmetic_is_unspaced() {
        let expr = ValExpr::BinaryExpr {
            left: Box::new(col("a")),
            op: BinaryOp::Plus,
            right: Box::new(ValExpr::NumVal(b"1".to_vec())),
        };
        assert_eq!("a+1", expr.to_string());
    }

    #[test]
    fn columns_format_via_select_exprs() {
        let columns = Columns(vec![
            ColName {
                name: b"a".to_vec(),
                qualifier: None,
            },
            ColName {
                name: b"order".to_vec(),
                qualifier: None,
            },
        ]);
        assert_eq!("(a, `order`)", columns.to_string());
    }

    #[test]
    fn func_expr_aggregates() {
        let count = FuncExpr {
            name: b"count".to_vec(),
            distinct: true,
            exprs: vec![SelectExpr::Expr {
                expr: Expr::Val(col("x")),
                alias: None,
            }],
        };
        assert!(count.is_aggregate());
        assert_eq!("count(distinct x)", count.to_string());

        let concat = FuncExpr {
            name: b"concat".to_vec(),
            distinct: false,
            exprs: vec![],
        };
        assert!(!concat.is_aggregate());
    }

    #[test]
    fn limits_extraction() {
        let limit = Limit {
            offset: Some(ValExpr::NumVal(b"5".to_vec())),
            rowcount: ValExpr::ValArg(b":count".to_vec()),
        };
        assert_eq!(
            limit.limits().unwrap(),
            (Some(LimitVal::Number(5)), LimitVal::Arg(b"count".to_vec()))
        );

        let negative = Limit {
            offset: None,
            rowcount: ValExpr::NumVal(b"-1".to_vec()),
        };
        assert_eq!(
            negative.limits().unwrap_err(),
            ParserError::ParserError("negative limit: -1".to_string())
        );

        let negative_offset = Limit {
            offset: Some(ValExpr::NumVal(b"-5".to_vec())),
            rowcount: ValExpr::NumVal(b"1".to_vec()),
        };
        assert_eq!(
            negative_offset.limits().unwrap_err(),
            ParserError::ParserError("negative offset: -5".to_string())
        );

        let bad = Limit {
            offset: None,
            rowcount: ValExpr::StrVal(b"abc".to_vec()),
        };
        assert_eq!(
            bad.limits().unwrap_err(),
            ParserError::ParserError("unexpected node for rowcount".to_string())
        );
    }

    #[test]
    fn table_name_extraction() {
        let plain = SimpleTableExpr::Table(TableName {
            name: b"t".to_vec(),
            qualifier: None,
        });
        assert_eq!(plain.table_name(), Some(&b"t"[..]));

        let qualified = SimpleTableExpr::Table(TableName {
            name: b"t".to_vec(),
            qualifier: Some(b"db".to_vec()),
        });
        assert_eq!(qualified.table_name(), None);
    }
}

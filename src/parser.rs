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

//! SQL Parser
//!
//! One statement per parse: [`parse`] runs a fresh [`Tokenizer`] to
//! completion and returns the root [`Statement`] or the first error. There
//! is no error recovery. Expressions are parsed by precedence climbing over
//! the operator ladder of the dialect (`or` < `and` < `not` < comparisons
//! < `|` < `&` < shifts < `+ -` < `* / %` < `^` < `||` < unary), with the
//! comparison level non-associative.

use core::fmt;

use itertools::Itertools;
use log::debug;

use crate::ast::*;
use crate::keywords::Keyword;
use crate::tokenizer::{Token, Tokenizer, TokenizerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    TokenizerError(String),
    ParserError(String),
    RecursionLimitExceeded,
}

macro_rules! parser_err {
    ($($arg:tt)*) => {
        Err(ParserError::ParserError(format!($($arg)*)))
    };
}

impl From<TokenizerError> for ParserError {
    fn from(e: TokenizerError) -> Self {
        ParserError::TokenizerError(e.to_string())
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "sql parser error: {}",
            match self {
                ParserError::TokenizerError(s) => s,
                ParserError::ParserError(s) => s,
                ParserError::RecursionLimitExceeded => "recursion limit exceeded",
            }
        )
    }
}

impl std::error::Error for ParserError {}

/// Nested selects and expressions deeper than this fail the parse instead
/// of overflowing the stack.
const MAX_NESTING_DEPTH: usize = 50;

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_COMPARISON: u8 = 4;
const PREC_BIT_OR: u8 = 5;
const PREC_BIT_AND: u8 = 6;
const PREC_SHIFT: u8 = 7;
const PREC_ADDITIVE: u8 = 8;
const PREC_MULTIPLICATIVE: u8 = 9;
const PREC_BIT_XOR: u8 = 10;
const PREC_CONCAT: u8 = 11;
const PREC_UNARY: u8 = 12;

/// Parses a single SQL statement.
pub fn parse(sql: &str) -> Result<Statement, ParserError> {
    parse_bytes(sql.as_bytes())
}

/// Parses a single SQL statement from raw bytes. Identifiers and literals
/// keep their bytes untouched, so non-UTF-8 input round-trips.
pub fn parse_bytes(sql: &[u8]) -> Result<Statement, ParserError> {
    debug!("parsing: {}", String::from_utf8_lossy(sql));
    let mut parser = Parser::new(sql);
    let statement = parser.parse_statement()?;
    parser.expect_statement_end()?;
    Ok(statement)
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    /// The current lookahead token
    token: Token,
    /// 1-based byte position where `token` starts
    token_pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(sql: &'a [u8]) -> Self {
        Parser {
            tokenizer: Tokenizer::new_bytes(sql),
            token: Token::EOF,
            token_pos: 1,
            depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // token plumbing

    /// Advances to the next token, discarding comments.
    fn next_token(&mut self) -> Result<(), ParserError> {
        loop {
            let token = self.tokenizer.next_token()?;
            self.token_pos = self.tokenizer.token_position();
            match token {
                Token::Comment(_) => continue,
                token => {
                    self.token = token;
                    return Ok(());
                }
            }
        }
    }

    /// Returns the current token and advances past it.
    fn take_token(&mut self) -> Result<Token, ParserError> {
        let token = std::mem::replace(&mut self.token, Token::EOF);
        self.next_token()?;
        Ok(token)
    }

    /// Looks `n` tokens past the current one without consuming anything.
    fn peek_nth(&self, n: usize) -> Result<Token, ParserError> {
        let mut tokenizer = self.tokenizer.clone();
        let mut remaining = n;
        loop {
            let token = tokenizer.next_token()?;
            if matches!(token, Token::Comment(_)) {
                continue;
            }
            remaining -= 1;
            if remaining == 0 {
                return Ok(token);
            }
        }
    }

    /// The keyword of the current token, or `NoKeyword`.
    fn keyword(&self) -> Keyword {
        match &self.token {
            Token::Word(w) => w.keyword,
            _ => Keyword::NoKeyword,
        }
    }

    fn parse_keyword(&mut self, kw: Keyword) -> Result<bool, ParserError> {
        if self.keyword() == kw {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParserError> {
        if self.parse_keyword(kw)? {
            Ok(())
        } else {
            self.expected(&format!("{kw:?}"))
        }
    }

    fn consume_token(&mut self, token: &Token) -> Result<bool, ParserError> {
        if &self.token == token {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_token(&mut self, token: &Token) -> Result<(), ParserError> {
        if self.consume_token(token)? {
            Ok(())
        } else {
            self.expected(&token.to_string())
        }
    }

    fn expected<T>(&self, expected: &str) -> Result<T, ParserError> {
        parser_err!(
            "Expected {expected}, found: {} at position {}",
            self.token,
            self.token_pos
        )
    }

    /// A bare identifier: a non-keyword or backtick-quoted word.
    fn parse_identifier(&mut self) -> Result<Vec<u8>, ParserError> {
        match &self.token {
            Token::Word(w) if w.keyword == Keyword::NoKeyword => {
                let value = w.value.clone();
                self.next_token()?;
                Ok(value)
            }
            _ => self.expected("identifier"),
        }
    }

    /// Skips the rest of the input; used for opaque statement tails.
    fn skip_to_eof(&mut self) {
        self.tokenizer.force_eof();
        self.token = Token::EOF;
    }

    fn expect_statement_end(&mut self) -> Result<(), ParserError> {
        if self.token == Token::SemiColon {
            self.next_token()?;
        }
        if self.token != Token::EOF {
            return self.expected("end of statement");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // statements

    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let comments = self.collect_leading_comments()?;
        match self.keyword() {
            Keyword::SELECT => {
                self.next_token()?;
                let select = self.parse_select(comments)?;
                let stmt =
                    self.finish_select_statement(SelectStatement::Select(Box::new(select)))?;
                Ok(stmt.into())
            }
            Keyword::INSERT => {
                self.next_token()?;
                self.parse_insert(comments)
            }
            Keyword::UPDATE => {
                self.next_token()?;
                self.parse_update(comments)
            }
            Keyword::DELETE => {
                self.next_token()?;
                self.parse_delete(comments)
            }
            Keyword::SET => {
                self.next_token()?;
                self.parse_set(comments)
            }
            Keyword::CREATE => {
                self.next_token()?;
                self.parse_create()
            }
            Keyword::ALTER => {
                self.next_token()?;
                self.parse_alter()
            }
            Keyword::DROP => {
                self.next_token()?;
                self.parse_drop()
            }
            Keyword::RENAME => {
                self.next_token()?;
                self.parse_rename()
            }
            Keyword::SHOW | Keyword::DESCRIBE | Keyword::EXPLAIN => {
                self.skip_to_eof();
                Ok(Statement::Other)
            }
            _ => {
                let verbs = [
                    "select", "insert", "update", "delete", "set", "create", "alter", "drop",
                    "rename", "show", "describe", "explain",
                ];
                self.expected(&format!("one of {}", verbs.iter().join(", ")))
            }
        }
    }

    /// Reads the first real token, collecting the comments before it.
    fn collect_leading_comments(&mut self) -> Result<Comments, ParserError> {
        let mut comments = Vec::new();
        loop {
            let token = self.tokenizer.next_token()?;
            self.token_pos = self.tokenizer.token_position();
            match token {
                Token::Comment(c) => comments.push(c),
                token => {
                    self.token = token;
                    return Ok(Comments(comments));
                }
            }
        }
    }

    /// A `select` or `union`, with the `select` keyword still pending.
    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParserError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParserError::RecursionLimitExceeded);
        }
        self.depth += 1;
        let result = self.parse_select_statement_inner();
        self.depth -= 1;
        result
    }

    fn parse_select_statement_inner(&mut self) -> Result<SelectStatement, ParserError> {
        self.expect_keyword(Keyword::SELECT)?;
        let select = self.parse_select(Comments::default())?;
        self.finish_select_statement(SelectStatement::Select(Box::new(select)))
    }

    /// Folds trailing set operations into the left operand.
    fn finish_select_statement(
        &mut self,
        mut stmt: SelectStatement,
    ) -> Result<SelectStatement, ParserError> {
        while let Some(op) = self.parse_union_op()? {
            self.expect_keyword(Keyword::SELECT)?;
            let right = self.parse_select(Comments::default())?;
            stmt = SelectStatement::Union(Box::new(Union {
                op,
                left: stmt,
                right: SelectStatement::Select(Box::new(right)),
            }));
        }
        Ok(stmt)
    }

    fn parse_union_op(&mut self) -> Result<Option<UnionOp>, ParserError> {
        let op = match self.keyword() {
            Keyword::UNION => {
                self.next_token()?;
                if self.parse_keyword(Keyword::ALL)? {
                    UnionOp::UnionAll
                } else {
                    UnionOp::Union
                }
            }
            Keyword::MINUS => {
                self.next_token()?;
                UnionOp::Minus
            }
            Keyword::EXCEPT => {
                self.next_token()?;
                UnionOp::Except
            }
            Keyword::INTERSECT => {
                self.next_token()?;
                UnionOp::Intersect
            }
            _ => return Ok(None),
        };
        Ok(Some(op))
    }

    /// The body of a `select`, the verb already consumed.
    fn parse_select(&mut self, comments: Comments) -> Result<Select, ParserError> {
        let distinct = self.parse_keyword(Keyword::DISTINCT)?;
        let mut select_exprs = vec![self.parse_select_expr()?];
        while self.consume_token(&Token::Comma)? {
            select_exprs.push(self.parse_select_expr()?);
        }
        self.expect_keyword(Keyword::FROM)?;
        let mut from = vec![self.parse_table_expr()?];
        while self.consume_token(&Token::Comma)? {
            from.push(self.parse_table_expr()?);
        }
        let where_clause = self.parse_where_opt(Keyword::WHERE, WhereType::Where)?;
        let time_range = self.parse_time_range_opt()?;
        let group_by = if self.parse_keyword(Keyword::GROUP)? {
            self.expect_keyword(Keyword::BY)?;
            self.parse_val_expr_list()?
        } else {
            Vec::new()
        };
        let having = self.parse_where_opt(Keyword::HAVING, WhereType::Having)?;
        let order_by = self.parse_order_by_opt()?;
        let limit = self.parse_limit_opt()?;
        let lock = self.parse_lock_opt()?;
        Ok(Select {
            comments,
            distinct,
            select_exprs,
            from,
            where_clause,
            time_range,
            group_by,
            having,
            order_by,
            limit,
            lock,
        })
    }

    fn parse_select_expr(&mut self) -> Result<SelectExpr, ParserError> {
        if self.consume_token(&Token::Mul)? {
            return Ok(SelectExpr::Star { table: None });
        }
        if let Token::Word(w) = &self.token {
            if w.keyword == Keyword::NoKeyword
                && self.peek_nth(1)? == Token::Period
                && self.peek_nth(2)? == Token::Mul
            {
                let table = w.value.clone();
                self.next_token()?; // table
                self.next_token()?; // .
                self.next_token()?; // *
                return Ok(SelectExpr::Star { table: Some(table) });
            }
        }
        let expr = self.parse_expression()?;
        let alias = self.parse_alias_opt()?;
        Ok(SelectExpr::Expr { expr, alias })
    }

    /// `[as] ident`, both parts optional.
    fn parse_alias_opt(&mut self) -> Result<Option<Vec<u8>>, ParserError> {
        if self.parse_keyword(Keyword::AS)? {
            return Ok(Some(self.parse_identifier()?));
        }
        match &self.token {
            Token::Word(w) if w.keyword == Keyword::NoKeyword => {
                let alias = w.value.clone();
                self.next_token()?;
                Ok(Some(alias))
            }
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // table expressions

    fn parse_table_expr(&mut self) -> Result<TableExpr, ParserError> {
        let mut expr = self.parse_table_factor()?;
        while let Some(join) = self.parse_join_kind_opt()? {
            let right = self.parse_table_factor()?;
            let on = if self.parse_keyword(Keyword::ON)? {
                Some(self.parse_bool_expr()?)
            } else {
                None
            };
            expr = TableExpr::Join(Box::new(JoinTableExpr {
                left: expr,
                join,
                right,
                on,
            }));
        }
        Ok(expr)
    }

    fn parse_table_factor(&mut self) -> Result<TableExpr, ParserError> {
        if self.consume_token(&Token::LParen)? {
            if self.keyword() == Keyword::SELECT {
                let stmt = self.parse_select_statement()?;
                self.expect_token(&Token::RParen)?;
                let alias = self.parse_alias_opt()?;
                return Ok(TableExpr::Aliased(AliasedTableExpr {
                    expr: SimpleTableExpr::Subquery(Subquery(Box::new(stmt))),
                    alias,
                    hints: None,
                }));
            }
            let inner = self.parse_table_expr()?;
            self.expect_token(&Token::RParen)?;
            return Ok(TableExpr::Paren(Box::new(inner)));
        }
        let table = self.parse_table_name()?;
        let alias = self.parse_alias_opt()?;
        let hints = self.parse_index_hints_opt()?;
        Ok(TableExpr::Aliased(AliasedTableExpr {
            expr: SimpleTableExpr::Table(table),
            alias,
            hints,
        }))
    }

    fn parse_join_kind_opt(&mut self) -> Result<Option<JoinKind>, ParserError> {
        let kind = match self.keyword() {
            Keyword::JOIN => {
                self.next_token()?;
                JoinKind::Join
            }
            Keyword::STRAIGHT_JOIN => {
                self.next_token()?;
                JoinKind::StraightJoin
            }
            Keyword::INNER => {
                self.next_token()?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinKind::Join
            }
            Keyword::CROSS => {
                self.next_token()?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinKind::CrossJoin
            }
            Keyword::NATURAL => {
                self.next_token()?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinKind::NaturalJoin
            }
            Keyword::LEFT => {
                self.next_token()?;
                self.parse_keyword(Keyword::OUTER)?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinKind::LeftJoin
            }
            Keyword::RIGHT => {
                self.next_token()?;
                self.parse_keyword(Keyword::OUTER)?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinKind::RightJoin
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    fn parse_table_name(&mut self) -> Result<TableName, ParserError> {
        let first = self.parse_identifier()?;
        if self.consume_token(&Token::Period)? {
            let name = self.parse_identifier()?;
            Ok(TableName {
                name,
                qualifier: Some(first),
            })
        } else {
            Ok(TableName {
                name: first,
                qualifier: None,
            })
        }
    }

    fn parse_index_hints_opt(&mut self) -> Result<Option<IndexHints>, ParserError> {
        let typ = match self.keyword() {
            Keyword::USE => IndexHintType::Use,
            Keyword::IGNORE => IndexHintType::Ignore,
            Keyword::FORCE => IndexHintType::Force,
            _ => return Ok(None),
        };
        self.next_token()?;
        self.expect_keyword(Keyword::INDEX)?;
        self.expect_token(&Token::LParen)?;
        let mut indexes = vec![self.parse_identifier()?];
        while self.consume_token(&Token::Comma)? {
            indexes.push(self.parse_identifier()?);
        }
        self.expect_token(&Token::RParen)?;
        Ok(Some(IndexHints { typ, indexes }))
    }

    // ------------------------------------------------------------------
    // select tail clauses

    fn parse_where_opt(
        &mut self,
        kw: Keyword,
        typ: WhereType,
    ) -> Result<Option<Where>, ParserError> {
        if !self.parse_keyword(kw)? {
            return Ok(None);
        }
        let expr = self.parse_bool_expr()?;
        Ok(Some(Where { typ, expr }))
    }

    fn parse_time_range_opt(&mut self) -> Result<Option<TimeRange>, ParserError> {
        if !self.parse_keyword(Keyword::TIMERANGE)? {
            return Ok(None);
        }
        let from = self.parse_time_range_value()?;
        let to = if self.consume_token(&Token::Comma)? {
            Some(self.parse_time_range_value()?)
        } else {
            None
        };
        Ok(Some(TimeRange { from, to }))
    }

    fn parse_time_range_value(&mut self) -> Result<ValExpr, ParserError> {
        let value = self.parse_val_expr()?;
        if value.is_value() {
            Ok(value)
        } else {
            parser_err!("Expected literal or bind variable in timerange, found: {value}")
        }
    }

    fn parse_order_by_opt(&mut self) -> Result<Vec<Order>, ParserError> {
        if !self.parse_keyword(Keyword::ORDER)? {
            return Ok(Vec::new());
        }
        self.expect_keyword(Keyword::BY)?;
        let mut order_by = Vec::new();
        loop {
            let expr = self.parse_val_expr()?;
            let direction = if self.parse_keyword(Keyword::DESC)? {
                OrderDirection::Desc
            } else {
                self.parse_keyword(Keyword::ASC)?;
                OrderDirection::Asc
            };
            order_by.push(Order { expr, direction });
            if !self.consume_token(&Token::Comma)? {
                return Ok(order_by);
            }
        }
    }

    fn parse_limit_opt(&mut self) -> Result<Option<Limit>, ParserError> {
        if !self.parse_keyword(Keyword::LIMIT)? {
            return Ok(None);
        }
        let first = self.parse_val_expr()?;
        if self.consume_token(&Token::Comma)? {
            let rowcount = self.parse_val_expr()?;
            Ok(Some(Limit {
                offset: Some(first),
                rowcount,
            }))
        } else {
            Ok(Some(Limit {
                offset: None,
                rowcount: first,
            }))
        }
    }

    fn parse_lock_opt(&mut self) -> Result<Lock, ParserError> {
        if self.parse_keyword(Keyword::FOR)? {
            self.expect_keyword(Keyword::UPDATE)?;
            return Ok(Lock::ForUpdate);
        }
        if self.parse_keyword(Keyword::LOCK)? {
            self.expect_keyword(Keyword::IN)?;
            self.expect_keyword(Keyword::SHARE)?;
            self.expect_keyword(Keyword::MODE)?;
            return Ok(Lock::ShareMode);
        }
        Ok(Lock::None)
    }

    // ------------------------------------------------------------------
    // insert / update / delete / set

    fn parse_insert(&mut self, comments: Comments) -> Result<Statement, ParserError> {
        self.expect_keyword(Keyword::INTO)?;
        let table = self.parse_table_name()?;
        let mut columns = None;
        let mut rows = None;
        if self.consume_token(&Token::LParen)? {
            if self.keyword() == Keyword::SELECT {
                let stmt = self.parse_select_statement()?;
                self.expect_token(&Token::RParen)?;
                rows = Some(insert_rows_from(stmt));
            } else {
                let mut cols = vec![self.parse_bare_col_name()?];
                while self.consume_token(&Token::Comma)? {
                    cols.push(self.parse_bare_col_name()?);
                }
                self.expect_token(&Token::RParen)?;
                columns = Some(Columns(cols));
            }
        }
        let rows = if let Some(rows) = rows {
            rows
        } else if self.parse_keyword(Keyword::VALUES)? {
            let mut tuples = vec![self.parse_row_tuple()?];
            while self.consume_token(&Token::Comma)? {
                tuples.push(self.parse_row_tuple()?);
            }
            InsertRows::Values(tuples)
        } else if self.keyword() == Keyword::SELECT {
            insert_rows_from(self.parse_select_statement()?)
        } else if self.consume_token(&Token::LParen)? {
            let stmt = self.parse_select_statement()?;
            self.expect_token(&Token::RParen)?;
            insert_rows_from(stmt)
        } else {
            return self.expected("VALUES, select or subquery");
        };
        let on_dup = if self.parse_keyword(Keyword::ON)? {
            self.expect_keyword(Keyword::DUPLICATE)?;
            self.expect_keyword(Keyword::KEY)?;
            self.expect_keyword(Keyword::UPDATE)?;
            self.parse_update_exprs()?
        } else {
            Vec::new()
        };
        Ok(Statement::Insert(Box::new(Insert {
            comments,
            table,
            columns,
            rows,
            on_dup,
        })))
    }

    fn parse_row_tuple(&mut self) -> Result<RowTuple, ParserError> {
        self.expect_token(&Token::LParen)?;
        if self.keyword() == Keyword::SELECT {
            let stmt = self.parse_select_statement()?;
            self.expect_token(&Token::RParen)?;
            return Ok(RowTuple::Subquery(Subquery(Box::new(stmt))));
        }
        let mut exprs = Vec::new();
        if self.token != Token::RParen {
            exprs.push(self.parse_val_expr()?);
            while self.consume_token(&Token::Comma)? {
                exprs.push(self.parse_val_expr()?);
            }
        }
        self.expect_token(&Token::RParen)?;
        Ok(RowTuple::Tuple(ValTuple(exprs)))
    }

    fn parse_update(&mut self, comments: Comments) -> Result<Statement, ParserError> {
        let table = self.parse_table_name()?;
        self.expect_keyword(Keyword::SET)?;
        let exprs = self.parse_update_exprs()?;
        let where_clause = self.parse_where_opt(Keyword::WHERE, WhereType::Where)?;
        let order_by = self.parse_order_by_opt()?;
        let limit = self.parse_limit_opt()?;
        Ok(Statement::Update(Box::new(Update {
            comments,
            table,
            exprs,
            where_clause,
            order_by,
            limit,
        })))
    }

    fn parse_delete(&mut self, comments: Comments) -> Result<Statement, ParserError> {
        self.expect_keyword(Keyword::FROM)?;
        let table = self.parse_table_name()?;
        let where_clause = self.parse_where_opt(Keyword::WHERE, WhereType::Where)?;
        let order_by = self.parse_order_by_opt()?;
        let limit = self.parse_limit_opt()?;
        Ok(Statement::Delete(Box::new(Delete {
            comments,
            table,
            where_clause,
            order_by,
            limit,
        })))
    }

    fn parse_set(&mut self, comments: Comments) -> Result<Statement, ParserError> {
        let exprs = self.parse_update_exprs()?;
        Ok(Statement::Set(Box::new(Set { comments, exprs })))
    }

    fn parse_update_exprs(&mut self) -> Result<Vec<UpdateExpr>, ParserError> {
        let mut exprs = vec![self.parse_update_expr()?];
        while self.consume_token(&Token::Comma)? {
            exprs.push(self.parse_update_expr()?);
        }
        Ok(exprs)
    }

    fn parse_update_expr(&mut self) -> Result<UpdateExpr, ParserError> {
        let name = self.parse_col_name()?;
        self.expect_token(&Token::Eq)?;
        let expr = self.parse_val_expr()?;
        Ok(UpdateExpr { name, expr })
    }

    fn parse_col_name(&mut self) -> Result<ColName, ParserError> {
        let first = self.parse_identifier()?;
        if self.consume_token(&Token::Period)? {
            let name = self.parse_identifier()?;
            Ok(ColName {
                name,
                qualifier: Some(first),
            })
        } else {
            Ok(ColName {
                name: first,
                qualifier: None,
            })
        }
    }

    fn parse_bare_col_name(&mut self) -> Result<ColName, ParserError> {
        Ok(ColName {
            name: self.parse_identifier()?,
            qualifier: None,
        })
    }

    // ------------------------------------------------------------------
    // DDL

    fn parse_create(&mut self) -> Result<Statement, ParserError> {
        if self.parse_keyword(Keyword::TABLE)? {
            if self.parse_keyword(Keyword::IF)? {
                self.expect_keyword(Keyword::NOT)?;
                self.expect_keyword(Keyword::EXISTS)?;
            }
            let name = self.parse_identifier()?;
            if self.token == Token::LParen {
                let columns = self.parse_column_definitions()?;
                return Ok(Statement::CreateTable(Box::new(CreateTable {
                    name,
                    columns,
                })));
            }
            self.skip_to_eof();
            return Ok(ddl(DdlAction::Create, None, Some(name)));
        }
        if self.parse_keyword(Keyword::VIEW)? {
            let name = self.parse_identifier()?;
            self.skip_to_eof();
            return Ok(ddl(DdlAction::Create, None, Some(name)));
        }
        if self.parse_keyword(Keyword::INDEX)? {
            let _index = self.parse_identifier()?;
            self.expect_keyword(Keyword::ON)?;
            let table = self.parse_identifier()?;
            self.skip_to_eof();
            return Ok(ddl(DdlAction::Alter, Some(table.clone()), Some(table)));
        }
        self.expected("TABLE, VIEW or INDEX")
    }

    fn parse_alter(&mut self) -> Result<Statement, ParserError> {
        self.parse_keyword(Keyword::IGNORE)?;
        if self.parse_keyword(Keyword::TABLE)? {
            let table = self.parse_identifier()?;
            if self.parse_keyword(Keyword::RENAME)? {
                if !self.parse_keyword(Keyword::TO)? {
                    self.parse_keyword(Keyword::AS)?;
                }
                let new_name = self.parse_identifier()?;
                return Ok(ddl(DdlAction::Rename, Some(table), Some(new_name)));
            }
            self.skip_to_eof();
            return Ok(ddl(DdlAction::Alter, Some(table.clone()), Some(table)));
        }
        if self.parse_keyword(Keyword::VIEW)? {
            let name = self.parse_identifier()?;
            self.skip_to_eof();
            return Ok(ddl(DdlAction::Alter, Some(name.clone()), Some(name)));
        }
        self.expected("TABLE or VIEW")
    }

    fn parse_drop(&mut self) -> Result<Statement, ParserError> {
        if self.parse_keyword(Keyword::TABLE)? || self.parse_keyword(Keyword::VIEW)? {
            if self.parse_keyword(Keyword::IF)? {
                self.expect_keyword(Keyword::EXISTS)?;
            }
            let table = self.parse_identifier()?;
            return Ok(ddl(DdlAction::Drop, Some(table), None));
        }
        if self.parse_keyword(Keyword::INDEX)? {
            let _index = self.parse_identifier()?;
            self.expect_keyword(Keyword::ON)?;
            let table = self.parse_identifier()?;
            return Ok(ddl(DdlAction::Alter, Some(table.clone()), Some(table)));
        }
        self.expected("TABLE, VIEW or INDEX")
    }

    fn parse_rename(&mut self) -> Result<Statement, ParserError> {
        self.expect_keyword(Keyword::TABLE)?;
        let table = self.parse_identifier()?;
        self.expect_keyword(Keyword::TO)?;
        let new_name = self.parse_identifier()?;
        Ok(ddl(DdlAction::Rename, Some(table), Some(new_name)))
    }

    fn parse_column_definitions(&mut self) -> Result<Vec<ColumnDefinition>, ParserError> {
        self.expect_token(&Token::LParen)?;
        let mut columns = vec![self.parse_column_definition()?];
        while self.consume_token(&Token::Comma)? {
            columns.push(self.parse_column_definition()?);
        }
        self.expect_token(&Token::RParen)?;
        Ok(columns)
    }

    fn parse_column_definition(&mut self) -> Result<ColumnDefinition, ParserError> {
        let name = self.parse_identifier()?;
        let col_type = match column_type_str(self.keyword()) {
            Some(t) => {
                self.next_token()?;
                t.as_bytes().to_vec()
            }
            None => return self.expected("column type"),
        };
        let mut attrs = Vec::new();
        loop {
            match self.keyword() {
                Keyword::NOT => {
                    self.next_token()?;
                    self.expect_keyword(Keyword::NULL)?;
                    attrs.push(b"not null".to_vec());
                }
                Keyword::AUTO_INCREMENT => {
                    self.next_token()?;
                    attrs.push(b"auto_increment".to_vec());
                }
                Keyword::PRIMARY => {
                    self.next_token()?;
                    self.expect_keyword(Keyword::KEY)?;
                    attrs.push(b"primary key".to_vec());
                }
                Keyword::UNIQUE => {
                    self.next_token()?;
                    self.expect_keyword(Keyword::KEY)?;
                    attrs.push(b"unique key".to_vec());
                }
                Keyword::KEY => {
                    self.next_token()?;
                    attrs.push(b"key".to_vec());
                }
                Keyword::UNSIGNED => {
                    self.next_token()?;
                    attrs.push(b"unsigned".to_vec());
                }
                Keyword::ZEROFILL => {
                    self.next_token()?;
                    attrs.push(b"zerofill".to_vec());
                }
                Keyword::DEFAULT => {
                    self.next_token()?;
                    let value = self.parse_val_expr()?;
                    if !(value.is_value() || value == ValExpr::Null) {
                        return parser_err!("unsupported default value: {value}");
                    }
                    let mut attr = b"default ".to_vec();
                    attr.extend_from_slice(&crate::format::to_bytes(&value));
                    attrs.push(attr);
                }
                _ => break,
            }
        }
        Ok(ColumnDefinition {
            name,
            col_type,
            attrs,
        })
    }

    // ------------------------------------------------------------------
    // expressions

    fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        self.parse_subexpr(PREC_OR)
    }

    fn parse_bool_expr(&mut self) -> Result<BoolExpr, ParserError> {
        let expr = self.parse_expression()?;
        bool_expr(expr)
    }

    fn parse_val_expr(&mut self) -> Result<ValExpr, ParserError> {
        let expr = self.parse_expression()?;
        val_expr(expr)
    }

    fn parse_val_expr_list(&mut self) -> Result<Vec<ValExpr>, ParserError> {
        let mut exprs = vec![self.parse_val_expr()?];
        while self.consume_token(&Token::Comma)? {
            exprs.push(self.parse_val_expr()?);
        }
        Ok(exprs)
    }

    fn parse_subexpr(&mut self, min_precedence: u8) -> Result<Expr, ParserError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParserError::RecursionLimitExceeded);
        }
        self.depth += 1;
        let result = self.parse_subexpr_inner(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_subexpr_inner(&mut self, min_precedence: u8) -> Result<Expr, ParserError> {
        let mut expr = self.parse_prefix()?;
        loop {
            let precedence = self.next_precedence();
            if precedence == 0 || precedence < min_precedence {
                return Ok(expr);
            }
            debug!("next precedence: {precedence}");
            expr = self.parse_infix(expr, precedence)?;
        }
    }

    /// The precedence of the operator the current token starts, 0 if none.
    fn next_precedence(&self) -> u8 {
        match &self.token {
            Token::Eq
            | Token::Lt
            | Token::Gt
            | Token::LtEq
            | Token::GtEq
            | Token::Neq
            | Token::NullSafeEq => PREC_COMPARISON,
            Token::Pipe => PREC_BIT_OR,
            Token::Ampersand => PREC_BIT_AND,
            Token::ShiftLeft | Token::ShiftRight => PREC_SHIFT,
            Token::Plus | Token::Minus => PREC_ADDITIVE,
            Token::Mul | Token::Div | Token::Mod => PREC_MULTIPLICATIVE,
            Token::Caret => PREC_BIT_XOR,
            Token::Concat => PREC_CONCAT,
            Token::Word(w) => match w.keyword {
                Keyword::OR => PREC_OR,
                Keyword::AND => PREC_AND,
                Keyword::NOT
                | Keyword::BETWEEN
                | Keyword::IS
                | Keyword::IN
                | Keyword::LIKE => PREC_COMPARISON,
                _ => 0,
            },
            _ => 0,
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParserError> {
        let start_pos = self.token_pos;
        match self.keyword() {
            Keyword::NULL => {
                self.next_token()?;
                return Ok(Expr::Val(ValExpr::Null));
            }
            Keyword::NOT => {
                self.next_token()?;
                let operand = self.parse_subexpr(PREC_NOT)?;
                let operand = bool_expr(operand)?;
                return Ok(Expr::Bool(BoolExpr::Not(Box::new(operand))));
            }
            Keyword::EXISTS => {
                self.next_token()?;
                let subquery = self.parse_subquery()?;
                return Ok(Expr::Bool(BoolExpr::Exists(subquery)));
            }
            Keyword::CASE => {
                self.next_token()?;
                return self.parse_case();
            }
            Keyword::NoKeyword => {}
            _ => return self.expected("expression"),
        }
        match self.take_token()? {
            Token::Word(w) => {
                if self.token == Token::LParen {
                    return Ok(Expr::Val(self.parse_function(w.value)?));
                }
                if self.token == Token::Period {
                    self.next_token()?;
                    let name = self.parse_identifier()?;
                    return Ok(Expr::Val(ValExpr::ColName(ColName {
                        name,
                        qualifier: Some(w.value),
                    })));
                }
                Ok(Expr::Val(ValExpr::ColName(ColName {
                    name: w.value,
                    qualifier: None,
                })))
            }
            Token::Number(n) => Ok(Expr::Val(ValExpr::NumVal(n))),
            Token::StringLiteral(s) => Ok(Expr::Val(ValExpr::StrVal(s))),
            Token::ValArg(v) => Ok(Expr::Val(ValExpr::ValArg(v))),
            Token::LParen => {
                if self.keyword() == Keyword::SELECT {
                    let stmt = self.parse_select_statement()?;
                    self.expect_token(&Token::RParen)?;
                    return Ok(Expr::Val(ValExpr::Subquery(Subquery(Box::new(stmt)))));
                }
                let first = self.parse_expression()?;
                if self.consume_token(&Token::Comma)? {
                    let mut exprs = vec![val_expr(first)?];
                    loop {
                        exprs.push(self.parse_val_expr()?);
                        if !self.consume_token(&Token::Comma)? {
                            break;
                        }
                    }
                    self.expect_token(&Token::RParen)?;
                    return Ok(Expr::Val(ValExpr::Tuple(ValTuple(exprs))));
                }
                self.expect_token(&Token::RParen)?;
                match first {
                    Expr::Bool(b) => Ok(Expr::Bool(BoolExpr::Paren(Box::new(b)))),
                    // grouping parentheses on the value side are a 1-tuple
                    Expr::Val(v) => Ok(Expr::Val(ValExpr::Tuple(ValTuple(vec![v])))),
                }
            }
            Token::Plus => {
                let operand = self.parse_subexpr(PREC_UNARY)?;
                Ok(Expr::Val(ValExpr::UnaryExpr {
                    op: UnaryOp::Plus,
                    expr: Box::new(val_expr(operand)?),
                }))
            }
            Token::Minus => {
                let operand = self.parse_subexpr(PREC_UNARY)?;
                Ok(Expr::Val(fold_unary_minus(val_expr(operand)?)))
            }
            Token::Tilde => {
                let operand = self.parse_subexpr(PREC_UNARY)?;
                Ok(Expr::Val(ValExpr::UnaryExpr {
                    op: UnaryOp::Tilde,
                    expr: Box::new(val_expr(operand)?),
                }))
            }
            token => {
                parser_err!("Expected expression, found: {token} at position {start_pos}")
            }
        }
    }

    fn parse_infix(&mut self, left: Expr, precedence: u8) -> Result<Expr, ParserError> {
        match self.keyword() {
            Keyword::AND => {
                self.next_token()?;
                let left = bool_expr(left)?;
                let right = self.parse_subexpr(precedence + 1)?;
                let right = bool_expr(right)?;
                return Ok(Expr::Bool(BoolExpr::And(Box::new(left), Box::new(right))));
            }
            Keyword::OR => {
                self.next_token()?;
                let left = bool_expr(left)?;
                let right = self.parse_subexpr(precedence + 1)?;
                let right = bool_expr(right)?;
                return Ok(Expr::Bool(BoolExpr::Or(Box::new(left), Box::new(right))));
            }
            Keyword::IN => {
                self.next_token()?;
                let left = val_expr(left)?;
                let right = self.parse_col_tuple()?;
                return Ok(Expr::Bool(BoolExpr::Comparison {
                    left,
                    op: ComparisonOp::In,
                    right,
                }));
            }
            Keyword::LIKE => {
                self.next_token()?;
                let left = val_expr(left)?;
                let right = self.parse_subexpr(precedence + 1)?;
                let right = val_expr(right)?;
                return Ok(Expr::Bool(BoolExpr::Comparison {
                    left,
                    op: ComparisonOp::Like,
                    right,
                }));
            }
            Keyword::BETWEEN => {
                self.next_token()?;
                return self.parse_range(val_expr(left)?, false);
            }
            Keyword::IS => {
                self.next_token()?;
                let negated = self.parse_keyword(Keyword::NOT)?;
                self.expect_keyword(Keyword::NULL)?;
                let expr = val_expr(left)?;
                return Ok(Expr::Bool(BoolExpr::NullCheck { expr, negated }));
            }
            Keyword::NOT => {
                self.next_token()?;
                let left = val_expr(left)?;
                return match self.keyword() {
                    Keyword::IN => {
                        self.next_token()?;
                        let right = self.parse_col_tuple()?;
                        Ok(Expr::Bool(BoolExpr::Comparison {
                            left,
                            op: ComparisonOp::NotIn,
                            right,
                        }))
                    }
                    Keyword::LIKE => {
                        self.next_token()?;
                        let right = self.parse_subexpr(precedence + 1)?;
                        let right = val_expr(right)?;
                        Ok(Expr::Bool(BoolExpr::Comparison {
                            left,
                            op: ComparisonOp::NotLike,
                            right,
                        }))
                    }
                    Keyword::BETWEEN => {
                        self.next_token()?;
                        self.parse_range(left, true)
                    }
                    _ => self.expected("IN, LIKE or BETWEEN"),
                };
            }
            _ => {}
        }
        if let Some(op) = comparison_op(&self.token) {
            self.next_token()?;
            let left = val_expr(left)?;
            let right = self.parse_subexpr(precedence + 1)?;
            let right = val_expr(right)?;
            return Ok(Expr::Bool(BoolExpr::Comparison { left, op, right }));
        }
        let op = match &self.token {
            Token::Ampersand => BinaryOp::BitAnd,
            Token::Pipe => BinaryOp::BitOr,
            Token::Caret => BinaryOp::BitXor,
            Token::Plus => BinaryOp::Plus,
            Token::Minus => BinaryOp::Minus,
            Token::Mul => BinaryOp::Mul,
            Token::Div => BinaryOp::Div,
            Token::Mod => BinaryOp::Mod,
            Token::ShiftLeft => BinaryOp::ShiftLeft,
            Token::ShiftRight => BinaryOp::ShiftRight,
            Token::Concat => BinaryOp::Concat,
            _ => return self.expected("operator"),
        };
        self.next_token()?;
        let left = val_expr(left)?;
        let right = self.parse_subexpr(precedence + 1)?;
        let right = val_expr(right)?;
        Ok(Expr::Val(ValExpr::BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    fn parse_range(&mut self, left: ValExpr, negated: bool) -> Result<Expr, ParserError> {
        let from = self.parse_subexpr(PREC_COMPARISON + 1)?;
        let from = val_expr(from)?;
        self.expect_keyword(Keyword::AND)?;
        let to = self.parse_subexpr(PREC_COMPARISON + 1)?;
        let to = val_expr(to)?;
        Ok(Expr::Bool(BoolExpr::Range {
            left,
            negated,
            from,
            to,
        }))
    }

    /// The right-hand side of `in`: a value tuple, a subquery, or a list
    /// bind variable.
    fn parse_col_tuple(&mut self) -> Result<ValExpr, ParserError> {
        if let Token::ListArg(arg) = &self.token {
            let arg = arg.clone();
            self.next_token()?;
            return Ok(ValExpr::ListArg(arg));
        }
        if self.consume_token(&Token::LParen)? {
            if self.keyword() == Keyword::SELECT {
                let stmt = self.parse_select_statement()?;
                self.expect_token(&Token::RParen)?;
                return Ok(ValExpr::Subquery(Subquery(Box::new(stmt))));
            }
            let mut exprs = vec![self.parse_val_expr()?];
            while self.consume_token(&Token::Comma)? {
                exprs.push(self.parse_val_expr()?);
            }
            self.expect_token(&Token::RParen)?;
            return Ok(ValExpr::Tuple(ValTuple(exprs)));
        }
        self.expected("value tuple, subquery or list bind variable")
    }

    fn parse_subquery(&mut self) -> Result<Subquery, ParserError> {
        self.expect_token(&Token::LParen)?;
        let stmt = self.parse_select_statement()?;
        self.expect_token(&Token::RParen)?;
        Ok(Subquery(Box::new(stmt)))
    }

    fn parse_function(&mut self, name: Vec<u8>) -> Result<ValExpr, ParserError> {
        self.next_token()?; // '('
        let distinct = self.parse_keyword(Keyword::DISTINCT)?;
        let mut exprs = Vec::new();
        if self.token != Token::RParen {
            loop {
                exprs.push(self.parse_select_expr()?);
                if !self.consume_token(&Token::Comma)? {
                    break;
                }
            }
        }
        self.expect_token(&Token::RParen)?;
        let count_star = exprs.len() == 1
            && !distinct
            && matches!(exprs[0], SelectExpr::Star { table: None })
            && name.eq_ignore_ascii_case(b"count");
        if !count_star && exprs.iter().any(|e| matches!(e, SelectExpr::Star { .. })) {
            return parser_err!("'*' argument is only supported in count(*)");
        }
        Ok(ValExpr::FuncExpr(FuncExpr {
            name,
            distinct,
            exprs,
        }))
    }

    fn parse_case(&mut self) -> Result<Expr, ParserError> {
        let expr = if self.keyword() == Keyword::WHEN {
            None
        } else {
            Some(Box::new(self.parse_val_expr()?))
        };
        let mut whens = Vec::new();
        self.expect_keyword(Keyword::WHEN)?;
        loop {
            let cond = self.parse_expression()?;
            self.expect_keyword(Keyword::THEN)?;
            let val = self.parse_val_expr()?;
            whens.push(When { cond, val });
            if !self.parse_keyword(Keyword::WHEN)? {
                break;
            }
        }
        let else_expr = if self.parse_keyword(Keyword::ELSE)? {
            Some(Box::new(self.parse_val_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::END)?;
        Ok(Expr::Val(ValExpr::CaseExpr(CaseExpr {
            expr,
            whens,
            else_expr,
        })))
    }
}

fn ddl(action: DdlAction, table: Option<Vec<u8>>, new_name: Option<Vec<u8>>) -> Statement {
    Statement::Ddl(Box::new(Ddl {
        action,
        table,
        new_name,
    }))
}

fn insert_rows_from(stmt: SelectStatement) -> InsertRows {
    match stmt {
        SelectStatement::Select(s) => InsertRows::Select(s),
        SelectStatement::Union(u) => InsertRows::Union(u),
    }
}

fn bool_expr(expr: Expr) -> Result<BoolExpr, ParserError> {
    match expr {
        Expr::Bool(b) => Ok(b),
        Expr::Val(v) => parser_err!("Expected boolean expression, found: {v}"),
    }
}

fn val_expr(expr: Expr) -> Result<ValExpr, ParserError> {
    match expr {
        Expr::Val(v) => Ok(v),
        Expr::Bool(b) => parser_err!("Expected value expression, found: {b}"),
    }
}

fn comparison_op(token: &Token) -> Option<ComparisonOp> {
    let op = match token {
        Token::Eq => ComparisonOp::Eq,
        Token::Lt => ComparisonOp::Lt,
        Token::Gt => ComparisonOp::Gt,
        Token::LtEq => ComparisonOp::LtEq,
        Token::GtEq => ComparisonOp::GtEq,
        Token::Neq => ComparisonOp::Neq,
        Token::NullSafeEq => ComparisonOp::NullSafeEq,
        _ => return None,
    };
    Some(op)
}

/// Unary minus folds directly into numeric literals, so `limit -1` carries
/// `NumVal(-1)` and a doubled minus cancels out.
fn fold_unary_minus(expr: ValExpr) -> ValExpr {
    match expr {
        ValExpr::NumVal(num) => {
            if num.first() == Some(&b'-') {
                ValExpr::NumVal(num[1..].to_vec())
            } else {
                let mut bytes = Vec::with_capacity(num.len() + 1);
                bytes.push(b'-');
                bytes.extend_from_slice(&num);
                ValExpr::NumVal(bytes)
            }
        }
        expr => ValExpr::UnaryExpr {
            op: UnaryOp::Minus,
            expr: Box::new(expr),
        },
    }
}

fn column_type_str(kw: Keyword) -> Option<&'static str> {
    let t = match kw {
        Keyword::BIT => "bit",
        Keyword::TINYINT => "tinyint",
        Keyword::SMALLINT => "smallint",
        Keyword::MEDIUMINT => "mediumint",
        Keyword::INT => "int",
        Keyword::INTEGER => "integer",
        Keyword::BIGINT => "bigint",
        Keyword::REAL => "real",
        Keyword::DOUBLE => "double",
        Keyword::FLOAT => "float",
        Keyword::DECIMAL => "decimal",
        Keyword::NUMERIC => "numeric",
        Keyword::CHAR => "char",
        Keyword::VARCHAR => "varchar",
        Keyword::TEXT => "text",
        Keyword::DATE => "date",
        Keyword::TIME => "time",
        Keyword::TIMESTAMP => "timestamp",
        Keyword::DATETIME => "datetime",
        Keyword::YEAR => "year",
        _ => return None,
    };
    Some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_reports_token_and_position() {
        let err = parse("select * from t wheer a = 1").unwrap_err();
        assert_eq!(
            err,
            ParserError::ParserError("Expected end of statement, found: a at position 23".into())
        );

        let err = parse("select * from").unwrap_err();
        assert_eq!(
            err,
            ParserError::ParserError("Expected identifier, found: EOF at position 14".into())
        );
    }

    #[test]
    fn lex_error_surfaces_as_tokenizer_error() {
        let err = parse("select * from t where a = 'unterminated").unwrap_err();
        match err {
            ParserError::TokenizerError(msg) => {
                assert!(msg.starts_with("unterminated string"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn statement_dispatch_error_lists_the_verbs() {
        let err = parse("frobnicate t").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Expected one of select, insert"), "{msg}");
        assert!(msg.contains("found: frobnicate at position 1"), "{msg}");
    }

    #[test]
    fn deep_nesting_hits_the_recursion_limit() {
        let mut sql = String::from("select ");
        for _ in 0..100 {
            sql.push('(');
        }
        sql.push('1');
        for _ in 0..100 {
            sql.push(')');
        }
        sql.push_str(" from t");
        assert_eq!(parse(&sql).unwrap_err(), ParserError::RecursionLimitExceeded);
    }

    #[test]
    fn bare_column_is_not_a_boolean() {
        let err = parse("select * from t where a").unwrap_err();
        assert_eq!(
            err,
            ParserError::ParserError("Expected boolean expression, found: a".into())
        );
    }

    #[test]
    fn non_associative_comparison() {
        let err = parse("select * from t where a = b = c").unwrap_err();
        assert_eq!(
            err,
            ParserError::ParserError("Expected value expression, found: a = b".into())
        );
    }

    #[test]
    fn star_restricted_to_count() {
        assert!(parse("select count(*) from t").is_ok());
        let err = parse("select sum(*) from t").unwrap_err();
        assert_eq!(
            err,
            ParserError::ParserError("'*' argument is only supported in count(*)".into())
        );
    }
}

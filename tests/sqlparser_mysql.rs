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

#![warn(clippy::all)]
//! End-to-end tests: statements parse into the expected trees and their
//! canonical form re-parses to an equal tree (the round-trip guarantee).

use matches::assert_matches;
use mysqlparse::ast::*;
use mysqlparse::format::{format_with_list_args, to_bytes, TrackedBuffer};
use mysqlparse::test_utils::*;
use mysqlparse::{parse, parse_bytes, ParserError};
use pretty_assertions::assert_eq;

#[test]
fn parse_simple_select() {
    let stmt = verified_stmt("select a, b from t where a = 1 and b != 2");
    assert_eq!(
        stmt,
        Statement::Select(Box::new(Select {
            comments: Comments::default(),
            distinct: false,
            select_exprs: vec![select_expr(col("a")), select_expr(col("b"))],
            from: vec![TableExpr::Aliased(AliasedTableExpr {
                expr: SimpleTableExpr::Table(TableName {
                    name: b"t".to_vec(),
                    qualifier: None,
                }),
                alias: None,
                hints: None,
            })],
            where_clause: Some(Where {
                typ: WhereType::Where,
                expr: BoolExpr::And(
                    Box::new(BoolExpr::Comparison {
                        left: col("a"),
                        op: ComparisonOp::Eq,
                        right: num("1"),
                    }),
                    Box::new(BoolExpr::Comparison {
                        left: col("b"),
                        op: ComparisonOp::Neq,
                        right: num("2"),
                    }),
                ),
            }),
            time_range: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
            lock: Lock::None,
        }))
    );
}

#[test]
fn whitespace_collapses_to_canonical_form() {
    one_statement_parses_to(
        "SELECT  a ,   b\nFROM\tt  WHERE a = 1",
        "select a, b from t where a = 1",
    );
}

#[test]
fn parse_left_join() {
    let stmt = verified_stmt("select * from t1 left join t2 on t1.id = t2.id");
    let select = match stmt {
        Statement::Select(s) => s,
        other => panic!("expected select, got {other:?}"),
    };
    assert_eq!(select.select_exprs, vec![SelectExpr::Star { table: None }]);
    match &select.from[0] {
        TableExpr::Join(join) => {
            assert_eq!(join.join, JoinKind::LeftJoin);
            assert_eq!(
                join.on,
                Some(BoolExpr::Comparison {
                    left: qual_col("t1", "id"),
                    op: ComparisonOp::Eq,
                    right: qual_col("t2", "id"),
                })
            );
        }
        other => panic!("expected join, got {other:?}"),
    }
}

#[test]
fn join_kinds_normalize() {
    one_statement_parses_to(
        "select * from a inner join b on x = y",
        "select * from a join b on x = y",
    );
    one_statement_parses_to(
        "select * from a left outer join b on x = y",
        "select * from a left join b on x = y",
    );
    verified_stmt("select * from a right join b on x = y");
    verified_stmt("select * from a straight_join b");
    verified_stmt("select * from a cross join b");
    verified_stmt("select * from a natural join b");
    verified_stmt("select * from a join b on a.x = b.x join c on c.y = b.y");
    verified_stmt("select * from (t1 join t2 on a = b)");
}

#[test]
fn parse_insert_values() {
    let stmt = verified_stmt("insert into t(a, b) values (1, 2), (3, 4)");
    let insert = match stmt {
        Statement::Insert(i) => i,
        other => panic!("expected insert, got {other:?}"),
    };
    assert_eq!(
        insert.columns,
        Some(Columns(vec![
            ColName {
                name: b"a".to_vec(),
                qualifier: None,
            },
            ColName {
                name: b"b".to_vec(),
                qualifier: None,
            },
        ]))
    );
    assert_eq!(
        insert.rows,
        InsertRows::Values(vec![
            RowTuple::Tuple(ValTuple(vec![num("1"), num("2")])),
            RowTuple::Tuple(ValTuple(vec![num("3"), num("4")])),
        ])
    );
}

#[test]
fn parse_insert_variants() {
    verified_stmt("insert into db.t values (1)");
    verified_stmt("insert into t values ()");
    verified_stmt("insert into t values (select a from u)");
    verified_stmt("insert into t(a, b) select a, b from u on duplicate key update a = 1");
    one_statement_parses_to(
        "insert into t (select * from u)",
        "insert into t select * from u",
    );
}

#[test]
fn rewrite_bind_var_tuples_into_list_args() {
    let stmt = verified_stmt("select * from t where id in (:a, :b, :c)");
    let (sql, bindings) = format_with_list_args(&stmt);
    assert_eq!(sql, b"select * from t where id in ::arg1".to_vec());
    assert_eq!(bindings.len(), 1);
    assert_eq!(
        bindings["arg1"],
        ValTuple(vec![
            ValExpr::ValArg(b":a".to_vec()),
            ValExpr::ValArg(b":b".to_vec()),
            ValExpr::ValArg(b":c".to_vec()),
        ])
    );
    // the rewritten form is itself parseable
    verified_stmt("select * from t where id in ::arg1");

    // tuples with non-bind-variable members are left alone
    let stmt = verified_stmt("select * from t where id in (:a, 1)");
    let (sql, bindings) = format_with_list_args(&stmt);
    assert_eq!(sql, b"select * from t where id in (:a, 1)".to_vec());
    assert!(bindings.is_empty());
}

#[test]
fn parse_count_distinct() {
    let stmt = verified_stmt("select count(distinct x) from t");
    let select = match stmt {
        Statement::Select(s) => s,
        other => panic!("expected select, got {other:?}"),
    };
    match &select.select_exprs[0] {
        SelectExpr::Expr {
            expr: Expr::Val(ValExpr::FuncExpr(f)),
            alias: None,
        } => {
            assert_eq!(f.name, b"count".to_vec());
            assert!(f.distinct);
            assert!(f.is_aggregate());
            assert_eq!(f.exprs, vec![select_expr(col("x"))]);
        }
        other => panic!("expected function call, got {other:?}"),
    }
}

#[test]
fn limit_extraction() {
    let extract = |sql: &str| match verified_stmt(sql) {
        Statement::Select(s) => s.limit.unwrap().limits(),
        other => panic!("expected select, got {other:?}"),
    };

    assert_eq!(
        extract("select * from t limit 10"),
        Ok((None, LimitVal::Number(10)))
    );
    assert_eq!(
        extract("select * from t limit 5, 10"),
        Ok((Some(LimitVal::Number(5)), LimitVal::Number(10)))
    );
    assert_eq!(
        extract("select * from t limit :o, :c"),
        Ok((
            Some(LimitVal::Arg(b"o".to_vec())),
            LimitVal::Arg(b"c".to_vec())
        ))
    );
    // parses fine, fails only at extraction time
    assert_eq!(
        extract("select * from t limit -1"),
        Err(ParserError::ParserError("negative limit: -1".into()))
    );
    assert_eq!(
        extract("select * from t limit 'abc'"),
        Err(ParserError::ParserError(
            "unexpected node for rowcount".into()
        ))
    );
}

#[test]
fn parse_errors() {
    assert_matches!(
        parse("select * from").unwrap_err(),
        ParserError::ParserError(_)
    );
    assert_matches!(
        parse("select * from t where a = 'unterminated").unwrap_err(),
        ParserError::TokenizerError(_)
    );
    assert_matches!(
        parse("select * from t where a like b = c").unwrap_err(),
        ParserError::ParserError(_)
    );
}

#[test]
fn parse_union_chains_left_associative() {
    let stmt =
        verified_stmt("select 1 from t union select 2 from u union all select 3 from v");
    let union = match stmt {
        Statement::Union(u) => u,
        other => panic!("expected union, got {other:?}"),
    };
    assert_eq!(union.op, UnionOp::UnionAll);
    match &union.left {
        SelectStatement::Union(inner) => assert_eq!(inner.op, UnionOp::Union),
        other => panic!("expected nested union, got {other:?}"),
    }

    verified_stmt("select 1 from t minus select 2 from u");
    verified_stmt("select 1 from t except select 2 from u");
    verified_stmt("select 1 from t intersect select 2 from u");
}

#[test]
fn keyword_identifiers_are_backtick_escaped() {
    let stmt = verified_stmt("select `order` from t");
    match stmt {
        Statement::Select(s) => {
            assert_eq!(s.select_exprs[0], select_expr(col("order")));
        }
        other => panic!("expected select, got {other:?}"),
    }
    // quoting is dropped when the name does not collide
    one_statement_parses_to("select `a` from `t`", "select a from t");
    // non-identifier shapes keep their quotes
    verified_stmt("select `odd name` from t");
    verified_stmt("select * from t as `order`");
}

#[test]
fn string_literals_round_trip() {
    let stmt = verified_stmt("select 'don''t' from t");
    match stmt {
        Statement::Select(s) => {
            assert_eq!(s.select_exprs[0], select_expr(sval("don't")));
        }
        other => panic!("expected select, got {other:?}"),
    }
    verified_stmt(r"select 'a\nb' from t");
    verified_stmt(r"select '\Z' from t");
    // the backslash of \% survives unescaping, re-encoded as \\%
    one_statement_parses_to(r"select 'a\%b' from t", r"select 'a\\%b' from t");
    // unknown escapes drop the backslash
    one_statement_parses_to(r"select '\q' from t", "select 'q' from t");
    // double-quoted strings normalize to single quotes
    one_statement_parses_to(r#"select "x" from t"#, "select 'x' from t");
}

#[test]
fn non_utf8_literals_round_trip_bit_exactly() {
    let sql = b"select 'a\xffb' from t";
    let stmt = parse_bytes(sql).unwrap();
    assert_eq!(to_bytes(&stmt), sql.to_vec());
    assert_eq!(parse_bytes(&to_bytes(&stmt)).unwrap(), stmt);
}

#[test]
fn shallow_ddl_decodes_actions() {
    assert_eq!(
        verified_stmt("create table t"),
        Statement::Ddl(Box::new(Ddl {
            action: DdlAction::Create,
            table: None,
            new_name: Some(b"t".to_vec()),
        }))
    );
    one_statement_parses_to("create table t2 like t1", "create table t2");
    one_statement_parses_to("create view v as select * from t", "create table v");
    one_statement_parses_to("create index i on t using btree", "alter table t");

    assert_eq!(
        one_statement_parses_to("alter table t add column c int", "alter table t"),
        Statement::Ddl(Box::new(Ddl {
            action: DdlAction::Alter,
            table: Some(b"t".to_vec()),
            new_name: Some(b"t".to_vec()),
        }))
    );
    one_statement_parses_to("alter ignore table t drop column c", "alter table t");
    one_statement_parses_to("alter view v as select 1 from t", "alter table v");
    one_statement_parses_to("drop index i on t", "alter table t");

    assert_eq!(
        one_statement_parses_to("drop table if exists t", "drop table t"),
        Statement::Ddl(Box::new(Ddl {
            action: DdlAction::Drop,
            table: Some(b"t".to_vec()),
            new_name: None,
        }))
    );
    one_statement_parses_to("drop view v", "drop table v");

    assert_eq!(
        verified_stmt("rename table a to b"),
        Statement::Ddl(Box::new(Ddl {
            action: DdlAction::Rename,
            table: Some(b"a".to_vec()),
            new_name: Some(b"b".to_vec()),
        }))
    );
    one_statement_parses_to("alter table a rename to b", "rename table a to b");
    one_statement_parses_to("alter table a rename b", "rename table a to b");
}

#[test]
fn create_table_with_columns() {
    let stmt = verified_stmt(
        "create table t (id int not null auto_increment primary key, \
         name varchar default 'x', ts timestamp)",
    );
    let create = match stmt {
        Statement::CreateTable(c) => c,
        other => panic!("expected create table, got {other:?}"),
    };
    assert_eq!(create.name, b"t".to_vec());
    assert_eq!(
        create.columns[0],
        ColumnDefinition {
            name: b"id".to_vec(),
            col_type: b"int".to_vec(),
            attrs: vec![
                b"not null".to_vec(),
                b"auto_increment".to_vec(),
                b"primary key".to_vec(),
            ],
        }
    );

    one_statement_parses_to(
        "CREATE TABLE t (id INT NOT NULL, n DECIMAL UNSIGNED ZEROFILL)",
        "create table t (id int not null, n decimal unsigned zerofill)",
    );
    verified_stmt("create table t (a int unique key, b int key)");
    one_statement_parses_to(
        "create table if not exists t (a bigint)",
        "create table t (a bigint)",
    );
}

#[test]
fn parse_update_delete_set() {
    verified_stmt("update t set a = 1, t.b = 2 where id = 3 order by id asc limit 10");
    verified_stmt("delete from t where id = 1 order by id desc limit 1");
    verified_stmt("set a = 1, b = 'two'");
    let stmt = verified_stmt("set names = 'utf8'");
    assert_matches!(stmt, Statement::Set(_));
}

#[test]
fn show_describe_explain_are_opaque() {
    let stmt = parse("show tables").unwrap();
    assert_eq!(stmt, Statement::Other);
    assert_eq!(stmt.to_string(), "show");
    assert_eq!(parse("describe t").unwrap(), Statement::Other);
    assert_eq!(parse("explain select * from t").unwrap(), Statement::Other);
    // the opaque tail is never lexed, so it cannot fail the parse
    assert_eq!(parse("show 'unterminated").unwrap(), Statement::Other);
}

#[test]
fn leading_comments_are_kept() {
    let stmt = verified_stmt("/* leading */ select a from t");
    match &stmt {
        Statement::Select(s) => {
            assert_eq!(s.comments, Comments(vec![b"/* leading */".to_vec()]));
        }
        other => panic!("expected select, got {other:?}"),
    }
    verified_stmt("-- note\nselect a from t");
    verified_stmt("/* a */ # b\nselect a from t");
    verified_stmt("/* audit */ update t set a = 1");
    // comments anywhere else are dropped
    one_statement_parses_to("select /* inner */ a from t", "select a from t");
}

#[test]
fn parse_time_range() {
    verified_stmt("select * from t where a = 1 timerange '2020-01-01', '2020-02-01'");
    verified_stmt("select * from t timerange :start");
    assert_matches!(
        parse("select * from t timerange a").unwrap_err(),
        ParserError::ParserError(_)
    );
}

#[test]
fn parse_case_expressions() {
    verified_stmt("select case x when 1 then 'one' else 'other' end from t");
    verified_stmt("select case when a = 1 then 2 when a = 3 then 4 end from t");
}

#[test]
fn parse_subqueries() {
    verified_stmt("select * from t where exists (select 1 from u)");
    verified_stmt("select * from t where id in (select id from u)");
    verified_stmt("select * from t where id = (select max(id) from u)");
    verified_stmt("select * from (select a from u) as sub");
    verified_stmt("select (select a from u) as x from t");
    verified_stmt("select * from t where id in (select a from u union select b from v)");
}

#[test]
fn expression_precedence() {
    let where_expr = |sql: &str| match verified_stmt(sql) {
        Statement::Select(s) => s.where_clause.unwrap().expr,
        other => panic!("expected select, got {other:?}"),
    };

    // between binds tighter than and
    assert_eq!(
        where_expr("select * from t where a between 1 and 2 and b = 3"),
        BoolExpr::And(
            Box::new(BoolExpr::Range {
                left: col("a"),
                negated: false,
                from: num("1"),
                to: num("2"),
            }),
            Box::new(BoolExpr::Comparison {
                left: col("b"),
                op: ComparisonOp::Eq,
                right: num("3"),
            }),
        )
    );

    // not binds tighter than and
    assert_eq!(
        where_expr("select * from t where not a = 1 and b = 2"),
        BoolExpr::And(
            Box::new(BoolExpr::Not(Box::new(BoolExpr::Comparison {
                left: col("a"),
                op: ComparisonOp::Eq,
                right: num("1"),
            }))),
            Box::new(BoolExpr::Comparison {
                left: col("b"),
                op: ComparisonOp::Eq,
                right: num("2"),
            }),
        )
    );

    verified_stmt("select * from t where (a = 1 or b = 2) and c = 3");
    verified_stmt("select * from t where a is null and b is not null");
    verified_stmt("select * from t where a not between 1 and 2");
    verified_stmt("select * from t where a not in (1, 2)");
    verified_stmt("select * from t where a not like 'x%'");
    verified_stmt("select * from t where a <=> null");
    verified_stmt("select * from t where (a, b) in ((1, 2), (3, 4))");
    verified_stmt("select * from t where a in ::ids");
}

#[test]
fn arithmetic_precedence_and_format() {
    let first_expr = |sql: &str| match verified_stmt(sql) {
        Statement::Select(s) => match s.select_exprs.into_iter().next().unwrap() {
            SelectExpr::Expr {
                expr: Expr::Val(v), ..
            } => v,
            other => panic!("expected value expression, got {other:?}"),
        },
        other => panic!("expected select, got {other:?}"),
    };

    assert_eq!(
        first_expr("select 1+2*3 from t"),
        ValExpr::BinaryExpr {
            left: Box::new(num("1")),
            op: BinaryOp::Plus,
            right: Box::new(ValExpr::BinaryExpr {
                left: Box::new(num("2")),
                op: BinaryOp::Mul,
                right: Box::new(num("3")),
            }),
        }
    );
    assert_eq!(
        first_expr("select 1|2&3 from t"),
        ValExpr::BinaryExpr {
            left: Box::new(num("1")),
            op: BinaryOp::BitOr,
            right: Box::new(ValExpr::BinaryExpr {
                left: Box::new(num("2")),
                op: BinaryOp::BitAnd,
                right: Box::new(num("3")),
            }),
        }
    );
    assert_eq!(
        first_expr("select a||b from t"),
        ValExpr::BinaryExpr {
            left: Box::new(col("a")),
            op: BinaryOp::Concat,
            right: Box::new(col("b")),
        }
    );
    one_statement_parses_to("select a || b from t", "select a||b from t");
    verified_stmt("select 1<<2 from t");
    verified_stmt("select (1+2)*3 from t");
    verified_stmt("select a%2 from t");
}

#[test]
fn unary_minus_folds_into_numbers() {
    one_statement_parses_to("select - 1 from t", "select -1 from t");
    one_statement_parses_to("select - -1 from t", "select 1 from t");
    verified_stmt("select -1 from t");
    verified_stmt("select -(1) from t");
    verified_stmt("select ~a from t");
    verified_stmt("select +1 from t");
    verified_stmt("select -1.5e-3 from t");
    verified_stmt("select 0xbeef from t");
}

#[test]
fn select_modifiers() {
    verified_stmt("select distinct a from t");
    verified_stmt("select a, count(*) from t group by a having count(*) > 1");
    verified_stmt("select * from t order by a asc, b desc");
    verified_stmt("select * from t where a = 1 for update");
    verified_stmt("select * from t lock in share mode");
    verified_stmt("select t.* from db.t as x");
    one_statement_parses_to("select a x, b as y from t z", "select a as x, b as y from t as z");
    one_statement_parses_to("select a from t;", "select a from t");
}

#[test]
fn index_hints() {
    verified_stmt("select * from t use index (i1, i2)");
    verified_stmt("select * from t ignore index (i)");
    verified_stmt("select * from t as x force index (i)");
}

#[test]
fn bind_locations_cover_every_arg() {
    let stmt = parse("select * from t where a = :a and b in ::list").unwrap();
    let mut buf = TrackedBuffer::new();
    buf.write_node(&stmt);
    let locations = buf.bind_locations().to_vec();
    let bytes = buf.into_bytes();
    assert_eq!(locations.len(), 2);
    let args: Vec<&[u8]> = locations
        .iter()
        .map(|loc| &bytes[loc.offset..loc.offset + loc.length])
        .collect();
    assert_eq!(args, vec![&b":a"[..], &b"::list"[..]]);
}

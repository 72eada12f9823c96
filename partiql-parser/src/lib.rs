//! # partiql-parser
//!
//! partiql-parser is a PartiQL parser, which converts a sequence of tokens
//! into an abstract syntax tree.
//!
//! Parsing runs in two stages: a Pratt expression parser fused with
//! keyword-driven statement sub-parsers produces an intermediate parse tree,
//! which is then structurally validated and rewritten into the typed AST of
//! [`partiql_ast`].

#![deny(missing_docs)]
#![deny(unused_imports)]

mod build;
mod error;
mod node;
mod parser;
mod view;

pub use self::{
    error::{ErrorCode, ParserError},
    parser::Parser,
};

#[cfg(test)]
mod tests {
    use partiql_ast::{
        ColumnComponent, ConflictAction, DmlOp, Expr, FromSource, GroupingStrategy, JoinKind,
        NAryOp, OrderingSpec, Projection, ReturningMapping, ScopeQualifier, SelectItem, SeqKind,
        SetQuantifier, Statement, TypedOp, TypeName, Value,
    };
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn parse(source: &str) -> Expr {
        Parser::new()
            .parse_expr_node(source)
            .unwrap_or_else(|err| panic!("parse failed for {:?}: {}", source, err))
    }

    fn parse_err(source: &str) -> ErrorCode {
        Parser::new()
            .parse_expr_node(source)
            .expect_err(&format!("parse unexpectedly succeeded for {:?}", source))
            .code
    }

    fn var(expr: &Expr) -> &str {
        match expr {
            Expr::VarRef(var) => &var.name,
            other => panic!("expected a variable reference, got {:?}", other),
        }
    }

    fn lit(expr: &Expr) -> &Value {
        match expr {
            Expr::Lit(lit) => &lit.value,
            other => panic!("expected a literal, got {:?}", other),
        }
    }

    fn nary(expr: &Expr) -> (&NAryOp, &Vec<Expr>) {
        match expr {
            Expr::NAry(nary) => (&nary.op, &nary.operands),
            other => panic!("expected an n-ary node, got {:?}", other),
        }
    }

    fn select(expr: &Expr) -> &partiql_ast::Select {
        match expr {
            Expr::Select(select) => select,
            other => panic!("expected a select, got {:?}", other),
        }
    }

    fn dml(expr: &Expr) -> &partiql_ast::DataManipulation {
        match expr {
            Expr::Dml(dml) => dml,
            other => panic!("expected DML, got {:?}", other),
        }
    }

    // ------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------

    #[test]
    fn literals_and_folding() {
        assert_eq!(lit(&parse("5")), &Value::Integer(5));
        assert_eq!(lit(&parse("-5")), &Value::Integer(-5));
        assert_eq!(lit(&parse("+5")), &Value::Integer(5));
        assert_eq!(lit(&parse("-1.5")), &Value::Decimal("-1.5".into()));
        assert_eq!(lit(&parse("'a'")), &Value::Text("a".into()));
        assert_eq!(lit(&parse("null")), &Value::Null);
        assert_eq!(lit(&parse("missing")), &Value::Missing);
        assert_eq!(lit(&parse("`[1, 2]`")), &Value::Ion("[1, 2]".into()));
    }

    #[test]
    fn left_associativity() {
        // a - b - c parses as (a - b) - c
        let expr = parse("a - b - c");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Sub);
        assert_eq!(var(&operands[1]), "c");
        let (inner_op, inner) = nary(&operands[0]);
        assert_eq!(inner_op, &NAryOp::Sub);
        assert_eq!(var(&inner[0]), "a");
        assert_eq!(var(&inner[1]), "b");
    }

    #[test]
    fn precedence_shapes() {
        // a + b * c parses as a + (b * c)
        let expr = parse("a + b * c");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Add);
        let (inner_op, _) = nary(&operands[1]);
        assert_eq!(inner_op, &NAryOp::Mul);

        // a OR b AND c parses as a OR (b AND c)
        let expr = parse("a OR b AND c");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Or);
        let (inner_op, _) = nary(&operands[1]);
        assert_eq!(inner_op, &NAryOp::And);

        // NOT binds looser than comparison: NOT a = b is NOT (a = b)
        let expr = parse("NOT a = b");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Not);
        let (inner_op, _) = nary(&operands[0]);
        assert_eq!(inner_op, &NAryOp::Eq);
    }

    #[test]
    fn between_and_like_ternaries() {
        let expr = parse("a BETWEEN 1 AND 2 AND b LIKE 'x%' ESCAPE '\\'");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::And);
        let (between_op, between) = nary(&operands[0]);
        assert_eq!(between_op, &NAryOp::Between);
        assert_eq!(between.len(), 3);
        let (like_op, like) = nary(&operands[1]);
        assert_eq!(like_op, &NAryOp::Like);
        assert_eq!(like.len(), 3);
        assert_eq!(lit(&like[2]), &Value::Text("\\".into()));
    }

    #[test]
    fn negated_forms_rewrite_to_legacy_not() {
        let expr = parse("a NOT IN (1, 2)");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Not);
        assert!(expr.metas().legacy_logical_not);
        let (inner_op, inner) = nary(&operands[0]);
        assert_eq!(inner_op, &NAryOp::In);
        match &inner[1] {
            Expr::Seq(seq) => assert_eq!(seq.kind, SeqKind::List),
            other => panic!("expected an IN list, got {:?}", other),
        }

        let expr = parse("x IS NOT NULL");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::Not);
        match &operands[0] {
            Expr::Typed(typed) => {
                assert_eq!(typed.op, TypedOp::Is);
                assert_eq!(typed.data_type.name, TypeName::Null);
            }
            other => panic!("expected IS, got {:?}", other),
        }
    }

    #[test]
    fn in_subquery_falls_through() {
        let expr = parse("x IN (SELECT a FROM t)");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::In);
        assert!(matches!(&operands[1], Expr::Select(_)));
    }

    #[test]
    fn paths_and_wildcards() {
        let expr = parse("a.b[0].\"C\"[*].*");
        match expr {
            Expr::Path(path) => {
                assert_eq!(var(&path.root), "a");
                assert_eq!(path.components.len(), 5);
                assert!(matches!(
                    path.components[4],
                    partiql_ast::PathComponent::Unpivot
                ));
                assert!(matches!(
                    path.components[3],
                    partiql_ast::PathComponent::Wildcard
                ));
            }
            other => panic!("expected a path, got {:?}", other),
        }
    }

    #[test]
    fn lexically_scoped_variable() {
        let expr = parse("@x.y");
        match expr {
            Expr::Path(path) => match path.root.as_ref() {
                Expr::VarRef(var) => {
                    assert_eq!(var.name, "x");
                    assert_eq!(var.qualifier, ScopeQualifier::Lexical);
                }
                other => panic!("expected a var ref, got {:?}", other),
            },
            other => panic!("expected a path, got {:?}", other),
        }
        assert_eq!(parse_err("@1"), ErrorCode::MissingIdentifierAfterAt);
    }

    #[test]
    fn parameters() {
        let expr = parse("? + ?");
        let (_, operands) = nary(&expr);
        match (&operands[0], &operands[1]) {
            (Expr::Param(first), Expr::Param(second)) => {
                assert_eq!(first.index, 1);
                assert_eq!(second.index, 2);
            }
            other => panic!("expected parameters, got {:?}", other),
        }
    }

    #[test]
    fn seq_and_struct_literals() {
        match parse("[1, 2]") {
            Expr::Seq(seq) => assert_eq!(seq.kind, SeqKind::List),
            other => panic!("expected a list, got {:?}", other),
        }
        match parse("<< 1, 2 >>") {
            Expr::Seq(seq) => assert_eq!(seq.kind, SeqKind::Bag),
            other => panic!("expected a bag, got {:?}", other),
        }
        match parse("sexp(1, 2)") {
            Expr::Seq(seq) => assert_eq!(seq.kind, SeqKind::Sexp),
            other => panic!("expected a sexp, got {:?}", other),
        }
        match parse("{'a': 1, 'b': 2}") {
            Expr::Struct(node) => assert_eq!(node.fields.len(), 2),
            other => panic!("expected a struct, got {:?}", other),
        }
        match parse("{}") {
            Expr::Struct(node) => assert!(node.fields.is_empty()),
            other => panic!("expected a struct, got {:?}", other),
        }
    }

    #[test]
    fn row_constructor_and_grouping() {
        match parse("(1, 2)") {
            Expr::Seq(seq) => assert_eq!(seq.kind, SeqKind::List),
            other => panic!("expected a row constructor, got {:?}", other),
        }
        assert_eq!(lit(&parse("(1)")), &Value::Integer(1));
        assert_eq!(parse_err("()"), ErrorCode::ExpectedExpression);
    }

    #[test]
    fn case_expressions() {
        match parse("CASE WHEN a THEN 1 ELSE 2 END") {
            Expr::Case(case) => {
                assert!(case.operand.is_none());
                assert_eq!(case.when_clauses.len(), 1);
                assert!(case.else_clause.is_some());
            }
            other => panic!("expected CASE, got {:?}", other),
        }
        match parse("CASE x WHEN 1 THEN 'a' END") {
            Expr::Case(case) => assert!(case.operand.is_some()),
            other => panic!("expected CASE, got {:?}", other),
        }
        assert_eq!(parse_err("CASE END"), ErrorCode::UnexpectedKeyword);
    }

    // ------------------------------------------------------------------
    // functions and aggregates
    // ------------------------------------------------------------------

    #[test]
    fn call_and_aggregates() {
        match parse("foo(1, 2)") {
            Expr::Call(call) => {
                assert_eq!(call.name.value, "foo");
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected a call, got {:?}", other),
        }

        match parse("COUNT(*)") {
            Expr::CallAgg(agg) => {
                assert_eq!(agg.name.value, "count");
                assert!(agg.arg.is_none());
            }
            other => panic!("expected an aggregate, got {:?}", other),
        }
        match parse("COUNT(DISTINCT a)") {
            Expr::CallAgg(agg) => {
                assert_eq!(agg.quantifier, SetQuantifier::Distinct);
                assert!(agg.arg.is_some());
            }
            other => panic!("expected an aggregate, got {:?}", other),
        }
        match parse("SUM(a)") {
            Expr::CallAgg(agg) => assert_eq!(agg.quantifier, SetQuantifier::All),
            other => panic!("expected an aggregate, got {:?}", other),
        }

        assert_eq!(
            parse_err("COUNT(DISTINCT *)"),
            ErrorCode::UnsupportedCallWithStar
        );
        assert_eq!(parse_err("AVG(*)"), ErrorCode::UnsupportedCallWithStar);
        assert_eq!(
            parse_err("SUM(a, b)"),
            ErrorCode::NonUnaryAggregateFunctionCall
        );
    }

    #[test]
    fn special_form_builtins() {
        match parse("SUBSTRING('abcde' FROM 2 FOR 3)") {
            Expr::Call(call) => {
                assert_eq!(call.name.value, "substring");
                assert_eq!(call.args.len(), 3);
            }
            other => panic!("expected substring, got {:?}", other),
        }
        match parse("SUBSTRING('abcde', 2)") {
            Expr::Call(call) => assert_eq!(call.args.len(), 2),
            other => panic!("expected substring, got {:?}", other),
        }

        match parse("TRIM(LEADING ' ' FROM x)") {
            Expr::Call(call) => {
                assert_eq!(call.name.value, "trim");
                assert_eq!(call.args.len(), 3);
                assert_eq!(lit(&call.args[0]), &Value::Text("leading".into()));
            }
            other => panic!("expected trim, got {:?}", other),
        }
        match parse("TRIM(x)") {
            Expr::Call(call) => assert_eq!(call.args.len(), 1),
            other => panic!("expected trim, got {:?}", other),
        }

        match parse("EXTRACT(YEAR FROM ts)") {
            Expr::Call(call) => {
                assert_eq!(call.name.value, "extract");
                assert_eq!(lit(&call.args[0]), &Value::Text("year".into()));
            }
            other => panic!("expected extract, got {:?}", other),
        }
        match parse("DATE_ADD(day, 1, ts)") {
            Expr::Call(call) => {
                assert_eq!(call.name.value, "date_add");
                assert_eq!(call.args.len(), 3);
            }
            other => panic!("expected date_add, got {:?}", other),
        }
    }

    // ------------------------------------------------------------------
    // types and datetime literals
    // ------------------------------------------------------------------

    #[test]
    fn cast_expressions() {
        match parse("CAST(x AS DECIMAL(10, 2))") {
            Expr::Typed(typed) => {
                assert_eq!(typed.op, TypedOp::Cast);
                assert_eq!(typed.data_type.name, TypeName::Decimal);
                assert_eq!(typed.data_type.args, vec![10, 2]);
            }
            other => panic!("expected CAST, got {:?}", other),
        }
        match parse("CAST(x AS TIME(3) WITH TIME ZONE)") {
            Expr::Typed(typed) => {
                assert_eq!(typed.data_type.name, TypeName::TimeWithTimeZone);
                assert_eq!(typed.data_type.args, vec![3]);
            }
            other => panic!("expected CAST, got {:?}", other),
        }

        assert_eq!(parse_err("CAST(x AS VARCHAR(-1))"), ErrorCode::InvalidTypeParameter);
        assert_eq!(parse_err("CAST(x AS INT(1))"), ErrorCode::CastArityMismatch);
        assert_eq!(
            parse_err("CAST(x AS DECIMAL(1, 2, 3))"),
            ErrorCode::CastArityMismatch
        );
        assert_eq!(parse_err("CAST(x AS TIME(10))"), ErrorCode::InvalidPrecisionForTime);
        assert_eq!(parse_err("CAST(x AS foo)"), ErrorCode::ExpectedTypeName);
        assert_eq!(parse_err("CAST(x y)"), ErrorCode::ExpectedAs);
    }

    #[test]
    fn date_literals() {
        match parse("DATE '2021-02-28'") {
            Expr::DateLit(date) => {
                assert_eq!((date.year, date.month, date.day), (2021, 2, 28));
            }
            other => panic!("expected a date, got {:?}", other),
        }
        assert_eq!(parse_err("DATE '2021-02-29'"), ErrorCode::InvalidDateString);
        assert_eq!(parse_err("DATE '+99999-01-01'"), ErrorCode::InvalidDateString);
    }

    #[test]
    fn time_literals() {
        match parse("TIME '10:30:00.125'") {
            Expr::TimeLit(time) => {
                assert_eq!((time.hour, time.minute, time.second), (10, 30, 0));
                assert_eq!(time.nanos, 125_000_000);
                // precision derives from the fractional digits
                assert_eq!(time.precision, 3);
                assert!(!time.with_time_zone);
                assert_eq!(time.tz_minutes, None);
            }
            other => panic!("expected a time, got {:?}", other),
        }
        match parse("TIME (6) '10:30:00'") {
            Expr::TimeLit(time) => assert_eq!(time.precision, 6),
            other => panic!("expected a time, got {:?}", other),
        }
        match parse("TIME WITH TIME ZONE '10:00:00-05:30'") {
            Expr::TimeLit(time) => {
                assert!(time.with_time_zone);
                assert_eq!(time.tz_minutes, Some(-330));
            }
            other => panic!("expected a time, got {:?}", other),
        }
        // the system offset fills in when the string has none
        match parse("TIME WITH TIME ZONE '10:00:00'") {
            Expr::TimeLit(time) => {
                assert!(time.with_time_zone);
                assert!(time.tz_minutes.is_some());
            }
            other => panic!("expected a time, got {:?}", other),
        }

        assert_eq!(parse_err("TIME (10) '10:00:00'"), ErrorCode::InvalidPrecisionForTime);
        assert_eq!(parse_err("TIME '25:00:00'"), ErrorCode::InvalidTimeString);
        assert_eq!(
            parse_err("TIME '10:00:00+19:00'"),
            ErrorCode::InvalidTimeString
        );
    }

    // ------------------------------------------------------------------
    // SELECT
    // ------------------------------------------------------------------

    #[test]
    fn simple_select() {
        // SELECT a, b FROM t
        let expr = parse("SELECT a, b FROM t");
        let query = select(&expr);
        assert_eq!(query.quantifier, SetQuantifier::All);
        match &query.projection {
            Projection::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[0], SelectItem::Expr { .. }));
            }
            other => panic!("expected a projection list, got {:?}", other),
        }
        match query.from.as_ref().unwrap() {
            FromSource::Expr { expr, aliases } => {
                assert_eq!(var(expr), "t");
                assert_eq!(aliases.as_alias, None);
            }
            other => panic!("expected a source expression, got {:?}", other),
        }
    }

    #[test]
    fn full_select_clauses() {
        let expr = parse(
            "SELECT DISTINCT x FROM t WHERE x > 1 GROUP BY x HAVING COUNT(*) > 2 \
             ORDER BY x DESC LIMIT 10",
        );
        let query = select(&expr);
        assert_eq!(query.quantifier, SetQuantifier::Distinct);
        assert!(query.where_clause.is_some());
        let group = query.group_by.as_ref().unwrap();
        assert_eq!(group.strategy, GroupingStrategy::Full);
        assert_eq!(group.items.len(), 1);
        let having = query.having.as_ref().unwrap();
        let (op, operands) = nary(having);
        assert_eq!(op, &NAryOp::Gt);
        assert!(matches!(&operands[0], Expr::CallAgg(agg) if agg.arg.is_none()));
        let order = query.order_by.as_ref().unwrap();
        assert_eq!(order.specs[0].ordering, Some(OrderingSpec::Desc));
        assert_eq!(lit(query.limit.as_ref().unwrap()), &Value::Integer(10));
    }

    #[test]
    fn clause_order_follows_the_grammar_listing_too() {
        // LET and the WHERE/ORDER BY/GROUP BY order of the grammar listing
        let expr = parse(
            "SELECT x FROM t LET 1 + 1 AS two WHERE x ORDER BY x GROUP BY x GROUP AS g HAVING x LIMIT 1",
        );
        let query = select(&expr);
        assert_eq!(query.let_clause.as_ref().unwrap().bindings[0].name.value, "two");
        let group = query.group_by.as_ref().unwrap();
        assert_eq!(group.group_as.as_ref().unwrap().value, "g");
        assert!(query.order_by.is_some());
        assert!(query.having.is_some());
    }

    #[test]
    fn select_value_and_group_partial() {
        let expr = parse("SELECT VALUE v FROM t GROUP PARTIAL BY v AS g");
        let query = select(&expr);
        assert!(matches!(query.projection, Projection::Value(_)));
        let group = query.group_by.as_ref().unwrap();
        assert_eq!(group.strategy, GroupingStrategy::Partial);
        assert_eq!(group.items[0].alias.as_ref().unwrap().value, "g");
    }

    #[test]
    fn project_all_forms() {
        // both forms produce exactly one PROJECT_ALL item
        for source in ["SELECT * FROM t", "SELECT t.* FROM t"] {
            let expr = parse(source);
            let query = select(&expr);
            match &query.projection {
                Projection::List(items) => {
                    assert_eq!(items.len(), 1, "{}", source);
                    assert!(
                        matches!(items[0], SelectItem::ProjectAll { .. }),
                        "{}",
                        source
                    );
                }
                other => panic!("expected a projection list, got {:?}", other),
            }
        }
        // SELECT t.* keeps the path-less root
        let expr = parse("SELECT t.a.* FROM t");
        let query = select(&expr);
        match &query.projection {
            Projection::List(items) => match &items[0] {
                SelectItem::ProjectAll { expr: Some(path) } => {
                    assert!(matches!(path, Expr::Path(_)));
                }
                other => panic!("expected a path project-all, got {:?}", other),
            },
            other => panic!("expected a projection list, got {:?}", other),
        }
    }

    #[test]
    fn select_list_star_rules() {
        assert_eq!(
            parse_err("SELECT *, a FROM t"),
            ErrorCode::AsteriskIsNotAloneInSelectList
        );
        assert_eq!(
            parse_err("SELECT a, * FROM t"),
            ErrorCode::AsteriskIsNotAloneInSelectList
        );
        assert_eq!(
            parse_err("SELECT a.*.b FROM t"),
            ErrorCode::CannotMixWildcardsInSelectList
        );
        assert_eq!(
            parse_err("SELECT a[1].* FROM t"),
            ErrorCode::CannotMixWildcardsInSelectList
        );
        assert_eq!(
            parse_err("SELECT a[*] FROM t"),
            ErrorCode::CannotMixWildcardsInSelectList
        );
        // SELECT DISTINCT * is legal
        parse("SELECT DISTINCT * FROM t");
        assert_eq!(
            parse_err("SELECT DISTINCT *, a FROM t"),
            ErrorCode::AsteriskIsNotAloneInSelectList
        );
    }

    #[test]
    fn group_by_rejects_literals() {
        assert_eq!(
            parse_err("SELECT a FROM t GROUP BY 1"),
            ErrorCode::UnsupportedLiteralsGroupBy
        );
    }

    #[test]
    fn empty_select_list_is_an_error() {
        assert_eq!(parse_err("SELECT FROM t"), ErrorCode::ExpectedExpression);
    }

    // ------------------------------------------------------------------
    // FROM sources and joins
    // ------------------------------------------------------------------

    #[test]
    fn aliases_and_implicit_join() {
        let expr = parse("SELECT x FROM a AS x AT i BY b, c");
        let query = select(&expr);
        match query.from.as_ref().unwrap() {
            FromSource::Join(join) => {
                assert_eq!(join.kind, JoinKind::Inner);
                assert!(join.metas.implicit_cross_join);
                assert_eq!(lit(&join.on), &Value::Boolean(true));
                match &join.left {
                    FromSource::Expr { aliases, .. } => {
                        assert_eq!(aliases.as_alias.as_ref().unwrap().value, "x");
                        assert_eq!(aliases.at_alias.as_ref().unwrap().value, "i");
                        assert_eq!(aliases.by_alias.as_ref().unwrap().value, "b");
                    }
                    other => panic!("expected a source expression, got {:?}", other),
                }
            }
            other => panic!("expected a join, got {:?}", other),
        }
    }

    #[test]
    fn explicit_joins() {
        let expr = parse("SELECT x FROM a INNER JOIN b ON a.id = b.id LEFT JOIN c ON b.id = c.id");
        let query = select(&expr);
        match query.from.as_ref().unwrap() {
            FromSource::Join(outer) => {
                assert_eq!(outer.kind, JoinKind::Left);
                match &outer.left {
                    FromSource::Join(inner) => assert_eq!(inner.kind, JoinKind::Inner),
                    other => panic!("expected a nested join, got {:?}", other),
                }
            }
            other => panic!("expected a join, got {:?}", other),
        }

        let expr = parse("SELECT x FROM a LEFT CROSS JOIN b");
        let query = select(&expr);
        match query.from.as_ref().unwrap() {
            FromSource::Join(join) => {
                assert_eq!(join.kind, JoinKind::Left);
                assert_eq!(lit(&join.on), &Value::Boolean(true));
            }
            other => panic!("expected a join, got {:?}", other),
        }

        assert_eq!(
            parse_err("SELECT x FROM a JOIN b"),
            ErrorCode::ExpectedKeyword
        );
        assert_eq!(parse_err("SELECT x FROM a LEFT b"), ErrorCode::MalformedJoin);
    }

    #[test]
    fn unpivot_source() {
        let expr = parse("SELECT k, v FROM UNPIVOT s AS v AT k");
        let query = select(&expr);
        match query.from.as_ref().unwrap() {
            FromSource::Unpivot { aliases, .. } => {
                assert_eq!(aliases.as_alias.as_ref().unwrap().value, "v");
                assert_eq!(aliases.at_alias.as_ref().unwrap().value, "k");
            }
            other => panic!("expected unpivot, got {:?}", other),
        }
    }

    #[test]
    fn parenthesized_sources() {
        // a parenthesized join tree is a single source
        let expr = parse("SELECT x FROM (a INNER JOIN b ON c)");
        let query = select(&expr);
        assert!(matches!(query.from.as_ref().unwrap(), FromSource::Join(_)));

        // a parenthesized sub-query is an expression source
        let expr = parse("SELECT x FROM (SELECT y FROM t) AS s");
        let query = select(&expr);
        match query.from.as_ref().unwrap() {
            FromSource::Expr { expr, aliases } => {
                assert!(matches!(expr.as_ref(), Expr::Select(_)));
                assert_eq!(aliases.as_alias.as_ref().unwrap().value, "s");
            }
            other => panic!("expected a sub-query source, got {:?}", other),
        }
    }

    #[test]
    fn pivot_query() {
        let expr = parse("PIVOT v AT n FROM t WHERE v > 0");
        let query = select(&expr);
        match &query.projection {
            Projection::Pivot { value, at } => {
                assert_eq!(var(value), "v");
                assert_eq!(var(at), "n");
            }
            other => panic!("expected a pivot, got {:?}", other),
        }
        assert!(query.where_clause.is_some());
    }

    #[test]
    fn set_operators_combine_queries() {
        let expr = parse("(SELECT a FROM t) UNION ALL (SELECT b FROM u)");
        let (op, operands) = nary(&expr);
        assert_eq!(op, &NAryOp::UnionAll);
        assert_eq!(operands.len(), 2);
    }

    // ------------------------------------------------------------------
    // WITH
    // ------------------------------------------------------------------

    #[test]
    fn select_without_from() {
        let expr = parse("SELECT 1");
        let query = select(&expr);
        assert!(query.from.is_none());
        match &query.projection {
            Projection::List(items) => assert_eq!(items.len(), 1),
            other => panic!("expected a projection list, got {:?}", other),
        }
    }

    #[test]
    fn with_recursive_query() {
        let expr = parse(
            "WITH RECURSIVE r AS MATERIALIZED (SELECT 1 UNION ALL SELECT n + 1 FROM r) \
             SELECT * FROM r",
        );
        match expr {
            Expr::With(with) => {
                assert!(with.recursive);
                assert_eq!(with.bindings.len(), 1);
                let binding = &with.bindings[0];
                assert_eq!(binding.name.value, "r");
                assert!(binding.materialized);
                let (op, _) = nary(&binding.query);
                assert_eq!(op, &NAryOp::UnionAll);
                assert!(matches!(with.query, Expr::Select(_)));
            }
            other => panic!("expected WITH, got {:?}", other),
        }
    }

    #[test]
    fn with_materialization_defaults() {
        let expr = parse("WITH a AS (SELECT x FROM t), b AS NOT MATERIALIZED (SELECT y FROM u) SELECT z FROM b");
        match expr {
            Expr::With(with) => {
                assert!(!with.recursive);
                assert!(with.bindings[0].materialized);
                assert!(!with.bindings[1].materialized);
            }
            other => panic!("expected WITH, got {:?}", other),
        }
    }

    // ------------------------------------------------------------------
    // DML
    // ------------------------------------------------------------------

    #[test]
    fn insert_value_with_conflict_and_returning() {
        let expr = parse(
            "INSERT INTO foo VALUE {'a': 1} AT 0 ON CONFLICT WHERE foo.a = 1 DO NOTHING \
             RETURNING MODIFIED NEW *",
        );
        let statement = dml(&expr);
        assert_eq!(statement.ops.len(), 1);
        match &statement.ops[0] {
            DmlOp::InsertValue(insert) => {
                assert_eq!(var(&insert.target), "foo");
                assert!(matches!(insert.value, Expr::Struct(_)));
                assert_eq!(lit(insert.position.as_ref().unwrap()), &Value::Integer(0));
                let conflict = insert.on_conflict.as_ref().unwrap();
                assert_eq!(conflict.action, ConflictAction::DoNothing);
            }
            other => panic!("expected INSERT VALUE, got {:?}", other),
        }
        let returning = statement.returning.as_ref().unwrap();
        assert_eq!(returning.elems[0].mapping, ReturningMapping::ModifiedNew);
        assert!(matches!(
            returning.elems[0].column,
            ColumnComponent::Wildcard
        ));
    }

    #[test]
    fn insert_collection() {
        let expr = parse("INSERT INTO foo VALUES (1, 2), (3, 4)");
        let statement = dml(&expr);
        match &statement.ops[0] {
            DmlOp::Insert(insert) => match &insert.values {
                Expr::Seq(seq) => {
                    assert_eq!(seq.kind, SeqKind::Bag);
                    assert_eq!(seq.items.len(), 2);
                }
                other => panic!("expected a bag of rows, got {:?}", other),
            },
            other => panic!("expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn legacy_update() {
        let expr = parse("UPDATE foo SET a = 1, b = 2 REMOVE c WHERE a > 0 RETURNING ALL OLD foo.a");
        let statement = dml(&expr);
        assert_eq!(statement.ops.len(), 3);
        assert!(matches!(statement.ops[0], DmlOp::Set(_)));
        assert!(matches!(statement.ops[1], DmlOp::Set(_)));
        assert!(matches!(statement.ops[2], DmlOp::Remove(_)));
        assert!(statement.from.is_some());
        assert!(statement.where_clause.is_some());
        let returning = statement.returning.as_ref().unwrap();
        assert_eq!(returning.elems[0].mapping, ReturningMapping::AllOld);
        assert!(matches!(
            returning.elems[0].column,
            ColumnComponent::Expr(Expr::Path(_))
        ));
    }

    #[test]
    fn from_prefixed_dml() {
        let expr = parse("FROM foo AS f SET f.a = 1 WHERE f.a IS NULL");
        let statement = dml(&expr);
        assert_eq!(statement.ops.len(), 1);
        assert!(statement.from.is_some());
        assert!(statement.where_clause.is_some());
    }

    #[test]
    fn delete_statement() {
        let expr = parse("DELETE FROM foo AS f WHERE f.a = 1");
        let statement = dml(&expr);
        assert!(matches!(statement.ops[0], DmlOp::Delete));
        assert!(statement.from.is_some());
        assert!(statement.where_clause.is_some());
    }

    #[test]
    fn dml_errors() {
        assert_eq!(parse_err("UPDATE foo WHERE a"), ErrorCode::MissingSetAssignment);
        assert_eq!(parse_err("SET"), ErrorCode::MissingSetAssignment);
        assert_eq!(
            parse_err("INSERT INTO foo VALUE 1 ON CONFLICT DO NOTHING"),
            ErrorCode::ExpectedWhere
        );
        assert_eq!(
            parse_err("INSERT INTO foo VALUE 1 ON CONFLICT WHERE a"),
            ErrorCode::ExpectedConflictAction
        );
        assert_eq!(
            parse_err("UPDATE foo SET a = 1 RETURNING SOMETHING OLD a"),
            ErrorCode::ExpectedReturningClause
        );
        // RETURNING paths are limited to two components
        assert_eq!(
            parse_err("UPDATE foo SET a = 1 RETURNING ALL OLD foo.a.b"),
            ErrorCode::InvalidPathComponent
        );
        // DML lvalues take literal-only bracket components
        assert_eq!(parse_err("SET a[b] = 1"), ErrorCode::InvalidPathComponent);
    }

    // ------------------------------------------------------------------
    // DDL and EXEC
    // ------------------------------------------------------------------

    #[test]
    fn ddl_statements() {
        match parse("CREATE TABLE foo") {
            Expr::Ddl(ddl) => match ddl.op {
                partiql_ast::DdlOp::CreateTable { name } => assert_eq!(name.value, "foo"),
                other => panic!("expected CREATE TABLE, got {:?}", other),
            },
            other => panic!("expected DDL, got {:?}", other),
        }
        match parse("DROP TABLE foo") {
            Expr::Ddl(ddl) => assert!(matches!(ddl.op, partiql_ast::DdlOp::DropTable { .. })),
            other => panic!("expected DDL, got {:?}", other),
        }
        match parse("CREATE INDEX ON foo (a.b, c)") {
            Expr::Ddl(ddl) => match ddl.op {
                partiql_ast::DdlOp::CreateIndex { table, keys } => {
                    assert_eq!(table.value, "foo");
                    assert_eq!(keys.len(), 2);
                }
                other => panic!("expected CREATE INDEX, got {:?}", other),
            },
            other => panic!("expected DDL, got {:?}", other),
        }
        match parse("DROP INDEX bar ON foo") {
            Expr::Ddl(ddl) => assert!(matches!(ddl.op, partiql_ast::DdlOp::DropIndex { .. })),
            other => panic!("expected DDL, got {:?}", other),
        }

        assert_eq!(parse_err("CREATE TABLE foo bar"), ErrorCode::UnexpectedToken);
        assert_eq!(parse_err("CREATE VIEW foo"), ErrorCode::UnexpectedKeyword);
    }

    #[test]
    fn exec_statements() {
        match parse("EXEC proc 'a', 1") {
            Expr::Exec(exec) => {
                assert_eq!(exec.name.value, "proc");
                assert_eq!(exec.args.len(), 2);
            }
            other => panic!("expected EXEC, got {:?}", other),
        }
        match parse("EXEC proc") {
            Expr::Exec(exec) => assert!(exec.args.is_empty()),
            other => panic!("expected EXEC, got {:?}", other),
        }

        assert_eq!(parse_err("EXEC"), ErrorCode::NoStoredProcedureProvided);
        assert_eq!(parse_err("EXEC proc(1)"), ErrorCode::UnexpectedToken);
        assert_eq!(parse_err("EXEC proc 1 EXEC q"), ErrorCode::UnexpectedKeyword);
    }

    // ------------------------------------------------------------------
    // statement surface
    // ------------------------------------------------------------------

    #[test]
    fn statement_mapping() {
        assert!(matches!(
            Parser::new().parse_ast_statement("SELECT a FROM t").unwrap(),
            Statement::Query(_)
        ));
        assert!(matches!(
            Parser::new().parse_ast_statement("SET a = 1").unwrap(),
            Statement::Dml(_)
        ));
        assert!(matches!(
            Parser::new().parse_ast_statement("DROP TABLE t").unwrap(),
            Statement::Ddl(_)
        ));
        assert!(matches!(
            Parser::new().parse_ast_statement("EXEC p").unwrap(),
            Statement::Exec(_)
        ));
    }

    #[test]
    fn sexp_surface() {
        let sexp = Parser::new().parse("SELECT a FROM t").unwrap();
        assert_eq!(
            sexp.to_string(),
            "(select (project (list (id a case_insensitive))) (from (id t case_insensitive)))"
        );
        let sexp = Parser::new().parse("1 + 2 * 3").unwrap();
        assert_eq!(sexp.to_string(), "(+ (lit 1) (* (lit 2) (lit 3)))");
        let sexp = Parser::new().parse("a NOT LIKE 'x%'").unwrap();
        assert_eq!(
            sexp.to_string(),
            "(not (like (id a case_insensitive) (lit \"x%\")))"
        );
    }

    #[test]
    fn trailing_token_errors() {
        assert_eq!(parse_err("1 2"), ErrorCode::UnexpectedToken);
        assert_eq!(parse_err("1; 2"), ErrorCode::UnexpectedTokenAfterSemicolon);
        // trailing semicolons terminate a statement cleanly
        parse("SELECT a FROM t;");
        parse("SELECT a FROM t;;");
    }

    #[test]
    fn top_level_validation() {
        assert_eq!(
            parse_err("SELECT a, (INSERT INTO x VALUE 1) FROM t"),
            ErrorCode::UnexpectedTerm
        );
        assert_eq!(parse_err("1 + (SET a = 2)"), ErrorCode::UnexpectedTerm);
        assert_eq!(
            parse_err("INSERT INTO foo VALUE (REMOVE a)"),
            ErrorCode::UnexpectedTerm
        );
        // DDL rejects its nested position through the trailing-token rule
        assert_eq!(
            parse_err("SELECT a FROM (DROP TABLE t)"),
            ErrorCode::UnexpectedToken
        );
    }

    #[test]
    fn cancellation_interrupts_parsing() {
        let token = CancellationToken::new();
        token.cancel();
        let err = Parser::with_cancellation(token)
            .parse_expr_node("SELECT a FROM t")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Interrupted);
    }

    #[test]
    fn errors_carry_positions() {
        let err = Parser::new().parse_expr_node("SELECT a\nFROM t WHERE").unwrap_err();
        assert_eq!(err.code, ErrorCode::ExpectedExpression);
        let position = err.position.unwrap();
        assert_eq!(position.line, 2);
    }
}

//! The fixed V0 AST-to-s-expression mapping.
//!
//! Every AST node serializes to a list headed by a tag symbol:
//!
//! ```txt
//! (lit 5)  (missing)  (id a case_insensitive)  (@ (id a case_insensitive))
//! (parameter 1)  (+ (lit 1) (lit 2))  (not (lit true))
//! (path (id t case_insensitive) (case_insensitive (lit "a")) (wildcard) (unpivot))
//! (call foo (lit 1))  (call_agg count all (id a case_insensitive))
//! (call_agg_wildcard count)
//! (cast (id x case_insensitive) (type decimal 10 2))
//! (is (id x case_insensitive) (type null))
//! (simple_case e (when c v) (else e))  (searched_case (when c v))
//! (list ...)  (bag ...)  (sexp ...)  (struct (field k v) ...)
//! (date 2021 2 3)  (time 10 30 0 0 0 [offset-minutes])
//! (select (project (list ...)) (from ...) (where e) (group ...)
//!         (having e) (order_by ...) (limit e))
//! (pivot (member name value) (from ...) ...)
//! (dml (operations ...) (from f) (where e) (returning ...))
//! (create_table t)  (drop_table t)  (create_index t keys...)
//! (drop_index i t)  (exec p args...)
//! (with [recursive] (bindings (binding name materialized|not_materialized q)...) q)
//! ```
//!
//! The mapping is stable: tests pin the textual form.

use core::fmt;

use partiql_core::Value;

use crate::dml::{ColumnComponent, DataManipulation, Ddl, DdlOp, DmlOp, Returning};
use crate::expr::{Case, Expr, NAry, NAryOp, PathComponent, Seq, SeqKind, TypedOp};
use crate::query::{
    Aliases, FromSource, GroupingStrategy, JoinKind, OrderingSpec, Projection, Select, SelectItem,
    WithQuery,
};
use crate::types::{CaseSensitivity, DataType, ScopeQualifier, SetQuantifier};

/// An s-expression value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sexp {
    /// A bare symbol.
    Symbol(String),
    /// An integer atom.
    Int(i64),
    /// A quoted string atom.
    Str(String),
    /// A parenthesized list.
    List(Vec<Sexp>),
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(text) => f.write_str(text),
            Sexp::Int(value) => write!(f, "{}", value),
            Sexp::Str(text) => write!(f, "\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")),
            Sexp::List(items) => {
                f.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn sym(text: impl Into<String>) -> Sexp {
    Sexp::Symbol(text.into())
}

fn list(items: Vec<Sexp>) -> Sexp {
    Sexp::List(items)
}

fn tagged(tag: &str, rest: Vec<Sexp>) -> Sexp {
    let mut items = vec![sym(tag)];
    items.extend(rest);
    Sexp::List(items)
}

impl Expr {
    /// Serializes the expression to the V0 s-expression form.
    pub fn to_sexp(&self) -> Sexp {
        match self {
            Expr::Lit(node) => value_to_sexp(&node.value),
            Expr::VarRef(node) => {
                let id = tagged(
                    "id",
                    vec![sym(node.name.clone()), sym(case_tag(node.case))],
                );
                match node.qualifier {
                    ScopeQualifier::Unqualified => id,
                    ScopeQualifier::Lexical => tagged("@", vec![id]),
                }
            }
            Expr::Param(node) => tagged("parameter", vec![Sexp::Int(node.index as i64)]),
            Expr::Path(node) => {
                let mut items = vec![node.root.to_sexp()];
                for component in &node.components {
                    items.push(match component {
                        PathComponent::Expr { expr, case } => {
                            tagged(case_tag(*case), vec![expr.to_sexp()])
                        }
                        PathComponent::Wildcard => list(vec![sym("wildcard")]),
                        PathComponent::Unpivot => list(vec![sym("unpivot")]),
                    });
                }
                tagged("path", items)
            }
            Expr::NAry(node) => nary_to_sexp(node),
            Expr::Call(node) => {
                let mut items = vec![sym(node.name.value.clone())];
                items.extend(node.args.iter().map(Expr::to_sexp));
                tagged("call", items)
            }
            Expr::CallAgg(node) => match &node.arg {
                Some(arg) => tagged(
                    "call_agg",
                    vec![
                        sym(node.name.value.clone()),
                        sym(quantifier_tag(node.quantifier)),
                        arg.to_sexp(),
                    ],
                ),
                None => tagged("call_agg_wildcard", vec![sym(node.name.value.clone())]),
            },
            Expr::Typed(node) => {
                let tag = match node.op {
                    TypedOp::Cast => "cast",
                    TypedOp::Is => "is",
                };
                tagged(tag, vec![node.expr.to_sexp(), type_to_sexp(&node.data_type)])
            }
            Expr::Case(node) => case_to_sexp(node),
            Expr::Seq(node) => seq_to_sexp(node),
            Expr::Struct(node) => {
                let fields = node
                    .fields
                    .iter()
                    .map(|field| tagged("field", vec![field.name.to_sexp(), field.value.to_sexp()]))
                    .collect();
                tagged("struct", fields)
            }
            Expr::DateLit(node) => tagged(
                "date",
                vec![
                    Sexp::Int(node.year as i64),
                    Sexp::Int(node.month as i64),
                    Sexp::Int(node.day as i64),
                ],
            ),
            Expr::TimeLit(node) => {
                let mut items = vec![
                    Sexp::Int(node.hour as i64),
                    Sexp::Int(node.minute as i64),
                    Sexp::Int(node.second as i64),
                    Sexp::Int(node.nanos as i64),
                    Sexp::Int(node.precision as i64),
                ];
                if let Some(tz) = node.tz_minutes {
                    items.push(Sexp::Int(tz as i64));
                }
                tagged("time", items)
            }
            Expr::Select(node) => select_to_sexp(node),
            Expr::With(node) => with_to_sexp(node),
            Expr::Dml(node) => dml_to_sexp(node),
            Expr::Ddl(node) => ddl_to_sexp(node),
            Expr::Exec(node) => {
                let mut items = vec![sym(node.name.value.clone())];
                items.extend(node.args.iter().map(Expr::to_sexp));
                tagged("exec", items)
            }
        }
    }
}

fn case_tag(case: CaseSensitivity) -> &'static str {
    match case {
        CaseSensitivity::Sensitive => "case_sensitive",
        CaseSensitivity::Insensitive => "case_insensitive",
    }
}

fn quantifier_tag(quantifier: SetQuantifier) -> &'static str {
    match quantifier {
        SetQuantifier::All => "all",
        SetQuantifier::Distinct => "distinct",
    }
}

fn value_to_sexp(value: &Value) -> Sexp {
    match value {
        Value::Missing => list(vec![sym("missing")]),
        Value::Null => tagged("lit", vec![sym("null")]),
        Value::Boolean(v) => tagged("lit", vec![sym(if *v { "true" } else { "false" })]),
        Value::Integer(v) => tagged("lit", vec![Sexp::Int(*v)]),
        Value::Decimal(text) => tagged("lit", vec![sym(text.clone())]),
        Value::Text(text) => tagged("lit", vec![Sexp::Str(text.clone())]),
        Value::Ion(text) => tagged("lit", vec![sym(format!("`{}`", text))]),
    }
}

fn nary_to_sexp(node: &NAry) -> Sexp {
    let operands = node.operands.iter().map(Expr::to_sexp).collect();
    tagged(NAryOp::as_str(&node.op), operands)
}

fn type_to_sexp(data_type: &DataType) -> Sexp {
    let mut items = vec![sym(data_type.name.as_str())];
    items.extend(data_type.args.iter().map(|arg| Sexp::Int(*arg as i64)));
    tagged("type", items)
}

fn case_to_sexp(node: &Case) -> Sexp {
    let mut items = vec![];
    let tag = match &node.operand {
        Some(operand) => {
            items.push(operand.to_sexp());
            "simple_case"
        }
        None => "searched_case",
    };
    for when in &node.when_clauses {
        items.push(tagged(
            "when",
            vec![when.condition.to_sexp(), when.value.to_sexp()],
        ));
    }
    if let Some(else_clause) = &node.else_clause {
        items.push(tagged("else", vec![else_clause.to_sexp()]));
    }
    tagged(tag, items)
}

fn seq_to_sexp(node: &Seq) -> Sexp {
    let tag = match node.kind {
        SeqKind::List => "list",
        SeqKind::Bag => "bag",
        SeqKind::Sexp => "sexp",
    };
    tagged(tag, node.items.iter().map(Expr::to_sexp).collect())
}

fn aliases_wrap(inner: Sexp, aliases: &Aliases) -> Sexp {
    let mut wrapped = inner;
    if let Some(name) = &aliases.as_alias {
        wrapped = tagged("as", vec![sym(name.value.clone()), wrapped]);
    }
    if let Some(name) = &aliases.at_alias {
        wrapped = tagged("at", vec![sym(name.value.clone()), wrapped]);
    }
    if let Some(name) = &aliases.by_alias {
        wrapped = tagged("by", vec![sym(name.value.clone()), wrapped]);
    }
    wrapped
}

fn from_source_to_sexp(source: &FromSource) -> Sexp {
    match source {
        FromSource::Expr { expr, aliases } => aliases_wrap(expr.to_sexp(), aliases),
        FromSource::Unpivot { expr, aliases } => {
            aliases_wrap(tagged("unpivot", vec![expr.to_sexp()]), aliases)
        }
        FromSource::Join(join) => {
            let tag = match join.kind {
                JoinKind::Inner => "inner_join",
                JoinKind::Left => "left_join",
                JoinKind::Right => "right_join",
                JoinKind::Outer => "outer_join",
            };
            tagged(
                tag,
                vec![
                    from_source_to_sexp(&join.left),
                    from_source_to_sexp(&join.right),
                    join.on.to_sexp(),
                ],
            )
        }
    }
}

fn select_to_sexp(node: &Select) -> Sexp {
    let (head, projection) = match &node.projection {
        Projection::List(items) => {
            let items = items
                .iter()
                .map(|item| match item {
                    SelectItem::Expr { expr, alias } => match alias {
                        Some(alias) => {
                            tagged("as", vec![sym(alias.value.clone()), expr.to_sexp()])
                        }
                        None => expr.to_sexp(),
                    },
                    SelectItem::ProjectAll { expr } => match expr {
                        Some(expr) => tagged("project_all", vec![expr.to_sexp()]),
                        None => list(vec![sym("project_all")]),
                    },
                })
                .collect();
            ("select", tagged("list", items))
        }
        Projection::Value(expr) => ("select", tagged("value", vec![expr.to_sexp()])),
        Projection::Pivot { value, at } => (
            "pivot",
            tagged("member", vec![at.to_sexp(), value.to_sexp()]),
        ),
    };

    let project_tag = match node.quantifier {
        SetQuantifier::All => "project",
        SetQuantifier::Distinct => "project_distinct",
    };
    let mut items = vec![tagged(project_tag, vec![projection])];
    if let Some(from) = &node.from {
        items.push(tagged("from", vec![from_source_to_sexp(from)]));
    }
    if let Some(let_clause) = &node.let_clause {
        let bindings = let_clause
            .bindings
            .iter()
            .map(|binding| {
                tagged(
                    "binding",
                    vec![sym(binding.name.value.clone()), binding.expr.to_sexp()],
                )
            })
            .collect();
        items.push(tagged("let", bindings));
    }
    if let Some(where_clause) = &node.where_clause {
        items.push(tagged("where", vec![where_clause.to_sexp()]));
    }
    if let Some(group_by) = &node.group_by {
        let tag = match group_by.strategy {
            GroupingStrategy::Full => "group",
            GroupingStrategy::Partial => "group_partial",
        };
        let mut group = vec![];
        for item in &group_by.items {
            group.push(match &item.alias {
                Some(alias) => tagged("as", vec![sym(alias.value.clone()), item.expr.to_sexp()]),
                None => item.expr.to_sexp(),
            });
        }
        if let Some(name) = &group_by.group_as {
            group.push(tagged("group_as", vec![sym(name.value.clone())]));
        }
        items.push(tagged(tag, group));
    }
    if let Some(having) = &node.having {
        items.push(tagged("having", vec![having.to_sexp()]));
    }
    if let Some(order_by) = &node.order_by {
        let specs = order_by
            .specs
            .iter()
            .map(|spec| {
                let mut sort = vec![spec.expr.to_sexp()];
                if let Some(ordering) = spec.ordering {
                    sort.push(sym(match ordering {
                        OrderingSpec::Asc => "asc",
                        OrderingSpec::Desc => "desc",
                    }));
                }
                tagged("sort_spec", sort)
            })
            .collect();
        items.push(tagged("order_by", specs));
    }
    if let Some(limit) = &node.limit {
        items.push(tagged("limit", vec![limit.to_sexp()]));
    }
    tagged(head, items)
}

fn with_to_sexp(node: &WithQuery) -> Sexp {
    let mut items = vec![];
    if node.recursive {
        items.push(sym("recursive"));
    }
    let bindings = node
        .bindings
        .iter()
        .map(|binding| {
            tagged(
                "binding",
                vec![
                    sym(binding.name.value.clone()),
                    sym(if binding.materialized {
                        "materialized"
                    } else {
                        "not_materialized"
                    }),
                    binding.query.to_sexp(),
                ],
            )
        })
        .collect();
    items.push(tagged("bindings", bindings));
    items.push(node.query.to_sexp());
    tagged("with", items)
}

fn returning_to_sexp(returning: &Returning) -> Sexp {
    let elems = returning
        .elems
        .iter()
        .map(|elem| {
            let column = match &elem.column {
                ColumnComponent::Wildcard => list(vec![sym("wildcard")]),
                ColumnComponent::Expr(expr) => expr.to_sexp(),
            };
            tagged("returning_elem", vec![sym(elem.mapping.as_str()), column])
        })
        .collect();
    tagged("returning", elems)
}

fn dml_to_sexp(node: &DataManipulation) -> Sexp {
    let ops = node
        .ops
        .iter()
        .map(|op| match op {
            DmlOp::Insert(insert) => tagged(
                "insert",
                vec![insert.target.to_sexp(), insert.values.to_sexp()],
            ),
            DmlOp::InsertValue(insert) => {
                let mut items = vec![insert.target.to_sexp(), insert.value.to_sexp()];
                if let Some(position) = &insert.position {
                    items.push(tagged("at", vec![position.to_sexp()]));
                }
                if let Some(on_conflict) = &insert.on_conflict {
                    items.push(tagged(
                        "on_conflict",
                        vec![on_conflict.condition.to_sexp(), sym("do_nothing")],
                    ));
                }
                tagged("insert_value", items)
            }
            DmlOp::Set(assignment) => tagged(
                "set",
                vec![
                    tagged(
                        "assignment",
                        vec![assignment.target.to_sexp(), assignment.value.to_sexp()],
                    ),
                ],
            ),
            DmlOp::Remove(remove) => tagged("remove", vec![remove.target.to_sexp()]),
            DmlOp::Delete => list(vec![sym("delete")]),
        })
        .collect();
    let mut items = vec![tagged("operations", ops)];
    if let Some(from) = &node.from {
        items.push(tagged("from", vec![from_source_to_sexp(from)]));
    }
    if let Some(where_clause) = &node.where_clause {
        items.push(tagged("where", vec![where_clause.to_sexp()]));
    }
    if let Some(returning) = &node.returning {
        items.push(returning_to_sexp(returning));
    }
    tagged("dml", items)
}

fn ddl_to_sexp(node: &Ddl) -> Sexp {
    match &node.op {
        DdlOp::CreateTable { name } => tagged("create_table", vec![sym(name.value.clone())]),
        DdlOp::DropTable { name } => tagged("drop_table", vec![sym(name.value.clone())]),
        DdlOp::CreateIndex { table, keys } => {
            let mut items = vec![sym(table.value.clone())];
            items.extend(keys.iter().map(Expr::to_sexp));
            tagged("create_index", items)
        }
        DdlOp::DropIndex { index, table } => tagged(
            "drop_index",
            vec![sym(index.value.clone()), sym(table.value.clone())],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Lit;
    use crate::meta::Metas;
    use crate::types::SymbolName;

    fn lit(value: Value) -> Expr {
        Expr::Lit(Lit {
            value,
            metas: Metas::NONE,
        })
    }

    #[test]
    fn render_atoms() {
        assert_eq!(lit(Value::Integer(5)).to_sexp().to_string(), "(lit 5)");
        assert_eq!(lit(Value::Null).to_sexp().to_string(), "(lit null)");
        assert_eq!(lit(Value::Missing).to_sexp().to_string(), "(missing)");
        assert_eq!(
            lit(Value::Text("a\"b".into())).to_sexp().to_string(),
            "(lit \"a\\\"b\")"
        );
    }

    #[test]
    fn render_nary() {
        let expr = Expr::NAry(NAry {
            op: NAryOp::Add,
            operands: vec![lit(Value::Integer(1)), lit(Value::Integer(2))],
            metas: Metas::NONE,
        });
        assert_eq!(expr.to_sexp().to_string(), "(+ (lit 1) (lit 2))");
    }

    #[test]
    fn render_call_agg() {
        let expr = Expr::CallAgg(crate::expr::CallAgg {
            name: SymbolName::new("count"),
            quantifier: SetQuantifier::All,
            arg: None,
            metas: Metas::NONE,
        });
        assert_eq!(expr.to_sexp().to_string(), "(call_agg_wildcard count)");
    }
}

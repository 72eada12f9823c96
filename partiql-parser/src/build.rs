//! Top-level placement validation and the parse-tree → AST rewrite.
//!
//! Every [`NodeKind`] has a deterministic mapping into the typed AST.
//! Structural violations (wrong child count, wrong child kind) raise
//! `malformed parse tree`: those are implementation-contract errors, never
//! user-facing ones.

use chrono::Offset;

use partiql_ast::{
    Aliases, Assignment, Call, CallAgg, Case, CaseSensitivity, ColumnComponent, ConflictAction,
    DataManipulation, DataType, DateLit, Ddl, DdlOp, DmlOp, Exec, Expr, FromSource, GroupBy,
    GroupByItem, GroupingStrategy, Insert, InsertValue, Join, JoinKind, Let, LetBinding, Lit,
    Metas, NAry, NAryOp, OnConflict, OrderBy, OrderingSpec, Param, Path, PathComponent,
    Projection, Remove, Returning, ReturningElem, ReturningMapping, ScopeQualifier, Select,
    SelectItem, Seq, SeqKind, SetQuantifier, SortSpec, Struct, StructField, SymbolName, TimeLit,
    Typed, TypedOp, TypeName, VarRef, WhenClause, WithBinding, WithQuery,
};
use partiql_core::{Keyword, Operator, Token, TokenKind, Value};

use crate::error::{ErrorCode, ParserError};
use crate::node::{NodeKind, ParseNode};
use crate::parser::datetime;

/// Enforces the top-level placement rule over the whole tree: a
/// top-level-only tag may appear at the root, and a DML tag additionally
/// directly beneath a legally-placed DML container (DML_LIST, UPDATE, FROM,
/// DELETE).
pub(crate) fn validate_top_level(node: &ParseNode<'_>) -> Result<(), ParserError> {
    validate(node, true, false)
}

fn validate(
    node: &ParseNode<'_>,
    at_root: bool,
    parent_is_container: bool,
) -> Result<(), ParserError> {
    let placed_ok = at_root || (node.kind.is_dml() && parent_is_container);
    if node.kind.is_top_level() && !placed_ok {
        return Err(match node.position() {
            Some(position) => ParserError::at(ErrorCode::UnexpectedTerm, position),
            None => ParserError::new(ErrorCode::UnexpectedTerm),
        });
    }
    let is_container = placed_ok
        && matches!(
            node.kind,
            NodeKind::DmlList | NodeKind::Update | NodeKind::From | NodeKind::Delete
        );
    for child in &node.children {
        validate(child, false, is_container)?;
    }
    Ok(())
}

fn node_metas(node: &ParseNode<'_>) -> Metas {
    match node.position() {
        Some(position) => Metas::at(position),
        None => Metas::NONE,
    }
}

fn token_metas(token: &Token) -> Metas {
    Metas::at(token.position())
}

/// Rewrites a parse node into the typed AST.
pub(crate) fn build_expr(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    match node.kind {
        NodeKind::Atom | NodeKind::CaseSensitiveAtom | NodeKind::CaseInsensitiveAtom => {
            build_atom(node)
        }
        NodeKind::Parameter => build_parameter(node),
        NodeKind::Unary => build_unary(node),
        NodeKind::Binary => build_binary(node),
        NodeKind::Ternary => build_ternary(node),
        NodeKind::Path => build_path(node),
        NodeKind::List => build_seq(node, SeqKind::List),
        NodeKind::Bag => build_seq(node, SeqKind::Bag),
        NodeKind::Struct => build_struct(node),
        NodeKind::Call => build_call(node),
        NodeKind::CallAgg | NodeKind::CallDistinctAgg | NodeKind::CallAggWildcard => {
            build_call_agg(node)
        }
        NodeKind::Cast => build_cast(node),
        NodeKind::Case => build_case(node),
        NodeKind::Date => build_date(node),
        NodeKind::Time | NodeKind::TimeWithTimeZone => build_time(node),
        NodeKind::SelectList | NodeKind::SelectValue | NodeKind::Pivot => build_select(node),
        NodeKind::With => build_with(node),
        NodeKind::Insert
        | NodeKind::InsertValue
        | NodeKind::Set
        | NodeKind::Remove
        | NodeKind::Delete
        | NodeKind::Update
        | NodeKind::From
        | NodeKind::DmlList => build_dml_statement(node),
        NodeKind::CreateTable
        | NodeKind::DropTable
        | NodeKind::CreateIndex
        | NodeKind::DropIndex => build_ddl(node),
        NodeKind::Exec => build_exec(node),
        _ => Err(node.malformed("node kind is not an expression")),
    }
}

fn node_token<'b>(node: &'b ParseNode<'_>) -> Result<&'b Token, ParserError> {
    node.token
        .as_ref()
        .ok_or_else(|| node.malformed("missing originating token"))
}

fn only_child<'b, 'a>(node: &'b ParseNode<'a>) -> Result<&'b ParseNode<'a>, ParserError> {
    if node.children.len() == 1 {
        Ok(&node.children[0])
    } else {
        Err(node.malformed("expected exactly one child"))
    }
}

fn two_children<'b, 'a>(
    node: &'b ParseNode<'a>,
) -> Result<(&'b ParseNode<'a>, &'b ParseNode<'a>), ParserError> {
    if node.children.len() == 2 {
        Ok((&node.children[0], &node.children[1]))
    } else {
        Err(node.malformed("expected exactly two children"))
    }
}

fn build_atom(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?;
    let metas = token_metas(token);
    let expr = match &token.kind {
        TokenKind::Ident(name) => Expr::VarRef(VarRef {
            name: name.clone(),
            case: CaseSensitivity::Insensitive,
            qualifier: ScopeQualifier::Unqualified,
            metas,
        }),
        TokenKind::QuotedIdent(name) => Expr::VarRef(VarRef {
            name: name.clone(),
            case: CaseSensitivity::Sensitive,
            qualifier: ScopeQualifier::Unqualified,
            metas,
        }),
        TokenKind::Literal(value) => Expr::Lit(Lit {
            value: value.clone(),
            metas,
        }),
        TokenKind::IonLiteral(text) => Expr::Lit(Lit {
            value: Value::Ion(text.clone()),
            metas,
        }),
        TokenKind::Null => Expr::Lit(Lit {
            value: Value::Null,
            metas,
        }),
        TokenKind::Missing => Expr::Lit(Lit {
            value: Value::Missing,
            metas,
        }),
        TokenKind::TrimSpec(spec) => Expr::Lit(Lit {
            value: Value::Text(spec.as_str().to_string()),
            metas,
        }),
        TokenKind::DatePart(part) => Expr::Lit(Lit {
            value: Value::Text(part.as_str().to_string()),
            metas,
        }),
        _ => return Err(node.malformed("unexpected atom token")),
    };
    Ok(expr)
}

fn build_parameter(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?;
    match token.kind {
        TokenKind::QuestionMark(index) => Ok(Expr::Param(Param {
            index,
            metas: token_metas(token),
        })),
        _ => Err(node.malformed("parameter without ordinal")),
    }
}

fn build_unary(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?.clone();
    let metas = token_metas(&token);
    let operand = only_child(node)?;
    match &token.kind {
        TokenKind::Operator(Operator::Plus) => Ok(nary(NAryOp::Add, vec![build_expr(operand)?], metas)),
        TokenKind::Operator(Operator::Minus) => {
            Ok(nary(NAryOp::Sub, vec![build_expr(operand)?], metas))
        }
        TokenKind::Keyword(Keyword::Not) => Ok(nary(NAryOp::Not, vec![build_expr(operand)?], metas)),
        // `@name` becomes a lexically-scoped variable reference
        TokenKind::Operator(Operator::AtSign) => match build_expr(operand)? {
            Expr::VarRef(var) => Ok(Expr::VarRef(VarRef {
                qualifier: ScopeQualifier::Lexical,
                metas,
                ..var
            })),
            _ => operand
                .position()
                .map(|position| {
                    Err(ParserError::at(ErrorCode::MissingIdentifierAfterAt, position))
                })
                .unwrap_or_else(|| Err(node.malformed("@ without identifier"))),
        },
        _ => Err(node.malformed("unexpected unary operator")),
    }
}

fn nary(op: NAryOp, operands: Vec<Expr>, metas: Metas) -> Expr {
    Expr::NAry(NAry {
        op,
        operands,
        metas,
    })
}

/// Wraps a positive-form operation in the legacy `NOT`, preserving the
/// negated surface form for downstream lowering.
fn legacy_not(inner: Expr, metas: Metas) -> Expr {
    Expr::NAry(NAry {
        op: NAryOp::Not,
        operands: vec![inner],
        metas: metas.with_legacy_logical_not(),
    })
}

fn build_binary(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?.clone();
    let metas = token_metas(&token);
    let (left, right) = two_children(node)?;

    if let Some(keyword) = token.keyword() {
        return match keyword {
            Keyword::Is => Ok(Expr::Typed(Typed {
                op: TypedOp::Is,
                expr: Box::new(build_expr(left)?),
                data_type: build_data_type(right)?,
                metas,
            })),
            Keyword::IsNot => Ok(legacy_not(
                Expr::Typed(Typed {
                    op: TypedOp::Is,
                    expr: Box::new(build_expr(left)?),
                    data_type: build_data_type(right)?,
                    metas,
                }),
                metas,
            )),
            Keyword::NotIn => Ok(legacy_not(
                nary(
                    NAryOp::In,
                    vec![build_expr(left)?, build_expr(right)?],
                    metas,
                ),
                metas,
            )),
            Keyword::NotLike => Ok(legacy_not(
                nary(
                    NAryOp::Like,
                    vec![build_expr(left)?, build_expr(right)?],
                    metas,
                ),
                metas,
            )),
            _ => {
                let op = keyword_nary_op(keyword)
                    .ok_or_else(|| node.malformed("unexpected binary keyword"))?;
                Ok(nary(
                    op,
                    vec![build_expr(left)?, build_expr(right)?],
                    metas,
                ))
            }
        };
    }

    let op = match &token.kind {
        TokenKind::Star => NAryOp::Mul,
        TokenKind::Operator(op) => symbol_nary_op(*op)
            .ok_or_else(|| node.malformed("unexpected binary operator"))?,
        _ => return Err(node.malformed("unexpected binary token")),
    };
    Ok(nary(
        op,
        vec![build_expr(left)?, build_expr(right)?],
        metas,
    ))
}

fn build_ternary(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?.clone();
    let metas = token_metas(&token);
    if node.children.len() != 3 {
        return Err(node.malformed("expected exactly three children"));
    }
    let operands = node
        .children
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;
    match token.keyword() {
        Some(Keyword::Between) => Ok(nary(NAryOp::Between, operands, metas)),
        Some(Keyword::NotBetween) => Ok(legacy_not(nary(NAryOp::Between, operands, metas), metas)),
        Some(Keyword::Like) => Ok(nary(NAryOp::Like, operands, metas)),
        Some(Keyword::NotLike) => Ok(legacy_not(nary(NAryOp::Like, operands, metas), metas)),
        _ => Err(node.malformed("unexpected ternary token")),
    }
}

fn keyword_nary_op(keyword: Keyword) -> Option<NAryOp> {
    match keyword {
        Keyword::And => Some(NAryOp::And),
        Keyword::Or => Some(NAryOp::Or),
        Keyword::In => Some(NAryOp::In),
        Keyword::Like => Some(NAryOp::Like),
        Keyword::Union => Some(NAryOp::Union),
        Keyword::UnionAll => Some(NAryOp::UnionAll),
        Keyword::Intersect => Some(NAryOp::Intersect),
        Keyword::IntersectAll => Some(NAryOp::IntersectAll),
        Keyword::Except => Some(NAryOp::Except),
        Keyword::ExceptAll => Some(NAryOp::ExceptAll),
        _ => None,
    }
}

fn symbol_nary_op(op: Operator) -> Option<NAryOp> {
    match op {
        Operator::Plus => Some(NAryOp::Add),
        Operator::Minus => Some(NAryOp::Sub),
        Operator::Slash => Some(NAryOp::Div),
        Operator::Percent => Some(NAryOp::Mod),
        Operator::Concat => Some(NAryOp::Concat),
        Operator::Eq => Some(NAryOp::Eq),
        Operator::NotEq => Some(NAryOp::NotEq),
        Operator::Lt => Some(NAryOp::Lt),
        Operator::LtEq => Some(NAryOp::LtEq),
        Operator::Gt => Some(NAryOp::Gt),
        Operator::GtEq => Some(NAryOp::GtEq),
        Operator::AtSign => None,
    }
}

fn build_path(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    if node.children.is_empty() {
        return Err(node.malformed("path without root"));
    }
    let root = build_expr(&node.children[0])?;
    let mut components = vec![];
    for component in &node.children[1..] {
        components.push(match component.kind {
            NodeKind::PathDot => {
                let inner = only_child(component)?;
                let case = match inner.kind {
                    NodeKind::CaseSensitiveAtom => CaseSensitivity::Sensitive,
                    NodeKind::CaseInsensitiveAtom => CaseSensitivity::Insensitive,
                    _ => return Err(component.malformed("unexpected dot component")),
                };
                PathComponent::Expr {
                    expr: Box::new(build_atom(inner)?),
                    case,
                }
            }
            NodeKind::PathSqb => PathComponent::Expr {
                expr: Box::new(build_expr(only_child(component)?)?),
                case: CaseSensitivity::Sensitive,
            },
            NodeKind::PathWildcard => PathComponent::Wildcard,
            NodeKind::PathUnpivot => PathComponent::Unpivot,
            _ => return Err(component.malformed("unexpected path component")),
        });
    }
    let metas = *root.metas();
    Ok(Expr::Path(Path {
        root: Box::new(root),
        components,
        metas,
    }))
}

fn build_seq(node: &ParseNode<'_>, kind: SeqKind) -> Result<Expr, ParserError> {
    let items = node
        .children
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::Seq(Seq {
        kind,
        items,
        metas: node_metas(node),
    }))
}

fn build_struct(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let mut fields = vec![];
    for member in &node.children {
        if member.kind != NodeKind::Member {
            return Err(node.malformed("struct child is not a member"));
        }
        let (name, value) = two_children(member)?;
        fields.push(StructField {
            name: build_expr(name)?,
            value: build_expr(value)?,
        });
    }
    Ok(Expr::Struct(Struct {
        fields,
        metas: node_metas(node),
    }))
}

fn build_call(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?;
    let metas = token_metas(token);
    let args = node
        .children
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;
    let name = match &token.kind {
        TokenKind::Ident(name) | TokenKind::QuotedIdent(name) => name.clone(),
        // `list(...)`, `bag(...)` and `sexp(...)` fold into seq literals
        TokenKind::Keyword(Keyword::List) => {
            return Ok(Expr::Seq(Seq {
                kind: SeqKind::List,
                items: args,
                metas,
            }))
        }
        TokenKind::Keyword(Keyword::Bag) => {
            return Ok(Expr::Seq(Seq {
                kind: SeqKind::Bag,
                items: args,
                metas,
            }))
        }
        TokenKind::Keyword(Keyword::Sexp) => {
            return Ok(Expr::Seq(Seq {
                kind: SeqKind::Sexp,
                items: args,
                metas,
            }))
        }
        TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
        _ => return Err(node.malformed("unexpected call name token")),
    };
    Ok(Expr::Call(Call {
        name: SymbolName::with_metas(name, metas),
        args,
        metas,
    }))
}

fn build_call_agg(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let token = node_token(node)?;
    let metas = token_metas(token);
    let keyword = token
        .keyword()
        .ok_or_else(|| node.malformed("aggregate without keyword"))?;
    let name = SymbolName::with_metas(keyword.as_str(), metas);
    match node.kind {
        NodeKind::CallAggWildcard => {
            if !node.children.is_empty() {
                return Err(node.malformed("COUNT(*) takes no argument"));
            }
            Ok(Expr::CallAgg(CallAgg {
                name,
                quantifier: SetQuantifier::All,
                arg: None,
                metas,
            }))
        }
        _ => {
            let arg = only_child(node)?;
            let quantifier = if node.kind == NodeKind::CallDistinctAgg {
                SetQuantifier::Distinct
            } else {
                SetQuantifier::All
            };
            Ok(Expr::CallAgg(CallAgg {
                name,
                quantifier,
                arg: Some(Box::new(build_expr(arg)?)),
                metas,
            }))
        }
    }
}

fn build_cast(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let (expr, data_type) = two_children(node)?;
    Ok(Expr::Typed(Typed {
        op: TypedOp::Cast,
        expr: Box::new(build_expr(expr)?),
        data_type: build_data_type(data_type)?,
        metas: node_metas(node),
    }))
}

fn build_data_type(node: &ParseNode<'_>) -> Result<DataType, ParserError> {
    if node.kind != NodeKind::Type {
        return Err(node.malformed("expected a type node"));
    }
    let token = node_token(node)?;
    let name = match &token.kind {
        TokenKind::Null => TypeName::Null,
        TokenKind::Missing => TypeName::Missing,
        TokenKind::Keyword(keyword) => keyword_type_name(*keyword)
            .ok_or_else(|| node.malformed("unexpected type keyword"))?,
        _ => return Err(node.malformed("unexpected type token")),
    };
    let mut args = vec![];
    for child in &node.children {
        match child.token.as_ref().map(|token| &token.kind) {
            Some(TokenKind::Literal(Value::Integer(value))) if *value >= 0 => {
                args.push(*value as u64)
            }
            _ => return Err(node.malformed("type parameter is not an unsigned integer")),
        }
    }
    Ok(DataType {
        name,
        args,
        metas: token_metas(token),
    })
}

fn keyword_type_name(keyword: Keyword) -> Option<TypeName> {
    match keyword {
        Keyword::Boolean => Some(TypeName::Boolean),
        Keyword::Smallint => Some(TypeName::Smallint),
        Keyword::Int | Keyword::Integer => Some(TypeName::Int),
        Keyword::Float => Some(TypeName::Float),
        Keyword::Real => Some(TypeName::Real),
        Keyword::DoublePrecision => Some(TypeName::DoublePrecision),
        Keyword::Decimal => Some(TypeName::Decimal),
        Keyword::Numeric => Some(TypeName::Numeric),
        Keyword::Timestamp => Some(TypeName::Timestamp),
        Keyword::Character | Keyword::Char => Some(TypeName::Character),
        Keyword::Varchar => Some(TypeName::Varchar),
        Keyword::CharacterVarying => Some(TypeName::CharacterVarying),
        Keyword::String => Some(TypeName::String),
        Keyword::Symbol => Some(TypeName::Symbol),
        Keyword::Clob => Some(TypeName::Clob),
        Keyword::Blob => Some(TypeName::Blob),
        Keyword::Struct => Some(TypeName::Struct),
        Keyword::Tuple => Some(TypeName::Tuple),
        Keyword::List => Some(TypeName::List),
        Keyword::Sexp => Some(TypeName::Sexp),
        Keyword::Bag => Some(TypeName::Bag),
        Keyword::Time => Some(TypeName::Time),
        Keyword::TimeWithTimeZone => Some(TypeName::TimeWithTimeZone),
        Keyword::Date => Some(TypeName::Date),
        _ => None,
    }
}

fn build_case(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let mut operand = None;
    let mut when_clauses = vec![];
    let mut else_clause = None;
    for child in &node.children {
        match child.kind {
            NodeKind::When => {
                let (condition, value) = two_children(child)?;
                when_clauses.push(WhenClause {
                    condition: build_expr(condition)?,
                    value: build_expr(value)?,
                });
            }
            NodeKind::Else => else_clause = Some(Box::new(build_expr(only_child(child)?)?)),
            _ if when_clauses.is_empty() && operand.is_none() => {
                operand = Some(Box::new(build_expr(child)?))
            }
            _ => return Err(node.malformed("unexpected CASE child")),
        }
    }
    if when_clauses.is_empty() {
        return Err(node.malformed("CASE without WHEN"));
    }
    Ok(Expr::Case(Case {
        operand,
        when_clauses,
        else_clause,
        metas: node_metas(node),
    }))
}

fn build_date(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let text = literal_text(only_child(node)?)?;
    let (year, month, day) = datetime::parse_date_parts(&text)
        .ok_or_else(|| node.malformed("invalid date literal survived parsing"))?;
    Ok(Expr::DateLit(DateLit {
        year,
        month,
        day,
        metas: node_metas(node),
    }))
}

fn build_time(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let (atom, precision) = two_children(node)?;
    let text = literal_text(atom)?;
    let parts = datetime::parse_time_parts(&text)
        .ok_or_else(|| node.malformed("invalid time literal survived parsing"))?;
    let precision = match precision.token.as_ref().map(|token| &token.kind) {
        Some(TokenKind::Literal(Value::Integer(value))) if *value >= 0 => *value as u32,
        _ => return Err(node.malformed("missing time precision")),
    };
    let with_time_zone = node.kind == NodeKind::TimeWithTimeZone;
    // a WITH TIME ZONE literal without an offset takes the system offset
    let tz_minutes = if with_time_zone {
        Some(
            parts
                .tz_minutes
                .unwrap_or_else(|| chrono::Local::now().offset().fix().local_minus_utc() / 60),
        )
    } else {
        None
    };
    Ok(Expr::TimeLit(TimeLit {
        hour: parts.hour,
        minute: parts.minute,
        second: parts.second,
        nanos: parts.nanos,
        precision,
        with_time_zone,
        tz_minutes,
        metas: node_metas(node),
    }))
}

fn literal_text(node: &ParseNode<'_>) -> Result<String, ParserError> {
    match node.token.as_ref().map(|token| &token.kind) {
        Some(TokenKind::Literal(Value::Text(text))) => Ok(text.clone()),
        _ => Err(node.malformed("expected a string literal atom")),
    }
}

fn alias_name(node: &ParseNode<'_>) -> Result<SymbolName, ParserError> {
    let token = node_token(node)?;
    match &token.kind {
        TokenKind::Ident(name) | TokenKind::QuotedIdent(name) => {
            Ok(SymbolName::with_metas(name.clone(), token_metas(token)))
        }
        _ => Err(node.malformed("alias is not an identifier")),
    }
}

fn build_select(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    if node.children.is_empty() {
        return Err(node.malformed("select without projection"));
    }
    let mut projection_node = &node.children[0];
    let quantifier = if projection_node.kind == NodeKind::Distinct {
        projection_node = only_child(projection_node)?;
        SetQuantifier::Distinct
    } else {
        SetQuantifier::All
    };

    let projection = match node.kind {
        NodeKind::SelectList => {
            if projection_node.kind != NodeKind::ArgList {
                return Err(node.malformed("select list is not an arg list"));
            }
            let mut items = vec![];
            for item in &projection_node.children {
                items.push(match item.kind {
                    NodeKind::ProjectAll => SelectItem::ProjectAll {
                        expr: match item.children.first() {
                            Some(inner) => Some(build_expr(inner)?),
                            None => None,
                        },
                    },
                    NodeKind::AsAlias => SelectItem::Expr {
                        expr: build_expr(only_child(item)?)?,
                        alias: Some(alias_name(item)?),
                    },
                    _ => SelectItem::Expr {
                        expr: build_expr(item)?,
                        alias: None,
                    },
                });
            }
            Projection::List(items)
        }
        NodeKind::SelectValue => Projection::Value(Box::new(build_expr(projection_node)?)),
        NodeKind::Pivot => {
            if projection_node.kind != NodeKind::Member {
                return Err(node.malformed("pivot projection is not a member"));
            }
            let (at, value) = two_children(projection_node)?;
            Projection::Pivot {
                value: Box::new(build_expr(value)?),
                at: Box::new(build_expr(at)?),
            }
        }
        _ => unreachable!("checked by build_expr"),
    };

    let mut select = Select {
        quantifier,
        projection,
        from: None,
        let_clause: None,
        where_clause: None,
        group_by: None,
        having: None,
        order_by: None,
        limit: None,
        metas: node_metas(node),
    };

    for clause in &node.children[1..] {
        match clause.kind {
            NodeKind::FromClause => {
                select.from = Some(build_from_source(only_child(clause)?)?);
            }
            NodeKind::Let => {
                let mut bindings = vec![];
                for binding in &clause.children {
                    if binding.kind != NodeKind::AsAlias {
                        return Err(clause.malformed("LET binding is not an alias"));
                    }
                    bindings.push(LetBinding {
                        expr: build_expr(only_child(binding)?)?,
                        name: alias_name(binding)?,
                    });
                }
                select.let_clause = Some(Let { bindings });
            }
            NodeKind::Where => {
                select.where_clause = Some(Box::new(build_expr(only_child(clause)?)?));
            }
            NodeKind::Group | NodeKind::GroupPartial => {
                select.group_by = Some(build_group_by(clause)?);
            }
            NodeKind::Having => {
                select.having = Some(Box::new(build_expr(only_child(clause)?)?));
            }
            NodeKind::OrderBy => {
                select.order_by = Some(build_order_by(clause)?);
            }
            NodeKind::Limit => {
                select.limit = Some(Box::new(build_expr(only_child(clause)?)?));
            }
            _ => return Err(clause.malformed("unexpected select clause")),
        }
    }
    Ok(Expr::Select(Box::new(select)))
}

fn build_order_by(node: &ParseNode<'_>) -> Result<OrderBy, ParserError> {
    let mut specs = vec![];
    for spec in &node.children {
        if spec.kind != NodeKind::SortSpec || spec.children.is_empty() {
            return Err(node.malformed("unexpected sort spec"));
        }
        let expr = build_expr(&spec.children[0])?;
        let ordering = match spec.children.get(1) {
            Some(ordering) => Some(
                match ordering.token.as_ref().map(|token| &token.kind) {
                    Some(TokenKind::Asc) => OrderingSpec::Asc,
                    Some(TokenKind::Desc) => OrderingSpec::Desc,
                    _ => return Err(ordering.malformed("unexpected ordering spec")),
                },
            ),
            None => None,
        };
        specs.push(SortSpec { expr, ordering });
    }
    Ok(OrderBy { specs })
}

fn build_group_by(node: &ParseNode<'_>) -> Result<GroupBy, ParserError> {
    let strategy = if node.kind == NodeKind::GroupPartial {
        GroupingStrategy::Partial
    } else {
        GroupingStrategy::Full
    };
    if node.children.is_empty() {
        return Err(node.malformed("group by without items"));
    }
    let arg_list = &node.children[0];
    if arg_list.kind != NodeKind::ArgList {
        return Err(node.malformed("group items are not an arg list"));
    }
    let mut items = vec![];
    for item in &arg_list.children {
        items.push(match item.kind {
            NodeKind::AsAlias => GroupByItem {
                expr: build_expr(only_child(item)?)?,
                alias: Some(alias_name(item)?),
            },
            _ => GroupByItem {
                expr: build_expr(item)?,
                alias: None,
            },
        });
    }
    let group_as = match node.children.get(1) {
        Some(marker) if marker.kind == NodeKind::AsAlias => Some(alias_name(marker)?),
        Some(other) => return Err(other.malformed("unexpected group-as marker")),
        None => None,
    };
    Ok(GroupBy {
        strategy,
        items,
        group_as,
    })
}

/// Peels the AS/AT/BY alias wrappers off a FROM source.
fn unwrap_aliases<'b, 'a>(
    node: &'b ParseNode<'a>,
) -> Result<(&'b ParseNode<'a>, Aliases), ParserError> {
    let mut aliases = Aliases::default();
    let mut current = node;
    loop {
        match current.kind {
            NodeKind::ByAlias if aliases.by_alias.is_none() => {
                aliases.by_alias = Some(alias_name(current)?);
                current = only_child(current)?;
            }
            NodeKind::AtAlias if aliases.at_alias.is_none() => {
                aliases.at_alias = Some(alias_name(current)?);
                current = only_child(current)?;
            }
            NodeKind::AsAlias if aliases.as_alias.is_none() => {
                aliases.as_alias = Some(alias_name(current)?);
                current = only_child(current)?;
            }
            _ => return Ok((current, aliases)),
        }
    }
}

fn build_from_source(node: &ParseNode<'_>) -> Result<FromSource, ParserError> {
    let (inner, aliases) = unwrap_aliases(node)?;
    match inner.kind {
        NodeKind::Unpivot => Ok(FromSource::Unpivot {
            expr: Box::new(build_expr(only_child(inner)?)?),
            aliases,
        }),
        kind if kind.is_join() => {
            if aliases != Aliases::default() {
                return Err(inner.malformed("aliased join"));
            }
            build_join(inner)
        }
        NodeKind::FromSourceJoin => {
            if aliases != Aliases::default() {
                return Err(inner.malformed("aliased parenthesized join"));
            }
            build_from_source(only_child(inner)?)
        }
        _ => Ok(FromSource::Expr {
            expr: Box::new(build_expr(inner)?),
            aliases,
        }),
    }
}

fn build_join(node: &ParseNode<'_>) -> Result<FromSource, ParserError> {
    let kind = match node.kind {
        NodeKind::InnerJoin => JoinKind::Inner,
        NodeKind::LeftJoin => JoinKind::Left,
        NodeKind::RightJoin => JoinKind::Right,
        NodeKind::OuterJoin => JoinKind::Outer,
        _ => return Err(node.malformed("not a join node")),
    };
    let mut metas = node_metas(node);
    // implicit comma joins carry no originating token
    if node.token.is_none() {
        metas = metas.with_implicit_cross_join();
    }
    let (left, right, on) = match node.children.len() {
        // cross join: the condition is a synthesized TRUE
        2 => (
            &node.children[0],
            &node.children[1],
            Expr::Lit(Lit {
                value: Value::Boolean(true),
                metas: Metas::NONE,
            }),
        ),
        3 => (
            &node.children[0],
            &node.children[1],
            build_expr(&node.children[2])?,
        ),
        _ => return Err(node.malformed("join arity")),
    };
    Ok(FromSource::Join(Box::new(Join {
        kind,
        left: build_from_source(left)?,
        right: build_from_source(right)?,
        on,
        metas,
    })))
}

fn build_with(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    if node.children.is_empty() {
        return Err(node.malformed("WITH without query"));
    }
    let mut recursive = false;
    let mut bindings = vec![];
    let (query, rest) = node
        .children
        .split_last()
        .expect("checked non-empty above");
    for child in rest {
        match child.kind {
            NodeKind::Recursive => recursive = true,
            NodeKind::Materialized => {
                let materialized = !matches!(
                    child.token.as_ref().and_then(Token::keyword),
                    Some(Keyword::NotMaterialized)
                );
                bindings.push(build_with_binding(only_child(child)?, materialized)?);
            }
            NodeKind::AsAlias => bindings.push(build_with_binding(child, true)?),
            _ => return Err(child.malformed("unexpected WITH child")),
        }
    }
    Ok(Expr::With(Box::new(WithQuery {
        recursive,
        bindings,
        query: build_expr(query)?,
        metas: node_metas(node),
    })))
}

fn build_with_binding(
    node: &ParseNode<'_>,
    materialized: bool,
) -> Result<WithBinding, ParserError> {
    if node.kind != NodeKind::AsAlias {
        return Err(node.malformed("WITH binding is not an alias"));
    }
    Ok(WithBinding {
        name: alias_name(node)?,
        materialized,
        query: build_expr(only_child(node)?)?,
    })
}

fn build_dml_statement(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let mut where_clause = None;
    let mut returning = None;
    let mut core = vec![];
    for child in &node.children {
        match child.kind {
            NodeKind::Where => {
                where_clause = Some(Box::new(build_expr(only_child(child)?)?));
            }
            NodeKind::Returning => returning = Some(build_returning(child)?),
            _ => core.push(child),
        }
    }

    let (ops, from) = match node.kind {
        NodeKind::Insert | NodeKind::InsertValue | NodeKind::Set | NodeKind::Remove => {
            (build_dml_ops(node.kind, node, &core)?, None)
        }
        NodeKind::DmlList => {
            let mut ops = vec![];
            for op in &core {
                ops.extend(build_dml_ops(op.kind, op, &op.children.iter().collect::<Vec<_>>())?);
            }
            (ops, None)
        }
        NodeKind::Update | NodeKind::From => {
            if core.len() != 2 {
                return Err(node.malformed("DML wrapper arity"));
            }
            let from = build_from_source(core[0])?;
            let ops_node = core[1];
            let ops = match ops_node.kind {
                NodeKind::DmlList => {
                    let mut ops = vec![];
                    for op in &ops_node.children {
                        ops.extend(build_dml_ops(
                            op.kind,
                            op,
                            &op.children.iter().collect::<Vec<_>>(),
                        )?);
                    }
                    ops
                }
                kind => build_dml_ops(kind, ops_node, &ops_node.children.iter().collect::<Vec<_>>())?,
            };
            (ops, Some(from))
        }
        NodeKind::Delete => {
            if core.len() != 1 {
                return Err(node.malformed("DELETE arity"));
            }
            (vec![DmlOp::Delete], Some(build_from_source(core[0])?))
        }
        _ => return Err(node.malformed("not a DML statement")),
    };

    Ok(Expr::Dml(Box::new(DataManipulation {
        ops,
        from,
        where_clause,
        returning,
        metas: node_metas(node),
    })))
}

fn build_dml_ops(
    kind: NodeKind,
    node: &ParseNode<'_>,
    children: &[&ParseNode<'_>],
) -> Result<Vec<DmlOp>, ParserError> {
    match kind {
        NodeKind::Insert => {
            if children.len() != 2 {
                return Err(node.malformed("INSERT arity"));
            }
            Ok(vec![DmlOp::Insert(Insert {
                target: build_expr(children[0])?,
                values: build_expr(children[1])?,
            })])
        }
        NodeKind::InsertValue => {
            if children.len() < 2 {
                return Err(node.malformed("INSERT VALUE arity"));
            }
            let target = build_expr(children[0])?;
            let value = build_expr(children[1])?;
            let mut position = None;
            let mut on_conflict = None;
            for extra in &children[2..] {
                match extra.kind {
                    NodeKind::OnConflict => on_conflict = Some(build_on_conflict(extra)?),
                    _ => position = Some(build_expr(extra)?),
                }
            }
            Ok(vec![DmlOp::InsertValue(InsertValue {
                target,
                value,
                position,
                on_conflict,
            })])
        }
        NodeKind::Set => {
            let mut ops = vec![];
            for assignment in children {
                if assignment.kind != NodeKind::Assignment {
                    return Err(node.malformed("SET child is not an assignment"));
                }
                let (target, value) = two_children(assignment)?;
                ops.push(DmlOp::Set(Assignment {
                    target: build_expr(target)?,
                    value: build_expr(value)?,
                }));
            }
            if ops.is_empty() {
                return Err(node.malformed("SET without assignments"));
            }
            Ok(ops)
        }
        NodeKind::Remove => {
            if children.len() != 1 {
                return Err(node.malformed("REMOVE arity"));
            }
            Ok(vec![DmlOp::Remove(Remove {
                target: build_expr(children[0])?,
            })])
        }
        _ => Err(node.malformed("not a DML operation")),
    }
}

fn build_on_conflict(node: &ParseNode<'_>) -> Result<OnConflict, ParserError> {
    let (check, action) = two_children(node)?;
    if check.kind != NodeKind::Check {
        return Err(node.malformed("ON CONFLICT without condition"));
    }
    if action.kind != NodeKind::ConflictAction {
        return Err(node.malformed("ON CONFLICT without action"));
    }
    Ok(OnConflict {
        condition: build_expr(only_child(check)?)?,
        action: ConflictAction::DoNothing,
    })
}

fn build_returning(node: &ParseNode<'_>) -> Result<Returning, ParserError> {
    let mut elems = vec![];
    for elem in &node.children {
        if elem.kind != NodeKind::ReturningElem {
            return Err(node.malformed("unexpected RETURNING element"));
        }
        let (mapping, column) = two_children(elem)?;
        let mapping = match mapping.token.as_ref().and_then(Token::keyword) {
            Some(Keyword::ModifiedOld) => ReturningMapping::ModifiedOld,
            Some(Keyword::ModifiedNew) => ReturningMapping::ModifiedNew,
            Some(Keyword::AllOld) => ReturningMapping::AllOld,
            Some(Keyword::AllNew) => ReturningMapping::AllNew,
            _ => return Err(mapping.malformed("unexpected RETURNING mapping")),
        };
        let column = match column.kind {
            NodeKind::ReturningWildcard => ColumnComponent::Wildcard,
            _ => ColumnComponent::Expr(build_expr(column)?),
        };
        elems.push(ReturningElem { mapping, column });
    }
    Ok(Returning { elems })
}

fn build_ddl(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    let metas = node_metas(node);
    let op = match node.kind {
        NodeKind::CreateTable => DdlOp::CreateTable {
            name: alias_name(only_child(node)?)?,
        },
        NodeKind::DropTable => DdlOp::DropTable {
            name: alias_name(only_child(node)?)?,
        },
        NodeKind::CreateIndex => {
            if node.children.is_empty() {
                return Err(node.malformed("CREATE INDEX without table"));
            }
            let table = alias_name(&node.children[0])?;
            let keys = node.children[1..]
                .iter()
                .map(build_expr)
                .collect::<Result<Vec<_>, _>>()?;
            DdlOp::CreateIndex { table, keys }
        }
        NodeKind::DropIndex => {
            let (index, table) = two_children(node)?;
            DdlOp::DropIndex {
                index: alias_name(index)?,
                table: alias_name(table)?,
            }
        }
        _ => return Err(node.malformed("not a DDL statement")),
    };
    Ok(Expr::Ddl(Ddl { op, metas }))
}

fn build_exec(node: &ParseNode<'_>) -> Result<Expr, ParserError> {
    if node.children.is_empty() {
        return Err(node.malformed("EXEC without procedure"));
    }
    let name = alias_name(&node.children[0])?;
    let args = node.children[1..]
        .iter()
        .map(build_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::Exec(Exec {
        name,
        args,
        metas: node_metas(node),
    }))
}

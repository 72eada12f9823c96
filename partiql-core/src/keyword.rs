use core::fmt;

/// PartiQL keywords.
///
/// Multi-word variants (e.g. [`Keyword::LeftCrossJoin`]) are never produced by
/// single-word lookup; the lexer fuses adjacent keyword lexemes into them.
/// Their normalized text joins the lexemes with `_`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum Keyword {
    All,
    AllNew,
    AllOld,
    And,
    Any,
    Avg,
    Bag,
    Between,
    Blob,
    Boolean,
    Case,
    Cast,
    Char,
    Character,
    CharacterVarying,
    Clob,
    Conflict,
    Count,
    Create,
    Cross,
    CrossJoin,
    Date,
    DateAdd,
    DateDiff,
    Decimal,
    Delete,
    Distinct,
    Do,
    DoNothing,
    Double,
    DoublePrecision,
    Drop,
    Else,
    End,
    Escape,
    Every,
    Except,
    ExceptAll,
    Exec,
    Extract,
    Float,
    From,
    Group,
    Having,
    In,
    Index,
    Inner,
    InnerJoin,
    Insert,
    InsertInto,
    Int,
    Integer,
    Intersect,
    IntersectAll,
    Into,
    Is,
    IsNot,
    Join,
    Left,
    LeftCrossJoin,
    LeftJoin,
    Let,
    Like,
    Limit,
    List,
    Materialized,
    Max,
    Min,
    Modified,
    ModifiedNew,
    ModifiedOld,
    New,
    Not,
    NotBetween,
    NotIn,
    NotLike,
    NotMaterialized,
    Nothing,
    Numeric,
    Old,
    On,
    OnConflict,
    Or,
    Order,
    Outer,
    OuterCrossJoin,
    OuterJoin,
    Partial,
    Pivot,
    Precision,
    Real,
    Recursive,
    Remove,
    Returning,
    Right,
    RightCrossJoin,
    RightJoin,
    Select,
    Set,
    Sexp,
    Smallint,
    Some,
    String,
    Struct,
    Substring,
    Sum,
    Symbol,
    Table,
    Then,
    Time,
    /// Not lexable directly; the type parser rewrites `time ... with time
    /// zone` into this keyword.
    TimeWithTimeZone,
    Timestamp,
    Trim,
    Tuple,
    Union,
    UnionAll,
    Unpivot,
    Update,
    Value,
    Values,
    Varchar,
    Varying,
    When,
    Where,
    With,
    Zone,
}

/// Single-word keyword lookup table.
///
/// **NOTE**: entries must stay sorted by string to keep the binary search valid.
const SINGLE_WORD_KEYWORDS: &[(&str, Keyword)] = &[
    ("all", Keyword::All),
    ("and", Keyword::And),
    ("any", Keyword::Any),
    ("avg", Keyword::Avg),
    ("bag", Keyword::Bag),
    ("between", Keyword::Between),
    ("blob", Keyword::Blob),
    ("boolean", Keyword::Boolean),
    ("case", Keyword::Case),
    ("cast", Keyword::Cast),
    ("char", Keyword::Char),
    ("character", Keyword::Character),
    ("clob", Keyword::Clob),
    ("conflict", Keyword::Conflict),
    ("count", Keyword::Count),
    ("create", Keyword::Create),
    ("cross", Keyword::Cross),
    ("date", Keyword::Date),
    ("date_add", Keyword::DateAdd),
    ("date_diff", Keyword::DateDiff),
    ("decimal", Keyword::Decimal),
    ("delete", Keyword::Delete),
    ("distinct", Keyword::Distinct),
    ("do", Keyword::Do),
    ("double", Keyword::Double),
    ("drop", Keyword::Drop),
    ("else", Keyword::Else),
    ("end", Keyword::End),
    ("escape", Keyword::Escape),
    ("every", Keyword::Every),
    ("except", Keyword::Except),
    ("exec", Keyword::Exec),
    ("extract", Keyword::Extract),
    ("float", Keyword::Float),
    ("from", Keyword::From),
    ("group", Keyword::Group),
    ("having", Keyword::Having),
    ("in", Keyword::In),
    ("index", Keyword::Index),
    ("inner", Keyword::Inner),
    ("insert", Keyword::Insert),
    ("int", Keyword::Int),
    ("integer", Keyword::Integer),
    ("intersect", Keyword::Intersect),
    ("into", Keyword::Into),
    ("is", Keyword::Is),
    ("join", Keyword::Join),
    ("left", Keyword::Left),
    ("let", Keyword::Let),
    ("like", Keyword::Like),
    ("limit", Keyword::Limit),
    ("list", Keyword::List),
    ("materialized", Keyword::Materialized),
    ("max", Keyword::Max),
    ("min", Keyword::Min),
    ("modified", Keyword::Modified),
    ("new", Keyword::New),
    ("not", Keyword::Not),
    ("nothing", Keyword::Nothing),
    ("numeric", Keyword::Numeric),
    ("old", Keyword::Old),
    ("on", Keyword::On),
    ("or", Keyword::Or),
    ("order", Keyword::Order),
    ("outer", Keyword::Outer),
    ("partial", Keyword::Partial),
    ("pivot", Keyword::Pivot),
    ("precision", Keyword::Precision),
    ("real", Keyword::Real),
    ("recursive", Keyword::Recursive),
    ("remove", Keyword::Remove),
    ("returning", Keyword::Returning),
    ("right", Keyword::Right),
    ("select", Keyword::Select),
    ("set", Keyword::Set),
    ("sexp", Keyword::Sexp),
    ("smallint", Keyword::Smallint),
    ("some", Keyword::Some),
    ("string", Keyword::String),
    ("struct", Keyword::Struct),
    ("substring", Keyword::Substring),
    ("sum", Keyword::Sum),
    ("symbol", Keyword::Symbol),
    ("table", Keyword::Table),
    ("then", Keyword::Then),
    ("time", Keyword::Time),
    ("timestamp", Keyword::Timestamp),
    ("trim", Keyword::Trim),
    ("tuple", Keyword::Tuple),
    ("union", Keyword::Union),
    ("unpivot", Keyword::Unpivot),
    ("update", Keyword::Update),
    ("value", Keyword::Value),
    ("values", Keyword::Values),
    ("varchar", Keyword::Varchar),
    ("varying", Keyword::Varying),
    ("when", Keyword::When),
    ("where", Keyword::Where),
    ("with", Keyword::With),
    ("zone", Keyword::Zone),
];

impl Keyword {
    /// Looks up a single-word keyword from its (already lowercased) text.
    pub fn from_word(word: &str) -> Option<Keyword> {
        SINGLE_WORD_KEYWORDS
            .binary_search_by(|(text, _)| (*text).cmp(word))
            .map(|index| SINGLE_WORD_KEYWORDS[index].1)
            .ok()
    }

    /// Returns the normalized keyword text, multi-word keywords joined by `_`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::All => "all",
            Keyword::AllNew => "all_new",
            Keyword::AllOld => "all_old",
            Keyword::And => "and",
            Keyword::Any => "any",
            Keyword::Avg => "avg",
            Keyword::Bag => "bag",
            Keyword::Between => "between",
            Keyword::Blob => "blob",
            Keyword::Boolean => "boolean",
            Keyword::Case => "case",
            Keyword::Cast => "cast",
            Keyword::Char => "char",
            Keyword::Character => "character",
            Keyword::CharacterVarying => "character_varying",
            Keyword::Clob => "clob",
            Keyword::Conflict => "conflict",
            Keyword::Count => "count",
            Keyword::Create => "create",
            Keyword::Cross => "cross",
            Keyword::CrossJoin => "cross_join",
            Keyword::Date => "date",
            Keyword::DateAdd => "date_add",
            Keyword::DateDiff => "date_diff",
            Keyword::Decimal => "decimal",
            Keyword::Delete => "delete",
            Keyword::Distinct => "distinct",
            Keyword::Do => "do",
            Keyword::DoNothing => "do_nothing",
            Keyword::Double => "double",
            Keyword::DoublePrecision => "double_precision",
            Keyword::Drop => "drop",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Escape => "escape",
            Keyword::Every => "every",
            Keyword::Except => "except",
            Keyword::ExceptAll => "except_all",
            Keyword::Exec => "exec",
            Keyword::Extract => "extract",
            Keyword::Float => "float",
            Keyword::From => "from",
            Keyword::Group => "group",
            Keyword::Having => "having",
            Keyword::In => "in",
            Keyword::Index => "index",
            Keyword::Inner => "inner",
            Keyword::InnerJoin => "inner_join",
            Keyword::Insert => "insert",
            Keyword::InsertInto => "insert_into",
            Keyword::Int => "int",
            Keyword::Integer => "integer",
            Keyword::Intersect => "intersect",
            Keyword::IntersectAll => "intersect_all",
            Keyword::Into => "into",
            Keyword::Is => "is",
            Keyword::IsNot => "is_not",
            Keyword::Join => "join",
            Keyword::Left => "left",
            Keyword::LeftCrossJoin => "left_cross_join",
            Keyword::LeftJoin => "left_join",
            Keyword::Let => "let",
            Keyword::Like => "like",
            Keyword::Limit => "limit",
            Keyword::List => "list",
            Keyword::Materialized => "materialized",
            Keyword::Max => "max",
            Keyword::Min => "min",
            Keyword::Modified => "modified",
            Keyword::ModifiedNew => "modified_new",
            Keyword::ModifiedOld => "modified_old",
            Keyword::New => "new",
            Keyword::Not => "not",
            Keyword::NotBetween => "not_between",
            Keyword::NotIn => "not_in",
            Keyword::NotLike => "not_like",
            Keyword::NotMaterialized => "not_materialized",
            Keyword::Nothing => "nothing",
            Keyword::Numeric => "numeric",
            Keyword::Old => "old",
            Keyword::On => "on",
            Keyword::OnConflict => "on_conflict",
            Keyword::Or => "or",
            Keyword::Order => "order",
            Keyword::Outer => "outer",
            Keyword::OuterCrossJoin => "outer_cross_join",
            Keyword::OuterJoin => "outer_join",
            Keyword::Partial => "partial",
            Keyword::Pivot => "pivot",
            Keyword::Precision => "precision",
            Keyword::Real => "real",
            Keyword::Recursive => "recursive",
            Keyword::Remove => "remove",
            Keyword::Returning => "returning",
            Keyword::Right => "right",
            Keyword::RightCrossJoin => "right_cross_join",
            Keyword::RightJoin => "right_join",
            Keyword::Select => "select",
            Keyword::Set => "set",
            Keyword::Sexp => "sexp",
            Keyword::Smallint => "smallint",
            Keyword::Some => "some",
            Keyword::String => "string",
            Keyword::Struct => "struct",
            Keyword::Substring => "substring",
            Keyword::Sum => "sum",
            Keyword::Symbol => "symbol",
            Keyword::Table => "table",
            Keyword::Then => "then",
            Keyword::Time => "time",
            Keyword::TimeWithTimeZone => "time_with_time_zone",
            Keyword::Timestamp => "timestamp",
            Keyword::Trim => "trim",
            Keyword::Tuple => "tuple",
            Keyword::Union => "union",
            Keyword::UnionAll => "union_all",
            Keyword::Unpivot => "unpivot",
            Keyword::Update => "update",
            Keyword::Value => "value",
            Keyword::Values => "values",
            Keyword::Varchar => "varchar",
            Keyword::Varying => "varying",
            Keyword::When => "when",
            Keyword::Where => "where",
            Keyword::With => "with",
            Keyword::Zone => "zone",
        }
    }

    /// Returns true for the join keywords that introduce a FROM-source join.
    pub fn is_join(&self) -> bool {
        matches!(
            self,
            Keyword::Join
                | Keyword::InnerJoin
                | Keyword::CrossJoin
                | Keyword::LeftJoin
                | Keyword::LeftCrossJoin
                | Keyword::RightJoin
                | Keyword::RightCrossJoin
                | Keyword::OuterJoin
                | Keyword::OuterCrossJoin
        )
    }

    /// Returns true for the join keywords that take no `ON` condition.
    pub fn is_cross_join(&self) -> bool {
        matches!(
            self,
            Keyword::CrossJoin
                | Keyword::LeftCrossJoin
                | Keyword::RightCrossJoin
                | Keyword::OuterCrossJoin
        )
    }

    /// Returns true for the standard aggregate function keywords.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Keyword::Count
                | Keyword::Avg
                | Keyword::Min
                | Keyword::Max
                | Keyword::Sum
                | Keyword::Any
                | Keyword::Some
                | Keyword::Every
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_is_sorted() {
        for window in SINGLE_WORD_KEYWORDS.windows(2) {
            assert!(
                window[0].0 < window[1].0,
                "{:?} must sort before {:?}",
                window[0].0,
                window[1].0
            );
        }
    }

    #[test]
    fn lookup_single_word() {
        assert_eq!(Keyword::from_word("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_word("date_add"), Some(Keyword::DateAdd));
        assert_eq!(Keyword::from_word("zone"), Some(Keyword::Zone));
        assert_eq!(Keyword::from_word("all"), Some(Keyword::All));
        assert_eq!(Keyword::from_word("inner_join"), None);
        assert_eq!(Keyword::from_word("t"), None);
    }

    #[test]
    fn normalized_text() {
        assert_eq!(Keyword::LeftCrossJoin.as_str(), "left_cross_join");
        assert_eq!(Keyword::NotBetween.as_str(), "not_between");
        assert_eq!(Keyword::InsertInto.as_str(), "insert_into");
        assert_eq!(Keyword::DoNothing.as_str(), "do_nothing");
    }
}

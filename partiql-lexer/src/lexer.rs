use core::iter::Peekable;
use core::str::Chars;

use partiql_core::{DatePart, Keyword, Operator, Position, Span, Token, TokenKind, TrimSpec, Value};

use crate::error::LexerError;

/// PartiQL Lexer
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    line: u64,
    column: u64,
    consumed: u64,
    next_parameter: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            iter: input.chars().peekable(),
            line: 1,
            column: 1,
            consumed: 0,
            next_parameter: 1,
        }
    }

    /// Tokenizes the statement and produces an EOF-terminated token sequence.
    ///
    /// Whitespace and comments are skipped; adjacent keyword lexemes are fused
    /// into their multi-word keywords (`inner join` lexes as a single
    /// `inner_join` token carrying the span of `inner`).
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = vec![];
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        let mut tokens = fuse_keywords(tokens);
        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.line, self.column, 0),
        ));
        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        self.consumed += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consumes the next character if it equals `expected`.
    fn next_if_is(&mut self, expected: char) -> bool {
        if self.iter.peek() == Some(&expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        loop {
            let ch = match self.iter.peek() {
                Some(&ch) => ch,
                None => return Ok(None),
            };
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.next_char();
                }
                '-' => {
                    let start = self.start();
                    self.next_char();
                    if self.next_if_is('-') {
                        self.skip_line_comment();
                    } else {
                        return Ok(Some(self.finish(start, op(Operator::Minus))));
                    }
                }
                '/' => {
                    let start = self.start();
                    self.next_char();
                    if self.next_if_is('*') {
                        self.skip_block_comment(start.0)?;
                    } else {
                        return Ok(Some(self.finish(start, op(Operator::Slash))));
                    }
                }
                _ => return self.scan_token().map(Some),
            }
        }
    }

    /// Marks the start of a token: (position, chars consumed so far).
    fn start(&self) -> (Position, u64) {
        (self.position(), self.consumed)
    }

    fn finish(&self, start: (Position, u64), kind: TokenKind) -> Token {
        let (position, consumed) = start;
        Token::new(
            kind,
            Span::new(position.line, position.column, self.consumed - consumed),
        )
    }

    fn scan_token(&mut self) -> Result<Token, LexerError> {
        let start = self.start();
        let ch = self.next_char().expect("peeked by the caller");
        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftCurly,
            '}' => TokenKind::RightCurly,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '*' => TokenKind::Star,
            '+' => op(Operator::Plus),
            '%' => op(Operator::Percent),
            '@' => op(Operator::AtSign),
            '=' => op(Operator::Eq),
            '?' => {
                let ordinal = self.next_parameter;
                self.next_parameter += 1;
                TokenKind::QuestionMark(ordinal)
            }
            '<' => {
                if self.next_if_is('<') {
                    TokenKind::LeftDoubleAngle
                } else if self.next_if_is('=') {
                    op(Operator::LtEq)
                } else if self.next_if_is('>') {
                    op(Operator::NotEq)
                } else {
                    op(Operator::Lt)
                }
            }
            '>' => {
                if self.next_if_is('>') {
                    TokenKind::RightDoubleAngle
                } else if self.next_if_is('=') {
                    op(Operator::GtEq)
                } else {
                    op(Operator::Gt)
                }
            }
            '|' => {
                if self.next_if_is('|') {
                    op(Operator::Concat)
                } else {
                    return Err(LexerError::new("unexpected character '|'", start.0));
                }
            }
            '!' => {
                if self.next_if_is('=') {
                    op(Operator::NotEq)
                } else {
                    return Err(LexerError::new("unexpected character '!'", start.0));
                }
            }
            '\'' => TokenKind::Literal(Value::Text(self.scan_quoted(start.0, '\'')?)),
            '"' => TokenKind::QuotedIdent(self.scan_quoted(start.0, '"')?),
            '`' => TokenKind::IonLiteral(self.scan_ion(start.0)?),
            '0'..='9' => self.scan_number(ch),
            ch if is_ident_start(ch) => self.scan_word(ch),
            ch => {
                return Err(LexerError::new(
                    format!("unexpected character {:?}", ch),
                    start.0,
                ));
            }
        };
        Ok(self.finish(start, kind))
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.next_char() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, position: Position) -> Result<(), LexerError> {
        loop {
            match self.next_char() {
                Some('*') if self.next_if_is('/') => return Ok(()),
                Some(_) => continue,
                None => return Err(LexerError::new("unterminated block comment", position)),
            }
        }
    }

    /// Scans the remainder of a `'` or `"` quoted sequence; a doubled quote
    /// escapes itself.
    fn scan_quoted(&mut self, position: Position, quote: char) -> Result<String, LexerError> {
        let mut text = String::new();
        loop {
            match self.next_char() {
                Some(ch) if ch == quote => {
                    if self.next_if_is(quote) {
                        text.push(quote);
                    } else {
                        return Ok(text);
                    }
                }
                Some(ch) => text.push(ch),
                None => {
                    let what = if quote == '\'' {
                        "unterminated string literal"
                    } else {
                        "unterminated quoted identifier"
                    };
                    return Err(LexerError::new(what, position));
                }
            }
        }
    }

    fn scan_ion(&mut self, position: Position) -> Result<String, LexerError> {
        let mut text = String::new();
        loop {
            match self.next_char() {
                Some('`') => return Ok(text),
                Some(ch) => text.push(ch),
                None => return Err(LexerError::new("unterminated ion literal", position)),
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        let mut exact = true;
        while let Some(&ch) = self.iter.peek() {
            match ch {
                '0'..='9' => {
                    text.push(ch);
                    self.next_char();
                }
                '.' => {
                    exact = false;
                    text.push(ch);
                    self.next_char();
                }
                'e' | 'E' => {
                    exact = false;
                    text.push(ch);
                    self.next_char();
                    if let Some(&sign) = self.iter.peek() {
                        if sign == '+' || sign == '-' {
                            text.push(sign);
                            self.next_char();
                        }
                    }
                }
                _ => break,
            }
        }
        if exact {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Literal(Value::Integer(value)),
                Err(_) => TokenKind::Literal(Value::Decimal(text)),
            }
        } else {
            TokenKind::Literal(Value::Decimal(text))
        }
    }

    fn scan_word(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(&ch) = self.iter.peek() {
            if is_ident_part(ch) {
                text.push(ch);
                self.next_char();
            } else {
                break;
            }
        }
        let lowered = text.to_lowercase();
        match lowered.as_str() {
            "true" => return TokenKind::Literal(Value::Boolean(true)),
            "false" => return TokenKind::Literal(Value::Boolean(false)),
            "null" => return TokenKind::Null,
            "missing" => return TokenKind::Missing,
            "as" => return TokenKind::As,
            "at" => return TokenKind::At,
            "by" => return TokenKind::By,
            "asc" => return TokenKind::Asc,
            "desc" => return TokenKind::Desc,
            "for" => return TokenKind::For,
            _ => {}
        }
        if let Some(spec) = TrimSpec::from_word(&lowered) {
            return TokenKind::TrimSpec(spec);
        }
        if let Some(part) = DatePart::from_word(&lowered) {
            return TokenKind::DatePart(part);
        }
        match Keyword::from_word(&lowered) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident(text),
        }
    }
}

fn op(operator: Operator) -> TokenKind {
    TokenKind::Operator(operator)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Multi-lexeme keyword table, longest sequences first.
///
/// **NOTE**: a sequence must come before every proper prefix of itself.
const MULTI_LEXEME_KEYWORDS: &[(&[Keyword], Keyword)] = &[
    (
        &[Keyword::Left, Keyword::Outer, Keyword::Cross, Keyword::Join],
        Keyword::LeftCrossJoin,
    ),
    (
        &[
            Keyword::Right,
            Keyword::Outer,
            Keyword::Cross,
            Keyword::Join,
        ],
        Keyword::RightCrossJoin,
    ),
    (
        &[Keyword::Left, Keyword::Outer, Keyword::Join],
        Keyword::LeftJoin,
    ),
    (
        &[Keyword::Right, Keyword::Outer, Keyword::Join],
        Keyword::RightJoin,
    ),
    (
        &[Keyword::Left, Keyword::Cross, Keyword::Join],
        Keyword::LeftCrossJoin,
    ),
    (
        &[Keyword::Right, Keyword::Cross, Keyword::Join],
        Keyword::RightCrossJoin,
    ),
    (
        &[Keyword::Outer, Keyword::Cross, Keyword::Join],
        Keyword::OuterCrossJoin,
    ),
    (&[Keyword::Inner, Keyword::Join], Keyword::InnerJoin),
    (&[Keyword::Cross, Keyword::Join], Keyword::CrossJoin),
    (&[Keyword::Left, Keyword::Join], Keyword::LeftJoin),
    (&[Keyword::Right, Keyword::Join], Keyword::RightJoin),
    (&[Keyword::Outer, Keyword::Join], Keyword::OuterJoin),
    (&[Keyword::Not, Keyword::In], Keyword::NotIn),
    (&[Keyword::Not, Keyword::Between], Keyword::NotBetween),
    (&[Keyword::Not, Keyword::Like], Keyword::NotLike),
    (&[Keyword::Is, Keyword::Not], Keyword::IsNot),
    (&[Keyword::Union, Keyword::All], Keyword::UnionAll),
    (&[Keyword::Intersect, Keyword::All], Keyword::IntersectAll),
    (&[Keyword::Except, Keyword::All], Keyword::ExceptAll),
    (&[Keyword::Insert, Keyword::Into], Keyword::InsertInto),
    (&[Keyword::On, Keyword::Conflict], Keyword::OnConflict),
    (&[Keyword::Do, Keyword::Nothing], Keyword::DoNothing),
    (&[Keyword::Modified, Keyword::Old], Keyword::ModifiedOld),
    (&[Keyword::Modified, Keyword::New], Keyword::ModifiedNew),
    (&[Keyword::All, Keyword::Old], Keyword::AllOld),
    (&[Keyword::All, Keyword::New], Keyword::AllNew),
    (
        &[Keyword::Not, Keyword::Materialized],
        Keyword::NotMaterialized,
    ),
    (
        &[Keyword::Character, Keyword::Varying],
        Keyword::CharacterVarying,
    ),
    (
        &[Keyword::Double, Keyword::Precision],
        Keyword::DoublePrecision,
    ),
];

/// Fuses adjacent keyword tokens into multi-word keywords.
///
/// The fused token keeps the span of the first lexeme.
fn fuse_keywords(tokens: Vec<Token>) -> Vec<Token> {
    let mut fused = Vec::with_capacity(tokens.len());
    let mut index = 0;
    'outer: while index < tokens.len() {
        for (sequence, keyword) in MULTI_LEXEME_KEYWORDS {
            if matches_sequence(&tokens[index..], sequence) {
                fused.push(Token::new(
                    TokenKind::Keyword(*keyword),
                    tokens[index].span,
                ));
                index += sequence.len();
                continue 'outer;
            }
        }
        fused.push(tokens[index].clone());
        index += 1;
    }
    fused
}

fn matches_sequence(tokens: &[Token], sequence: &[Keyword]) -> bool {
    tokens.len() >= sequence.len()
        && sequence
            .iter()
            .zip(tokens)
            .all(|(keyword, token)| token.is_keyword(*keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tokenize {
        ($input:expr, $expected:expr) => {{
            let got: Vec<TokenKind> = Lexer::new($input)
                .tokenize()
                .expect("tokenize failed")
                .into_iter()
                .map(|token| token.kind)
                .collect();
            assert_eq!(got, $expected);
        }};
    }

    fn kw(keyword: Keyword) -> TokenKind {
        TokenKind::Keyword(keyword)
    }

    #[test]
    fn tokenize_atoms() {
        tokenize!(
            "a \"B\" 'it''s' `1` 1 1.5 -- trailing",
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::QuotedIdent("B".into()),
                TokenKind::Literal(Value::Text("it's".into())),
                TokenKind::IonLiteral("1".into()),
                TokenKind::Literal(Value::Integer(1)),
                TokenKind::Literal(Value::Decimal("1.5".into())),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_punctuation() {
        tokenize!(
            "( ) [ ] { } << >> , . : ; * <= <> != @",
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::LeftCurly,
                TokenKind::RightCurly,
                TokenKind::LeftDoubleAngle,
                TokenKind::RightDoubleAngle,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Operator(Operator::LtEq),
                TokenKind::Operator(Operator::NotEq),
                TokenKind::Operator(Operator::NotEq),
                TokenKind::Operator(Operator::AtSign),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_keywords_and_special_words() {
        tokenize!(
            "SELECT missing null leading year as BY true",
            vec![
                kw(Keyword::Select),
                TokenKind::Missing,
                TokenKind::Null,
                TokenKind::TrimSpec(TrimSpec::Leading),
                TokenKind::DatePart(DatePart::Year),
                TokenKind::As,
                TokenKind::By,
                TokenKind::Literal(Value::Boolean(true)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn fuse_multi_word_keywords() {
        tokenize!(
            "a LEFT OUTER CROSS JOIN b INNER JOIN c",
            vec![
                TokenKind::Ident("a".into()),
                kw(Keyword::LeftCrossJoin),
                TokenKind::Ident("b".into()),
                kw(Keyword::InnerJoin),
                TokenKind::Ident("c".into()),
                TokenKind::Eof,
            ]
        );
        tokenize!(
            "x NOT BETWEEN 1 AND 2",
            vec![
                TokenKind::Ident("x".into()),
                kw(Keyword::NotBetween),
                TokenKind::Literal(Value::Integer(1)),
                kw(Keyword::And),
                TokenKind::Literal(Value::Integer(2)),
                TokenKind::Eof,
            ]
        );
        tokenize!(
            "ON CONFLICT WHERE a DO NOTHING",
            vec![
                kw(Keyword::OnConflict),
                kw(Keyword::Where),
                TokenKind::Ident("a".into()),
                kw(Keyword::DoNothing),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unfused_keywords_stay_single() {
        tokenize!(
            "is null not x",
            vec![
                kw(Keyword::Is),
                TokenKind::Null,
                kw(Keyword::Not),
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn parameter_ordinals() {
        let tokens = Lexer::new("? + ?").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::QuestionMark(1));
        assert_eq!(tokens[2].kind, TokenKind::QuestionMark(2));
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let tokens = Lexer::new("ab\n  cd").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 2));
        assert_eq!(tokens[1].span, Span::new(2, 3, 2));
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn comments_are_skipped() {
        tokenize!(
            "1 /* a\nb */ -- c\n2",
            vec![
                TokenKind::Literal(Value::Integer(1)),
                TokenKind::Literal(Value::Integer(2)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert_eq!(err.position, Position::new(1, 1));
    }

    #[test]
    fn fusion_table_prefers_longest_match() {
        for (index, (sequence, _)) in MULTI_LEXEME_KEYWORDS.iter().enumerate() {
            for (earlier, _) in &MULTI_LEXEME_KEYWORDS[..index] {
                assert!(
                    !sequence.starts_with(earlier),
                    "{:?} is shadowed by {:?}",
                    sequence,
                    earlier
                );
            }
        }
    }
}

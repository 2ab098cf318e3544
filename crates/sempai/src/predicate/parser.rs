//! Side-predicate parser built from `nom` combinators.
//!
//! ```text
//! disjunction := conjunction ("or" conjunction)*
//! conjunction := negation ("and" negation)*
//! negation    := "not" negation | comparison
//! comparison  := postfix (op postfix)?
//! op          := "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not" "in"
//! postfix     := primary ("[" disjunction "]" | "." name args)*
//! primary     := string | int | "True" | "False" | "None"
//!              | name args | name | "(" disjunction ")"
//! args        := "(" (disjunction ("," disjunction)*)? ")"
//! ```
//!
//! Parentheses, `not`, subscripts, method chains and call arguments each
//! add a nesting level; input deeper than [`MAX_DEPTH`] is rejected rather
//! than recursed into.

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag, take_while};
use nom::character::complete::{char as pchar, digit1, multispace0, satisfy};
use nom::combinator::{cut, map, not, opt, recognize, value, verify};
use nom::error::{ErrorKind, ParseError};
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated};

/// Deepest nesting a predicate may use.
pub(crate) const MAX_DEPTH: usize = 32;

const KEYWORDS: [&str; 4] = ["and", "or", "not", "in"];

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    Name(String),
    Not(Box<Expr>),
    /// Two or more operands joined by `and`.
    And(Vec<Expr>),
    /// Two or more operands joined by `or`.
    Or(Vec<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    Subscript(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Problem {
    Unexpected,
    Unterminated,
    IntegerRange,
    TooDeep,
}

/// Where parsing stopped and why.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SyntaxError<'a> {
    input: &'a str,
    problem: Problem,
}

impl<'a> SyntaxError<'a> {
    const fn new(input: &'a str, problem: Problem) -> Self {
        Self { input, problem }
    }

    fn describe(&self, source: &str) -> String {
        let rest = self.input.trim_start();
        let offset = source.len().saturating_sub(rest.len());
        match self.problem {
            Problem::TooDeep => {
                format!("expression nested too deeply (more than {MAX_DEPTH} levels)")
            }
            Problem::Unterminated => String::from("unterminated string literal"),
            Problem::IntegerRange => format!("integer literal at offset {offset} is out of range"),
            Problem::Unexpected => rest.chars().next().map_or_else(
                || String::from("unexpected end of expression"),
                |ch| format!("unexpected character '{ch}' at offset {offset}"),
            ),
        }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self::new(input, Problem::Unexpected)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

/// Parses one complete expression.
pub(crate) fn parse(source: &str) -> Result<Expr, String> {
    let parsed = terminated(|input| disjunction(input, 0), multispace0)(source);
    match parsed {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(format!("unexpected '{rest}' after expression")),
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) => Err(error.describe(source)),
        Err(nom::Err::Incomplete(_)) => Err(String::from("unexpected end of expression")),
    }
}

const fn too_deep<O>(input: &str) -> PResult<'_, O> {
    Err(nom::Err::Failure(SyntaxError::new(input, Problem::TooDeep)))
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn symbol<'a>(ch: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    ws(pchar(ch))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    ws(terminated(
        tag(word),
        not(satisfy(|ch: char| ch == '$' || ch == '_' || ch.is_alphanumeric())),
    ))
}

fn joined(first: Expr, rest: Vec<Expr>, join: fn(Vec<Expr>) -> Expr) -> Expr {
    if rest.is_empty() {
        first
    } else {
        join(std::iter::once(first).chain(rest).collect())
    }
}

fn disjunction(input: &str, depth: usize) -> PResult<'_, Expr> {
    if depth > MAX_DEPTH {
        return too_deep(input);
    }
    map(
        pair(
            move |i| conjunction(i, depth),
            many0(preceded(keyword("or"), cut(move |i| conjunction(i, depth)))),
        ),
        |(first, rest)| joined(first, rest, Expr::Or),
    )(input)
}

fn conjunction(input: &str, depth: usize) -> PResult<'_, Expr> {
    map(
        pair(
            move |i| negation(i, depth),
            many0(preceded(keyword("and"), cut(move |i| negation(i, depth)))),
        ),
        |(first, rest)| joined(first, rest, Expr::And),
    )(input)
}

fn negation(input: &str, depth: usize) -> PResult<'_, Expr> {
    if depth > MAX_DEPTH {
        return too_deep(input);
    }
    alt((
        map(
            preceded(keyword("not"), cut(move |i| negation(i, depth + 1))),
            |inner| Expr::Not(Box::new(inner)),
        ),
        move |i| comparison(i, depth),
    ))(input)
}

fn comparison(input: &str, depth: usize) -> PResult<'_, Expr> {
    map(
        pair(
            move |i| postfix(i, depth),
            opt(pair(compare_op, cut(move |i| postfix(i, depth)))),
        ),
        |(left, tail)| {
            tail.into_iter().fold(left, |lhs, (op, rhs)| {
                Expr::Compare(Box::new(lhs), op, Box::new(rhs))
            })
        },
    )(input)
}

fn compare_op(input: &str) -> PResult<'_, CompareOp> {
    alt((
        value(CompareOp::Eq, ws(tag("=="))),
        value(CompareOp::NotEq, ws(tag("!="))),
        value(CompareOp::Le, ws(tag("<="))),
        value(CompareOp::Lt, ws(tag("<"))),
        value(CompareOp::Ge, ws(tag(">="))),
        value(CompareOp::Gt, ws(tag(">"))),
        value(CompareOp::In, keyword("in")),
        value(CompareOp::NotIn, pair(keyword("not"), keyword("in"))),
    ))(input)
}

enum Suffix {
    Index(Expr),
    Method(String, Vec<Expr>),
}

fn postfix(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (mut rest, mut expr) = primary(input, depth)?;
    let mut level = depth;
    loop {
        level += 1;
        let (after, parsed) = opt(move |i| suffix(i, level))(rest)?;
        let Some(found) = parsed else {
            return Ok((rest, expr));
        };
        if level > MAX_DEPTH {
            return too_deep(rest);
        }
        expr = match found {
            Suffix::Index(index) => Expr::Subscript(Box::new(expr), Box::new(index)),
            Suffix::Method(method, args) => Expr::Method(Box::new(expr), method, args),
        };
        rest = after;
    }
}

fn suffix(input: &str, depth: usize) -> PResult<'_, Suffix> {
    alt((
        map(
            delimited(
                symbol('['),
                cut(move |i| disjunction(i, depth)),
                cut(symbol(']')),
            ),
            Suffix::Index,
        ),
        map(
            preceded(symbol('.'), cut(pair(name, move |i| arguments(i, depth)))),
            |(method, args)| Suffix::Method(method, args),
        ),
    ))(input)
}

fn arguments(input: &str, depth: usize) -> PResult<'_, Vec<Expr>> {
    delimited(
        symbol('('),
        separated_list0(symbol(','), move |i| disjunction(i, depth)),
        cut(symbol(')')),
    )(input)
}

fn primary(input: &str, depth: usize) -> PResult<'_, Expr> {
    ws(alt((
        map(string_literal, Expr::Str),
        integer,
        delimited(
            symbol('('),
            cut(move |i| disjunction(i, depth + 1)),
            cut(symbol(')')),
        ),
        map(
            pair(name, move |i| arguments(i, depth + 1)),
            |(function, args)| Expr::Call(function, args),
        ),
        map(name, named_value),
    )))(input)
}

fn named_value(ident: String) -> Expr {
    match ident.as_str() {
        "True" => Expr::Bool(true),
        "False" => Expr::Bool(false),
        "None" => Expr::None,
        _ => Expr::Name(ident),
    }
}

fn name(input: &str) -> PResult<'_, String> {
    map(
        verify(
            recognize(pair(
                satisfy(|ch: char| ch == '$' || ch == '_' || ch.is_alphabetic()),
                take_while(|ch: char| ch == '$' || ch == '_' || ch.is_alphanumeric()),
            )),
            |word: &str| !KEYWORDS.contains(&word),
        ),
        str::to_owned,
    )(input)
}

fn integer(input: &str) -> PResult<'_, Expr> {
    let (rest, digits) = digit1::<&str, SyntaxError<'_>>(input)?;
    digits
        .parse::<i64>()
        .map(|number| (rest, Expr::Int(number)))
        .map_err(|_| nom::Err::Failure(SyntaxError::new(input, Problem::IntegerRange)))
}

fn string_literal(input: &str) -> PResult<'_, String> {
    alt((quoted('\'', "\\'"), quoted('"', "\\\"")))(input)
}

fn quoted<'a>(quote: char, special: &'static str) -> impl FnMut(&'a str) -> PResult<'a, String> {
    move |input: &'a str| {
        let (body, _) = pchar::<&'a str, SyntaxError<'a>>(quote)(input)?;
        let (rest, text) = quoted_body(special)(body)?;
        pchar::<&'a str, SyntaxError<'a>>(quote)(rest)
            .map(|(after, _)| (after, text))
            .map_err(|_| nom::Err::Failure(SyntaxError::new(input, Problem::Unterminated)))
    }
}

fn quoted_body<'a>(special: &'static str) -> impl FnMut(&'a str) -> PResult<'a, String> {
    map(
        opt(escaped_transform(
            is_not(special),
            '\\',
            alt((
                value("\\", pchar('\\')),
                value("'", pchar('\'')),
                value("\"", pchar('"')),
                value("\n", pchar('n')),
                value("\t", pchar('t')),
            )),
        )),
        Option::unwrap_or_default,
    )
}

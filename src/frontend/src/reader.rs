use {
    super::ast::{Atom, Ast, Expr},
    chumsky::prelude::{Parser as ChumskyParser, *},
};

pub(super) trait Parser<'src, Output>:
    ChumskyParser<'src, &'src str, Output, extra::Err<Rich<'src, char>>> + Clone
{
}
impl<
        'src,
        Output,
        T: ChumskyParser<'src, &'src str, Output, extra::Err<Rich<'src, char>>> + Clone,
    > Parser<'src, Output> for T
{
}

// characters that end a bare atom
const DELIMITERS: &str = "()'\";";

fn char_escape_parser<'src>() -> impl Parser<'src, char> {
    just('\\').ignore_then(choice([
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
        just('\\').to('\\'),
        just('"').to('"'),
        just('0').to('\0'),
    ]))
}

fn string_parser<'src>() -> impl Parser<'src, Expr> {
    none_of("\"\\")
        .or(char_escape_parser())
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .map(|s| Expr::Atom(Atom::Str(s)))
}

fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-' | '+' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn bare_atom(text: &str) -> Expr {
    match text {
        "true" => Expr::from(true),
        "false" => Expr::from(false),
        _ if looks_numeric(text) => match text.parse::<f64>() {
            Ok(n) => Expr::from(n),
            Err(_) => Expr::symbol(text),
        },
        _ => Expr::symbol(text),
    }
}

fn bare_parser<'src>() -> impl Parser<'src, Expr> {
    any()
        .filter(|c: &char| !c.is_whitespace() && !DELIMITERS.contains(*c))
        .repeated()
        .at_least(1)
        .to_slice()
        .map(bare_atom)
}

fn comment_parser<'src>() -> impl Parser<'src, ()> {
    just(';').then(none_of('\n').repeated()).padded().ignored()
}

fn trivia_parser<'src>() -> impl Parser<'src, ()> {
    comment_parser().repeated().padded()
}

fn expr_parser<'src>() -> impl Parser<'src, Expr> {
    recursive(|expr_parser| {
        let list = expr_parser
            .clone()
            .padded_by(trivia_parser())
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just('(').then(trivia_parser()), just(')'))
            .map(Expr::list);

        let quoted = just('\'').ignore_then(expr_parser).map(Expr::quoted);

        choice((list, quoted, string_parser(), bare_parser()))
    })
}

pub(super) fn ast_parser<'src>() -> impl Parser<'src, Ast> {
    trivia_parser()
        .ignore_then(expr_parser().padded_by(trivia_parser()).repeated().collect())
        .map(|forms| Ast { forms })
        .then_ignore(end())
}

#[cfg(test)]
mod str_test_strategies;

mod error;
mod lexer;
mod formula;
mod parse;

pub use error::ParserError;
pub(crate) use lexer::{Lexer, Spanned, Token};
pub use formula::Formula;
pub use parse::{
    Parser, ParseOptions, Diagnostic, DEFAULT_MAX_COUNT,
    parse_to_formula, parse_with, parse_and_roll, parse_and_roll_with, is_valid
};

use crate::parser::ParserError as ParserError;


/// Errors raised while building dice and terms, or choosing a roll mode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A die or term that cannot be drawn from.
    #[error("Invalid die: {0}")]
    InvalidDieSpec(String),

    /// A term with a count of zero.
    #[error("Zero value not allowed")]
    ZeroValue,

    /// A term with more dice than a single term may carry.
    #[error("Too many dice in one term: {0}")]
    TooManyDice(u32),

    /// A roll mode name that is not recognized.
    #[error("Invalid roll mode: {0}")]
    InvalidMode(String),

    /// A formula that failed to parse.
    #[error("Parser error - {0}")]
    ParserError(#[from] ParserError)
}

use crate::Error as RollError;


/// Errors raised while parsing a formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParserError {
    /// Wraps another error with the char offset it occurred at.
    #[error("At position {0} - {1}")]
    AtPosition(usize, Box<ParserError>),

    /// Text that starts no term, in strict mode.
    #[error("Unrecognized input: {0}")]
    Unrecognized(String),

    /// A count or number that had to be replaced, in strict mode.
    #[error("Invalid number: {0}")]
    Number(String),

    /// A term that describes an invalid die.
    #[error("Invalid die - {0}")]
    DieSpec(#[from] Box<RollError>),
}

impl ParserError {
    /// The error without its position.
    pub fn err(&self) -> &Self {
        match self {
            ParserError::AtPosition(_, err) => err.as_ref(),
            other => other
        }
    }

    /// The position, if the error carries one.
    pub fn pos(&self) -> Option<&usize> {
        match self {
            ParserError::AtPosition(position, _) => Some(position),
            _ => None
        }
    }

    /// Attaches `position`, keeping any position already present.
    pub fn at_pos(self, position: usize) -> Self {
        match self {
            ParserError::AtPosition(_, _) => self,
            other => ParserError::AtPosition(position, Box::new(other))
        }
    }

    /// Returns the die construction error wrapped by this error, if any.
    pub fn die_spec(&self) -> Option<&RollError> {
        match self.err() {
            ParserError::DieSpec(err) => Some(err.as_ref()),
            _ => None
        }
    }
}

impl From<RollError> for ParserError {
    fn from(value: RollError) -> Self {
        ParserError::DieSpec(Box::new(value))
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;

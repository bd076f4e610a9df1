//! Dice formulas such as `2d6+3`, `1d20` or `4d8-1d4`: parsing, rolling, and
//! a breakdown of every die that was drawn.
//!
//! ```
//! use dice_formula::{parse_to_formula, RollMode};
//!
//! let formula = parse_to_formula("1d20 + 4").unwrap();
//! let roll = formula.roll_with_mode(RollMode::Advantage, &mut rand::rng());
//!
//! assert!((5..=24).contains(&roll.primary.total));
//! assert_eq!(roll.primary.max_total, 24);
//! println!("{} = {}", roll.primary.breakdown, roll.primary.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]


#[cfg(test)]
mod die_test_strategies;

mod error;
mod die;
mod roll;
mod mode;
mod sequencer;
mod parser;

pub use error::Error;
pub use die::{Die, Faces, FaceList, WeightedTable, PossibleValues};
pub use roll::{
    Sign, Term, SingleDieRoll, RollResult, TermRoll,
    evaluate, max_total, format_breakdown, EMPTY_BREAKDOWN, MAX_COUNT
};
pub use mode::{RollMode, ModeRoll, evaluate_with_mode};
pub use sequencer::{RollSequencer, RollTicket, progress};
pub use parser::{
    ParserError, Parser, ParseOptions, Diagnostic, Formula, DEFAULT_MAX_COUNT,
    parse_to_formula, parse_with, parse_and_roll, parse_and_roll_with, is_valid
};

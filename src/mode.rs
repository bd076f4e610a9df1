use std::{fmt::Display, str::FromStr};
use rand::Rng;
use crate::{Error, RollResult, Term, evaluate};


/// How many times a formula is evaluated and which result governs.
///
/// # Examples
/// ```
/// use dice_formula::RollMode;
///
/// assert_eq!("adv".parse::<RollMode>().unwrap(), RollMode::Advantage);
/// assert_eq!(RollMode::Disadvantage.to_string(), "disadvantage");
/// assert!("sideways".parse::<RollMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RollMode {
    /// A single evaluation.
    #[default]
    Normal,
    /// Two independent evaluations, the higher total governs.
    Advantage,
    /// Two independent evaluations, the lower total governs.
    Disadvantage
}

impl RollMode {
    /// Evaluates `terms` according to the mode.
    ///
    /// Both candidates of [`RollMode::Advantage`] and [`RollMode::Disadvantage`]
    /// draw their own dice, so the discarded result is still a full roll that
    /// can be shown next to the governing one.
    pub fn evaluate<R: Rng + ?Sized>(self, terms: &[Term], rng: &mut R) -> ModeRoll {
        match self {
            RollMode::Normal => ModeRoll { mode: self, primary: evaluate(terms, rng), secondary: None },
            RollMode::Advantage | RollMode::Disadvantage => {
                let first = evaluate(terms, rng);
                let second = evaluate(terms, rng);
                self.select(first, second)
            }
        }
    }

    /// Picks the governing result out of two evaluations. Ties keep `first`.
    fn select(self, first: RollResult, second: RollResult) -> ModeRoll {
        let second_wins = match self {
            RollMode::Advantage => second.total > first.total,
            RollMode::Disadvantage => second.total < first.total,
            RollMode::Normal => false
        };

        let (primary, secondary) = if second_wins { (second, first) } else { (first, second) };

        tracing::debug!(
            mode = %self,
            primary = primary.total,
            secondary = secondary.total,
            "selected governing roll"
        );

        ModeRoll { mode: self, primary, secondary: Some(secondary) }
    }
}

impl Display for RollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            RollMode::Normal => "normal",
            RollMode::Advantage => "advantage",
            RollMode::Disadvantage => "disadvantage"
        };

        write!(f, "{mode}")
    }
}

impl FromStr for RollMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "n" => Ok(RollMode::Normal),
            "advantage" | "adv" | "a" => Ok(RollMode::Advantage),
            "disadvantage" | "dis" | "d" => Ok(RollMode::Disadvantage),
            other => Err(Error::InvalidMode(other.into()))
        }
    }
}


/// Outcome of [`RollMode::evaluate()`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeRoll {
    /// The mode that was rolled.
    pub mode: RollMode,
    /// The governing result.
    pub primary: RollResult,
    /// The other candidate, `None` in [`RollMode::Normal`].
    pub secondary: Option<RollResult>
}


/// Evaluates `terms` under `mode` with the thread-local generator.
///
/// # Examples
/// ```
/// use dice_formula::{evaluate_with_mode, parse_to_formula, RollMode};
///
/// let formula = parse_to_formula("1d20 + 5").unwrap();
/// let roll = evaluate_with_mode(formula.terms(), RollMode::Advantage);
///
/// let secondary = roll.secondary.unwrap();
/// assert!(roll.primary.total >= secondary.total);
/// ```
pub fn evaluate_with_mode(terms: &[Term], mode: RollMode) -> ModeRoll {
    mode.evaluate(terms, &mut rand::rng())
}

use std::fmt::Display;
use std::str::FromStr;
use rand::Rng;
use crate::{Die, RollMode, ModeRoll, RollResult, Term};
use crate::roll;
use crate::parser::{Diagnostic, ParserError, parse_to_formula};


/// An ordered sequence of signed [`Term`]s, as produced by the parser.
///
/// A formula is immutable and can be rolled any number of times; an
/// animation driver can keep one around to draw cosmetic frames with
/// [`Formula::draw_frame()`] while the authoritative result is shown later.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formula {
    pub(crate) terms: Vec<Term>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) recognized: usize,
    pub(crate) skipped: usize
}

impl Formula {
    /// Builds a formula directly from terms, bypassing the parser.
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms, ..Self::default() }
    }

    /// The terms in input order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// What the lenient parser skipped or replaced.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether the formula has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether the formula came from blank input: no terms and nothing
    /// skipped. Only a blank formula rolls [`RollResult::empty()`].
    ///
    /// # Examples
    /// ```
    /// use dice_formula::parse_to_formula;
    ///
    /// assert!(parse_to_formula("  ").unwrap().is_blank());
    /// assert!(!parse_to_formula("hello").unwrap().is_blank());
    /// ```
    pub fn is_blank(&self) -> bool {
        self.terms.is_empty() && self.skipped == 0
    }

    /// Share of the parsed non-whitespace input that belongs to terms,
    /// between 0 and 1. Blank input and formulas built with
    /// [`Formula::new()`] report 0.
    pub fn coverage(&self) -> f64 {
        let total = self.recognized + self.skipped;
        if total == 0 {
            return 0.0;
        }

        self.recognized as f64 / total as f64
    }

    /// Rolls the formula with the thread-local generator.
    pub fn roll(&self) -> RollResult {
        self.roll_with(&mut rand::rng())
    }

    /// Rolls the formula once using `rng`.
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        if self.is_blank() {
            return RollResult::empty();
        }

        roll::evaluate(&self.terms, rng)
    }

    /// Rolls once or twice depending on `mode`, see [`RollMode::evaluate()`].
    pub fn roll_with_mode<R: Rng + ?Sized>(&self, mode: RollMode, rng: &mut R) -> ModeRoll {
        if self.is_blank() {
            let secondary = (mode != RollMode::Normal).then(RollResult::empty);
            return ModeRoll { mode, primary: RollResult::empty(), secondary };
        }

        mode.evaluate(&self.terms, rng)
    }

    /// The `max_total` every roll of this formula reports.
    pub fn max_total(&self) -> i32 {
        if self.is_blank() {
            return 0;
        }

        roll::max_total(&self.terms)
    }

    /// Smallest and largest achievable totals, without the floor applied to
    /// [`RollResult::max_total`].
    ///
    /// # Examples
    /// ```
    /// use dice_formula::parse_to_formula;
    ///
    /// let formula = parse_to_formula("1d20 - 1d4").unwrap();
    /// assert_eq!(formula.possible_values(), (-3, 19));
    /// ```
    pub fn possible_values(&self) -> (i32, i32) {
        self.terms.iter().fold((0i32, 0i32), |(min, max), term| {
            (min.saturating_add(term.min_contribution()), max.saturating_add(term.max_contribution()))
        })
    }

    /// Expected total over many rolls, honoring weights and custom faces.
    ///
    /// # Examples
    /// ```
    /// use dice_formula::parse_to_formula;
    ///
    /// let formula = parse_to_formula("2d6 + 1").unwrap();
    /// assert_eq!(formula.expected_value(), 8.0);
    /// ```
    pub fn expected_value(&self) -> f64 {
        self.terms.iter()
            .map(|term| {
                let mean = match term.die() {
                    Die::Standard(faces) => (1.0 + f64::from(faces.get())) / 2.0,
                    Die::CustomValues(list) => {
                        let values = list.values();
                        values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64
                    },
                    Die::Weighted(table) => {
                        let weighted: f64 = table.entries().iter()
                            .map(|(value, weight)| f64::from(*value) * f64::from(*weight))
                            .sum();
                        weighted / f64::from(table.total_weight())
                    },
                    Die::Constant(value) => f64::from(*value)
                };

                f64::from(term.sign().coefficient()) * f64::from(term.count()) * mean
            })
            .sum()
    }

    /// Draws a throwaway total for an animation frame.
    ///
    /// Nothing is recorded; the value only has to look plausible while the
    /// real [`RollResult`] is held back.
    pub fn draw_frame<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let mut total = 0i32;
        for term in &self.terms {
            for value in term.draw(rng) {
                total = total.saturating_add(term.sign().apply(value));
            }
        }

        total
    }
}

impl Display for Formula {
    /// Canonical text of the formula, which parses back to the same terms.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            write!(f, "{}{term}", roll::operator(i, term.sign()))?;
        }

        Ok(())
    }
}

impl FromStr for Formula {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_to_formula(s)
    }
}

impl From<Vec<Term>> for Formula {
    fn from(value: Vec<Term>) -> Self {
        Self::new(value)
    }
}


#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};
    use super::*;
    use crate::Sign;
    use crate::die_test_strategies::terms_strategy;


    proptest! {
        #[test]
        fn test_roll_within_possible_values(terms in terms_strategy(), seed: u64) {
            let formula = Formula::new(terms);
            let (min, max) = formula.possible_values();
            let mut rng = StdRng::seed_from_u64(seed);

            let result = formula.roll_with(&mut rng);
            prop_assert!(result.total >= min && result.total <= max);
            prop_assert_eq!(result.max_total, formula.max_total());

            let frame = formula.draw_frame(&mut rng);
            prop_assert!(frame >= min && frame <= max);
        }

        #[test]
        fn test_expected_value_within_bounds(terms in terms_strategy()) {
            let formula = Formula::new(terms);
            let (min, max) = formula.possible_values();
            let expected = formula.expected_value();

            prop_assert!(expected >= f64::from(min) - 1e-9);
            prop_assert!(expected <= f64::from(max) + 1e-9);
        }
    }

    #[test]
    fn test_display() {
        let formula = Formula::new(vec![
            Term::dice(Sign::Minus, 1, 4).unwrap(),
            Term::dice(Sign::Plus, 2, 6).unwrap(),
            Term::flat(Sign::Minus, 3),
        ]);

        assert_eq!(formula.to_string(), "-1d4 + 2d6 - 3");
    }

    #[test]
    fn test_empty_formula_rolls_empty() {
        let formula = Formula::default();

        assert_eq!(formula.roll(), RollResult::empty());
        assert_eq!(formula.max_total(), 0);
        assert_eq!(formula.coverage(), 0.0);
        assert_eq!(formula.to_string(), "");
    }

    #[test]
    fn test_skipped_only_formula_is_not_blank() {
        let formula = Formula { skipped: 3, ..Formula::default() };
        let result = formula.roll();

        assert_eq!(formula.max_total(), 1);
        assert_eq!(result.max_total, 1);
        assert_eq!(result.breakdown, "");
        assert!(!result.is_empty());
    }

    #[test]
    fn test_blank_formula_modes() {
        let formula = Formula::default();
        let mut rng = StdRng::seed_from_u64(3);

        let roll = formula.roll_with_mode(RollMode::Advantage, &mut rng);
        assert_eq!(roll.primary, RollResult::empty());
        assert_eq!(roll.secondary, Some(RollResult::empty()));

        let roll = formula.roll_with_mode(RollMode::Normal, &mut rng);
        assert!(roll.secondary.is_none());
    }

    #[test]
    fn test_from_str() {
        let formula: Formula = "3d6 + 2".parse().unwrap();
        assert_eq!(formula.terms().len(), 2);
        assert_eq!(formula.max_total(), 20);
    }

    #[test]
    fn test_weighted_expected_value() {
        let formula = Formula::new(vec![Term::new(Sign::Plus, 1, Die::weighted([(0, 3), (4, 1)]).unwrap()).unwrap()]);
        assert_eq!(formula.expected_value(), 1.0);
    }
}

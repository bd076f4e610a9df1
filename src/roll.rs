use std::fmt::Display;
use rand::Rng;
use crate::{Die, Error};


/// Breakdown shown for a blank formula.
pub const EMPTY_BREAKDOWN: &str = "Empty";

/// Largest count a single term may carry.
pub const MAX_COUNT: u32 = 10_000;

/// Floor applied to [`RollResult::max_total`] for any non-blank formula.
const MIN_MAX_TOTAL: i32 = 1;


/// Sign carried by a [`Term`] and by every [`SingleDieRoll`] it produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sign {
    /// Added to the total.
    #[default]
    Plus,
    /// Subtracted from the total.
    Minus
}

impl Sign {
    /// `1` for [`Sign::Plus`], `-1` for [`Sign::Minus`].
    pub const fn coefficient(self) -> i32 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1
        }
    }

    /// `value` with the sign applied, saturating at the `i32` bounds.
    pub const fn apply(self, value: i32) -> i32 {
        match self {
            Sign::Plus => value,
            Sign::Minus => value.saturating_neg()
        }
    }
}

impl Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-")
        }
    }
}


/// One signed component of a formula: `count` draws from `die`.
///
/// A flat modifier such as `+5` is a term with a count of 1 and a
/// [`Die::Constant`].
///
/// # Examples
/// ```
/// use dice_formula::{Sign, Term};
///
/// let term = Term::dice(Sign::Minus, 2, 8).unwrap();
/// assert_eq!(term.to_string(), "2d8");
/// assert_eq!(term.max_contribution(), -2);
///
/// let flat = Term::flat(Sign::Plus, 3);
/// assert_eq!(flat.to_string(), "3");
/// assert_eq!(flat.max_contribution(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTerm"))]
pub struct Term {
    sign: Sign,
    count: u32,
    die: Die
}

impl Term {
    /// Creates a term from its parts.
    ///
    /// # Errors
    /// - Returns [`Error::ZeroValue`] if `count` is 0.
    /// - Returns [`Error::TooManyDice`] if `count` exceeds [`MAX_COUNT`].
    /// - Returns [`Error::InvalidDieSpec`] if `die` is a constant and `count` is not 1.
    pub fn new(sign: Sign, count: u32, die: Die) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::ZeroValue);
        }

        if count > MAX_COUNT {
            return Err(Error::TooManyDice(count));
        }

        if die.is_constant() && count != 1 {
            return Err(Error::InvalidDieSpec(format!("a flat modifier cannot be counted, got {count}x{die}")));
        }

        Ok(Self { sign, count, die })
    }

    /// Creates a `{count}d{faces}` term.
    ///
    /// # Errors
    /// See [`Term::new()`] and [`Die::standard()`].
    pub fn dice(sign: Sign, count: u32, faces: i32) -> Result<Self, Error> {
        Self::new(sign, count, Die::standard(faces)?)
    }

    /// Creates a flat modifier term.
    pub const fn flat(sign: Sign, value: i32) -> Self {
        Self { sign, count: 1, die: Die::constant(value) }
    }

    /// Whether the term is added or subtracted.
    pub const fn sign(&self) -> Sign {
        self.sign
    }

    /// Number of draws, 1 for a flat modifier.
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// The die drawn from.
    pub const fn die(&self) -> &Die {
        &self.die
    }

    /// Best-case contribution to a total: every die on its maximum when the
    /// term is added, every die on its minimum when it is subtracted. The
    /// minimum of a standard die is 1, custom and weighted dice use their
    /// smallest face.
    pub fn max_contribution(&self) -> i32 {
        match self.sign {
            Sign::Plus => self.scaled(self.die.max_value()),
            Sign::Minus => self.scaled(self.die.min_value()).saturating_neg()
        }
    }

    /// Worst-case contribution to a total.
    pub fn min_contribution(&self) -> i32 {
        match self.sign {
            Sign::Plus => self.scaled(self.die.min_value()),
            Sign::Minus => self.scaled(self.die.max_value()).saturating_neg()
        }
    }

    /// Draws `count` independent values from the term's die.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        (0..self.count)
            .map(|_| self.die.draw(rng))
            .collect()
    }

    fn scaled(&self, value: i32) -> i32 {
        let count = i32::try_from(self.count).unwrap_or(i32::MAX);
        value.saturating_mul(count)
    }
}

/// Untrusted term fields, validated through [`Term::new()`] on deserialization.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTerm {
    #[serde(default)]
    sign: Sign,
    count: u32,
    die: Die
}

#[cfg(feature = "serde")]
impl TryFrom<RawTerm> for Term {
    type Error = Error;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        Term::new(raw.sign, raw.count, raw.die)
    }
}

impl Display for Term {
    /// Canonical label of the term, without its sign.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.die {
            Die::Constant(value) => write!(f, "{value}"),
            _ => write!(f, "{}{}", self.count, self.die)
        }
    }
}


/// A single value drawn for one unit of a [`Term`]'s count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleDieRoll {
    /// The die the value was drawn from.
    pub die: Die,
    /// The drawn value, sign not applied.
    pub value: i32,
    /// Sign of the parent term.
    pub coefficient: Sign
}

impl SingleDieRoll {
    /// The value with the parent term's sign applied.
    pub const fn signed_value(&self) -> i32 {
        self.coefficient.apply(self.value)
    }
}


/// Outcome of evaluating a formula once. Never mutated after creation.
///
/// `max_total` is the best case the formula could have produced, floored at 1
/// so that callers can normalize against it. A blank formula is the one
/// exception and reports 0, see [`RollResult::empty()`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollResult {
    /// Signed sum of all drawn values.
    pub total: i32,
    /// Every drawn value, in formula order.
    pub rolls: Vec<SingleDieRoll>,
    /// Best achievable total.
    pub max_total: i32,
    /// Formula text with the drawn values interpolated.
    pub breakdown: String
}

impl RollResult {
    /// The terminal result of blank input, which has no formula at all.
    pub fn empty() -> Self {
        Self {
            total: 0,
            rolls: Vec::new(),
            max_total: 0,
            breakdown: EMPTY_BREAKDOWN.into()
        }
    }

    /// Whether this is the result of blank input.
    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty() && self.max_total == 0
    }
}


/// Values drawn for one term, kept together for breakdown formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct TermRoll<'a> {
    /// The term that was drawn.
    pub term: &'a Term,
    /// One value per unit of the term's count.
    pub values: Vec<i32>
}

impl TermRoll<'_> {
    /// Signed sum of the drawn values.
    pub fn subtotal(&self) -> i32 {
        let sum = self.values.iter().fold(0i32, |acc, value| acc.saturating_add(*value));
        self.term.sign.apply(sum)
    }
}


/// Evaluates `terms` in order, drawing from `rng`.
///
/// An empty slice follows the same rules as any other: a total of 0, no
/// rolls, an empty breakdown and a `max_total` of 1. Blank input is told apart
/// by [`Formula`](crate::Formula), which rolls [`RollResult::empty()`] instead.
///
/// # Examples
/// ```
/// use dice_formula::{evaluate, Sign, Term};
///
/// let terms = [Term::dice(Sign::Plus, 1, 1).unwrap(), Term::flat(Sign::Minus, 4)];
/// let result = evaluate(&terms, &mut rand::rng());
///
/// assert_eq!(result.total, -3);
/// assert_eq!(result.max_total, 1);
/// assert_eq!(result.breakdown, "1d1(1) - 4");
/// ```
pub fn evaluate<R: Rng + ?Sized>(terms: &[Term], rng: &mut R) -> RollResult {
    let rolled: Vec<TermRoll> = terms.iter()
        .map(|term| TermRoll { term, values: term.draw(rng) })
        .collect();

    let total = rolled.iter()
        .fold(0i32, |acc, roll| acc.saturating_add(roll.subtotal()));

    let rolls = rolled.iter()
        .flat_map(|roll| roll.values.iter().map(|&value| SingleDieRoll {
            die: roll.term.die.clone(),
            value,
            coefficient: roll.term.sign
        }))
        .collect();

    RollResult {
        total,
        rolls,
        max_total: max_total(terms),
        breakdown: format_breakdown(&rolled)
    }
}

/// Best-case total of `terms`, floored at 1.
pub fn max_total(terms: &[Term]) -> i32 {
    terms.iter()
        .fold(0i32, |acc, term| acc.saturating_add(term.max_contribution()))
        .max(MIN_MAX_TOTAL)
}

/// Operator written before the term at `index`: nothing for a leading `+`,
/// a bare `-` for a leading `-`, spaced operators otherwise.
pub(crate) const fn operator(index: usize, sign: Sign) -> &'static str {
    match (index, sign) {
        (0, Sign::Plus) => "",
        (0, Sign::Minus) => "-",
        (_, Sign::Plus) => " + ",
        (_, Sign::Minus) => " - "
    }
}

/// Rebuilds the formula text with the drawn values interpolated,
/// e.g. `2d6(3,5) + 3`.
pub fn format_breakdown(rolled: &[TermRoll<'_>]) -> String {
    let mut breakdown = String::new();

    for (i, roll) in rolled.iter().enumerate() {
        breakdown.push_str(operator(i, roll.term.sign));
        breakdown.push_str(&roll.term.to_string());

        if !roll.term.die.is_constant() {
            let values: Vec<String> = roll.values.iter().map(i32::to_string).collect();
            breakdown.push_str(&format!("({})", values.join(",")));
        }
    }

    breakdown
}

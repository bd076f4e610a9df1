use std::fmt::Display;
use rand::Rng;
use crate::{Die, RollResult, Sign, Term, MAX_COUNT};
use crate::parser::error::*;
use crate::parser::{Formula, Lexer, Spanned, Token};


/// Largest dice count accepted before falling back to a single die.
pub const DEFAULT_MAX_COUNT: u32 = MAX_COUNT;

/// Share of the non-whitespace input that must belong to terms for
/// [`is_valid`] to accept a formula.
const MIN_VALID_COVERAGE: f64 = 0.5;

/// Count used when a dice term has no count or an unusable one.
const FALLBACK_COUNT: u32 = 1;

/// Weight of a list entry written without `:weight`.
const DEFAULT_WEIGHT: u32 = 1;


/// Settings for [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fail on the first [`Diagnostic`] instead of recording it.
    pub strict: bool,
    /// Counts above this fall back to a single die. Values above
    /// [`MAX_COUNT`] act as [`MAX_COUNT`].
    pub max_count: u32
}

impl ParseOptions {
    /// Lenient options with the default count limit.
    pub const fn lenient() -> Self {
        Self { strict: false, max_count: DEFAULT_MAX_COUNT }
    }

    /// Strict options with the default count limit.
    pub const fn strict() -> Self {
        Self { strict: true, max_count: DEFAULT_MAX_COUNT }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::lenient()
    }
}


/// Something the lenient parser tolerated instead of failing.
///
/// `position` is the char offset of the offending text in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diagnostic {
    /// Text that matched no term and was skipped.
    Skipped {
        /// Char offset.
        position: usize,
        /// Skipped text.
        text: String
    },
    /// A dice count that was zero, too large or unreadable, replaced by 1.
    CountFallback {
        /// Char offset.
        position: usize,
        /// The count as written.
        text: String
    },
    /// A number too large for an `i32`, replaced by `i32::MAX`.
    Saturated {
        /// Char offset.
        position: usize,
        /// The number as written.
        text: String
    }
}

impl Diagnostic {
    /// Char offset of the offending text.
    pub fn position(&self) -> usize {
        match self {
            Diagnostic::Skipped { position, .. }
            | Diagnostic::CountFallback { position, .. }
            | Diagnostic::Saturated { position, .. } => *position
        }
    }

    /// The offending text, whitespace removed.
    pub fn text(&self) -> &str {
        match self {
            Diagnostic::Skipped { text, .. }
            | Diagnostic::CountFallback { text, .. }
            | Diagnostic::Saturated { text, .. } => text
        }
    }

    fn into_error(self) -> ParserError {
        let position = self.position();
        let err = match self {
            Diagnostic::Skipped { text, .. } => ParserError::Unrecognized(text),
            Diagnostic::CountFallback { text, .. } | Diagnostic::Saturated { text, .. } => ParserError::Number(text)
        };

        err.at_pos(position)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Skipped { position, text } =>
                write!(f, "skipped '{text}' at {position}"),
            Diagnostic::CountFallback { position, text } =>
                write!(f, "count '{text}' at {position} replaced by {FALLBACK_COUNT}"),
            Diagnostic::Saturated { position, text } =>
                write!(f, "number '{text}' at {position} saturated to {}", i32::MAX)
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
struct ListEntry {
    sign: Sign,
    value: Spanned,
    weight: Option<Spanned>
}

#[derive(Debug, Clone, PartialEq)]
enum FaceSpec {
    Faces(Spanned),
    Fudge,
    List(Vec<ListEntry>)
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Dice { count: Option<Spanned>, faces: FaceSpec },
    Flat(Spanned)
}

/// A term recognized at some token position, not yet turned into a [`Term`].
#[derive(Debug, Clone, PartialEq)]
struct TermMatch {
    sign: Sign,
    shape: Shape,
    start: usize,
    next: usize
}


/// Left-to-right term scanner for dice formulas.
///
/// At every position the longest term is taken: `[sign] [count] d faces`
/// before `[sign] number`. Tokens that start no term are skipped and reported
/// as [`Diagnostic::Skipped`], or rejected when [`ParseOptions::strict`] is set.
///
/// # Examples
/// ```
/// use dice_formula::{Parser, ParseOptions, ParserError};
///
/// let formula = Parser::new("2d6 + 3", ParseOptions::default()).parse().unwrap();
/// assert_eq!(formula.to_string(), "2d6 + 3");
///
/// let lenient = Parser::new("2d6 ? 3", ParseOptions::default()).parse().unwrap();
/// assert_eq!(lenient.diagnostics().len(), 1);
///
/// let err = Parser::new("2d6 ? 3", ParseOptions::strict()).parse().unwrap_err();
/// assert!(matches!(err.err(), ParserError::Unrecognized(_)));
/// assert_eq!(err.pos(), Some(&4));
/// ```
#[derive(Debug)]
pub struct Parser {
    chars: Vec<char>,
    tokens: Vec<Spanned>,
    position: usize,
    options: ParseOptions,
    diagnostics: Vec<Diagnostic>,
    recognized: usize,
    skipped: usize
}

impl Parser {
    /// Tokenizes `input` and prepares a parser for it.
    pub fn new(input: &str, options: ParseOptions) -> Self {
        Self {
            chars: input.chars().collect(),
            tokens: Lexer::new(input).tokenize(),
            position: 0,
            options,
            diagnostics: Vec::new(),
            recognized: 0,
            skipped: 0
        }
    }

    /// Scans the whole input into a [`Formula`].
    ///
    /// Blank input gives an empty formula, which is not an error.
    ///
    /// # Errors
    /// - A [`ParserError::DieSpec`] if a recognized term describes an invalid
    ///   die, such as `1d0` or `d[]`. This aborts the parse in every mode.
    /// - In strict mode, [`ParserError::Unrecognized`] or [`ParserError::Number`]
    ///   for the first text the lenient parser would have tolerated.
    ///
    /// Errors are wrapped with [`ParserError::AtPosition`].
    pub fn parse(mut self) -> Result<Formula> {
        let mut terms = Vec::new();
        let mut pending: Option<(usize, usize)> = None;

        while self.position < self.tokens.len() {
            match self.match_term(self.position) {
                Some(found) => {
                    if let Some(span) = pending.take() {
                        self.skip(span)?;
                    }

                    self.recognized += self.width(self.position, found.next);
                    terms.push(self.build_term(&found)?);
                    self.position = found.next;
                },
                None => {
                    pending = Some(match pending {
                        Some((first, _)) => (first, self.position),
                        None => (self.position, self.position)
                    });
                    self.skipped += self.tokens[self.position].width;
                    self.position += 1;
                }
            }
        }

        if let Some(span) = pending.take() {
            self.skip(span)?;
        }

        Ok(Formula {
            terms,
            diagnostics: self.diagnostics,
            recognized: self.recognized,
            skipped: self.skipped
        })
    }

    fn token(&self, at: usize) -> Token {
        self.tokens.get(at).map_or(Token::Eof, |spanned| spanned.token)
    }

    fn width(&self, from: usize, to: usize) -> usize {
        self.tokens[from..to].iter().map(|spanned| spanned.width).sum()
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter()
            .filter(|ch| !ch.is_whitespace())
            .collect()
    }

    fn match_term(&self, at: usize) -> Option<TermMatch> {
        let start = self.tokens.get(at)?.start;

        let (sign, body) = match self.token(at) {
            Token::Plus => (Sign::Plus, at + 1),
            Token::Minus => (Sign::Minus, at + 1),
            _ => (Sign::Plus, at)
        };

        self.match_dice(body)
            .or_else(|| self.match_flat(body))
            .map(|(shape, next)| TermMatch { sign, shape, start, next })
    }

    fn match_dice(&self, at: usize) -> Option<(Shape, usize)> {
        let (count, at) = match self.token(at) {
            Token::Number(_) => (Some(self.tokens[at]), at + 1),
            _ => (None, at)
        };

        if self.token(at) != Token::Dice {
            return None;
        }

        let at = at + 1;
        let (faces, next) = match self.token(at) {
            Token::Number(_) => (FaceSpec::Faces(self.tokens[at]), at + 1),
            Token::Fudge => (FaceSpec::Fudge, at + 1),
            Token::LeftBracket => self.match_list(at + 1)?,
            _ => return None
        };

        Some((Shape::Dice { count, faces }, next))
    }

    fn match_list(&self, mut at: usize) -> Option<(FaceSpec, usize)> {
        let mut entries = Vec::new();

        if self.token(at) == Token::RightBracket {
            return Some((FaceSpec::List(entries), at + 1));
        }

        loop {
            let sign = match self.token(at) {
                Token::Plus => { at += 1; Sign::Plus },
                Token::Minus => { at += 1; Sign::Minus },
                _ => Sign::Plus
            };

            if !matches!(self.token(at), Token::Number(_)) {
                return None;
            }
            let value = self.tokens[at];
            at += 1;

            let weight = if self.token(at) == Token::Colon {
                if !matches!(self.token(at + 1), Token::Number(_)) {
                    return None;
                }
                at += 2;
                Some(self.tokens[at - 1])
            } else {
                None
            };

            entries.push(ListEntry { sign, value, weight });

            match self.token(at) {
                Token::Comma => at += 1,
                Token::RightBracket => return Some((FaceSpec::List(entries), at + 1)),
                _ => return None
            }
        }
    }

    fn match_flat(&self, at: usize) -> Option<(Shape, usize)> {
        match self.token(at) {
            Token::Number(_) => Some((Shape::Flat(self.tokens[at]), at + 1)),
            _ => None
        }
    }

    fn build_term(&mut self, found: &TermMatch) -> Result<Term> {
        let (count, faces) = match &found.shape {
            Shape::Flat(number) => {
                let value = self.number(number)?;
                return Ok(Term::flat(found.sign, value));
            },
            Shape::Dice { count, faces } => (*count, faces)
        };

        let count = self.count(count)?;

        let die = match faces {
            FaceSpec::Faces(faces) => Die::standard(self.number(faces)?),
            FaceSpec::Fudge => Ok(Die::fudge()),
            FaceSpec::List(entries) => {
                let weighted = entries.iter().any(|entry| entry.weight.is_some());
                let mut values = Vec::with_capacity(entries.len());

                for entry in entries {
                    let value = entry.sign.apply(self.number(&entry.value)?);
                    let weight = match &entry.weight {
                        Some(weight) => self.number(weight)?.unsigned_abs(),
                        None => DEFAULT_WEIGHT
                    };
                    values.push((value, weight));
                }

                if weighted {
                    Die::weighted(values)
                } else {
                    Die::custom(values.into_iter().map(|(value, _)| value))
                }
            }
        };

        die.and_then(|die| Term::new(found.sign, count, die))
            .map_err(|err| ParserError::from(err).at_pos(found.start))
    }

    fn number(&mut self, spanned: &Spanned) -> Result<i32> {
        match spanned.token {
            Token::Number(Some(value)) => Ok(value),
            _ => {
                let text = self.text(spanned.start, spanned.end);
                self.record(Diagnostic::Saturated { position: spanned.start, text })?;
                Ok(i32::MAX)
            }
        }
    }

    fn count(&mut self, count: Option<Spanned>) -> Result<u32> {
        let Some(spanned) = count else {
            return Ok(FALLBACK_COUNT);
        };

        let usable = match spanned.token {
            Token::Number(Some(n)) => u32::try_from(n).ok()
                .filter(|n| (1..=self.options.max_count.min(MAX_COUNT)).contains(n)),
            _ => None
        };

        match usable {
            Some(n) => Ok(n),
            None => {
                let text = self.text(spanned.start, spanned.end);
                self.record(Diagnostic::CountFallback { position: spanned.start, text })?;
                Ok(FALLBACK_COUNT)
            }
        }
    }

    fn skip(&mut self, (first, last): (usize, usize)) -> Result<()> {
        let start = self.tokens[first].start;
        let text = self.text(start, self.tokens[last].end);
        self.record(Diagnostic::Skipped { position: start, text })
    }

    fn record(&mut self, diagnostic: Diagnostic) -> Result<()> {
        if self.options.strict {
            return Err(diagnostic.into_error());
        }

        tracing::warn!(position = diagnostic.position(), "{diagnostic}");
        self.diagnostics.push(diagnostic);
        Ok(())
    }
}


/// Parses `input` leniently into a [`Formula`].
///
/// # Errors
/// Returns [`ParserError::DieSpec`] (wrapped with its position) when a term
/// describes an invalid die. See [`Parser::parse()`].
///
/// # Examples
/// ```
/// use dice_formula::parse_to_formula;
///
/// let formula = parse_to_formula("4d8 - 1d4").unwrap();
/// assert_eq!(formula.terms().len(), 2);
/// assert_eq!(formula.max_total(), 31);
///
/// let err = parse_to_formula("1d0").unwrap_err();
/// assert!(err.die_spec().is_some());
/// ```
pub fn parse_to_formula(input: &str) -> Result<Formula> {
    parse_with(input, ParseOptions::default())
}

/// Parses `input` into a [`Formula`] with explicit [`ParseOptions`].
///
/// # Errors
/// See [`Parser::parse()`].
pub fn parse_with(input: &str, options: ParseOptions) -> Result<Formula> {
    let formula = Parser::new(input, options).parse()?;
    tracing::debug!(input, formula = %formula, diagnostics = formula.diagnostics().len(), "parsed formula");
    Ok(formula)
}

/// Parses `input` and rolls it once with the thread-local generator.
///
/// # Errors
/// See [`parse_to_formula`].
///
/// # Examples
/// ```
/// use dice_formula::parse_and_roll;
///
/// let result = parse_and_roll("2d6+3").unwrap();
/// assert!((5..=15).contains(&result.total));
/// assert_eq!(result.max_total, 15);
///
/// let empty = parse_and_roll("   ").unwrap();
/// assert_eq!(empty.breakdown, "Empty");
/// assert_eq!(empty.max_total, 0);
/// ```
pub fn parse_and_roll(input: &str) -> Result<RollResult> {
    parse_and_roll_with(input, &mut rand::rng())
}

/// Parses `input` and rolls it once using `rng`.
///
/// # Errors
/// See [`parse_to_formula`].
pub fn parse_and_roll_with<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Result<RollResult> {
    Ok(parse_to_formula(input)?.roll_with(rng))
}

/// Whether `input` is worth keeping as a reusable formula.
///
/// The input must parse without an invalid die, contain at least one term,
/// and at least half of its non-whitespace text must belong to terms.
///
/// # Examples
/// ```
/// use dice_formula::is_valid;
///
/// assert!(is_valid("2d6+3"));
/// assert!(is_valid("d20"));
/// assert!(is_valid("-1d4"));
/// assert!(!is_valid("hello"));
/// assert!(!is_valid(""));
/// ```
pub fn is_valid(input: &str) -> bool {
    match parse_to_formula(input) {
        Ok(formula) => !formula.is_empty() && formula.coverage() >= MIN_VALID_COVERAGE,
        Err(_) => false
    }
}


#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};
    use super::*;
    use crate::parser::str_test_strategies::*;
    use crate::ParserError;


    fn terms(input: &str) -> Vec<Term> {
        parse_to_formula(input).unwrap().terms().to_vec()
    }

    proptest! {
        #[test]
        fn test_parse_is_idempotent(input in signed_formula_strategy()) {
            prop_assert_eq!(parse_to_formula(&input), parse_to_formula(&input));
        }

        #[test]
        fn test_generated_formulas_fully_recognized(input in signed_formula_strategy()) {
            let formula = parse_with(&input, ParseOptions::strict()).unwrap();

            prop_assert!(formula.diagnostics().is_empty());
            prop_assert!(!formula.is_empty());
            prop_assert_eq!(formula.coverage(), 1.0);
            prop_assert!(is_valid(&input));
        }

        #[test]
        fn test_canonical_form_reparses(input in signed_formula_strategy()) {
            let formula = parse_to_formula(&input).unwrap();
            let reparsed = parse_to_formula(&formula.to_string()).unwrap();

            prop_assert_eq!(formula.terms(), reparsed.terms());
        }

        #[test]
        fn test_garbage_is_invalid(garbage in garbage_strategy()) {
            let formula = parse_to_formula(&garbage).unwrap();

            prop_assert!(formula.is_empty());
            prop_assert!(!is_valid(&garbage));
            prop_assert!(parse_with(&garbage, ParseOptions::strict()).is_err());
        }

        #[test]
        fn test_garbage_between_terms_is_skipped(
            left in term_string_strategy(),
            garbage in garbage_strategy(),
            right in term_string_strategy()
        ) {
            let input = format!("{left}{garbage}+{right}");
            let formula = parse_to_formula(&input).unwrap();

            prop_assert_eq!(formula.terms().len(), 2);
            prop_assert_eq!(formula.diagnostics().len(), 1);
            prop_assert_eq!(formula.diagnostics()[0].text(), garbage.as_str());
            prop_assert_eq!(formula.diagnostics()[0].position(), left.chars().count());
        }

        #[test]
        fn test_case_insensitive(input in signed_formula_strategy()) {
            prop_assert_eq!(terms(&input), terms(&input.to_uppercase()));
        }

        #[test]
        fn test_dice_without_count(faces in 1i32..=1000) {
            prop_assert_eq!(terms(&format!("d{faces}")), vec![Term::dice(Sign::Plus, 1, faces).unwrap()]);
        }

        #[test]
        fn test_parse_and_roll_bounds(input in signed_formula_strategy(), seed: u64) {
            let formula = parse_to_formula(&input).unwrap();
            let (min, max) = formula.possible_values();

            let mut rng = StdRng::seed_from_u64(seed);
            let result = parse_and_roll_with(&input, &mut rng).unwrap();

            prop_assert!(result.total >= min);
            prop_assert!(result.total <= max);
            prop_assert_eq!(result.max_total, max.max(1));
        }
    }

    #[test]
    fn test_empty_formula() {
        for input in ["", "   ", "\t\n"] {
            let result = parse_and_roll(input).unwrap();

            assert_eq!(result.total, 0);
            assert_eq!(result.breakdown, "Empty");
            assert!(result.rolls.is_empty());
            assert_eq!(result.max_total, 0);
        }

        assert!(parse_with("  ", ParseOptions::strict()).unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_input_is_not_blank() {
        for input in ["hello", "-", "+", " ? "] {
            let formula = parse_to_formula(input).unwrap();
            assert!(formula.is_empty());
            assert!(!formula.is_blank());

            let result = parse_and_roll(input).unwrap();
            assert_eq!(result.total, 0);
            assert!(result.rolls.is_empty());
            assert_eq!(result.breakdown, "");
            assert_eq!(result.max_total, 1);
        }
    }

    #[test]
    fn test_raised_count_limit_is_capped() {
        let options = ParseOptions { max_count: u32::MAX, ..ParseOptions::lenient() };
        let formula = parse_with(&format!("{}d6", MAX_COUNT + 1), options).unwrap();

        assert_eq!(formula.terms()[0].count(), 1);
        assert!(matches!(formula.diagnostics(), [Diagnostic::CountFallback { .. }]));
    }

    #[test]
    fn test_single_die() {
        let result = parse_and_roll("1d6").unwrap();

        assert!((1..=6).contains(&result.total));
        assert_eq!(result.rolls.len(), 1);
        assert_eq!(result.max_total, 6);
    }

    #[test]
    fn test_dice_plus_flat_breakdown() {
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            let result = parse_and_roll_with("2d6+3", &mut rng).unwrap();
            assert!((5..=15).contains(&result.total));
            assert_eq!(result.max_total, 15);

            let values = result.breakdown
                .strip_prefix("2d6(")
                .and_then(|rest| rest.strip_suffix(") + 3"))
                .unwrap();
            let values: Vec<i32> = values.split(',').map(|v| v.parse().unwrap()).collect();

            assert_eq!(values.len(), 2);
            assert!(values.iter().all(|v| (1..=6).contains(v)));
            assert_eq!(values.iter().sum::<i32>() + 3, result.total);
        }
    }

    #[test]
    fn test_subtracted_die() {
        let formula = parse_to_formula("1d20-1d4").unwrap();
        assert_eq!(formula.max_total(), 19);
        assert_eq!(formula.possible_values(), (-3, 19));

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let result = formula.roll_with(&mut rng);
            assert!(result.total >= -3 && result.total <= 19);
        }
    }

    #[test]
    fn test_negative_flat() {
        let result = parse_and_roll("-5").unwrap();

        assert_eq!(result.total, -5);
        assert_eq!(result.max_total, 1);
        assert_eq!(result.breakdown, "-5");
    }

    #[test]
    fn test_signs_and_spacing() {
        assert_eq!(terms(" 4D8 - 1d4 + 2 "), vec![
            Term::dice(Sign::Plus, 4, 8).unwrap(),
            Term::dice(Sign::Minus, 1, 4).unwrap(),
            Term::flat(Sign::Plus, 2),
        ]);
    }

    #[test]
    fn test_custom_and_weighted_lists() {
        assert_eq!(terms("3d[1,1,2]"), vec![Term::new(Sign::Plus, 3, Die::custom([1, 1, 2]).unwrap()).unwrap()]);
        assert_eq!(terms("d[1:3,-6]"), vec![Term::new(Sign::Plus, 1, Die::weighted([(1, 3), (-6, 1)]).unwrap()).unwrap()]);
        assert_eq!(terms("4dF"), vec![Term::new(Sign::Plus, 4, Die::fudge()).unwrap()]);
    }

    #[test]
    fn test_invalid_die_aborts() {
        for input in ["1d0", "2d6+d[]", "d[1:0]"] {
            let err = parse_to_formula(input).unwrap_err();
            assert!(matches!(err.die_spec(), Some(crate::Error::InvalidDieSpec(_))), "{input}: {err}");
            assert!(!is_valid(input));
        }

        assert_eq!(parse_to_formula("2d6+d[]").unwrap_err().pos(), Some(&3));
    }

    #[test]
    fn test_count_fallback() {
        let formula = parse_to_formula("0d6+99999999999d6").unwrap();

        assert_eq!(formula.terms(), &[
            Term::dice(Sign::Plus, 1, 6).unwrap(),
            Term::dice(Sign::Plus, 1, 6).unwrap(),
        ]);
        assert!(formula.diagnostics().iter().all(|d| matches!(d, Diagnostic::CountFallback { .. })));
        assert_eq!(formula.diagnostics().len(), 2);

        let over_limit = parse_with("20d6", ParseOptions { strict: false, max_count: 10 }).unwrap();
        assert_eq!(over_limit.terms()[0].count(), 1);

        let err = parse_with("0d6", ParseOptions::strict()).unwrap_err();
        assert!(matches!(err.err(), ParserError::Number(_)));
    }

    #[test]
    fn test_saturated_numbers() {
        let formula = parse_to_formula("1d99999999999 + 99999999999").unwrap();

        assert_eq!(formula.terms(), &[
            Term::dice(Sign::Plus, 1, i32::MAX).unwrap(),
            Term::flat(Sign::Plus, i32::MAX),
        ]);
        assert_eq!(formula.diagnostics().len(), 2);
    }

    #[test]
    fn test_partial_dice_falls_back_to_number() {
        let formula = parse_to_formula("2d+3").unwrap();

        assert_eq!(formula.terms(), &[Term::flat(Sign::Plus, 2), Term::flat(Sign::Plus, 3)]);
        assert_eq!(formula.diagnostics(), &[Diagnostic::Skipped { position: 1, text: "d".into() }]);
    }

    #[test]
    fn test_is_valid_coverage() {
        assert!(is_valid("1d6 xx"));
        assert!(!is_valid("1d6 hello world"));
        assert!(!is_valid("hello"));
        assert!(!is_valid("   "));
    }
}

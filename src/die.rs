use std::{fmt::Display, iter, ops::RangeInclusive, slice};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use crate::Error;


/// Lowest face shown by a [`Die::Standard`].
const STANDARD_MIN: i32 = 1;

/// Faces of a Fudge/Fate die.
const FUDGE_FACES: [i32; 3] = [-1, 0, 1];


/// A die that can be drawn from.
///
/// The set of behaviors is closed: every consumer matches on the variant.
/// Each variant wraps a payload that can only be built through a validating
/// constructor, so a `Die` that exists can always be drawn from.
///
/// # Examples
/// ```
/// use dice_formula::Die;
///
/// let d6 = Die::standard(6).unwrap();
/// assert_eq!(d6.max_value(), 6);
/// assert_eq!(d6.to_string(), "d6");
///
/// let value = d6.roll();
/// assert!((1..=6).contains(&value));
///
/// assert!(Die::standard(0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Die {
    /// Uniform draw from `1..=faces`.
    Standard(Faces),
    /// Uniform draw from an explicit list of face values.
    CustomValues(FaceList),
    /// Draw proportional to each entry's weight.
    Weighted(WeightedTable),
    /// Always draws the same value. Flat modifiers are modelled with this.
    Constant(i32)
}

impl Die {
    /// Creates a [`Die::Standard`] with `faces` sides.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDieSpec`] if `faces < 1`.
    pub fn standard(faces: i32) -> Result<Self, Error> {
        Ok(Die::Standard(Faces::try_from(faces)?))
    }

    /// Creates a [`Die::CustomValues`] drawing uniformly from `values`.
    /// Repeated values are kept, which makes them proportionally more likely.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDieSpec`] if `values` is empty.
    pub fn custom<I: IntoIterator<Item = i32>>(values: I) -> Result<Self, Error> {
        Ok(Die::CustomValues(FaceList::try_from(values.into_iter().collect::<Vec<_>>())?))
    }

    /// Creates a [`Die::Weighted`] from `(value, weight)` pairs.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDieSpec`] if there are no entries, if any weight
    /// is zero, or if the weights overflow when summed.
    pub fn weighted<I: IntoIterator<Item = (i32, u32)>>(entries: I) -> Result<Self, Error> {
        Ok(Die::Weighted(WeightedTable::try_from(entries.into_iter().collect::<Vec<_>>())?))
    }

    /// Creates a [`Die::Constant`].
    pub const fn constant(value: i32) -> Self {
        Die::Constant(value)
    }

    /// The Fudge die: a custom die with faces `-1, 0, 1`.
    pub fn fudge() -> Self {
        Die::CustomValues(FaceList::from_checked(FUDGE_FACES.to_vec()))
    }

    /// Draws a single value using `rng`.
    ///
    /// Draws are independent, no state is kept between calls.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        match self {
            Die::Standard(faces) => rng.random_range(STANDARD_MIN..=faces.get()),
            Die::CustomValues(list) => list.values[rng.random_range(0..list.values.len())],
            Die::Weighted(table) => table.entries[table.index.sample(rng)].0,
            Die::Constant(value) => *value
        }
    }

    /// Draws a single value using the thread-local generator.
    pub fn roll(&self) -> i32 {
        self.draw(&mut rand::rng())
    }

    /// The largest value this die can draw.
    pub fn max_value(&self) -> i32 {
        match self {
            Die::Standard(faces) => faces.get(),
            Die::CustomValues(list) => list.max,
            Die::Weighted(table) => table.max,
            Die::Constant(value) => *value
        }
    }

    /// The smallest value this die can draw.
    pub fn min_value(&self) -> i32 {
        match self {
            Die::Standard(_) => STANDARD_MIN,
            Die::CustomValues(list) => list.min,
            Die::Weighted(table) => table.min,
            Die::Constant(value) => *value
        }
    }

    /// Enumerates every value the die can draw.
    ///
    /// Custom and weighted dice yield their raw entries in declaration order,
    /// duplicates included. The iterator is `Clone`, so it can be restarted.
    ///
    /// # Examples
    /// ```
    /// use dice_formula::Die;
    ///
    /// let d4 = Die::standard(4).unwrap();
    /// assert_eq!(d4.possible_values().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    ///
    /// let flat = Die::constant(5);
    /// assert_eq!(flat.possible_values().collect::<Vec<_>>(), vec![5]);
    /// ```
    pub fn possible_values(&self) -> PossibleValues<'_> {
        match self {
            Die::Standard(faces) => PossibleValues::Range(STANDARD_MIN..=faces.get()),
            Die::CustomValues(list) => PossibleValues::List(list.values.iter()),
            Die::Weighted(table) => PossibleValues::Weighted(table.entries.iter()),
            Die::Constant(value) => PossibleValues::Single(iter::once(*value))
        }
    }

    /// Whether this die models a flat modifier rather than an actual die.
    pub const fn is_constant(&self) -> bool {
        matches!(self, Die::Constant(_))
    }
}

impl Display for Die {
    /// Formats the die the way the formula parser reads it back.
    ///
    /// # Examples
    /// ```
    /// use dice_formula::Die;
    ///
    /// assert_eq!(Die::standard(20).unwrap().to_string(), "d20");
    /// assert_eq!(Die::fudge().to_string(), "d[-1,0,1]");
    /// assert_eq!(Die::weighted([(1, 3), (6, 1)]).unwrap().to_string(), "d[1:3,6:1]");
    /// assert_eq!(Die::constant(4).to_string(), "4");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Die::Standard(faces) => write!(f, "d{}", faces.get()),
            Die::CustomValues(list) => {
                let values: Vec<String> = list.values.iter().map(i32::to_string).collect();
                write!(f, "d[{}]", values.join(","))
            },
            Die::Weighted(table) => {
                let entries: Vec<String> = table.entries.iter()
                    .map(|(value, weight)| format!("{value}:{weight}"))
                    .collect();
                write!(f, "d[{}]", entries.join(","))
            },
            Die::Constant(value) => write!(f, "{value}")
        }
    }
}


/// Number of faces of a standard die, always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct Faces(i32);

impl Faces {
    /// The number of faces.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Faces {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value < STANDARD_MIN {
            return Err(Error::InvalidDieSpec(format!("a die needs at least one face, got {value}")));
        }

        Ok(Self(value))
    }
}

impl From<Faces> for i32 {
    fn from(value: Faces) -> Self {
        value.0
    }
}


/// Non-empty list of face values for [`Die::CustomValues`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<i32>", into = "Vec<i32>"))]
pub struct FaceList {
    values: Vec<i32>,
    min: i32,
    max: i32
}

impl FaceList {
    /// Face values in declaration order.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    fn from_checked(values: Vec<i32>) -> Self {
        let min = values.iter().copied().min().unwrap_or_default();
        let max = values.iter().copied().max().unwrap_or_default();
        Self { values, min, max }
    }
}

impl TryFrom<Vec<i32>> for FaceList {
    type Error = Error;

    fn try_from(values: Vec<i32>) -> Result<Self, Self::Error> {
        if values.is_empty() {
            return Err(Error::InvalidDieSpec("a custom die needs at least one value".into()));
        }

        Ok(Self::from_checked(values))
    }
}

impl From<FaceList> for Vec<i32> {
    fn from(value: FaceList) -> Self {
        value.values
    }
}


/// `(value, weight)` entries for [`Die::Weighted`], with the sampling index
/// built once at construction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<(i32, u32)>", into = "Vec<(i32, u32)>"))]
pub struct WeightedTable {
    entries: Vec<(i32, u32)>,
    index: WeightedIndex<u32>,
    min: i32,
    max: i32
}

impl WeightedTable {
    /// `(value, weight)` pairs in declaration order.
    pub fn entries(&self) -> &[(i32, u32)] {
        &self.entries
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }
}

impl PartialEq for WeightedTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl TryFrom<Vec<(i32, u32)>> for WeightedTable {
    type Error = Error;

    fn try_from(entries: Vec<(i32, u32)>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            return Err(Error::InvalidDieSpec("a weighted die needs at least one entry".into()));
        }

        if let Some((value, _)) = entries.iter().find(|(_, weight)| *weight == 0) {
            return Err(Error::InvalidDieSpec(format!("weight of face {value} must be positive")));
        }

        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight))
            .map_err(|err| Error::InvalidDieSpec(err.to_string()))?;

        let min = entries.iter().map(|(value, _)| *value).min().unwrap_or_default();
        let max = entries.iter().map(|(value, _)| *value).max().unwrap_or_default();

        Ok(Self { entries, index, min, max })
    }
}

impl From<WeightedTable> for Vec<(i32, u32)> {
    fn from(value: WeightedTable) -> Self {
        value.entries
    }
}


/// Iterator over the values a [`Die`] can draw, see [`Die::possible_values()`].
#[derive(Debug, Clone)]
pub enum PossibleValues<'a> {
    /// Faces of a standard die.
    Range(RangeInclusive<i32>),
    /// Values of a custom die.
    List(slice::Iter<'a, i32>),
    /// Values of a weighted die, weights ignored.
    Weighted(slice::Iter<'a, (i32, u32)>),
    /// The value of a constant.
    Single(iter::Once<i32>)
}

impl Iterator for PossibleValues<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PossibleValues::Range(range) => range.next(),
            PossibleValues::List(values) => values.next().copied(),
            PossibleValues::Weighted(entries) => entries.next().map(|(value, _)| *value),
            PossibleValues::Single(value) => value.next()
        }
    }
}

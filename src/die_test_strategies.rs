use proptest::prelude::*;
use crate::die::Die;
use crate::roll::{Sign, Term};


pub(crate) fn die_strategy() -> impl Strategy<Value = Die> {
    prop_oneof![
        (1..=100i32).prop_map(|faces| Die::standard(faces).unwrap()),
        prop::collection::vec(-10..=10i32, 1..8).prop_map(|values| Die::custom(values).unwrap()),
        prop::collection::vec((-10..=10i32, 1..=5u32), 1..6).prop_map(|entries| Die::weighted(entries).unwrap()),
        (-50..=50i32).prop_map(Die::constant),
    ]
}

pub(crate) fn sign_strategy() -> impl Strategy<Value = Sign> {
    prop_oneof![Just(Sign::Plus), Just(Sign::Minus)]
}

pub(crate) fn term_strategy() -> impl Strategy<Value = Term> {
    (sign_strategy(), 1..=10u32, die_strategy())
        .prop_map(|(sign, count, die)| {
            let count = if die.is_constant() { 1 } else { count };
            Term::new(sign, count, die).unwrap()
        })
}

pub(crate) fn terms_strategy() -> impl Strategy<Value = Vec<Term>> {
    prop::collection::vec(term_strategy(), 1..6)
}

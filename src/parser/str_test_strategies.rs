use proptest::prelude::*;


pub(crate) fn simple_number_strategy() -> impl Strategy<Value = String> {
    (1i32..=1000).prop_map(|n| n.to_string())
}

pub(crate) fn simple_dice_strategy() -> impl Strategy<Value = String> {
    (prop::option::of(1u32..=20), 1i32..=100)
        .prop_map(|(count, faces)| match count {
            Some(count) => format!("{count}d{faces}"),
            None => format!("d{faces}")
        })
}

pub(crate) fn custom_dice_strategy() -> impl Strategy<Value = String> {
    (
        1u32..=5,
        prop::collection::vec((-10i32..=10, prop::option::of(1u32..=5)), 1..5),
    ).prop_map(|(count, entries)| {
        let weighted = entries.iter().any(|(_, weight)| weight.is_some());
        let entries: Vec<String> = entries.into_iter()
            .map(|(value, weight)| match weight {
                Some(weight) if weighted => format!("{value}:{weight}"),
                _ => value.to_string()
            })
            .collect();

        format!("{count}d[{}]", entries.join(","))
    })
}

pub(crate) fn term_string_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        simple_number_strategy(),
        simple_dice_strategy(),
        custom_dice_strategy(),
        (1u32..=6).prop_map(|count| format!("{count}df")),
    ]
}

/// Formulas without whitespace whose every char belongs to a term.
pub(crate) fn signed_formula_strategy() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop_oneof![Just("+"), Just("-")]),
        term_string_strategy(),
        prop::collection::vec((prop_oneof![Just("+"), Just("-")], term_string_strategy()), 0..5),
    ).prop_map(|(first_sign, first, rest)| {
        let mut formula = format!("{}{first}", first_sign.unwrap_or(""));
        for (sign, term) in rest {
            formula.push_str(sign);
            formula.push_str(&term);
        }
        formula
    })
}

pub(crate) fn garbage_strategy() -> impl Strategy<Value = String> {
    "[a-ce-zA-CE-Z!?#%&*/()=_]{1,8}"
}

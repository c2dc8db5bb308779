//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use crate::schemas::{Address, Person};
use lexdb_codec::{Scalar, ScalarKind};
use proptest::prelude::*;

/// Signed integers biased towards encoding width boundaries.
pub fn i64_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(0i64),
        Just(109i64),
        Just(110i64),
        Just(-1i64),
        Just(-255i64),
        Just(-256i64),
        Just(i64::MIN),
        Just(i64::MAX),
        -300i64..300,
        any::<i64>(),
    ]
}

/// Short strings that often contain the key separator.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-c/é]{0,6}").expect("Invalid regex")
}

/// Strategy for generating valid entity or index names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Any scalar kind.
pub fn scalar_kind_strategy() -> impl Strategy<Value = ScalarKind> {
    prop::sample::select(vec![
        ScalarKind::Int,
        ScalarKind::Uint,
        ScalarKind::Text,
        ScalarKind::Bool,
    ])
}

/// Scalars of one kind.
pub fn scalar_strategy(kind: ScalarKind) -> BoxedStrategy<Scalar> {
    match kind {
        ScalarKind::Int => i64_strategy().prop_map(Scalar::Int).boxed(),
        ScalarKind::Uint => any::<u64>().prop_map(Scalar::Uint).boxed(),
        ScalarKind::Text => text_strategy().prop_map(Scalar::Text).boxed(),
        ScalarKind::Bool => any::<bool>().prop_map(Scalar::Bool).boxed(),
    }
}

/// Strategy for sample addresses drawn from a small set of cities.
pub fn address_strategy() -> impl Strategy<Value = Address> {
    (
        "[0-9]{1,3} [A-Z][a-z]{2,6} St",
        prop::sample::select(vec!["Oslo", "Lima", "Pune"]),
    )
        .prop_map(|(street, city)| Address::new(street, city))
}

/// Strategy for sample people. Ages and emails come from small ranges so
/// that generated people share index values.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        "[A-Z][a-z]{1,8}",
        0i64..5,
        prop::collection::vec(prop::sample::select(vec!["a@x", "b@x", "a@x/b"]), 0..3),
        address_strategy(),
    )
        .prop_map(|(name, age, emails, home)| Person {
            name,
            age,
            emails: emails.into_iter().map(str::to_string).collect(),
            home,
        })
}

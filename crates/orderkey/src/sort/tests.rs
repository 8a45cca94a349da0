use super::*;
use crate::builder::AnyRow;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Clone, Debug, Eq, PartialEq)]
struct Person {
    age: u32,
    name: &'static str,
}

const fn person(age: u32, name: &'static str) -> Person {
    Person { age, name }
}

fn people() -> Vec<Person> {
    vec![person(30, "b"), person(20, "a"), person(20, "z")]
}

#[test]
fn sort_rows_orders_by_age_then_name() {
    let mut builder = CompositeOrderBuilder::<Person>::new();
    builder
        .order_by("age", |p: &Person| p.age)
        .then_by("name", |p: &Person| p.name)
        .expect("then-by name");

    let mut rows = people();
    sort_rows(&builder, &mut rows).expect("sort rows");

    assert_eq!(rows, [person(20, "a"), person(20, "z"), person(30, "b")]);
}

#[test]
fn sort_rows_is_stable_for_tied_keys() {
    let mut builder = CompositeOrderBuilder::<Person>::new();
    builder.order_by_desc("age", |p: &Person| p.age);

    let mut rows = people();
    sort_rows(&builder, &mut rows).expect("sort rows");

    assert_eq!(rows, [person(30, "b"), person(20, "a"), person(20, "z")]);
}

#[test]
fn bounded_sort_keeps_leading_rows() {
    let mut builder = CompositeOrderBuilder::<Person>::new();
    builder.order_by("age", |p: &Person| p.age);

    let mut rows = people();
    sort_rows_bounded(&builder, &mut rows, 2).expect("bounded sort");
    assert_eq!(rows, [person(20, "a"), person(20, "z")]);

    let mut rows = people();
    sort_rows_bounded(&builder, &mut rows, 0).expect("bounded sort");
    assert!(rows.is_empty());

    let mut rows = people();
    sort_rows_bounded(&builder, &mut rows, 10).expect("bounded sort");
    assert_eq!(rows.len(), 3);
}

#[test]
fn sort_rows_with_dispatches_on_limit() {
    let mut builder = CompositeOrderBuilder::<Person>::new();
    builder.order_by_desc("name", |p: &Person| p.name);

    let mut rows = people();
    sort_rows_with(&builder, &mut rows, &SortOptions::limit(1)).expect("limited sort");
    assert_eq!(rows, [person(20, "z")]);

    let mut rows = people();
    sort_rows_with(&builder, &mut rows, &SortOptions::default()).expect("full sort");
    assert_eq!(rows, [person(20, "z"), person(30, "b"), person(20, "a")]);
}

#[test]
fn failed_projection_leaves_rows_untouched() {
    let mut builder = CompositeOrderBuilder::<Person>::new();
    builder.order_by("age", |p: &Person| p.age);
    let erased = builder.clone_cast_any();

    let mut rows: Vec<AnyRow> = Vec::new();
    rows.push(Arc::new(person(2, "b")));
    rows.push(Arc::new("stray"));
    rows.push(Arc::new(person(1, "a")));
    let err = sort_rows(&erased, &mut rows).unwrap_err();

    assert!(matches!(err, OrderError::TypeMismatch { .. }));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].downcast_ref::<Person>(), Some(&person(2, "b")));
    assert!(rows[1].downcast_ref::<&str>().is_some());
}

#[test]
fn sort_options_deserialize_with_defaults() {
    let options: SortOptions = serde_json::from_str("{}").expect("empty options");
    assert_eq!(options, SortOptions::default());

    let options: SortOptions = serde_json::from_str(r#"{"limit":5}"#).expect("limit options");
    assert_eq!(options, SortOptions::limit(5));
}

proptest! {
    #[test]
    fn bounded_sort_matches_truncated_full_sort(
        rows in prop::collection::vec((0_u8..4, 0_u8..4), 0..24),
        keep_count in 0_usize..30,
        desc in any::<bool>(),
    ) {
        let mut builder = CompositeOrderBuilder::<(u8, u8)>::new();
        if desc {
            builder.order_by_desc("first", |row: &(u8, u8)| row.0);
        } else {
            builder.order_by("first", |row: &(u8, u8)| row.0);
        }

        let mut full = rows.clone();
        sort_rows(&builder, &mut full).expect("full sort");
        full.truncate(keep_count);

        let mut bounded = rows;
        sort_rows_bounded(&builder, &mut bounded, keep_count).expect("bounded sort");

        prop_assert_eq!(bounded, full);
    }
}

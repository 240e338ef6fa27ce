// tests/compare/comparator_test.rs
use std::cmp::Ordering;

use mantis_constraints::compare::{DatumComparator, DefaultComparator};
use mantis_constraints::config::ComparatorSettings;
use mantis_constraints::datum::{BuiltinTypes, Datum, TypeId, Value};
use mantis_constraints::eval::BuiltinEvaluator;

fn evaluating() -> DefaultComparator<'static> {
    DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, ComparatorSettings::default())
}

fn ints_only() -> DefaultComparator<'static> {
    let settings = ComparatorSettings {
        enable_const_eval: false,
        builtin_int_comparator: false,
    };
    DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, settings)
}

fn fast_path() -> DefaultComparator<'static> {
    let settings = ComparatorSettings {
        enable_const_eval: true,
        builtin_int_comparator: true,
    };
    DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, settings)
}

/// (equals, less_than, less_or_equal, greater_than, greater_or_equal)
fn table(cmp: &dyn DatumComparator, a: &Datum, b: &Datum) -> [bool; 5] {
    [
        cmp.equals(a, b).unwrap(),
        cmp.less_than(a, b).unwrap(),
        cmp.less_or_equal(a, b).unwrap(),
        cmp.greater_than(a, b).unwrap(),
        cmp.greater_or_equal(a, b).unwrap(),
    ]
}

#[test]
fn test_null_ordering_rules() {
    let null = Datum::null(TypeId::INT4);
    let five = Datum::int4(5);

    for cmp in [evaluating(), ints_only(), fast_path()] {
        assert_eq!(table(&cmp, &null, &null), [true, false, true, false, true]);
        assert_eq!(table(&cmp, &null, &five), [false, true, true, false, false]);
        assert_eq!(table(&cmp, &five, &null), [false, false, false, true, true]);
    }
}

#[test]
fn test_null_text_follows_same_rules() {
    let cmp = evaluating();
    let null = Datum::null(TypeId::TEXT);
    let x = Datum::text("x");
    assert_eq!(table(&cmp, &null, &null), [true, false, true, false, true]);
    assert_eq!(table(&cmp, &null, &x), [false, true, true, false, false]);
    assert_eq!(table(&cmp, &x, &null), [false, false, false, true, true]);
}

#[test]
fn test_non_null_integers() {
    for cmp in [evaluating(), ints_only(), fast_path()] {
        let (two, three) = (Datum::int4(2), Datum::int8(3));
        assert_eq!(table(&cmp, &two, &three), [false, true, true, false, false]);
        assert_eq!(table(&cmp, &three, &two), [false, false, false, true, true]);
        assert_eq!(table(&cmp, &two, &Datum::int2(2)), [true, false, true, false, true]);
    }
}

#[test]
fn test_text_needs_evaluation() {
    let (a, b) = (Datum::text("apple"), Datum::text("banana"));

    let cmp = evaluating();
    assert!(cmp.is_constrainable(&a));
    assert_eq!(table(&cmp, &a, &b), [false, true, true, false, false]);

    let cmp = ints_only();
    assert!(!cmp.is_constrainable(&a));
    assert_eq!(table(&cmp, &a, &b), [false; 5]);
    assert_eq!(table(&cmp, &a, &a), [false; 5]);
}

#[test]
fn test_unconstrainable_type_fails_every_predicate() {
    let cmp = evaluating();
    let blob = Datum::new(TypeId(17), Value::Text("\\x00".into()));
    assert!(!cmp.is_constrainable(&blob));
    assert_eq!(table(&cmp, &blob, &blob), [false; 5]);
    assert_eq!(table(&cmp, &blob, &Datum::int4(1)), [false; 5]);
}

#[test]
fn test_floats_and_mixed_numerics() {
    let cmp = evaluating();
    assert_eq!(
        table(&cmp, &Datum::float8(1.5), &Datum::int4(2)),
        [false, true, true, false, false]
    );
    assert!(cmp.equals(&Datum::float8(2.0), &Datum::int8(2)).unwrap());
}

#[test]
fn test_compare_is_consistent_with_predicates() {
    let cmp = evaluating();
    let values = [
        Datum::null(TypeId::INT8),
        Datum::int8(-3),
        Datum::int8(0),
        Datum::int8(7),
    ];
    for a in &values {
        for b in &values {
            let ord = cmp.compare(a, b).unwrap();
            assert_eq!(ord == Ordering::Less, cmp.less_than(a, b).unwrap(), "{} vs {}", a, b);
            assert_eq!(ord == Ordering::Equal, cmp.equals(a, b).unwrap(), "{} vs {}", a, b);
            assert_eq!(ord == Ordering::Greater, cmp.greater_than(a, b).unwrap(), "{} vs {}", a, b);
        }
    }
}

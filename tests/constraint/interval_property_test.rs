//! Property tests for interval set algebra.
//!
//! Intervals are generated from small integer bounds so that overlaps,
//! shared endpoints and points are common. Set membership is checked by
//! probing integers and half-integers, which covers every distinct region
//! such bounds can create.

use mantis_constraints::compare::DefaultComparator;
use mantis_constraints::config::{ComparatorSettings, DeriveSettings, RenderSettings};
use mantis_constraints::constraint::{Bound, ConstraintInterval, DeriveContext, Range};
use mantis_constraints::datum::{BuiltinTypes, Datum};
use mantis_constraints::eval::BuiltinEvaluator;
use mantis_constraints::expr::{ArrayQuantifier, CmpKind, ColumnRef, ScalarExpr};
use proptest::prelude::*;

fn comparator() -> DefaultComparator<'static> {
    DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, ComparatorSettings::default())
}

fn a() -> ColumnRef {
    ColumnRef::new(1, "a")
}

#[derive(Debug, Clone)]
struct IntervalShape {
    edges: Vec<(Bound, Bound)>,
    includes_null: bool,
}

fn arb_bound() -> impl Strategy<Value = Bound> {
    prop_oneof![
        1 => Just(Bound::Unbounded),
        4 => (-10i64..10, any::<bool>()).prop_map(|(n, inclusive)| {
            if inclusive {
                Bound::inclusive(Datum::int8(n))
            } else {
                Bound::exclusive(Datum::int8(n))
            }
        }),
    ]
}

fn arb_point() -> impl Strategy<Value = (Bound, Bound)> {
    (-10i64..10).prop_map(|n| (Bound::inclusive(Datum::int8(n)), Bound::inclusive(Datum::int8(n))))
}

fn arb_interval() -> impl Strategy<Value = IntervalShape> {
    let edge = prop_oneof![3 => (arb_bound(), arb_bound()), 1 => arb_point()];
    (prop::collection::vec(edge, 0..6), any::<bool>())
        .prop_map(|(edges, includes_null)| IntervalShape { edges, includes_null })
}

fn arb_point_list() -> impl Strategy<Value = IntervalShape> {
    (prop::collection::vec(arb_point(), 0..6), any::<bool>())
        .prop_map(|(edges, includes_null)| IntervalShape { edges, includes_null })
}

/// Build the interval, dropping edge pairs that describe an empty range.
fn build(shape: &IntervalShape, cmp: &DefaultComparator<'_>) -> ConstraintInterval {
    let mut ranges = Vec::new();
    for (left, right) in &shape.edges {
        if let Some(r) = Range::checked(left.clone(), right.clone(), cmp).unwrap() {
            ranges.push(r);
        }
    }
    ConstraintInterval::new(a(), ranges, shape.includes_null, cmp).unwrap()
}

/// `None` probes NULL.
fn probes() -> Vec<Option<f64>> {
    let mut out = vec![None];
    for twice in -22..=22 {
        out.push(Some(f64::from(twice) / 2.0));
    }
    out
}

fn admits(ci: &ConstraintInterval, probe: Option<f64>, cmp: &DefaultComparator<'_>) -> bool {
    match probe {
        None => ci.includes_null(),
        Some(x) => {
            let point = ConstraintInterval::from_points(a(), [Datum::float8(x)], false, cmp).unwrap();
            ci.contains(&point, cmp).unwrap()
        }
    }
}

proptest! {
    #[test]
    fn prop_intervals_are_canonical(shape in arb_interval()) {
        let cmp = comparator();
        let ci = build(&shape, &cmp);
        for pair in ci.ranges().windows(2) {
            prop_assert!(pair[0].ends_before(&pair[1], &cmp).unwrap(), "{}", ci);
            prop_assert!(!pair[0].overlaps_or_adjacent(&pair[1], &cmp).unwrap(), "{}", ci);
        }
    }

    #[test]
    fn prop_input_order_does_not_matter(shape in arb_interval()) {
        let cmp = comparator();
        let forward = build(&shape, &cmp);
        let mut reversed = shape.clone();
        reversed.edges.reverse();
        prop_assert!(forward.equals(&build(&reversed, &cmp), &cmp).unwrap());
    }

    #[test]
    fn prop_set_operations_match_membership(x in arb_interval(), y in arb_interval()) {
        let cmp = comparator();
        let (i, j) = (build(&x, &cmp), build(&y, &cmp));
        let union = i.union(&j, &cmp).unwrap();
        let meet = i.intersect(&j, &cmp).unwrap();
        let diff = i.difference(&j, &cmp).unwrap();
        let rest = i.complement(&cmp).unwrap();

        for p in probes() {
            let (in_i, in_j) = (admits(&i, p, &cmp), admits(&j, p, &cmp));
            prop_assert_eq!(admits(&union, p, &cmp), in_i || in_j, "union at {:?}", p);
            prop_assert_eq!(admits(&meet, p, &cmp), in_i && in_j, "intersect at {:?}", p);
            prop_assert_eq!(admits(&diff, p, &cmp), in_i && !in_j, "difference at {:?}", p);
            prop_assert_eq!(admits(&rest, p, &cmp), !in_i, "complement at {:?}", p);
        }
    }

    #[test]
    fn prop_union_contains_both_and_intersection_is_contained(x in arb_interval(), y in arb_interval()) {
        let cmp = comparator();
        let (i, j) = (build(&x, &cmp), build(&y, &cmp));
        let union = i.union(&j, &cmp).unwrap();
        let meet = i.intersect(&j, &cmp).unwrap();
        prop_assert!(union.contains(&i, &cmp).unwrap());
        prop_assert!(union.contains(&j, &cmp).unwrap());
        prop_assert!(i.contains(&meet, &cmp).unwrap());
        prop_assert!(j.contains(&meet, &cmp).unwrap());
    }

    #[test]
    fn prop_intersection_is_greatest_lower_bound(
        x in arb_interval(),
        y in arb_interval(),
        z in arb_interval(),
    ) {
        let cmp = comparator();
        let (i, j, k) = (build(&x, &cmp), build(&y, &cmp), build(&z, &cmp));
        // any common lower bound of i and j lies inside i ∩ j
        let lower = k.intersect(&i, &cmp).unwrap().intersect(&j, &cmp).unwrap();
        prop_assert!(i.intersect(&j, &cmp).unwrap().contains(&lower, &cmp).unwrap());
    }

    #[test]
    fn prop_complement_is_an_involution(shape in arb_interval()) {
        let cmp = comparator();
        let ci = build(&shape, &cmp);
        let back = ci.complement(&cmp).unwrap().complement(&cmp).unwrap();
        prop_assert!(back.equals(&ci, &cmp).unwrap(), "{} vs {}", back, ci);
    }

    #[test]
    fn prop_de_morgan(x in arb_interval(), y in arb_interval()) {
        let cmp = comparator();
        let (i, j) = (build(&x, &cmp), build(&y, &cmp));
        let (ni, nj) = (i.complement(&cmp).unwrap(), j.complement(&cmp).unwrap());

        let lhs = i.union(&j, &cmp).unwrap().complement(&cmp).unwrap();
        prop_assert!(lhs.equals(&ni.intersect(&nj, &cmp).unwrap(), &cmp).unwrap());

        let lhs = i.intersect(&j, &cmp).unwrap().complement(&cmp).unwrap();
        prop_assert!(lhs.equals(&ni.union(&nj, &cmp).unwrap(), &cmp).unwrap());
    }

    #[test]
    fn prop_equals_is_mutual_containment(x in arb_interval(), y in arb_interval()) {
        let cmp = comparator();
        let (i, j) = (build(&x, &cmp), build(&y, &cmp));
        let mutual = i.contains(&j, &cmp).unwrap() && j.contains(&i, &cmp).unwrap();
        prop_assert_eq!(i.equals(&j, &cmp).unwrap(), mutual);
    }

    #[test]
    fn prop_rendered_predicate_derives_back(shape in arb_interval(), arrays in any::<bool>()) {
        let cmp = comparator();
        let ctx = DeriveContext::new(&cmp, DeriveSettings::default());
        let settings = RenderSettings { array_predicates: arrays };
        let ci = build(&shape, &cmp);

        let expr = ci.to_scalar_expr(&settings, &cmp).unwrap();
        let back = ConstraintInterval::from_scalar_expr(&expr, &a(), &ctx).unwrap();

        prop_assert!(back.equals(&ci, &cmp).unwrap(), "{} rendered as {} came back as {}", ci, expr, back);
    }

    #[test]
    fn prop_in_list_has_one_literal_per_point(shape in arb_point_list()) {
        let cmp = comparator();
        let ci = build(&shape, &cmp).with_includes_null(false);
        let expr = ci.to_scalar_expr(&RenderSettings::default(), &cmp).unwrap();

        prop_assert_eq!(ci.converts_to_in_list(&cmp).unwrap(), !ci.ranges().is_empty());

        if ci.ranges().len() > 1 {
            match expr {
                ScalarExpr::ArrayCmp { op, quantifier, elements, .. } => {
                    prop_assert_eq!(op, CmpKind::Eq);
                    prop_assert_eq!(quantifier, ArrayQuantifier::Any);
                    prop_assert_eq!(elements.len(), ci.ranges().len());
                }
                other => {
                    prop_assert!(false, "expected an IN list, got {}", other);
                }
            }
        } else if let Some(only) = ci.ranges().first() {
            match expr {
                ScalarExpr::Cmp { op, right, .. } => {
                    prop_assert_eq!(op, CmpKind::Eq);
                    prop_assert_eq!(right.as_const(), only.left().datum());
                }
                other => {
                    prop_assert!(false, "expected a = v, got {}", other);
                }
            }
        } else {
            prop_assert!(expr.is_bool_const(false));
        }
    }
}

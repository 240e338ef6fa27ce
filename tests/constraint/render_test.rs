// tests/constraint/render_test.rs
//
// Snapshot tests for predicate rendering. Every rendered predicate is parsed
// back and derived again to check it describes the same values.
use insta::assert_snapshot;
use mantis_constraints::compare::DefaultComparator;
use mantis_constraints::config::{ComparatorSettings, DeriveSettings, RenderSettings};
use mantis_constraints::constraint::{Bound, Constraint, ConstraintInterval, DeriveContext, Range};
use mantis_constraints::datum::{BuiltinTypes, Datum};
use mantis_constraints::eval::BuiltinEvaluator;
use mantis_constraints::expr::ColumnRef;
use mantis_constraints::sql::{parse_predicate, ColumnRegistry};

fn comparator() -> DefaultComparator<'static> {
    DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, ComparatorSettings::default())
}

fn a() -> ColumnRef {
    ColumnRef::new(1, "a")
}

fn b() -> ColumnRef {
    ColumnRef::new(2, "b")
}

fn c() -> ColumnRef {
    ColumnRef::new(3, "c")
}

fn no_arrays() -> RenderSettings {
    RenderSettings {
        array_predicates: false,
    }
}

fn points(column: ColumnRef, values: &[i32], includes_null: bool) -> ConstraintInterval {
    let cmp = comparator();
    ConstraintInterval::from_points(column, values.iter().map(|n| Datum::int4(*n)), includes_null, &cmp).unwrap()
}

fn ranges(ranges: Vec<Range>, includes_null: bool) -> ConstraintInterval {
    let cmp = comparator();
    ConstraintInterval::new(a(), ranges, includes_null, &cmp).unwrap()
}

/// Render, then check the text derives back to the same interval.
fn render_interval(ci: &ConstraintInterval, settings: RenderSettings) -> String {
    let cmp = comparator();
    let ctx = DeriveContext::new(&cmp, DeriveSettings::default());
    let sql = ci.to_scalar_expr(&settings, &cmp).unwrap().to_string();

    let mut columns = ColumnRegistry::with_columns(["a", "b", "c"]);
    let parsed = parse_predicate(&sql, &mut columns).unwrap();
    let back = ConstraintInterval::from_scalar_expr(&parsed, ci.column(), &ctx).unwrap();
    assert!(back.equals(ci, &cmp).unwrap(), "{} came back as {}", sql, back);
    sql
}

fn render_constraint(constraint: &Constraint) -> String {
    let cmp = comparator();
    let ctx = DeriveContext::new(&cmp, DeriveSettings::default());
    let sql = constraint
        .to_scalar_expr(&RenderSettings::default(), &cmp)
        .unwrap()
        .to_string();

    let mut columns = ColumnRegistry::with_columns(["a", "b", "c"]);
    let parsed = parse_predicate(&sql, &mut columns).unwrap();
    let back = Constraint::from_scalar_expr(&parsed, &ctx).unwrap().constraint.unwrap();
    assert!(back.equals(constraint, &cmp).unwrap(), "{} came back as {}", sql, back);
    sql
}

fn int(n: i32) -> Datum {
    Datum::int4(n)
}

// =============================================================================
// Intervals
// =============================================================================

#[test]
fn in_list() {
    assert_snapshot!(render_interval(&points(a(), &[3, 1, 2], false), RenderSettings::default()), @"a IN (1, 2, 3)");
}

#[test]
fn in_list_with_null() {
    assert_snapshot!(render_interval(&points(a(), &[1, 2, 3], true), RenderSettings::default()), @"a IN (1, 2, 3) OR a IS NULL");
}

#[test]
fn not_in_list() {
    let cmp = comparator();
    let ci = points(a(), &[1, 2], true).complement(&cmp).unwrap();
    assert_snapshot!(render_interval(&ci, RenderSettings::default()), @"a NOT IN (1, 2)");
}

#[test]
fn single_exclusion() {
    let cmp = comparator();
    let ci = points(a(), &[5], true).complement(&cmp).unwrap();
    assert_snapshot!(render_interval(&ci, RenderSettings::default()), @"a <> 5");

    let ci = points(a(), &[5], false).complement(&cmp).unwrap();
    assert_snapshot!(render_interval(&ci, RenderSettings::default()), @"a <> 5 OR a IS NULL");
}

#[test]
fn single_point() {
    assert_snapshot!(render_interval(&points(a(), &[7], false), RenderSettings::default()), @"a = 7");
}

#[test]
fn ranges_and_tails() {
    let ci = ranges(
        vec![
            Range::new(Bound::inclusive(int(0)), Bound::exclusive(int(5))),
            Range::greater_than(int(10)),
        ],
        false,
    );
    assert_snapshot!(render_interval(&ci, RenderSettings::default()), @"(a >= 0 AND a < 5) OR a > 10");
}

#[test]
fn special_intervals() {
    let settings = RenderSettings::default();
    assert_snapshot!(render_interval(&ConstraintInterval::empty(a()), settings), @"FALSE");
    assert_snapshot!(render_interval(&ConstraintInterval::unbounded(a()), settings), @"TRUE");
    assert_snapshot!(render_interval(&ConstraintInterval::not_null(a()), settings), @"a IS NOT NULL");
    assert_snapshot!(render_interval(&ConstraintInterval::null_only(a()), settings), @"a IS NULL");
}

#[test]
fn points_without_arrays() {
    assert_snapshot!(render_interval(&points(a(), &[1, 2], false), no_arrays()), @"a = 1 OR a = 2");
}

#[test]
fn exclusions_without_arrays() {
    let cmp = comparator();
    let ci = points(a(), &[1, 2], true).complement(&cmp).unwrap();
    assert_snapshot!(render_interval(&ci, no_arrays()), @"a < 1 OR (a > 1 AND a < 2) OR a > 2");
}

#[test]
fn text_points() {
    let cmp = comparator();
    let ci = ConstraintInterval::from_points(b(), [Datum::text("y"), Datum::text("x")], false, &cmp).unwrap();
    assert_snapshot!(render_interval(&ci, RenderSettings::default()), @"b IN ('x', 'y')");
}

// =============================================================================
// Composite constraints
// =============================================================================

#[test]
fn conjunction_with_nested_disjunction() {
    let b_low: Constraint = ConstraintInterval::from_range(b(), Range::less_than(int(2))).into();
    let c_null: Constraint = ConstraintInterval::null_only(c()).into();
    let a_high: Constraint = ConstraintInterval::from_range(a(), Range::greater_than(int(1))).into();
    let constraint = Constraint::conjunction(vec![
        a_high,
        Constraint::disjunction(vec![b_low, c_null]).unwrap(),
    ])
    .unwrap();
    assert_snapshot!(render_constraint(&constraint), @"a > 1 AND (b < 2 OR c IS NULL)");
}

#[test]
fn negated_conjunction() {
    let a_high: Constraint = ConstraintInterval::from_range(a(), Range::greater_than(int(1))).into();
    let b_low: Constraint = ConstraintInterval::from_range(b(), Range::less_than(int(2))).into();
    let constraint = Constraint::negation(Constraint::conjunction(vec![a_high, b_low]).unwrap());
    assert_snapshot!(render_constraint(&constraint), @"NOT (a > 1 AND b < 2)");
}

#[test]
fn negated_interval() {
    let a_high: Constraint = ConstraintInterval::from_range(a(), Range::greater_than(int(1))).into();
    assert_snapshot!(render_constraint(&Constraint::negation(a_high)), @"NOT (a > 1)");
}

// tests/config/settings_test.rs
use std::io::Write;

use mantis_constraints::compare::{DatumComparator, DefaultComparator};
use mantis_constraints::config::{Settings, SettingsError};
use mantis_constraints::constraint::{ConstraintInterval, DeriveContext};
use mantis_constraints::datum::{BuiltinTypes, Datum};
use mantis_constraints::eval::BuiltinEvaluator;
use mantis_constraints::sql::{parse_predicate, ColumnRegistry};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
[comparator]
enable_const_eval = true
builtin_int_comparator = true

[derive]
array_expansion_threshold = 8
"#,
    );

    let settings = Settings::from_file(file.path()).unwrap();

    assert!(settings.comparator.builtin_int_comparator);
    assert!(settings.comparator.use_int_fast_path());
    assert_eq!(settings.derive.array_expansion_threshold, 8);
    assert!(settings.render.array_predicates);
}

#[test]
fn test_unknown_value_type_is_a_parse_error() {
    let file = write_config("[derive]\narray_expansion_threshold = \"many\"\n");
    let err = Settings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
}

#[test]
fn test_serialized_settings_load_back() {
    let mut settings = Settings::default();
    settings.comparator.enable_const_eval = false;
    settings.render.array_predicates = false;

    let file = write_config(&toml::to_string(&settings).unwrap());

    assert_eq!(Settings::from_file(file.path()).unwrap(), settings);
}

#[test]
fn test_loaded_settings_drive_derivation() {
    let file = write_config(
        r#"
[comparator]
enable_const_eval = false

[derive]
array_expansion_threshold = 2
"#,
    );
    let settings = Settings::from_file(file.path()).unwrap();
    let cmp = DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, settings.comparator);
    let ctx = DeriveContext::new(&cmp, settings.derive);

    assert!(!cmp.is_constrainable(&Datum::text("x")));

    let mut columns = ColumnRegistry::new();
    let expr = parse_predicate("a IN (1, 2, 3)", &mut columns).unwrap();
    let a = columns.resolve("a").unwrap();
    let ci = ConstraintInterval::from_scalar_expr(&expr, &a, &ctx).unwrap();
    assert!(ci.is_unbounded());
}

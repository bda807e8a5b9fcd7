use ontime_extract::schema::{CanonicalFieldSet, fields};
use ontime_extract::project;

use crate::utils::{column_names, column_values, string_batch};

/// Projection keeps canonical fields in canonical order and every row
#[test]
fn test_project_orders_and_keeps_rows() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        (fields::DEST, &[Some("LAX"), Some("ORD"), None]),
        ("ORIGIN_COUNTRY_NAME", &[Some("UNITED STATES"), None, None]),
        (fields::FL_DATE, &[Some("2024-01-01"), Some("2024-01-02"), Some("2024-01-03")]),
        (fields::ORIGIN, &[Some("DFW"), Some("DFW"), Some("MIA")]),
    ]);

    let projected = project(&batch, &CanonicalFieldSet::default())?;

    assert_eq!(
        column_names(&projected),
        vec![fields::FL_DATE, fields::ORIGIN, fields::DEST]
    );
    assert_eq!(projected.num_rows(), batch.num_rows());
    for name in column_names(&projected) {
        assert_eq!(column_values(&projected, &name), column_values(&batch, &name));
    }
    Ok(())
}

/// A batch without any canonical field becomes the empty sentinel
#[test]
fn test_project_without_canonical_fields_is_empty_sentinel() -> ontime_extract::Result<()> {
    let batch = string_batch(&[("Quarter", &[Some("1"), Some("1")])]);

    let projected = project(&batch, &CanonicalFieldSet::default())?;

    assert_eq!(projected.num_rows(), 0);
    assert_eq!(projected.num_columns(), 0);
    Ok(())
}

/// A custom field set restricts and orders the output
#[test]
fn test_project_with_custom_field_set() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        (fields::FL_DATE, &[Some("2024-01-01")]),
        (fields::ORIGIN, &[Some("DFW")]),
        (fields::DEST, &[Some("LAX")]),
    ]);
    let set = CanonicalFieldSet::new([fields::DEST, fields::FL_DATE, fields::DEST]);

    let projected = project(&batch, &set)?;

    assert_eq!(set.len(), 2);
    assert_eq!(column_names(&projected), vec![fields::DEST, fields::FL_DATE]);
    Ok(())
}

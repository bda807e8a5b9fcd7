use arrow::array::Array;
use ontime_extract::schema::fields;
use ontime_extract::{CarrierKind, CarrierResolution, ExtractError, select_carrier};

use crate::utils::{column_values, string_batch};

fn both_carriers() -> ontime_extract::RecordBatch {
    string_batch(&[
        (fields::FL_DATE, &[Some("1"), Some("2"), Some("3"), Some("4")]),
        (fields::OP_UNIQUE_CARRIER, &[Some("AA"), Some("MQ"), Some("AA"), None]),
        (fields::MKT_UNIQUE_CARRIER, &[Some("AA"), Some("AA"), Some("DL"), Some("AA")]),
    ])
}

/// With both carrier fields present the flag alone picks the field
#[test]
fn test_prefer_marketing_flag_picks_field() -> ontime_extract::Result<()> {
    let batch = both_carriers();

    let operating = select_carrier(&batch, "AA", false)?;
    assert_eq!(
        column_values(&operating, fields::FL_DATE),
        vec![Some("1".to_string()), Some("3".to_string())]
    );

    let marketing = select_carrier(&batch, "AA", true)?;
    assert_eq!(
        column_values(&marketing, fields::FL_DATE),
        vec![Some("1".to_string()), Some("2".to_string()), Some("4".to_string())]
    );
    Ok(())
}

/// A missing preferred field falls back to the other carrier field
#[test]
fn test_falls_back_to_present_field() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        (fields::FL_DATE, &[Some("1"), Some("2")]),
        (fields::MKT_UNIQUE_CARRIER, &[Some("DL"), Some("AA")]),
    ]);

    assert_eq!(
        CarrierResolution::resolve(batch.schema_ref(), false),
        CarrierResolution::Fallback(fields::MKT_UNIQUE_CARRIER)
    );
    let selected = select_carrier(&batch, "AA", false)?;
    assert_eq!(column_values(&selected, fields::FL_DATE), vec![Some("2".to_string())]);
    Ok(())
}

/// Neither carrier field: schema error naming the available columns
#[test]
fn test_unresolvable_carrier_is_schema_error() {
    let batch = string_batch(&[
        ("FlightDate", &[Some("2024-01-01")]),
        ("Tail_Number", &[Some("AA")]),
    ]);

    let err = select_carrier(&batch, "AA", true).unwrap_err();
    match err {
        ExtractError::Schema { kind, available } => {
            assert_eq!(kind, CarrierKind::Marketing);
            assert_eq!(available, vec!["FlightDate", "Tail_Number"]);
        }
        other => panic!("expected schema error, got {other}"),
    }
}

/// The schema error does not depend on rows: an empty batch fails too
#[test]
fn test_unresolvable_carrier_fails_on_empty_batch() {
    let batch = string_batch(&[(fields::ORIGIN, &[])]);
    assert!(matches!(
        select_carrier(&batch, "AA", false),
        Err(ExtractError::Schema { kind: CarrierKind::Operating, .. })
    ));
}

/// Carrier comparison is exact: no case folding or trimming
#[test]
fn test_carrier_match_is_exact() -> ontime_extract::Result<()> {
    let batch = string_batch(&[(
        fields::OP_UNIQUE_CARRIER,
        &[Some("AA"), Some("aa"), Some(" AA"), Some("AAL"), None],
    )]);

    let selected = select_carrier(&batch, "AA", false)?;
    assert_eq!(selected.num_rows(), 1);
    Ok(())
}

/// Carrier columns without any null cell are filtered like any other
#[test]
fn test_carrier_column_without_nulls() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        (fields::FL_DATE, &[Some("1"), Some("2"), Some("3")]),
        (fields::OP_UNIQUE_CARRIER, &[Some("AA"), Some("DL"), Some("AA")]),
    ]);
    assert_eq!(batch.column(1).null_count(), 0);

    let selected = select_carrier(&batch, "AA", false)?;
    assert_eq!(
        column_values(&selected, fields::FL_DATE),
        vec![Some("1".to_string()), Some("3".to_string())]
    );
    Ok(())
}

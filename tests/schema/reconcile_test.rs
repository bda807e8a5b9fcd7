use ontime_extract::schema::fields;
use ontime_extract::{AliasTable, reconcile};

use crate::utils::{column_names, column_values, string_batch};

/// Bound columns are renamed, unbound columns pass through untouched
#[test]
fn test_reconcile_renames_bound_columns_only() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let batch = string_batch(&[
        ("FlightDate", &[Some("2024-01-01"), Some("2024-01-02")]),
        ("Reporting_Airline", &[Some("AA"), Some("DL")]),
        ("Tail_Number", &[Some("N101"), None]),
        ("Origin", &[Some("DFW"), Some("ATL")]),
    ]);

    let reconciled = reconcile(&batch, &table)?;

    assert_eq!(
        column_names(&reconciled),
        vec![fields::FL_DATE, fields::MKT_UNIQUE_CARRIER, "Tail_Number", fields::ORIGIN]
    );
    assert_eq!(reconciled.num_rows(), 2);
    assert_eq!(
        column_values(&reconciled, "Tail_Number"),
        vec![Some("N101".to_string()), None]
    );
    assert_eq!(
        column_values(&reconciled, fields::MKT_UNIQUE_CARRIER),
        column_values(&batch, "Reporting_Airline")
    );
    Ok(())
}

/// Reconciling twice gives the same batch as reconciling once
#[test]
fn test_reconcile_is_idempotent() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let batch = string_batch(&[
        ("fl_date", &[Some("2024-01-01")]),
        ("Dest", &[Some("LAX")]),
        ("DEST_AIRPORT", &[Some("KLAX")]),
        ("Op Carrier", &[Some("AA")]),
        ("OP_UNIQUE_CARRIER", &[Some("MQ")]),
        ("Distance", &[Some("1235")]),
    ]);

    let once = reconcile(&batch, &table)?;
    let twice = reconcile(&once, &table)?;

    assert_eq!(once, twice);
    // The literal canonical column keeps its name; the alias stays as it was
    assert_eq!(column_values(&once, fields::OP_UNIQUE_CARRIER), vec![Some("MQ".to_string())]);
    assert!(column_names(&once).contains(&"Op Carrier".to_string()));
    Ok(())
}

/// An already-canonical batch is returned unchanged
#[test]
fn test_reconcile_canonical_batch_is_noop() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let batch = string_batch(&[
        (fields::FL_DATE, &[Some("2024-01-01")]),
        (fields::OP_UNIQUE_CARRIER, &[Some("AA")]),
        ("EXTRA", &[None]),
    ]);

    assert_eq!(reconcile(&batch, &table)?, batch);
    Ok(())
}

use ontime_extract::filter::BatchFilter;
use ontime_extract::{AirportFilter, BatchTransform, ExtractError};

use crate::utils::{column_names, column_values, string_batch};

/// Keeps carrier rows whose both endpoints are in the set, with every column
#[test]
fn test_airport_filter_keeps_routes_within_set() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        ("Reporting_Airline", &[Some("AA"), Some(" aa "), Some("AA"), Some("DL"), None]),
        ("Origin", &[Some("DFW"), Some("lax"), Some("DFW"), Some("DFW"), Some("DFW")]),
        ("Dest", &[Some("JFK"), Some("ORD "), Some("BOS"), Some("LAX"), Some("LAX")]),
        ("Distance", &[Some("1391"), Some("1744"), Some("1562"), Some("1235"), None]),
    ]);

    let filtered = AirportFilter::default().filter(&batch)?;

    assert_eq!(column_names(&filtered), column_names(&batch));
    assert_eq!(
        column_values(&filtered, "Distance"),
        vec![Some("1391".to_string()), Some("1744".to_string())]
    );
    // Values are written as read, not folded
    assert_eq!(column_values(&filtered, "Origin")[1], Some("lax".to_string()));
    Ok(())
}

/// The first candidate column wins, whatever its case
#[test]
fn test_airport_filter_picks_first_candidate() -> ontime_extract::Result<()> {
    let batch = string_batch(&[
        ("carrier", &[Some("AA"), Some("UA")]),
        ("unique_carrier", &[Some("UA"), Some("AA")]),
        ("ORIGIN", &[Some("PHX"), Some("PHX")]),
        ("DEST", &[Some("CLT"), Some("CLT")]),
    ]);

    let filtered = AirportFilter::new("AA", ["PHX", "CLT"]).transform(&batch)?;
    assert_eq!(column_values(&filtered, "carrier"), vec![Some("UA".to_string())]);
    Ok(())
}

#[test]
fn test_airport_filter_requires_route_columns() {
    let batch = string_batch(&[("CARRIER", &[Some("AA")]), ("ORIGIN", &[Some("DFW")])]);
    let err = AirportFilter::default().filter(&batch).unwrap_err();
    assert!(matches!(err, ExtractError::MissingColumn { ref what, .. } if what == "origin/destination"));
}

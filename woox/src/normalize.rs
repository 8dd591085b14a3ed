use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Result, WooxError};
use crate::types::{NormalizedOrder, NumericField, OrderSet, RawOrder};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Convert raw rows into an [`OrderSet`], preserving their order.
///
/// A missing or `null` realized PnL counts as exactly zero.
///
/// # Errors
///
/// Returns `WooxError::InvalidOrder` for the first row whose timestamps or
/// PnL cannot be parsed; no partial set is produced.
pub fn normalize<I>(rows: I) -> Result<OrderSet>
where
    I: IntoIterator<Item = RawOrder>,
{
    rows.into_iter()
        .enumerate()
        .map(|(row, raw)| normalize_order(row, raw))
        .collect::<Result<Vec<_>>>()
        .map(OrderSet::new)
}

fn normalize_order(row: usize, raw: RawOrder) -> Result<NormalizedOrder> {
    let realized_pnl = match &raw.realized_pnl {
        None => Decimal::ZERO,
        Some(value) => value.to_decimal().ok_or_else(|| WooxError::InvalidOrder {
            row,
            field: "realized_pnl",
            value: value.to_string(),
        })?,
    };
    let created_at = parse_timestamp(row, "created_time", &raw.created_time)?;
    let updated_at = parse_timestamp(row, "updated_time", &raw.updated_time)?;

    Ok(NormalizedOrder {
        symbol: raw.symbol,
        realized_pnl,
        created_at,
        updated_at,
        extra: raw.extra,
    })
}

/// Parse unix seconds (fractional allowed) into a UTC timestamp.
fn parse_timestamp(
    row: usize,
    field: &'static str,
    value: &NumericField,
) -> Result<DateTime<Utc>> {
    let invalid = || WooxError::InvalidOrder {
        row,
        field,
        value: value.to_string(),
    };

    let secs = value.to_decimal().ok_or_else(invalid)?;
    let whole = secs.floor();
    let nanos = ((secs - whole) * Decimal::from(NANOS_PER_SEC)).trunc();

    let whole = whole.to_i64().ok_or_else(invalid)?;
    let nanos = nanos.to_u32().ok_or_else(invalid)?;
    DateTime::<Utc>::from_timestamp(whole, nanos).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawOrder {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_null_pnl_is_zero() {
        let rows = vec![raw(json!({
            "symbol": "SPOT_BTC_USDT",
            "realized_pnl": null,
            "created_time": "1700000000.000",
            "updated_time": "1700000001.000"
        }))];
        let set = normalize(rows).unwrap();
        assert_eq!(set.orders()[0].realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_absent_pnl_is_zero() {
        let rows = vec![raw(json!({
            "symbol": "SPOT_BTC_USDT",
            "created_time": 1700000000.0,
            "updated_time": 1700000000.0
        }))];
        let set = normalize(rows).unwrap();
        assert_eq!(set.orders()[0].realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_parses_string_and_number_fields() {
        let rows = vec![
            raw(json!({
                "symbol": "PERP_ETH_USDT",
                "realized_pnl": "-12.5",
                "created_time": "1700000000.250",
                "updated_time": "1700000005.500"
            })),
            raw(json!({
                "symbol": "PERP_ETH_USDT",
                "realized_pnl": 3.25,
                "created_time": 1700000100,
                "updated_time": 1700000100.75
            })),
        ];
        let set = normalize(rows).unwrap();
        let o = &set.orders()[0];
        assert_eq!(o.realized_pnl, dec!(-12.5));
        assert_eq!(o.created_at.timestamp(), 1_700_000_000);
        assert_eq!(o.created_at.timestamp_subsec_millis(), 250);
        assert_eq!(o.updated_at.timestamp_subsec_millis(), 500);

        let o = &set.orders()[1];
        assert_eq!(o.realized_pnl, dec!(3.25));
        assert_eq!(o.created_at.timestamp(), 1_700_000_100);
        assert_eq!(o.updated_at.timestamp_subsec_millis(), 750);
    }

    #[test]
    fn test_scientific_pnl() {
        let rows = vec![raw(json!({
            "symbol": "SPOT_BTC_USDT",
            "realized_pnl": "1e-4",
            "created_time": "1700000000",
            "updated_time": "1700000000"
        }))];
        let set = normalize(rows).unwrap();
        assert_eq!(set.orders()[0].realized_pnl, dec!(0.0001));
    }

    #[test]
    fn test_preserves_row_order_and_extra_fields() {
        let rows = vec![
            raw(json!({
                "symbol": "B",
                "realized_pnl": "1",
                "created_time": "1700000002",
                "updated_time": "1700000002",
                "side": "SELL",
                "order_id": 2
            })),
            raw(json!({
                "symbol": "A",
                "realized_pnl": "2",
                "created_time": "1700000001",
                "updated_time": "1700000001",
                "side": "BUY",
                "order_id": 1
            })),
        ];
        let set = normalize(rows).unwrap();
        let symbols: Vec<_> = set.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, ["B", "A"]);
        assert_eq!(set.orders()[0].extra["side"], "SELL");
        assert_eq!(set.orders()[1].extra["order_id"], 1);
    }

    #[test]
    fn test_malformed_timestamp_fails_whole_batch() {
        let rows = vec![
            raw(json!({
                "symbol": "A",
                "realized_pnl": "1",
                "created_time": "1700000001",
                "updated_time": "1700000001"
            })),
            raw(json!({
                "symbol": "A",
                "realized_pnl": "1",
                "created_time": "yesterday",
                "updated_time": "1700000001"
            })),
        ];
        let err = normalize(rows).unwrap_err();
        match err {
            WooxError::InvalidOrder { row, field, value } => {
                assert_eq!(row, 1);
                assert_eq!(field, "created_time");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_pnl_is_data_error() {
        let rows = vec![raw(json!({
            "symbol": "A",
            "realized_pnl": "n/a",
            "created_time": "1700000001",
            "updated_time": "1700000001"
        }))];
        let err = normalize(rows).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }

    #[test]
    fn test_created_date() {
        let rows = vec![raw(json!({
            "symbol": "A",
            "created_time": "1700000000",
            "updated_time": "1700000000"
        }))];
        let set = normalize(rows).unwrap();
        assert_eq!(set.orders()[0].created_date().to_string(), "2023-11-14");
    }

    #[test]
    fn test_empty_batch() {
        let set = normalize(Vec::<RawOrder>::new()).unwrap();
        assert!(set.is_empty());
    }
}

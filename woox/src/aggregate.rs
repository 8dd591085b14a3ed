use rust_decimal::Decimal;

use crate::types::{NormalizedOrder, OrderSet, PairFilter, PnlPoint, PnlSeries};

/// Orders whose symbol passes `pair_filter`, in their original order.
pub fn filter_orders(orders: &OrderSet, pair_filter: &PairFilter) -> OrderSet {
    orders
        .iter()
        .filter(|o| pair_filter.matches(&o.symbol))
        .cloned()
        .collect::<Vec<_>>()
        .into()
}

/// Total realized PnL and its cumulative series for the filtered orders.
///
/// The API lists orders newest first, so the filtered orders are reversed
/// and then stable-sorted by `created_at`. For a strictly descending input
/// the sort is a no-op; otherwise it repairs the order, and orders sharing
/// a timestamp keep their reversed position.
pub fn aggregate(orders: &OrderSet, pair_filter: &PairFilter) -> PnlSeries {
    let mut ascending: Vec<&NormalizedOrder> = orders
        .iter()
        .filter(|o| pair_filter.matches(&o.symbol))
        .collect();
    ascending.reverse();
    ascending.sort_by_key(|o| o.created_at);

    let mut running = Decimal::ZERO;
    let points = ascending
        .iter()
        .map(|o| {
            running += o.realized_pnl;
            PnlPoint {
                time: o.created_at,
                cumulative_pnl: running,
            }
        })
        .collect();

    PnlSeries {
        total_realized_pnl: running,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use serde_json::Map;

    fn order(symbol: &str, pnl: Decimal, created_secs: i64) -> NormalizedOrder {
        let ts = DateTime::<Utc>::from_timestamp(created_secs, 0).unwrap();
        NormalizedOrder {
            symbol: symbol.to_string(),
            realized_pnl: pnl,
            created_at: ts,
            updated_at: ts,
            extra: Map::new(),
        }
    }

    fn cumulative(series: &PnlSeries) -> Vec<Decimal> {
        series.points.iter().map(|p| p.cumulative_pnl).collect()
    }

    #[test]
    fn test_cumulative_sum_in_time_order() {
        // Oldest first: 5 then -2 then 3.
        let set = OrderSet::new(vec![
            order("A", dec!(5), 100),
            order("A", dec!(-2), 200),
            order("A", dec!(3), 300),
        ]);
        let series = aggregate(&set, &PairFilter::All);
        assert_eq!(cumulative(&series), vec![dec!(5), dec!(3), dec!(6)]);
        assert_eq!(series.total_realized_pnl, dec!(6));
        assert_eq!(series.final_value(), series.total_realized_pnl);
    }

    #[test]
    fn test_descending_api_order_is_reversed() {
        // Newest first, as the API returns it.
        let set = OrderSet::new(vec![
            order("A", dec!(3), 300),
            order("A", dec!(-2), 200),
            order("A", dec!(5), 100),
        ]);
        let series = aggregate(&set, &PairFilter::All);
        assert_eq!(cumulative(&series), vec![dec!(5), dec!(3), dec!(6)]);
        let times: Vec<_> = series.points.iter().map(|p| p.time.timestamp()).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn test_equal_timestamps_keep_reversed_order() {
        let set = OrderSet::new(vec![
            order("A", dec!(1), 100),
            order("A", dec!(10), 100),
        ]);
        let series = aggregate(&set, &PairFilter::All);
        assert_eq!(cumulative(&series), vec![dec!(10), dec!(11)]);
    }

    #[test]
    fn test_unordered_pages_are_sorted() {
        let set = OrderSet::new(vec![
            order("A", dec!(1), 200),
            order("A", dec!(2), 300),
            order("A", dec!(4), 100),
        ]);
        let series = aggregate(&set, &PairFilter::All);
        let times: Vec<_> = series.points.iter().map(|p| p.time.timestamp()).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert_eq!(cumulative(&series), vec![dec!(4), dec!(5), dec!(7)]);
    }

    #[test]
    fn test_filter_is_exact() {
        let set = OrderSet::new(vec![
            order("BTC_USDT", dec!(1), 300),
            order("ETH_USDT", dec!(100), 200),
            order("btc_usdt", dec!(1000), 150),
            order("BTC_USDT", dec!(2), 100),
        ]);
        let filter = PairFilter::Pair("BTC_USDT".into());
        let series = aggregate(&set, &filter);
        assert_eq!(series.len(), 2);
        assert_eq!(series.total_realized_pnl, dec!(3));

        let filtered = filter_orders(&set, &filter);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|o| o.symbol == "BTC_USDT"));
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let set = OrderSet::new(vec![
            order("BTC_USDT", dec!(1), 300),
            order("ETH_USDT", dec!(100), 200),
        ]);
        assert_eq!(filter_orders(&set, &PairFilter::All), set);
        let series = aggregate(&set, &PairFilter::All);
        assert_eq!(series.len(), set.len());
        assert_eq!(series.total_realized_pnl, dec!(101));
    }

    #[test]
    fn test_empty_set() {
        let series = aggregate(&OrderSet::default(), &PairFilter::All);
        assert!(series.is_empty());
        assert_eq!(series.total_realized_pnl, Decimal::ZERO);
        assert_eq!(series.final_value(), Decimal::ZERO);
    }

    #[test]
    fn test_filter_matching_nothing() {
        let set = OrderSet::new(vec![order("ETH_USDT", dec!(7), 1)]);
        let series = aggregate(&set, &PairFilter::Pair("BTC_USDT".into()));
        assert!(series.is_empty());
        assert_eq!(series.total_realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let set = OrderSet::new(vec![
            order("A", dec!(1.1), 3),
            order("B", dec!(-0.4), 2),
            order("A", dec!(2.25), 1),
        ]);
        let filter = PairFilter::Pair("A".into());
        assert_eq!(aggregate(&set, &filter), aggregate(&set, &filter));
        assert_eq!(aggregate(&set, &PairFilter::All), aggregate(&set, &PairFilter::All));
    }
}

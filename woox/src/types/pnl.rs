use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of the cumulative realized-PnL curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlPoint {
    pub time: DateTime<Utc>,
    pub cumulative_pnl: Decimal,
}

/// Total realized PnL plus its running sum in ascending time order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlSeries {
    pub total_realized_pnl: Decimal,
    pub points: Vec<PnlPoint>,
}

impl PnlSeries {
    /// Last cumulative value, or zero for an empty series.
    pub fn final_value(&self) -> Decimal {
        self.points
            .last()
            .map(|p| p.cumulative_pnl)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

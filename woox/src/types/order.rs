use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A numeric field that the API sends either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(serde_json::Number),
    Text(String),
}

impl NumericField {
    /// Parse as an exact decimal, accepting plain and scientific notation.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let text = self.to_string();
        let text = text.trim();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Number(n) => write!(f, "{n}"),
            NumericField::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for NumericField {
    fn from(v: f64) -> Self {
        match serde_json::Number::from_f64(v) {
            Some(n) => NumericField::Number(n),
            None => NumericField::Text(v.to_string()),
        }
    }
}

impl From<&str> for NumericField {
    fn from(v: &str) -> Self {
        NumericField::Text(v.to_string())
    }
}

/// One completed order as received from `GET /v1/orders`.
///
/// Only the fields the PnL computation reads are typed; everything else is
/// kept verbatim in `extra` for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    pub symbol: String,
    #[serde(default)]
    pub realized_pnl: Option<NumericField>,
    pub created_time: NumericField,
    pub updated_time: NumericField,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An order with parsed timestamps and a definite realized PnL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOrder {
    pub symbol: String,
    pub realized_pnl: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl NormalizedOrder {
    /// UTC calendar day the order was created on.
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Orders of one fetch cycle, in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderSet {
    orders: Vec<NormalizedOrder>,
}

impl OrderSet {
    pub fn new(orders: Vec<NormalizedOrder>) -> Self {
        Self { orders }
    }

    pub fn orders(&self) -> &[NormalizedOrder] {
        &self.orders
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedOrder> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn into_inner(self) -> Vec<NormalizedOrder> {
        self.orders
    }
}

impl From<Vec<NormalizedOrder>> for OrderSet {
    fn from(orders: Vec<NormalizedOrder>) -> Self {
        Self::new(orders)
    }
}

impl<'a> IntoIterator for &'a OrderSet {
    type Item = &'a NormalizedOrder;
    type IntoIter = std::slice::Iter<'a, NormalizedOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

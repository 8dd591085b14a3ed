use serde::{Deserialize, Serialize};

/// Envelope returned by `GET /v1/orders`.
///
/// Rows are kept as raw JSON here and validated into [`RawOrder`]s one by
/// one, so a bad row is reported as bad data rather than a bad envelope.
///
/// [`RawOrder`]: super::RawOrder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub success: bool,
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    pub meta: Option<PageMeta>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub records_per_page: u64,
    #[serde(default)]
    pub current_page: Option<u64>,
}

impl PageMeta {
    /// Whether more pages follow `page` (1-based).
    pub fn has_more(&self, page: u64) -> bool {
        self.total > page.saturating_mul(self.records_per_page)
    }
}

//! Paginated retrieval of the completed-order history.
//!
//! Pages are requested one after another because only the previous page's
//! `meta` says whether another one exists. A fetch is all-or-nothing: the
//! first failing page discards everything accumulated so far.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{Result, WooxError};
use crate::rest::WooxHttpClient;
use crate::signing::Credentials;
use crate::types::{QueryWindow, RawOrder};

/// Message used when the API rejects a request without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Anything that can produce the full raw order list for a window.
pub trait OrderSource: Send + Sync {
    fn fetch_all(
        &self,
        credentials: &Credentials,
        window: &QueryWindow,
    ) -> impl Future<Output = Result<Vec<RawOrder>>> + Send;
}

impl OrderSource for WooxHttpClient {
    fn fetch_all(
        &self,
        credentials: &Credentials,
        window: &QueryWindow,
    ) -> impl Future<Output = Result<Vec<RawOrder>>> + Send {
        self.fetch_all_orders(credentials, window)
    }
}

impl WooxHttpClient {
    /// Fetch every page of completed orders for `window`.
    ///
    /// Rows are returned in page-concatenation order.
    ///
    /// # Errors
    ///
    /// - `WooxError::Request` / `WooxError::Http` for transport failures.
    /// - `WooxError::Api` when a page reports `success: false`.
    /// - `WooxError::MalformedResponse` for a missing or unusable `meta`, or
    ///   when the rows received disagree with `meta.total`.
    /// - `WooxError::InvalidRow` when a row does not match the order schema.
    pub async fn fetch_all_orders(
        &self,
        credentials: &Credentials,
        window: &QueryWindow,
    ) -> Result<Vec<RawOrder>> {
        let mut rows: Vec<RawOrder> = Vec::new();
        let mut page: u64 = 1;

        loop {
            if page > 1 && !self.page_interval().is_zero() {
                tokio::time::sleep(self.page_interval()).await;
            }

            let resp = self.get_orders_page(credentials, window, page).await?;

            if !resp.success {
                let message = resp
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                warn!(page, message = %message, "order history request rejected");
                return Err(WooxError::Api(message));
            }

            let meta = resp.meta.ok_or_else(|| {
                WooxError::MalformedResponse(format!("page {page}: missing pagination metadata"))
            })?;
            if meta.records_per_page == 0 && meta.total > 0 {
                return Err(WooxError::MalformedResponse(format!(
                    "page {page}: records_per_page is 0 with {} records",
                    meta.total
                )));
            }

            let offset = rows.len();
            let received = resp.rows.len();
            if (offset + received) as u64 > meta.total {
                return Err(WooxError::MalformedResponse(format!(
                    "page {page}: {} rows received but total is {}",
                    offset + received,
                    meta.total
                )));
            }
            if received == 0 && meta.has_more(page) {
                return Err(WooxError::MalformedResponse(format!(
                    "page {page}: no rows but total {} not reached",
                    meta.total
                )));
            }

            for (i, value) in resp.rows.into_iter().enumerate() {
                let order = serde_json::from_value::<RawOrder>(value).map_err(|e| {
                    WooxError::InvalidRow {
                        row: offset + i,
                        reason: e.to_string(),
                    }
                })?;
                rows.push(order);
            }

            debug!(
                page,
                received,
                accumulated = rows.len(),
                total = meta.total,
                "fetched order page"
            );

            if !meta.has_more(page) {
                break;
            }
            page += 1;
        }

        Ok(rows)
    }
}

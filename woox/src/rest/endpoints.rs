use crate::error::Result;
use crate::rest::WooxHttpClient;
use crate::signing::Credentials;
use crate::types::*;

impl WooxHttpClient {
    // --- Orders ---

    /// GET /v1/orders - One page of completed orders with realized PnL.
    pub async fn get_orders_page(
        &self,
        credentials: &Credentials,
        window: &QueryWindow,
        page: u64,
    ) -> Result<OrdersResponse> {
        let params = window.order_params(page);
        self.get_signed("/v1/orders", &params, credentials).await
    }
}

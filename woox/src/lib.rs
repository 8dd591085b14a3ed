pub mod aggregate;
pub mod config;
pub mod error;
pub mod history;
pub mod normalize;
pub mod refresh;
pub mod rest;
pub mod signing;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Client + config + errors
pub use config::{WooxConfig, WOOX_MAINNET_URL};
pub use error::{ErrorInfo, ErrorKind, Result, WooxError};
pub use rest::WooxHttpClient;

// Signing
pub use signing::{sign, Credentials};

// Order history
pub use history::OrderSource;
pub use types::{NormalizedOrder, NumericField, OrderSet, OrdersResponse, PageMeta, RawOrder};

// Queries
pub use types::{PairFilter, QueryWindow, QuickRange, TimeRange, NO_PAIR_FILTER};

// PnL
pub use aggregate::{aggregate, filter_orders};
pub use normalize::normalize;
pub use types::{PnlPoint, PnlSeries};

// Refresh scheduling
pub use refresh::{
    run_cycle, CycleReport, RefreshHandle, RefreshScheduler, RefreshSettings, RefreshState,
};

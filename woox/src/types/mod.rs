pub mod order;
pub mod page;
pub mod pnl;
pub mod query;

pub use order::{NormalizedOrder, NumericField, OrderSet, RawOrder};
pub use page::{OrdersResponse, PageMeta};
pub use pnl::{PnlPoint, PnlSeries};
pub use query::{PairFilter, QueryWindow, QuickRange, TimeRange, NO_PAIR_FILTER};

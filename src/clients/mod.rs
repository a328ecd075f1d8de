//! HTTP clients for the scraped endpoints

pub mod dtl;
pub mod eth;
pub mod pos;

pub use dtl::DtlClient;
pub use eth::EthRpcClient;
pub use pos::PosClient;

use std::time::Duration;

/// Client-level HTTP timeout, matching the per-read deadline enforced by the
/// scrape loops.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

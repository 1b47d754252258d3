// ── Query cache ──
//
// Keyed, coalescing cache for server resources with prefix invalidation
// and per-key subscriptions.

mod cache;
pub mod key;
mod state;

pub use cache::QueryCache;
pub use key::{BOARDS, DEPLOYMENTS, KeySegment, QueryKey, ResourceKeys, openstack_health, system_status};
pub use state::{QueryOptions, QueryState, QueryStatus, QueryWatch};

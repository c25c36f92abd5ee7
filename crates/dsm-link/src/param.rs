use async_trait::async_trait;
use dsm_types::{CasOutcome, PeerId};

use crate::error::LinkResult;

/// Client side of the parameter server.
///
/// `id` identifies the calling participant. The server records it as the
/// slot's last writer; it does not affect the outcome of any call.
#[async_trait]
pub trait ParamClient: Send + Sync {
    /// Register a slot initialised to `0`.
    async fn register_param(&self, name: &str) -> LinkResult<()>;

    async fn deregister_param(&self, name: &str) -> LinkResult<()>;

    async fn read_param(&self, id: PeerId, name: &str) -> LinkResult<i64>;

    async fn write_param(&self, id: PeerId, name: &str, value: i64) -> LinkResult<()>;

    /// Replace the slot value with `new` only if it equals `expected`.
    async fn compare_and_swap(
        &self,
        id: PeerId,
        name: &str,
        expected: i64,
        new: i64,
    ) -> LinkResult<CasOutcome>;
}

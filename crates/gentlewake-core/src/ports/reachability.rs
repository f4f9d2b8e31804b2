//! Bridge reachability port (driven/secondary port)

/// Cheap check that the bridge can be reached at all
///
/// Run before a synchronization is attempted. Implementations must bound
/// the check with a short timeout and never fail: an error is "unreachable".
#[async_trait::async_trait]
pub trait IReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

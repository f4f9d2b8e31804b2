//! Bridge reachability probe
//!
//! A TCP connect to the bridge's HTTP port, bounded by a short timeout.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use gentlewake_core::config::BridgeConfig;
use gentlewake_core::ports::IReachabilityProbe;

use crate::HueError;

/// Checks whether the bridge accepts TCP connections
#[derive(Debug, Clone)]
pub struct BridgeProbe {
    address: String,
    port: u16,
    timeout: Duration,
}

impl BridgeProbe {
    pub fn new(address: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            port,
            timeout,
        }
    }

    /// Creates a probe from the bridge section of the configuration
    ///
    /// # Errors
    /// Returns [`HueError::NotConfigured`] if no address is set
    pub fn from_config(config: &BridgeConfig) -> Result<Self, HueError> {
        let address = config
            .address
            .as_deref()
            .ok_or(HueError::NotConfigured("bridge.address"))?;
        Ok(Self::new(
            address,
            config.port,
            Duration::from_millis(config.reachability_timeout_ms),
        ))
    }
}

#[async_trait::async_trait]
impl IReachabilityProbe for BridgeProbe {
    async fn is_reachable(&self) -> bool {
        let target = (self.address.as_str(), self.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(address = %self.address, port = self.port, error = %e, "Bridge refused connection");
                false
            }
            Err(_) => {
                debug!(
                    address = %self.address,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Bridge probe timed out"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listening_port_is_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = BridgeProbe::new("127.0.0.1", port, Duration::from_secs(2));
        assert!(probe.is_reachable().await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = BridgeProbe::new("127.0.0.1", port, Duration::from_secs(2));
        assert!(!probe.is_reachable().await);
    }

    #[test]
    fn test_from_config_requires_address() {
        let config = BridgeConfig::default();
        assert!(BridgeProbe::from_config(&config).is_err());
    }
}

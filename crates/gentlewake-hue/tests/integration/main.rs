//! Integration tests for gentlewake-hue
//!
//! Uses wiremock to simulate a Hue bridge and verifies end-to-end behavior
//! of the HueClient and the cached HueBridgeGateway.

mod common;

mod test_client;
mod test_gateway;

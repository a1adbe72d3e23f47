//! Validates GitHub organization webhooks delivered through API Gateway and republishes
//! the ones of interest onto an EventBridge bus.
pub mod bus;
pub mod config;
pub mod envelope;
pub mod forwarder;
pub mod handler;
pub mod replay;

//! Cross-service messaging: envelopes, topic routing, publishing, and the
//! consumer framework with bounded retry and dead-lettering.

pub mod broker;
pub mod consumer;
pub mod envelope;
pub mod publisher;
pub mod topics;

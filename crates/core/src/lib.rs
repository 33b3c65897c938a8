//! Beacon Core — multi-tenant school attendance and safeguarding platform:
//! message envelope and routing, SIS connectors, ingestion, and database layer.

pub mod config;
pub mod connectors;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod messaging;
pub mod models;
pub mod scope;

#![doc = "publish-table-core: core pipeline for publishing vault notes as a Notion table."]

//! This crate contains the record model, the remote-API contract, the fixed table
//! schema, the publish orchestrator and the vault reader. It has no HTTP dependency;
//! the concrete API client lives in the `publish-table` binary crate.
//!
//! # Usage
//! Aggregate notes with [`aggregate::aggregate`], probe credentials with
//! [`probe::verify_access`], then run [`publish::publish`] against any
//! [`contract::TablePublisher`].

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod contract;
pub mod probe;
pub mod publish;
pub mod schema;
pub mod vault;

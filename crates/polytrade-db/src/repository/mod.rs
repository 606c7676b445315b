//! # Repository Layer
//!
//! Data access, one repository per concern:
//! - [`kv`]     - Raw key/value operations on the local store
//! - [`ledger`] - Deal/inventory/test-report snapshots as JSON blobs

pub mod kv;
pub mod ledger;

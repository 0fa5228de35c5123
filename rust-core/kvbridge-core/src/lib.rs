// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kvbridge core
//
// Exposes a record-oriented CRUD interface (read / insert / update / delete
// / scan over tables of keyed, multi-field records) on top of a store that
// only maps flat string keys to single string values.
//
// # Modules
//
// - [`key`] -- Composite key construction from (table, record key).
// - [`codec`] -- Record encoding to one string value and projected decoding.
// - [`driver`] -- `KvDriver`, the request translator over the store primitives.
// - [`config`] -- `DriverConfig` from harness properties or the environment.
// - [`status`] -- `Status` codes returned at the CRUD boundary.
// - [`error`] -- `DriverError`, mapped to a `Status` before it reaches callers.

pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod key;
pub mod status;

pub use codec::{decode, encode, DecodeError, EncodeError, FieldSet, Record, RecordEncoder};
pub use config::{ConfigError, DriverConfig};
pub use driver::KvDriver;
pub use error::{DriverError, DriverResult};
pub use key::{compose_key, decompose_key};
pub use status::Status;

//! # Database Module
//!
//! Everything between a read worksheet and the destination: identifier naming, type inference,
//! table planning, value conversion and the [`connector::Connector`] seam with its DuckDB and
//! in-memory implementations.
pub mod column;
pub mod connector;
pub mod duckdb_connector;
pub mod inference;
pub mod memory;
pub mod naming;
pub mod table;
pub mod value;

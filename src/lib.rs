//! ipfilter - Select table rows whose IP address falls inside a set of subnets.
//!
//! This crate builds a reusable predicate from a list of CIDR subnets. The
//! predicate reads one field of a row (the host's active column), parses it
//! as an IPv4 or IPv6 address and reports whether any subnet contains it.
//!
//! # Features
//!
//! - **Parse once**: subnets are validated when the filter is built; an invalid
//!   entry fails the whole build with [`InvalidSubnetError`]
//! - **Never fails per row**: missing fields and unparseable values are simply
//!   not selected
//! - **Family aware**: IPv4 addresses never match IPv6 subnets and vice versa
//! - **Thread-safe**: filters are immutable and can be shared freely
//! - **Injected tracing**: diagnostics go through a [`Tracer`], silent by default
//!
//! # Quick Start
//!
//! ```
//! use ipfilter::SubnetFilter;
//! use std::collections::HashMap;
//!
//! let filter = SubnetFilter::build(["192.168.1.0/24", "10.0.0.0/8"]).unwrap();
//!
//! let mut row = HashMap::new();
//! row.insert("ip_column".to_string(), "10.5.5.5".to_string());
//! assert!(filter.test(&row, "ip_column"));
//! assert!(!filter.test(&row, "other_column"));
//! ```
//!
//! # Subnet Parsing
//!
//! By default parsing is loose: `192.168.1.5/24` is accepted and treated as
//! `192.168.1.0/24`. Use [`ParseMode::Strict`] to reject such entries.
//! A prefix length is always required.

mod error;

pub mod config;
pub mod filter;
pub mod row;
pub mod select;
pub mod source;
pub mod trace;

/// Crate version, reported when the CLI starts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export core types
pub use error::{Error, InvalidSubnetError, Result, SubnetErrorKind};
pub use filter::{parse_address, FilterBuilder, ParseMode, SubnetFilter};

// Re-export host-facing abstractions
pub use row::{ColumnContext, Cursor, Row};
pub use trace::{LogTracer, NoopTracer, Tracer};

// Re-export configuration, row sources and bulk selection
pub use config::FilterConfig;
pub use select::{check_addresses, select_rows, Format, SelectOptions, SelectSummary};
pub use source::{read_json_lines, DelimitedReader, JsonLine, Record};

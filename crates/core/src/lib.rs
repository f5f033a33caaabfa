//! SchoolMall Core - Shared types library.
//!
//! This crate provides the types and rules shared by the SchoolMall binaries:
//! - `server` - Public storefront API and the `/admin` API
//! - `cli` - Command-line tools for migrations, admin accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The order status table and order
//! pricing live here so both binaries and the tests agree on them.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, emails, slugs, statuses and order planning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

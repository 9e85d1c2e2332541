#![deny(missing_docs)]

//! # Route generator
//!
//! Fetches a registry delegation feed, aggregates the selected region into
//! CIDR blocks with the [`routes`] crate and renders them as route scripts
//! for a VPN client platform.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod output;
pub mod platform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

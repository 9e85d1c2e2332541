#![deny(missing_docs)]

//! # Routes
//!
//! Derives the minimal set of CIDR blocks covering a region's share of
//! the IPv4 address space from a registry's delegation feed, with the
//! RFC 1918 private blocks always left out.
//!
//! ```
//! use routes::builder::build_routes;
//! use routes::region::Region;
//!
//! let feed = [
//!     "apnic|CN|ipv4|1.0.0.0|256|20110414|allocated",
//!     "apnic|CN|ipv4|1.0.1.0|256|20110414|allocated",
//! ];
//! let routes = build_routes(Region::China, "apnic", feed).unwrap();
//! assert_eq!(routes.blocks[0].to_string(), "1.0.0.0/23");
//! ```

pub mod address;
pub mod aggregate;
pub mod builder;
pub mod cidr;
pub mod error;
pub mod feed;
pub mod private;
pub mod region;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::error::Error;

//! The gofer synthetic write-load generator.
//!
//! This library supports the gofer binary found elsewhere in this project:
//! a pool of concurrent writers that authenticate against an HTTP service,
//! hold a WebSocket open against a metrics intake endpoint and push random
//! measurements at it until the process is interrupted. The bits and pieces
//! here are not intended to be used outside of supporting gofer, although
//! if they are helpful in other domains that's a nice surprise.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod auth;
pub mod config;
pub mod measurement;
pub mod writer;

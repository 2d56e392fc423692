//! Everything QUERY2 wire-format codecs.
//!
//! # Crate Structure
//!
//! - [`wire`] — Request, result-list and item codecs plus the flag vocabulary
//!
//! The `everipc` binary (behind the `cli` feature) prints structure layouts
//! and encodes or decodes QUERY2 buffers from the command line.

/// Re-export wire types.
pub mod wire {
    pub use everipc_wire::*;
}

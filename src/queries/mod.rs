//! Read-only query layer over the product graph.
//!
//! Every query is stateless and issues a single read; an identifier that
//! matches no node yields an empty result, never an error.

pub mod catalog;
pub mod recommend;
pub mod stats;

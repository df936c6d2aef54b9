//! Graph algorithms over a [`NetworkView`](super::NetworkView)
//!
//! Both operate on positional node indices and weighted adjacency lists,
//! leaving id bookkeeping to the callers.

pub mod centrality;
pub mod community;

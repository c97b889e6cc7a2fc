//! Batched parallel map with result aggregation.
//!
//! A run enumerates work items from a [`source`], splits them into contiguous
//! batches ([`batch`]), hands each batch to an [`executor`], and stores the
//! records that come back ([`storage`]). Stored records are folded into
//! series and word counts ([`aggregate`]) and rendered as HTML ([`report`]).

pub mod aggregate;
pub mod batch;
pub mod cli;
pub mod config;
pub mod executor;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod storage;

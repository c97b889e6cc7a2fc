//! Core data model for fanout.
//!
//! Work items go in, result records come out. Runs tie one pass of the
//! pipeline together.

mod record;
mod run;
mod work_item;

pub use record::ResultRecord;
pub use run::RunSummary;
pub use work_item::WorkItem;

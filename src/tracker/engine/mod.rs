//! Sync planning and merge logic.
//!
//! This module is the **Functional Core** of the tracker:
//! - **Planner**: which watched addresses to query, in which groups, from which height.
//! - **Merge**: how fetched results fold into existing address records.
//!
//! # Architecture guarantees
//! * **No Network**: nothing here talks to the chain service or the store.
//! * **No Async**: every function is plain, blocking and cheap.
//! * **Deterministic**: the same inputs always produce the same output, so the runtime can
//!   re-apply a merge without changing the result.

mod merge;
mod planner;


pub use merge::{apply_batch_results, merge_records, merge_tx_ids};
pub use planner::{plan_batches, Batch};

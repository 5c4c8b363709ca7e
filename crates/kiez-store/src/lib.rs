//! # kiez-store
//!
//! Durable storage for the event/article/reflection pool.
//!
//! Each collection is a directory of one-JSON-file-per-record under the
//! data directory. Writes are atomic (temp file + rename), reads are full
//! linear scans — pool sizes are hundreds of records, not millions, so
//! scan + filter/sort beats any index.
//!
//! The store assumes a single writer (one pipeline run at a time). The
//! check-then-write sequence in [`RecordStore::save_event`] is not locked:
//! two concurrent scouting runs racing on the same dedup key could both
//! pass the "not found" check and create two records. That race is
//! accepted for the batch-job usage pattern and documented here rather
//! than papered over with file locks.

#![deny(unsafe_code)]

pub mod errors;
pub mod pool;
pub mod store;

pub use errors::StoreError;
pub use pool::EventSave;
pub use store::RecordStore;

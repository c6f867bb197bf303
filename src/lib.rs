//! Batch attribution repair for the sales CRM.
//!
//! One-shot job: fetch the identity and sale-record collections wholesale,
//! detect mis-attributed records, fuzzy-resolve personnel names against the
//! identity index, and apply the corrections in throttled chunks after
//! explicit operator confirmation.

pub mod aliases;
pub mod config;
pub mod index;
pub mod job;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;
pub mod updater;
pub mod util;

//! `nodewatch-recon`: node snapshot reconciliation engine.
//!
//! Pure engine crate: receives a parsed payload and the prior record set,
//! returns classified results. No CLI, IO or logging dependencies; callers
//! observe decisions through [`PassObserver`].

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod model;
pub mod observer;

pub use config::{Ipv6Policy, ReconOptions, WriteOrder};
pub use engine::run;
pub use error::ReconError;
pub use model::{
    Classification, FieldChange, NodeRecord, PayloadShape, ReconResult, ReconSummary, RecordSet,
    UpdatedRecord, FIELD_NAMES,
};
pub use observer::{PassObserver, Silent};

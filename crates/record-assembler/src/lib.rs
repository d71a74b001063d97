//! Record Assembly and Persistence
//!
//! Packages parsed samples, statistics, fatigue level and derived metrics into
//! persistable records and writes them to the document store:
//! - `users/{uid}/analyses` receives the general analysis record
//! - `users/{uid}/eyeTests` receives the eye-test record (a strict superset)

mod assembler;
mod context;
mod error;
mod record;
mod service;
mod settings;

pub use assembler::{AnalysisRequest, AssemblerConfig, RecordAssembler};
pub use context::{Identity, RecordKind};
pub use error::{AssemblyError, ServiceError};
pub use record::{AnalysisRecord, EyeTestRecord, PersistedRecord};
pub use service::{AnalysisService, SavedAnalysis};
pub use settings::{PupilSelection, Settings, TvModel};

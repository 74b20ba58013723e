pub mod error;
pub mod guard;
pub mod scheduler;
pub mod service;

pub use error::RefreshError;
pub use guard::{RefreshGuard, RefreshPermit};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
pub use service::{
    PassOutcome, RefreshAllSummary, RefreshOneSummary, RefreshService, RefreshServiceApi,
};

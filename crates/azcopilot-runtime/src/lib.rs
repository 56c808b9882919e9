//! Execution side of the pipeline.
//!
//! [`dispatcher::Dispatcher`] runs planned actions against an
//! [`port::AzureOperationsPort`] and records every outcome on an
//! [`audit::AuditSink`]. [`memory::InMemoryBackend`] is the sandbox backend.

pub mod audit;
pub mod dispatcher;
pub mod memory;
pub mod port;

pub use audit::{AuditEvent, AuditSink, RecordingAuditSink, TracingAuditSink};
pub use dispatcher::{CancelFlag, Confirmations, Dispatcher};
pub use memory::{InMemoryBackend, InventoryError};
pub use port::{
    AzureOperationsPort, BackendError, BackendErrorKind, CreateResourceParams, ResourceFilter,
};

//! Audit recording service.

mod service;

pub use service::{AuditService, AuditServiceConfig};

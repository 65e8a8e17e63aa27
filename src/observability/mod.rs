//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!
//! Consumers:
//!     → stderr, pretty for operators or JSON for log collectors
//! ```
//!
//! # Design Decisions
//! - Structured fields (`sender = %addr`) rather than formatted strings
//! - Secrets never appear in fields

pub mod logging;

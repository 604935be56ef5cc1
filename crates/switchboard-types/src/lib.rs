//! # Switchboard Types
//!
//! Core types, models, and error definitions for the Switchboard orchestrator.
//!
//! This crate provides the foundational type system for Switchboard:
//!
//! - **`error`** - Typed error hierarchy for orchestration and configuration
//! - **`models`** - Domain models (providers, requests, config, usage snapshots)
//!
//! ## Architecture Role
//!
//! `switchboard-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!     switchboard-types (this crate)
//!             │
//!             ▼
//!     switchboard-core
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API/IPC
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, FailureKind, OrchestratorError, ProviderAttempt, Result};

// Re-export core model types
pub use models::{
    AiRequest, BreakerConfig, Completion, CredentialEntry, CredentialStatus, CredentialUsage,
    HealthReport, HealthStatus, OrchestratorConfig, ProviderConfig, ProviderHealth, ProviderId,
    ProviderUsage, RetryConfig, UsageSnapshot,
};

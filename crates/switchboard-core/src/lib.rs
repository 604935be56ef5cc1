//! # Switchboard Core
//!
//! Multi-provider AI request orchestration.
//!
//! One logical "make this AI call" request goes in; a normalized response or
//! a typed failure comes out, despite multiple interchangeable upstream
//! providers, each with multiple credentials, unreliable availability, and
//! per-credential rate limits.
//!
//! ```text
//! switchboard-core/src/
//! ├── credentials/      # Per-provider credential pools with health state
//! ├── circuit_breaker/  # Per-provider fast-fail state machine
//! ├── retry/            # Pure backoff schedule
//! ├── usage/            # Thread-safe usage counters + snapshots
//! ├── health/           # Background provider probing
//! ├── transport/        # Provider transport seam + HTTP implementation
//! ├── orchestrator/     # The façade callers interact with
//! └── config.rs         # JSON config file loading
//! ```
//!
//! State is process-lifetime only: rate limits expire on their own, restarts
//! re-probe disabled credentials, and nothing is persisted.

pub mod circuit_breaker;
pub mod config;
pub mod credentials;
pub mod health;
pub mod orchestrator;
pub mod retry;
pub mod transport;
pub mod usage;

// Re-export commonly used types
pub use orchestrator::Orchestrator;
pub use switchboard_types::{
    AiRequest, Completion, FailureKind, OrchestratorConfig, OrchestratorError, ProviderId, Result,
};

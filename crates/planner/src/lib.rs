//! Expansion Planner: market analysis and execution-plan generation
//!
//! Provides:
//! - Deterministic prompt builders for market analysis, execution plans and chat
//! - An OpenAI-compatible completion client behind the `CompletionProvider` trait
//! - Bounded exponential-backoff retry with per-attempt timeouts
//! - Schema validation with 0-10 score clamping and plan-phase normalization
//! - The `Strategist` orchestrator tying the stages together

pub mod api;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod schema;
pub mod score;
pub mod types;

// Re-exports for convenience
pub use api::{CompletionProvider, CompletionRequest, OpenAiClient};
pub use config::PlannerConfig;
pub use error::{CompletionError, ConfigError, PipelineError, Stage};
pub use normalize::{normalize_execution_plan, PlanPhase};
pub use orchestrator::{CompletionSettings, Strategist};
pub use prompts::{build_analysis_prompt, build_chat_prompt, build_execution_plan_prompt};
pub use retry::{with_retry, RetryPolicy};
pub use schema::{validate_execution_plan, validate_market_analysis, Violation, ViolationKind};
pub use score::clamp_score;
pub use types::*;

//! Analysis orchestrator: one request flow per endpoint
//!
//! Every flow walks the same stages: validate caller input, build the prompt,
//! request a completion (with retry), parse the raw text as JSON, normalize,
//! validate against the schema. Any failure short-circuits with a
//! [`PipelineError`] that names its stage; nothing partial is returned.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::{CompletionProvider, CompletionRequest, OpenAiClient};
use crate::config::{PlannerConfig, MAX_TOKENS_ANALYSIS, MAX_TOKENS_CHAT, TEMPERATURE};
use crate::error::{ConfigError, PipelineError};
use crate::normalize::normalize_plan_payload;
use crate::prompts::{
    build_analysis_prompt, build_chat_prompt, build_execution_plan_prompt, CHAT_SYSTEM_PROMPT,
    SYSTEM_PROMPT,
};
use crate::retry::{with_retry, RetryPolicy};
use crate::schema::{validate_execution_plan, validate_market_analysis};
use crate::types::{
    ChatAnswer, ChatMessage, ChatRequest, ExecutionPlan, ExecutionPlanRequest, MarketAnalysis,
    MarketAnalysisRequest, MarketRecord, Role, Scenario, StrategyResult,
};

/// Sampling parameters per flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    pub temperature: f32,
    pub max_tokens_structured: u32,
    pub max_tokens_chat: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            max_tokens_structured: MAX_TOKENS_ANALYSIS,
            max_tokens_chat: MAX_TOKENS_CHAT,
        }
    }
}

/// Request handler for the analysis, execution-plan, strategy and chat flows.
///
/// Holds only immutable configuration and a shared provider, so one instance
/// serves any number of concurrent requests.
#[derive(Clone)]
pub struct Strategist {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
    settings: CompletionSettings,
}

// ---------------------------------------------------------------------------
// Input checks (stage: Received)
// ---------------------------------------------------------------------------

fn require_market(market: Option<MarketRecord>) -> Result<MarketRecord, PipelineError> {
    let market =
        market.ok_or_else(|| PipelineError::InvalidInput("Market data is required".into()))?;
    market.check()?;
    Ok(market)
}

fn require_scenario(scenario: Option<&str>) -> Result<Scenario, PipelineError> {
    match scenario {
        Some(label) if !label.trim().is_empty() => label.parse(),
        _ => Err(PipelineError::InvalidInput("Scenario is required".into())),
    }
}

fn report<T>(flow: &'static str, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
    if let Err(e) = &result {
        if e.is_client_error() {
            warn!(flow, error = %e, "Rejected request");
        } else {
            error!(flow, stage = ?e.stage(), error = %e, "Request failed");
        }
    }
    result
}

impl Strategist {
    pub fn new(provider: Arc<dyn CompletionProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            settings: CompletionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CompletionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Production wiring: an [`OpenAiClient`] built from `config`.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, ConfigError> {
        let client = OpenAiClient::new(config)?;
        info!(model = client.model(), retries = config.retry.max_retries, "Completion client ready");
        Ok(Self::new(Arc::new(client), config.retry))
    }

    // -----------------------------------------------------------------------
    // Public flows
    // -----------------------------------------------------------------------

    /// Market analysis for one country (scenario-independent).
    pub async fn market_analysis(
        &self,
        request: MarketAnalysisRequest,
    ) -> Result<MarketAnalysis, PipelineError> {
        let result = match require_market(request.market) {
            Ok(market) => self.generate_analysis(&market).await,
            Err(e) => Err(e),
        };
        report("market_analysis", result)
    }

    /// Scenario-specific 90-day execution plan.
    pub async fn execution_plan(
        &self,
        request: ExecutionPlanRequest,
    ) -> Result<ExecutionPlan, PipelineError> {
        let result = match Self::plan_inputs(request) {
            Ok((market, scenario)) => self.generate_plan(&market, scenario).await,
            Err(e) => Err(e),
        };
        report("execution_plan", result)
    }

    /// Analysis and plan together; both run concurrently and both must
    /// succeed.
    pub async fn full_strategy(
        &self,
        request: ExecutionPlanRequest,
    ) -> Result<StrategyResult, PipelineError> {
        let result = match Self::plan_inputs(request) {
            Ok((market, scenario)) => tokio::try_join!(
                self.generate_analysis(&market),
                self.generate_plan(&market, scenario)
            )
            .map(|(analysis, execution_plan)| StrategyResult {
                analysis,
                execution_plan,
                scenario,
            }),
            Err(e) => Err(e),
        };
        report("full_strategy", result)
    }

    /// Free-text question grounded in optional market/analysis context.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatAnswer, PipelineError> {
        let result = self.answer(request).await;
        report("chat", result)
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    fn plan_inputs(request: ExecutionPlanRequest) -> Result<(MarketRecord, Scenario), PipelineError> {
        if request.market.is_none() || request.scenario.is_none() {
            return Err(PipelineError::InvalidInput(
                "Market and scenario are required".into(),
            ));
        }
        let market = require_market(request.market)?;
        let scenario = require_scenario(request.scenario.as_deref())?;
        Ok((market, scenario))
    }

    fn structured_request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            json_mode: true,
            max_tokens: self.settings.max_tokens_structured,
            temperature: self.settings.temperature,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, PipelineError> {
        let provider = self.provider.as_ref();
        let raw = with_retry(&self.retry, move || provider.complete(request)).await?;
        Ok(raw)
    }

    async fn generate_analysis(&self, market: &MarketRecord) -> Result<MarketAnalysis, PipelineError> {
        info!(country = %market.country, "Generating market analysis");
        let request = self.structured_request(build_analysis_prompt(market));

        let raw = self.complete(&request).await?;
        let payload: Value = serde_json::from_str(&raw)?;
        let analysis = validate_market_analysis(&payload)?;

        for warning in analysis.content_warnings() {
            warn!(country = %market.country, %warning, "Thin analysis content");
        }
        info!(
            country = %market.country,
            cities = analysis.best_cities.len(),
            risk = analysis.scenario_impact.risk,
            upside = analysis.scenario_impact.upside,
            "Market analysis validated"
        );
        Ok(analysis)
    }

    async fn generate_plan(
        &self,
        market: &MarketRecord,
        scenario: Scenario,
    ) -> Result<ExecutionPlan, PipelineError> {
        info!(country = %market.country, %scenario, "Generating execution plan");
        let request = self.structured_request(build_execution_plan_prompt(market, scenario));

        let raw = self.complete(&request).await?;
        let mut payload: Value = serde_json::from_str(&raw)?;
        normalize_plan_payload(&mut payload);
        let plan = validate_execution_plan(&payload)?;

        info!(country = %market.country, %scenario, "Execution plan validated");
        Ok(plan)
    }

    async fn answer(&self, request: ChatRequest) -> Result<ChatAnswer, PipelineError> {
        let question = request
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| PipelineError::InvalidInput("Question is required".into()))?;

        if request.history.iter().any(|m| m.role == Role::System) {
            return Err(PipelineError::InvalidInput(
                "chat history may only contain user and assistant messages".into(),
            ));
        }

        let prompt = build_chat_prompt(
            question,
            request.market_context.as_ref(),
            request.strategy_context.as_ref(),
        );
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage::system(CHAT_SYSTEM_PROMPT));
        messages.extend(request.history);
        messages.push(ChatMessage::user(prompt));

        let completion = CompletionRequest {
            messages,
            json_mode: false,
            max_tokens: self.settings.max_tokens_chat,
            temperature: self.settings.temperature,
        };
        let answer = self.complete(&completion).await?;
        Ok(ChatAnswer {
            answer: answer.trim().to_string(),
        })
    }
}

//! Types for the analysis pipeline: market inputs, scenarios, validated results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

const PLACEHOLDER_TEXT: &str = "Custom market - analyzing based on available data";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A country market as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub country: String,
    pub code: String,
    pub population: u64,
    pub gdp_per_capita: f64,
    pub sports_culture: String,
    pub media_landscape: String,
    pub regulation_notes: String,
}

impl MarketRecord {
    /// Fallback record for a user-added market with no seed data.
    pub fn placeholder(name: &str) -> Self {
        let name = name.trim();
        Self {
            country: name.to_string(),
            code: name.chars().take(2).collect::<String>().to_uppercase(),
            population: 0,
            gdp_per_capita: 0.0,
            sports_culture: PLACEHOLDER_TEXT.to_string(),
            media_landscape: PLACEHOLDER_TEXT.to_string(),
            regulation_notes: PLACEHOLDER_TEXT.to_string(),
        }
    }

    /// Reject records the prompt builder cannot render meaningfully.
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.country.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "market.country must not be empty".into(),
            ));
        }
        if !self.gdp_per_capita.is_finite() || self.gdp_per_capita < 0.0 {
            return Err(PipelineError::InvalidInput(format!(
                "market.gdpPerCapita must be a non-negative number, got {}",
                self.gdp_per_capita
            )));
        }
        Ok(())
    }
}

/// Strategic posture used by the execution-plan flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "Low Regulation")]
    LowRegulation,
    #[serde(rename = "High Capital")]
    HighCapital,
    #[serde(rename = "Media-First")]
    MediaFirst,
    #[serde(rename = "Athlete-First")]
    AthleteFirst,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::LowRegulation,
        Scenario::HighCapital,
        Scenario::MediaFirst,
        Scenario::AthleteFirst,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LowRegulation => "Low Regulation",
            Self::HighCapital => "High Capital",
            Self::MediaFirst => "Media-First",
            Self::AthleteFirst => "Athlete-First",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scenario {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "unknown scenario '{}', expected one of: Low Regulation, High Capital, Media-First, Athlete-First",
                    wanted
                ))
            })
    }
}

/// Who said a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a chat conversation (also used for outbound prompt messages)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

// ---------------------------------------------------------------------------
// Request envelopes
// ---------------------------------------------------------------------------

/// Body of `POST /market-analysis`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketAnalysisRequest {
    pub market: Option<MarketRecord>,
}

/// Body of `POST /execution-plan` and `POST /strategy`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionPlanRequest {
    pub market: Option<MarketRecord>,
    pub scenario: Option<String>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: Option<String>,
    pub market_context: Option<MarketContext>,
    pub strategy_context: Option<StrategyContext>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Market fields a chat client may attach; any of them can be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketContext {
    pub country: Option<String>,
    pub code: Option<String>,
    pub population: Option<f64>,
    pub gdp_per_capita: Option<f64>,
    pub sports_culture: Option<String>,
    pub media_landscape: Option<String>,
    pub regulation_notes: Option<String>,
}

impl From<&MarketRecord> for MarketContext {
    fn from(m: &MarketRecord) -> Self {
        Self {
            country: Some(m.country.clone()),
            code: Some(m.code.clone()),
            population: Some(m.population as f64),
            gdp_per_capita: Some(m.gdp_per_capita),
            sports_culture: Some(m.sports_culture.clone()),
            media_landscape: Some(m.media_landscape.clone()),
            regulation_notes: Some(m.regulation_notes.clone()),
        }
    }
}

/// Analysis fragment attached to a chat question. Accepts a full
/// `MarketAnalysis`, a strategy payload, or any partial object; unknown
/// members such as `executionPlan` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyContext {
    pub soft_scores: Option<SoftScoresContext>,
    pub scenario_impact: Option<ScenarioImpactContext>,
    pub geopolitical_assessment: Option<GeopoliticalContext>,
    pub narrative: Option<NarrativeContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftScoresContext {
    pub cultural_fit: Option<f64>,
    pub regulatory_friendliness: Option<f64>,
    pub media_potential: Option<f64>,
    pub sponsorship_appetite: Option<f64>,
    pub infrastructure_readiness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioImpactContext {
    pub risk: Option<f64>,
    pub upside: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeopoliticalContext {
    pub risk_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NarrativeContext {
    pub summary: Option<String>,
}

impl From<&MarketAnalysis> for StrategyContext {
    fn from(a: &MarketAnalysis) -> Self {
        let s = &a.soft_scores;
        Self {
            soft_scores: Some(SoftScoresContext {
                cultural_fit: Some(s.cultural_fit),
                regulatory_friendliness: Some(s.regulatory_friendliness),
                media_potential: Some(s.media_potential),
                sponsorship_appetite: Some(s.sponsorship_appetite),
                infrastructure_readiness: Some(s.infrastructure_readiness),
            }),
            scenario_impact: Some(ScenarioImpactContext {
                risk: Some(a.scenario_impact.risk),
                upside: Some(a.scenario_impact.upside),
            }),
            geopolitical_assessment: Some(GeopoliticalContext {
                risk_level: Some(a.geopolitical_assessment.risk_level.to_string()),
            }),
            narrative: Some(NarrativeContext {
                summary: Some(a.narrative.summary.clone()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftScores {
    pub cultural_fit: f64,
    pub regulatory_friendliness: f64,
    pub media_potential: f64,
    pub sponsorship_appetite: f64,
    pub infrastructure_readiness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioImpact {
    pub risk: f64,
    pub upside: f64,
    pub cost_index: f64,
}

/// Unbounded market-size style numbers (audience in millions, 0-100 rates)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    pub audience_size: f64,
    pub fitness_rate: f64,
    pub streaming_score: f64,
    pub sponsorship_value: f64,
    pub regulation_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const LABELS: [&'static str; 3] = ["Low", "Medium", "High"];

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeopoliticalAssessment {
    pub stability_score: f64,
    pub risk_level: RiskLevel,
    pub key_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: f64,
    pub advantages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub summary: String,
    pub reasons_to_enter: Vec<String>,
    pub key_risks: Vec<String>,
}

/// Validated market analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub soft_scores: SoftScores,
    pub scenario_impact: ScenarioImpact,
    pub market_insights: MarketInsights,
    pub geopolitical_assessment: GeopoliticalAssessment,
    pub best_cities: Vec<HostCity>,
    pub narrative: Narrative,
}

impl MarketAnalysis {
    /// Lists whose length falls outside what the prompt asked for. Never a
    /// validation failure.
    pub fn content_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut check = |path: &str, len: usize, min: usize, max: usize| {
            if len < min || len > max {
                warnings.push(format!(
                    "{} has {} item(s), expected {}-{}",
                    path, len, min, max
                ));
            }
        };

        check("bestCities", self.best_cities.len(), 3, 5);
        for (i, city) in self.best_cities.iter().enumerate() {
            check(&format!("bestCities.{}.advantages", i), city.advantages.len(), 2, 3);
        }
        let geo = &self.geopolitical_assessment;
        check("geopoliticalAssessment.keyFactors", geo.key_factors.len(), 3, 5);
        check("geopoliticalAssessment.recommendations", geo.recommendations.len(), 2, 3);
        check("narrative.reasonsToEnter", self.narrative.reasons_to_enter.len(), 3, 4);
        check("narrative.keyRisks", self.narrative.key_risks.len(), 3, 4);

        warnings
    }
}

/// Validated 90-day plan, one string per phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub week1to2: String,
    pub week3to4: String,
    pub week5to6: String,
    pub week7to8: String,
    pub week9to12: String,
}

impl ExecutionPlan {
    pub const PHASES: [&'static str; 5] =
        ["week1to2", "week3to4", "week5to6", "week7to8", "week9to12"];
}

/// Wire shape of a successful execution-plan response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlanResponse {
    pub execution_plan: ExecutionPlan,
}

/// Result of the combined analysis + plan operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub analysis: MarketAnalysis,
    pub execution_plan: ExecutionPlan,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_market() {
        let m = MarketRecord::placeholder("  portugal ");
        assert_eq!(m.country, "portugal");
        assert_eq!(m.code, "PO");
        assert_eq!(m.population, 0);
        assert_eq!(m.sports_culture, PLACEHOLDER_TEXT);
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_market_check_rejects_blank_country() {
        let m = MarketRecord::placeholder("   ");
        assert!(matches!(m.check(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_market_check_rejects_negative_gdp() {
        let mut m = MarketRecord::placeholder("Chile");
        m.gdp_per_capita = -1.0;
        assert!(matches!(m.check(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_market_wire_format_is_camel_case() {
        let json = serde_json::json!({
            "country": "Testland", "code": "TL", "population": 1000000,
            "gdpPerCapita": 5000, "sportsCulture": "x",
            "mediaLandscape": "y", "regulationNotes": "z"
        });
        let m: MarketRecord = serde_json::from_value(json).unwrap();
        assert_eq!(m.gdp_per_capita, 5000.0);
        assert_eq!(m.regulation_notes, "z");
    }

    #[test]
    fn test_negative_population_is_rejected_by_serde() {
        let json = serde_json::json!({
            "country": "X", "code": "X", "population": -3,
            "gdpPerCapita": 1, "sportsCulture": "", "mediaLandscape": "", "regulationNotes": ""
        });
        assert!(serde_json::from_value::<MarketRecord>(json).is_err());
    }

    #[test]
    fn test_scenario_labels_round_trip() {
        for sc in Scenario::ALL {
            assert_eq!(sc.label().parse::<Scenario>().unwrap(), sc);
            let wire = serde_json::to_value(sc).unwrap();
            assert_eq!(wire, serde_json::Value::String(sc.label().to_string()));
        }
        assert_eq!("media-first".parse::<Scenario>().unwrap(), Scenario::MediaFirst);
        assert!("Moon-First".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_risk_level_display_matches_wire_label() {
        for label in RiskLevel::LABELS {
            let level = RiskLevel::from_label(label).unwrap();
            assert_eq!(level.to_string(), label);
            assert_eq!(serde_json::to_value(level).unwrap(), label);
        }
    }

    #[test]
    fn test_chat_request_accepts_partial_context() {
        let json = serde_json::json!({
            "question": "Where first?",
            "marketContext": { "country": "Testland", "population": 1000000 },
            "strategyContext": {
                "softScores": { "culturalFit": 7 },
                "narrative": { "summary": "s" },
                "executionPlan": { "week1to2": "ignored" }
            }
        });
        let req: ChatRequest = serde_json::from_value(json).unwrap();

        let market = req.market_context.unwrap();
        assert_eq!(market.country.as_deref(), Some("Testland"));
        assert_eq!(market.code, None);
        assert_eq!(market.population, Some(1_000_000.0));

        let strategy = req.strategy_context.unwrap();
        assert_eq!(strategy.soft_scores.unwrap().cultural_fit, Some(7.0));
        assert_eq!(strategy.scenario_impact, None);
        assert_eq!(strategy.narrative.unwrap().summary.as_deref(), Some("s"));
    }

    #[test]
    fn test_chat_request_accepts_null_context_members() {
        let json = serde_json::json!({
            "question": "q",
            "marketContext": null,
            "strategyContext": { "softScores": null, "geopoliticalAssessment": { "riskLevel": "Severe" } }
        });
        let req: ChatRequest = serde_json::from_value(json).unwrap();
        assert!(req.market_context.is_none());
        let strategy = req.strategy_context.unwrap();
        assert!(strategy.soft_scores.is_none());
        assert_eq!(
            strategy.geopolitical_assessment.unwrap().risk_level.as_deref(),
            Some("Severe")
        );
    }
}

//! Response schema: structural contract for model-generated payloads
//!
//! Walks a parsed `serde_json::Value`, collecting every violation (missing
//! field, wrong primitive type, value outside a closed enum) together with its
//! dotted path. Bounded 0-10 scores are clamped, never rejected, as long as
//! they are numbers.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::score::clamp_score;
use crate::types::{
    ExecutionPlan, GeopoliticalAssessment, HostCity, MarketAnalysis, MarketInsights, Narrative,
    RiskLevel, ScenarioImpact, SoftScores,
};

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    InvalidType,
    InvalidEnum,
}

/// A single field-level schema failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// An object in the payload being read. `map` is `None` once the object
/// itself has been reported, so its children stay silent.
struct Scope<'a> {
    map: Option<&'a Map<String, Value>>,
    path: String,
}

/// Accumulates violations while extracting typed values. Extractors return
/// placeholder values on failure; the result is discarded if any violation
/// was recorded.
#[derive(Default)]
struct Reader {
    violations: Vec<Violation>,
}

impl Reader {
    fn push(&mut self, path: String, kind: ViolationKind, message: String) {
        self.violations.push(Violation { path, kind, message });
    }

    fn invalid_type(&mut self, path: String, expected: &str, found: &Value) {
        let message = format!("Expected {}, received {}", expected, type_name(found));
        self.push(path, ViolationKind::InvalidType, message);
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(self.violations)
        }
    }

    fn field<'a>(&mut self, scope: &Scope<'a>, key: &str) -> Option<(&'a Value, String)> {
        let map = scope.map?;
        let path = join_path(&scope.path, key);
        match map.get(key) {
            Some(value) => Some((value, path)),
            None => {
                self.push(path, ViolationKind::Missing, "Required".into());
                None
            }
        }
    }

    fn as_object<'a>(&mut self, value: &'a Value, path: String) -> Scope<'a> {
        match value.as_object() {
            Some(map) => Scope { map: Some(map), path },
            None => {
                self.invalid_type(path.clone(), "object", value);
                Scope { map: None, path }
            }
        }
    }

    fn as_number(&mut self, value: &Value, path: String) -> f64 {
        match value.as_f64() {
            Some(n) => n,
            None => {
                self.invalid_type(path, "number", value);
                0.0
            }
        }
    }

    fn as_string(&mut self, value: &Value, path: String) -> String {
        match value.as_str() {
            Some(s) => s.to_string(),
            None => {
                self.invalid_type(path, "string", value);
                String::new()
            }
        }
    }

    fn object<'a>(&mut self, scope: &Scope<'a>, key: &str) -> Scope<'a> {
        match self.field(scope, key) {
            Some((value, path)) => self.as_object(value, path),
            None => Scope { map: None, path: join_path(&scope.path, key) },
        }
    }

    fn number(&mut self, scope: &Scope<'_>, key: &str) -> f64 {
        match self.field(scope, key) {
            Some((value, path)) => self.as_number(value, path),
            None => 0.0,
        }
    }

    fn bounded(&mut self, scope: &Scope<'_>, key: &str) -> f64 {
        clamp_score(self.number(scope, key))
    }

    fn string(&mut self, scope: &Scope<'_>, key: &str) -> String {
        match self.field(scope, key) {
            Some((value, path)) => self.as_string(value, path),
            None => String::new(),
        }
    }

    /// Array field; yields each element with its indexed path.
    fn array<'a>(&mut self, scope: &Scope<'a>, key: &str) -> Vec<(&'a Value, String)> {
        let Some((value, path)) = self.field(scope, key) else {
            return Vec::new();
        };
        match value.as_array() {
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (item, format!("{}.{}", path, i)))
                .collect(),
            None => {
                self.invalid_type(path, "array", value);
                Vec::new()
            }
        }
    }

    fn string_array(&mut self, scope: &Scope<'_>, key: &str) -> Vec<String> {
        self.array(scope, key)
            .into_iter()
            .map(|(item, path)| self.as_string(item, path))
            .collect()
    }

    fn risk_level(&mut self, scope: &Scope<'_>, key: &str) -> RiskLevel {
        let Some((value, path)) = self.field(scope, key) else {
            return RiskLevel::Medium;
        };
        let Some(label) = value.as_str() else {
            self.invalid_type(path, "string", value);
            return RiskLevel::Medium;
        };
        match RiskLevel::from_label(label) {
            Some(level) => level,
            None => {
                let message = format!(
                    "Invalid enum value. Expected {}, received '{}'",
                    RiskLevel::LABELS
                        .iter()
                        .map(|l| format!("'{}'", l))
                        .collect::<Vec<_>>()
                        .join(" | "),
                    label
                );
                self.push(path, ViolationKind::InvalidEnum, message);
                RiskLevel::Medium
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Market analysis
// ---------------------------------------------------------------------------

fn read_soft_scores(r: &mut Reader, s: &Scope<'_>) -> SoftScores {
    SoftScores {
        cultural_fit: r.bounded(s, "culturalFit"),
        regulatory_friendliness: r.bounded(s, "regulatoryFriendliness"),
        media_potential: r.bounded(s, "mediaPotential"),
        sponsorship_appetite: r.bounded(s, "sponsorshipAppetite"),
        infrastructure_readiness: r.bounded(s, "infrastructureReadiness"),
    }
}

fn read_scenario_impact(r: &mut Reader, s: &Scope<'_>) -> ScenarioImpact {
    ScenarioImpact {
        risk: r.bounded(s, "risk"),
        upside: r.bounded(s, "upside"),
        cost_index: r.bounded(s, "costIndex"),
    }
}

fn read_market_insights(r: &mut Reader, s: &Scope<'_>) -> MarketInsights {
    MarketInsights {
        audience_size: r.number(s, "audienceSize"),
        fitness_rate: r.number(s, "fitnessRate"),
        streaming_score: r.number(s, "streamingScore"),
        sponsorship_value: r.number(s, "sponsorshipValue"),
        regulation_score: r.number(s, "regulationScore"),
    }
}

fn read_geopolitics(r: &mut Reader, s: &Scope<'_>) -> GeopoliticalAssessment {
    GeopoliticalAssessment {
        stability_score: r.bounded(s, "stabilityScore"),
        risk_level: r.risk_level(s, "riskLevel"),
        key_factors: r.string_array(s, "keyFactors"),
        recommendations: r.string_array(s, "recommendations"),
    }
}

fn read_cities(r: &mut Reader, s: &Scope<'_>) -> Vec<HostCity> {
    r.array(s, "bestCities")
        .into_iter()
        .map(|(item, path)| {
            let city = r.as_object(item, path);
            HostCity {
                name: r.string(&city, "name"),
                latitude: r.number(&city, "latitude"),
                longitude: r.number(&city, "longitude"),
                population: r.number(&city, "population"),
                advantages: r.string_array(&city, "advantages"),
            }
        })
        .collect()
}

fn read_narrative(r: &mut Reader, s: &Scope<'_>) -> Narrative {
    Narrative {
        summary: r.string(s, "summary"),
        reasons_to_enter: r.string_array(s, "reasonsToEnter"),
        key_risks: r.string_array(s, "keyRisks"),
    }
}

/// Validate a parsed market-analysis payload.
pub fn validate_market_analysis(payload: &Value) -> Result<MarketAnalysis, Vec<Violation>> {
    let mut r = Reader::default();
    let root = r.as_object(payload, String::new());

    let soft = r.object(&root, "softScores");
    let impact = r.object(&root, "scenarioImpact");
    let insights = r.object(&root, "marketInsights");
    let geo = r.object(&root, "geopoliticalAssessment");
    let narrative = r.object(&root, "narrative");

    let analysis = MarketAnalysis {
        soft_scores: read_soft_scores(&mut r, &soft),
        scenario_impact: read_scenario_impact(&mut r, &impact),
        market_insights: read_market_insights(&mut r, &insights),
        geopolitical_assessment: read_geopolitics(&mut r, &geo),
        best_cities: read_cities(&mut r, &root),
        narrative: read_narrative(&mut r, &narrative),
    };
    r.finish(analysis)
}

// ---------------------------------------------------------------------------
// Execution plan
// ---------------------------------------------------------------------------

/// Validate a parsed `{ "executionPlan": { ... } }` payload.
pub fn validate_execution_plan(payload: &Value) -> Result<ExecutionPlan, Vec<Violation>> {
    let mut r = Reader::default();
    let root = r.as_object(payload, String::new());
    let plan = r.object(&root, "executionPlan");

    let [w1, w3, w5, w7, w9] = ExecutionPlan::PHASES.map(|phase| r.string(&plan, phase));
    r.finish(ExecutionPlan {
        week1to2: w1,
        week3to4: w3,
        week5to6: w5,
        week7to8: w7,
        week9to12: w9,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_analysis() -> Value {
        json!({
            "softScores": {
                "culturalFit": 7.5,
                "regulatoryFriendliness": 6,
                "mediaPotential": 8,
                "sponsorshipAppetite": 7,
                "infrastructureReadiness": 9
            },
            "scenarioImpact": { "risk": 4, "upside": 8, "costIndex": 6 },
            "marketInsights": {
                "audienceSize": 45.5,
                "fitnessRate": 62,
                "streamingScore": 81,
                "sponsorshipValue": 70,
                "regulationScore": 55
            },
            "geopoliticalAssessment": {
                "stabilityScore": 8,
                "riskLevel": "Low",
                "keyFactors": ["Stable government", "Strong IOC ties", "Open economy"],
                "recommendations": ["Engage ministry early", "Partner locally"]
            },
            "bestCities": [
                { "name": "Alpha", "latitude": 10.5, "longitude": -20.25, "population": 3.2,
                  "advantages": ["Stadiums", "Airport"] },
                { "name": "Beta", "latitude": 11.0, "longitude": -21.0, "population": 1.1,
                  "advantages": ["Hotels", "Transit"] },
                { "name": "Gamma", "latitude": 12.0, "longitude": -22.0, "population": 0.8,
                  "advantages": ["Beaches", "Media hub"] }
            ],
            "narrative": {
                "summary": "A promising but contested market.",
                "reasonsToEnter": ["Wealthy fans", "Media reach", "Sponsors"],
                "keyRisks": ["Regulators", "Public opinion", "Cost"]
            }
        })
    }

    #[test]
    fn test_valid_analysis_passes() {
        let analysis = validate_market_analysis(&sample_analysis()).unwrap();
        assert_eq!(analysis.soft_scores.cultural_fit, 7.5);
        assert_eq!(analysis.geopolitical_assessment.risk_level, RiskLevel::Low);
        assert_eq!(analysis.best_cities.len(), 3);
        assert_eq!(analysis.best_cities[0].longitude, -20.25);
        assert!(analysis.content_warnings().is_empty());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut payload = sample_analysis();
        payload["softScores"]["culturalFit"] = json!("high");
        let violations = validate_market_analysis(&payload).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "softScores.culturalFit");
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);
        assert_eq!(violations[0].message, "Expected number, received string");
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        let mut payload = sample_analysis();
        payload["softScores"]["culturalFit"] = json!(14);
        payload["scenarioImpact"]["costIndex"] = json!(-3);
        payload["geopoliticalAssessment"]["stabilityScore"] = json!(10.5);
        let analysis = validate_market_analysis(&payload).unwrap();
        assert_eq!(analysis.soft_scores.cultural_fit, 10.0);
        assert_eq!(analysis.scenario_impact.cost_index, 0.0);
        assert_eq!(analysis.geopolitical_assessment.stability_score, 10.0);
    }

    #[test]
    fn test_unbounded_fields_are_not_clamped() {
        let mut payload = sample_analysis();
        payload["marketInsights"]["audienceSize"] = json!(330.0);
        payload["bestCities"][0]["latitude"] = json!(-45.9);
        let analysis = validate_market_analysis(&payload).unwrap();
        assert_eq!(analysis.market_insights.audience_size, 330.0);
        assert_eq!(analysis.best_cities[0].latitude, -45.9);
    }

    #[test]
    fn test_missing_section_reports_once() {
        let mut payload = sample_analysis();
        payload.as_object_mut().unwrap().remove("narrative");
        let violations = validate_market_analysis(&payload).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "narrative");
        assert_eq!(violations[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_bad_risk_level_is_enum_violation() {
        let mut payload = sample_analysis();
        payload["geopoliticalAssessment"]["riskLevel"] = json!("Extreme");
        let violations = validate_market_analysis(&payload).unwrap_err();
        assert_eq!(violations[0].kind, ViolationKind::InvalidEnum);
        assert_eq!(violations[0].path, "geopoliticalAssessment.riskLevel");
    }

    #[test]
    fn test_all_violations_are_collected_with_indexed_paths() {
        let mut payload = sample_analysis();
        payload["bestCities"][1]["advantages"][0] = json!(42);
        payload["bestCities"][2].as_object_mut().unwrap().remove("name");
        payload["scenarioImpact"]["risk"] = Value::Null;
        let violations = validate_market_analysis(&payload).unwrap_err();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["scenarioImpact.risk", "bestCities.1.advantages.0", "bestCities.2.name"]
        );
    }

    #[test]
    fn test_empty_arrays_are_valid_but_warned() {
        let mut payload = sample_analysis();
        payload["narrative"]["reasonsToEnter"] = json!([]);
        payload["bestCities"] = json!([]);
        let analysis = validate_market_analysis(&payload).unwrap();
        let warnings = analysis.content_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("bestCities has 0"));
    }

    #[test]
    fn test_overlong_lists_are_warned() {
        let mut payload = sample_analysis();
        let city = payload["bestCities"][0].clone();
        for _ in 0..3 {
            payload["bestCities"].as_array_mut().unwrap().push(city.clone());
        }
        payload["bestCities"][1]["advantages"] = json!(["a", "b", "c", "d"]);
        let analysis = validate_market_analysis(&payload).unwrap();

        let warnings = analysis.content_warnings();
        assert_eq!(
            warnings,
            vec![
                "bestCities has 6 item(s), expected 3-5".to_string(),
                "bestCities.1.advantages has 4 item(s), expected 2-3".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_object_root() {
        let violations = validate_market_analysis(&json!([1, 2])).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "<root>: Expected object, received array");
    }

    #[test]
    fn test_execution_plan_validation() {
        let payload = json!({ "executionPlan": {
            "week1to2": "a", "week3to4": "b", "week5to6": "c", "week7to8": "d", "week9to12": "e"
        }});
        let plan = validate_execution_plan(&payload).unwrap();
        assert_eq!(plan.week9to12, "e");

        let payload = json!({ "executionPlan": { "week1to2": ["a"], "week3to4": "b" }});
        let violations = validate_execution_plan(&payload).unwrap_err();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "executionPlan.week1to2",
                "executionPlan.week5to6",
                "executionPlan.week7to8",
                "executionPlan.week9to12"
            ]
        );
    }
}

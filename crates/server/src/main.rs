//! Expansion Planner: AI market analysis and 90-day execution plans
//!
//! Usage:
//!   expansion-planner serve --port 3001   # Launch web server with UI
//!   expansion-planner analyze --market kenya.json --scenario Media-First   # Run from CLI

mod api;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use planner::{
    ExecutionPlan, ExecutionPlanRequest, MarketAnalysis, MarketAnalysisRequest, MarketRecord,
    PlannerConfig, Scenario, Strategist,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use api::{api_routes, AppState, APP_VERSION};

#[derive(Parser)]
#[command(name = "expansion-planner")]
#[command(about = "Market analysis and execution planning for league expansion", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the planner web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },
    /// Analyze one market from CLI (no web server)
    Analyze {
        /// Market record JSON file
        #[arg(long, conflicts_with = "country", required_unless_present = "country")]
        market: Option<PathBuf>,
        /// Country name for a market with no seed data
        #[arg(long)]
        country: Option<String>,
        /// Also build an execution plan: Low Regulation, High Capital, Media-First, Athlete-First
        #[arg(long)]
        scenario: Option<String>,
        /// Optional JSON export path
        #[arg(long)]
        export: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,planner=debug,expansion_planner=debug")
    } else {
        EnvFilter::new("info,planner=info,expansion_planner=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

/// Build the strategist from the environment; refuses to start without a key.
fn load_strategist() -> anyhow::Result<Strategist> {
    let config = PlannerConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    info!(config = ?config, "Configuration loaded");
    Ok(Strategist::from_config(&config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&host, port).await?;
        }
        Commands::Analyze {
            market,
            country,
            scenario,
            export,
        } => {
            cmd_analyze(market, country, scenario, export).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command: Axum web server
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("Expansion Planner v{} starting...", APP_VERSION);

    let state = AppState {
        strategist: Arc::new(load_strategist()?),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Determine static files directory
    let exe_path = std::env::current_exe().unwrap_or_default();
    let exe_dir = exe_path.parent().unwrap_or(std::path::Path::new("."));
    let dist_dir = exe_dir.join("dist");
    let static_dir = if dist_dir.exists() {
        dist_dir
    } else {
        PathBuf::from("dist")
    };

    let app = axum::Router::new()
        .nest("/api", api_routes(state))
        .fallback_service(ServeDir::new(&static_dir))
        .layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Expansion Planner v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /api/health            - Health check");
    println!("  POST /api/market-analysis   - Scores, insights, cities, narrative");
    println!("  POST /api/execution-plan    - 90-day plan for a scenario");
    println!("  POST /api/strategy          - Analysis and plan together");
    println!("  POST /api/chat              - Ask the strategy assistant");
    println!("\n  Static UI: {}", static_dir.display());
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Analyze command: CLI mode (no web server)
// ============================================================================

async fn cmd_analyze(
    market_path: Option<PathBuf>,
    country: Option<String>,
    scenario: Option<String>,
    export: Option<String>,
) -> anyhow::Result<()> {
    println!("\n=== Expansion Planner v{} ===", APP_VERSION);

    let market = match (market_path, country) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read market file {}", path.display()))?;
            serde_json::from_str::<MarketRecord>(&raw)
                .with_context(|| format!("Invalid market record in {}", path.display()))?
        }
        (None, Some(name)) => MarketRecord::placeholder(&name),
        (None, None) => anyhow::bail!("Either --market or --country is required"),
    };
    // Unknown labels fail here, before any network call
    let scenario = scenario
        .map(|s| s.parse::<Scenario>())
        .transpose()?;

    let strategist = load_strategist()?;

    println!("Market: {} ({})", market.country, market.code);
    if let Some(s) = scenario {
        println!("Scenario: {}", s);
    }
    println!();

    let (analysis, plan) = match scenario {
        Some(s) => {
            let result = strategist
                .full_strategy(ExecutionPlanRequest {
                    market: Some(market.clone()),
                    scenario: Some(s.label().to_string()),
                })
                .await?;
            (result.analysis, Some(result.execution_plan))
        }
        None => {
            let analysis = strategist
                .market_analysis(MarketAnalysisRequest {
                    market: Some(market.clone()),
                })
                .await?;
            (analysis, None)
        }
    };

    print_analysis(&analysis);
    if let Some(plan) = &plan {
        print_plan(plan);
    }

    if let Some(export_path) = export {
        let export_data = build_export_json(&market, scenario, &analysis, plan.as_ref());
        let json = serde_json::to_string_pretty(&export_data)?;
        std::fs::write(&export_path, &json)?;
        println!("\nResults exported to {}", export_path);
    }

    Ok(())
}

fn print_analysis(analysis: &MarketAnalysis) {
    let soft = &analysis.soft_scores;
    let impact = &analysis.scenario_impact;
    let geo = &analysis.geopolitical_assessment;

    println!("Scores (0-10):");
    println!("  {:<26} {:>5}", "Dimension", "Score");
    println!("  {}", "-".repeat(32));
    for (label, value) in [
        ("Cultural fit", soft.cultural_fit),
        ("Regulatory friendliness", soft.regulatory_friendliness),
        ("Media potential", soft.media_potential),
        ("Sponsorship appetite", soft.sponsorship_appetite),
        ("Infrastructure readiness", soft.infrastructure_readiness),
        ("Risk", impact.risk),
        ("Upside", impact.upside),
        ("Cost index", impact.cost_index),
        ("Stability", geo.stability_score),
    ] {
        println!("  {:<26} {:>5.1}", label, value);
    }
    println!("\nGeopolitical risk: {}", geo.risk_level);

    println!("\nBest host cities:");
    for (i, city) in analysis.best_cities.iter().enumerate() {
        println!(
            "  {:>2}. {:<18} ({:>7.3}, {:>8.3}) {:.1}M",
            i + 1,
            city.name,
            city.latitude,
            city.longitude,
            city.population
        );
    }

    println!("\n{}", analysis.narrative.summary);
}

fn print_plan(plan: &ExecutionPlan) {
    println!("\n90-day execution plan:");
    for (label, text) in [
        ("Weeks 1-2", &plan.week1to2),
        ("Weeks 3-4", &plan.week3to4),
        ("Weeks 5-6", &plan.week5to6),
        ("Weeks 7-8", &plan.week7to8),
        ("Weeks 9-12", &plan.week9to12),
    ] {
        println!("  {:<11} {}", label, text);
    }
}

/// Export JSON for the CLI analyze command
fn build_export_json(
    market: &MarketRecord,
    scenario: Option<Scenario>,
    analysis: &MarketAnalysis,
    plan: Option<&ExecutionPlan>,
) -> serde_json::Value {
    serde_json::json!({
        "generatedAt": Utc::now().to_rfc3339(),
        "version": APP_VERSION,
        "market": market,
        "scenario": scenario,
        "analysis": analysis,
        "executionPlan": plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_defaults() {
        let cli = Cli::try_parse_from(["expansion-planner", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 3001);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_analyze_needs_a_market() {
        assert!(Cli::try_parse_from(["expansion-planner", "analyze"]).is_err());
        assert!(Cli::try_parse_from([
            "expansion-planner",
            "analyze",
            "--market",
            "a.json",
            "--country",
            "Kenya"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "expansion-planner",
            "-v",
            "analyze",
            "--country",
            "Kenya",
            "--scenario",
            "Media-First",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze { country, scenario, market, .. } => {
                assert_eq!(country.as_deref(), Some("Kenya"));
                assert_eq!(scenario.as_deref(), Some("Media-First"));
                assert!(market.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_export_json_shape() {
        let analysis: MarketAnalysis = serde_json::from_value(serde_json::json!({
            "softScores": { "culturalFit": 7, "regulatoryFriendliness": 6, "mediaPotential": 8,
                            "sponsorshipAppetite": 7, "infrastructureReadiness": 9 },
            "scenarioImpact": { "risk": 4, "upside": 8, "costIndex": 6 },
            "marketInsights": { "audienceSize": 45, "fitnessRate": 62, "streamingScore": 81,
                                "sponsorshipValue": 70, "regulationScore": 55 },
            "geopoliticalAssessment": { "stabilityScore": 8, "riskLevel": "Low",
                                        "keyFactors": [], "recommendations": [] },
            "bestCities": [],
            "narrative": { "summary": "s", "reasonsToEnter": [], "keyRisks": [] }
        }))
        .unwrap();
        let market = MarketRecord::placeholder("Kenya");

        let value = build_export_json(&market, Some(Scenario::MediaFirst), &analysis, None);
        assert!(value["generatedAt"].is_string());
        assert_eq!(value["scenario"], "Media-First");
        assert_eq!(value["market"]["country"], "Kenya");
        assert_eq!(value["analysis"]["geopoliticalAssessment"]["riskLevel"], "Low");
        assert!(value["executionPlan"].is_null());
    }
}

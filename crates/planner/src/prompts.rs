//! Prompt builder: renders market/scenario inputs into model instructions
//!
//! Everything here is pure and deterministic: the same inputs always yield the
//! same text, byte for byte.

use std::fmt::Write;

use crate::types::{MarketContext, MarketRecord, Scenario, StrategyContext};

/// System message for the JSON-producing flows
pub const SYSTEM_PROMPT: &str = "You are a strategic business analyst. Return only valid JSON.";

/// System message for the chat assistant
pub const CHAT_SYSTEM_PROMPT: &str = "You are a strategic business analyst specializing in sports marketing and international expansion. Provide clear, actionable insights.";

const VENTURE_INTRO: &str = "You are a strategic advisor for the Enhanced Games, an international sporting competition that permits performance enhancement and openly challenges traditional anti-doping frameworks. It is a real, venture-backed initiative.";

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `1234567` -> `"1,234,567"`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Thousands-grouped amount with at most two decimals (`76398` -> `"76,398"`,
/// `5000.5` -> `"5,000.5"`).
pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let frac = cents % 100;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    match frac {
        0 => format!("{}{}", sign, whole),
        f if f % 10 == 0 => format!("{}{}.{}", sign, whole, f / 10),
        f => format!("{}{}.{:02}", sign, whole, f),
    }
}

fn market_block(market: &MarketRecord) -> String {
    format!(
        "Country: {} ({})\n\
         Population: {}\n\
         GDP per Capita: ${}\n\
         Sports Culture: {}\n\
         Media Landscape: {}\n\
         Regulation Notes: {}",
        market.country,
        market.code,
        group_thousands(market.population),
        format_amount(market.gdp_per_capita),
        market.sports_culture,
        market.media_landscape,
        market.regulation_notes,
    )
}

fn scenario_playbook(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::LowRegulation => {
            "LOW REGULATION strategy:\n\
             - Move first where the legal framework is permissive; treat regulatory arbitrage as the core advantage\n\
             - Secure written legal opinions and government letters of comfort before any public announcement\n\
             - Keep fixed costs light: lease venues, partner with existing event operators\n\
             - Build relationships with sports ministries and free-zone authorities\n\
             - Prepare for international pressure from anti-doping bodies and traditional federations"
        }
        Scenario::HighCapital => {
            "HIGH CAPITAL strategy:\n\
             - Target affluent audiences with premium brand positioning\n\
             - Invest heavily in world-class venues, luxury hospitality and VIP packages\n\
             - Partner with high-end brands (luxury goods, premium automotive, private banking)\n\
             - Recruit elite athletes with top-of-market compensation\n\
             - Build state-of-the-art training facilities and medical centers\n\
             - Premium ticket pricing and exclusive memberships"
        }
        Scenario::MediaFirst => {
            "MEDIA-FIRST strategy:\n\
             - Prioritize content creation and viral moments over live attendance\n\
             - Secure broadcast deals with major networks and streaming platforms\n\
             - Produce behind-the-scenes content and athlete documentaries\n\
             - Partner with creators, influencers and sports media personalities\n\
             - Focus on digital rights and streaming exclusivity\n\
             - Lean on short-form video (TikTok, Instagram Reels, YouTube Shorts)"
        }
        Scenario::AthleteFirst => {
            "ATHLETE-FIRST strategy:\n\
             - Make athlete welfare and development the absolute priority\n\
             - Offer industry-leading compensation, healthcare and support systems\n\
             - Build training facilities with the latest sports science technology\n\
             - Provide comprehensive medical oversight of performance programs\n\
             - Create pathways for athletes limited by traditional sports bodies\n\
             - Tell the story through athlete testimonials"
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Instructions for the market-analysis flow.
pub fn build_analysis_prompt(market: &MarketRecord) -> String {
    format!(
        r#"{intro}

Analyze the following market for strategic expansion:

{market}

Provide a data-driven, realistic market analysis as a JSON object with exactly these fields:

1. softScores (numbers, 0-10 scale):
   - culturalFit: attitudes toward sports science, performance optimization and enhancement culture
   - regulatoryFriendliness: anti-doping agency influence, pharmaceutical rules, government stance on sports innovation
   - mediaPotential: broadcasting maturity, streaming infrastructure, social media appetite
   - sponsorshipAppetite: corporate sports marketing spend, performance-focused brands, tolerance for controversy
   - infrastructureReadiness: venues, hotels, transport, medical facilities, event hosting track record

2. scenarioImpact (numbers, 0-10 scale):
   - risk: regulatory pushback, public perception, retaliation from traditional sports bodies, legal and athlete-safety exposure
   - upside: market size, media rights, sponsorship, athlete attraction, first-mover advantage
   - costIndex: facilities, compliance, awareness marketing, talent acquisition, operating overhead

3. marketInsights (numbers):
   - audienceSize: potential audience in millions
   - fitnessRate: fitness participation rate, 0-100
   - streamingScore: digital sports consumption maturity, 0-100
   - sponsorshipValue: commercial sponsorship potential, 0-100
   - regulationScore: regulatory favorability, 0-100

4. geopoliticalAssessment:
   - stabilityScore: political stability (number, 0-10 scale)
   - riskLevel: exactly one of "Low", "Medium", "High"
   - keyFactors: 3-5 specific geopolitical factors (array of strings)
   - recommendations: 2-3 actionable recommendations for managing geopolitical risk (array of strings)

5. bestCities: array of 3-5 real cities with world-class sports infrastructure, each with:
   - name: city name (string)
   - latitude: decimal degrees (number)
   - longitude: decimal degrees (number)
   - population: city population in millions (number)
   - advantages: 2-3 specific, factual advantages (array of strings)

6. narrative:
   - summary: one honest sentence on the opportunity that acknowledges both potential and challenges (string)
   - reasonsToEnter: 3-4 evidence-based reasons to enter (array of strings)
   - keyRisks: 3-4 realistic challenges (array of strings)

Be candid about resistance from traditional sports bodies, public skepticism and regulatory hurdles in {country} while highlighting genuine opportunities.

Return ONLY valid JSON matching this exact structure."#,
        intro = VENTURE_INTRO,
        market = market_block(market),
        country = market.country,
    )
}

/// Instructions for the scenario-specific 90-day execution plan.
pub fn build_execution_plan_prompt(market: &MarketRecord, scenario: Scenario) -> String {
    format!(
        r#"{intro} Create a realistic, actionable 90-day market entry execution plan.

Market Context:
{market}

Strategic Approach: {scenario}

{playbook}

Return a JSON object of the form {{"executionPlan": {{...}}}} where executionPlan has exactly these five fields. Each field MUST be a single string (not an array, not an object) of 4-5 sentences with concrete actions, named stakeholder types and measurable outcomes:

   - week1to2: initial entry actions: meetings with government officials, sports federations and venues; legal groundwork specific to {country}
   - week3to4: early implementation: facility assessments, partnership negotiations, media outreach, preliminary athlete recruitment
   - week5to6: mid-term execution: agreements being finalized (venues, sponsors, broadcast), campaign launches, athlete announcements, handling resistance
   - week7to8: advanced preparation: staffing, logistics, technology, training programs, community and local partnerships
   - week9to12: pre-launch readiness: test events, media previews, final recruitment push, scheduling, crisis management and contingency planning

Requirements:
- Every action must clearly serve the "{scenario}" strategy
- Account for the regulatory environment, cultural norms and market conditions of {country}
- Include concrete metrics and milestones for each phase
- Address likely opposition from traditional sports bodies, government agencies or public opinion

Return ONLY valid JSON matching this exact structure."#,
        intro = VENTURE_INTRO,
        market = market_block(market),
        scenario = scenario.label(),
        playbook = scenario_playbook(scenario),
        country = market.country,
    )
}

/// Missing context values render as `N/A`.
fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn text_or_na(value: Option<&str>) -> String {
    or_na(value.map(str::trim).filter(|v| !v.is_empty()))
}

fn context_block(market: &MarketContext) -> String {
    let country = text_or_na(market.country.as_deref());
    let country = match market.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => format!("{} ({})", country, code),
        None => country,
    };
    format!(
        "Country: {}\n\
         Population: {}\n\
         GDP per Capita: {}\n\
         Sports Culture: {}\n\
         Media Landscape: {}\n\
         Regulation Notes: {}",
        country,
        or_na(market.population.map(format_amount)),
        or_na(market.gdp_per_capita.map(|g| format!("${}", format_amount(g)))),
        text_or_na(market.sports_culture.as_deref()),
        text_or_na(market.media_landscape.as_deref()),
        text_or_na(market.regulation_notes.as_deref()),
    )
}

/// Context-grounded prompt for the chat assistant.
pub fn build_chat_prompt(
    question: &str,
    market: Option<&MarketContext>,
    strategy: Option<&StrategyContext>,
) -> String {
    let mut prompt = String::from(VENTURE_INTRO);
    prompt.push_str("\n\n");

    if let Some(market) = market {
        let _ = write!(prompt, "Current Market:\n{}\n\n", context_block(market));
    }

    if let Some(a) = strategy {
        let s = a.soft_scores.clone().unwrap_or_default();
        let impact = a.scenario_impact.clone().unwrap_or_default();
        let risk_level = a
            .geopolitical_assessment
            .as_ref()
            .and_then(|g| g.risk_level.as_deref());
        let _ = write!(
            prompt,
            "Current Strategy Analysis:\n\
             Cultural Fit: {}/10\n\
             Regulatory Friendliness: {}/10\n\
             Media Potential: {}/10\n\
             Sponsorship Appetite: {}/10\n\
             Infrastructure Readiness: {}/10\n\
             Risk: {}/10\n\
             Upside: {}/10\n\
             Geopolitical Risk Level: {}\n",
            or_na(s.cultural_fit),
            or_na(s.regulatory_friendliness),
            or_na(s.media_potential),
            or_na(s.sponsorship_appetite),
            or_na(s.infrastructure_readiness),
            or_na(impact.risk),
            or_na(impact.upside),
            text_or_na(risk_level),
        );
        let summary = a
            .narrative
            .as_ref()
            .and_then(|n| n.summary.as_deref())
            .map(str::trim)
            .filter(|summary| !summary.is_empty());
        if let Some(summary) = summary {
            let _ = writeln!(prompt, "Market Summary: {}", summary);
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "User Question: {}\n\n\
         Give a detailed, actionable answer grounded in the market data and analysis above, \
         referencing specific figures where relevant. Use plain text only: no markdown, \
         no special bullet characters. Write in clear paragraphs.",
        question.trim()
    );
    prompt
}

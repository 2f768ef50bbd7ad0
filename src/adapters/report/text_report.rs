//! Plain-text report of a finished analysis.
//!
//! Produces the sections the CLI prints: risk scores, opportunity scores
//! (both highest first) and the recommendation.

use crate::domain::schemas::{AnalysisState, OpportunityScore, Recommendation, RiskScore};

const RULE_WIDTH: usize = 60;
const SCORE_RULE_WIDTH: usize = 50;

/// Renders analysis results as text.
pub struct ReportFormatter;

impl ReportFormatter {
    /// Risk scores, highest first.
    pub fn risk_scores(scores: &[RiskScore]) -> String {
        let mut sorted: Vec<&RiskScore> = scores.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut out = format!("Risk Scores:\n{}\n", "=".repeat(SCORE_RULE_WIDTH));
        for risk in sorted {
            out.push_str(&format!(
                "\n{}: {:.1}/10 ({})\n  -> {}\n",
                risk.factor_name,
                risk.score,
                risk.severity.to_uppercase(),
                risk.reasoning
            ));
        }
        out
    }

    /// Opportunity scores, highest first.
    pub fn opportunity_scores(scores: &[OpportunityScore]) -> String {
        let mut sorted: Vec<&OpportunityScore> = scores.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut out = format!("Opportunity Scores:\n{}\n", "=".repeat(SCORE_RULE_WIDTH));
        for opp in sorted {
            out.push_str(&format!(
                "\n{}: {:.1}/10 ({})\n  -> {}\n",
                opp.factor_name,
                opp.score,
                opp.potential.to_uppercase(),
                opp.reasoning
            ));
        }
        out
    }

    pub fn recommendation(rec: &Recommendation) -> String {
        let mut out = heading("RECOMMENDATION");
        out.push_str(&format!("\nDecision: {}\n", rec.decision));
        out.push_str(&format!("\nRecommendation: {}\n", rec.recommendation));
        out.push_str(&format!("Confidence: {:.0}%\n", rec.confidence_level * 100.0));
        out.push_str(&format!("\nRisk Score: {:.1}/10\n", rec.overall_risk_score));
        out.push_str(&format!(
            "Opportunity Score: {:.1}/10\n",
            rec.overall_opportunity_score
        ));
        out.push_str(&format!("\n{}\n", rec.risk_reward_balance));

        out.push('\n');
        out.push_str(&heading("KEY INSIGHTS"));
        for (i, insight) in rec.key_insights.iter().enumerate() {
            out.push_str(&format!("\n{}. {}\n", i + 1, insight));
        }

        out.push('\n');
        out.push_str(&heading("NEXT STEPS"));
        for step in &rec.next_steps {
            out.push_str(&format!(
                "\n[{}] {}\n  Timeframe: {}\n",
                step.priority.as_str().to_uppercase(),
                step.action,
                step.timeframe
            ));
        }

        bullet_section(&mut out, "CRITICAL ASSUMPTIONS", &rec.critical_assumptions);
        bullet_section(&mut out, "WATCH SIGNALS", &rec.watch_signals);
        out
    }

    /// Full report for a run; a failed run renders only its error.
    pub fn analysis(state: &AnalysisState) -> String {
        if let Some(ref error) = state.error {
            return format!("Analysis failed: {}\n", error);
        }

        let mut sections = Vec::new();
        if let Some(ref risk) = state.risk_output {
            sections.push(Self::risk_scores(&risk.risk_scores));
        }
        if let Some(ref opportunity) = state.opportunity_output {
            sections.push(Self::opportunity_scores(&opportunity.opportunity_scores));
        }
        if let Some(ref rec) = state.recommendation {
            sections.push(Self::recommendation(rec));
        }
        sections.join("\n")
    }
}

fn heading(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{}\n{}\n{}\n", rule, title, rule)
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(&heading(title));
    for item in items {
        out.push_str(&format!("\n* {}\n", item));
    }
}

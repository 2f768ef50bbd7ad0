//! Prompt templates for the five reasoning steps.
//!
//! Each step has a fixed system prompt and a user prompt rendered from the
//! upstream outputs it depends on.

use crate::domain::schemas::{
    DecisionInput, OpportunityOutput, PlannerOutput, ResearchOutput, RiskOutput,
};

use super::step::StepKind;

/// Returns the system prompt for a step.
pub fn system_prompt_for_step(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Plan => PLANNER_SYSTEM,
        StepKind::Research => RESEARCH_SYSTEM,
        StepKind::Risk => RISK_SYSTEM,
        StepKind::Opportunity => OPPORTUNITY_SYSTEM,
        StepKind::Strategize => STRATEGIST_SYSTEM,
    }
}

// ============================================================================
// User Prompts
// ============================================================================

pub fn plan_prompt(input: &DecisionInput) -> String {
    format!(
        "Decision: {}\n\nContext: {}\nTimeframe: {}\n\nBreak this decision into evaluation factors.",
        input.decision(),
        input.context_or_default(),
        input.timeframe_or_default(),
    )
}

pub fn research_prompt(input: &DecisionInput, plan: &PlannerOutput) -> String {
    let factors = plan
        .factors
        .iter()
        .map(|f| format!("- {} ({}): {}", f.name, f.category, f.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Decision: {}\n\nContext: {}\n\nEvaluation Factors:\n{}\n\n\
         Analyze each factor in the context of this decision. Provide both \
         factor-specific analyses AND an overall_context summary.",
        input.decision(),
        input.context_or_default(),
        factors,
    )
}

pub fn risk_prompt(input: &DecisionInput, plan: &PlannerOutput, research: &ResearchOutput) -> String {
    format!(
        "Decision: {}\n\nEvaluation Factors:\n{}\n\nResearch Insights:\n{}\n\n\
         Assign risk scores to each factor.",
        input.decision(),
        factor_lines(plan),
        insight_lines(research),
    )
}

pub fn opportunity_prompt(
    input: &DecisionInput,
    plan: &PlannerOutput,
    research: &ResearchOutput,
) -> String {
    format!(
        "Decision: {}\n\nEvaluation Factors:\n{}\n\nResearch Insights:\n{}\n\n\
         Assign opportunity scores to each factor.",
        input.decision(),
        factor_lines(plan),
        insight_lines(research),
    )
}

pub fn strategize_prompt(
    input: &DecisionInput,
    research: &ResearchOutput,
    risk: &RiskOutput,
    opportunity: &OpportunityOutput,
) -> String {
    let risk_details = risk
        .risk_scores
        .iter()
        .map(|r| {
            format!(
                "- {}: {}/10 ({}) - {}",
                r.factor_name, r.score, r.severity, r.reasoning
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let opportunity_details = opportunity
        .opportunity_scores
        .iter()
        .map(|o| {
            format!(
                "- {}: {}/10 ({}) - {}",
                o.factor_name, o.score, o.potential, o.reasoning
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Decision: {}\n\nOverall Risk Score: {}/10\nOverall Opportunity Score: {}/10\n\n\
         Risk Analysis:\n{}\n\nOpportunity Analysis:\n{}\n\nResearch Context:\n{}\n\n\
         Provide your strategic recommendation.",
        input.decision(),
        risk.overall_risk_level,
        opportunity.overall_opportunity_level,
        risk_details,
        opportunity_details,
        research.overall_context,
    )
}

fn factor_lines(plan: &PlannerOutput) -> String {
    plan.factors
        .iter()
        .map(|f| format!("- {}: {}", f.name, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn insight_lines(research: &ResearchOutput) -> String {
    research
        .analyses
        .iter()
        .map(|a| format!("- {}: {}", a.factor_name, a.insights))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// System Prompts
// ============================================================================

const PLANNER_SYSTEM: &str = r#"You are a strategic planning expert. Your job is to break down complex decisions into clear evaluation factors.

For each decision, identify 5-8 key factors that should be evaluated. Consider:
- Financial implications
- Personal impact (happiness, fulfillment, stress)
- Professional growth
- Social/relationship effects
- Health and wellbeing
- Time commitment
- Reversibility
- Alignment with long-term goals

Each factor should be:
- Specific and measurable
- Relevant to the decision
- Non-overlapping with other factors

Categorize each factor as: financial, personal, professional, social, or health."#;

const RESEARCH_SYSTEM: &str = r#"You are a research analyst. Your job is to analyze each evaluation factor in depth.

For each factor, provide:
- Key insights about how this factor relates to the decision
- Specific considerations or data points
- Relevant context that would inform scoring

You must provide:
1. "analyses" - array of analysis for each factor, using the exact factor names
2. "overall_context" - a summary of the overall situation

Be thorough but concise. Focus on actionable insights."#;

const RISK_SYSTEM: &str = r#"You are a risk assessment expert. Your job is to assign risk scores to each evaluation factor.

Risk Scoring Scale (0-10):
- 0-2: Minimal risk - negligible negative impact
- 3-4: Low risk - minor negative impact, easily manageable
- 5-6: Medium risk - moderate negative impact, requires attention
- 7-8: High risk - significant negative impact, needs mitigation
- 9-10: Critical risk - severe negative impact, potentially catastrophic

For each factor, assign:
- A numerical score (0-10)
- Clear reasoning for the score
- Severity level: low, medium, high, or critical

Consider:
- Probability of negative outcome
- Magnitude of potential loss
- Reversibility
- Time to recover
- Cascading effects

Be objective and evidence-based."#;

const OPPORTUNITY_SYSTEM: &str = r#"You are an opportunity assessment expert. Your job is to assign opportunity scores to each evaluation factor.

Opportunity Scoring Scale (0-10):
- 0-2: Minimal opportunity - negligible positive impact
- 3-4: Low opportunity - minor positive impact
- 5-6: Medium opportunity - moderate positive impact, worth pursuing
- 7-8: High opportunity - significant positive impact, strong upside
- 9-10: Transformative opportunity - exceptional positive impact, game-changing

For each factor, assign:
- A numerical score (0-10)
- Clear reasoning for the score
- Potential level: low, medium, high, or transformative

Consider:
- Probability of positive outcome
- Magnitude of potential gain
- Long-term value creation
- Compounding effects
- Unique advantages

Be objective and evidence-based."#;

const STRATEGIST_SYSTEM: &str = r#"You are a strategic advisor. Your job is to synthesize all analysis into a clear, actionable recommendation.

Based on the risk and opportunity scores, provide:

1. Clear Recommendation:
   - "Proceed" - if opportunities significantly outweigh risks
   - "Proceed with Caution" - if opportunities and risks are balanced
   - "Do Not Proceed" - if risks significantly outweigh opportunities

2. Confidence Level (0-1):
   - How confident are you in this recommendation?
   - Consider data quality, uncertainty, and factor alignment

3. Key Insights (3-5):
   - Most important findings from the analysis
   - Critical factors that drive the recommendation

4. Risk-Reward Balance:
   - Clear summary of the tradeoff

5. Next Steps:
   - Concrete, actionable steps
   - Prioritized (high/medium/low)
   - Time-bound

6. Critical Assumptions:
   - What must be true for this recommendation to hold?

7. Watch Signals:
   - What should be monitored that might change the recommendation?

Be decisive, clear, and actionable."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schemas::{EvaluationFactor, FactorAnalysis, FactorCategory, RiskScore};

    fn input() -> DecisionInput {
        DecisionInput::new("Should I accept the job offer in Berlin?").unwrap()
    }

    fn plan() -> PlannerOutput {
        PlannerOutput::new(
            vec![
                EvaluationFactor::new("Salary", "Pay change", FactorCategory::Financial),
                EvaluationFactor::new("Network", "Friends nearby", FactorCategory::Social),
                EvaluationFactor::new("Role", "Seniority", FactorCategory::Professional),
            ],
            "Relocation for a job",
        )
        .unwrap()
    }

    fn research() -> ResearchOutput {
        ResearchOutput {
            analyses: vec![FactorAnalysis {
                factor_name: "Salary".to_string(),
                insights: "30% raise".to_string(),
                data_points: vec![],
            }],
            overall_context: "Strong market".to_string(),
        }
    }

    #[test]
    fn every_step_has_a_system_prompt() {
        for kind in StepKind::ALL {
            assert!(!system_prompt_for_step(kind).is_empty(), "{:?}", kind);
        }
    }

    #[test]
    fn plan_prompt_substitutes_defaults() {
        let prompt = plan_prompt(&input());
        assert!(prompt.contains("Decision: Should I accept the job offer in Berlin?"));
        assert!(prompt.contains("Context: No additional context provided"));
        assert!(prompt.contains("Timeframe: Not specified"));
    }

    #[test]
    fn plan_prompt_uses_supplied_context() {
        let input = input().with_context("Partner works remotely").with_timeframe("3 months");
        let prompt = plan_prompt(&input);
        assert!(prompt.contains("Context: Partner works remotely"));
        assert!(prompt.contains("Timeframe: 3 months"));
    }

    #[test]
    fn research_prompt_lists_factors_with_category() {
        let prompt = research_prompt(&input(), &plan());
        assert!(prompt.contains("- Salary (financial): Pay change"));
        assert!(prompt.contains("- Network (social): Friends nearby"));
    }

    #[test]
    fn risk_prompt_includes_research_insights() {
        let prompt = risk_prompt(&input(), &plan(), &research());
        assert!(prompt.contains("- Role: Seniority"));
        assert!(prompt.contains("- Salary: 30% raise"));
        assert!(prompt.ends_with("Assign risk scores to each factor."));
    }

    #[test]
    fn strategize_prompt_carries_scores() {
        let risk = RiskOutput {
            risk_scores: vec![RiskScore {
                factor_name: "Salary".to_string(),
                score: 3.5,
                reasoning: "Cost of living".to_string(),
                severity: "low".to_string(),
            }],
            overall_risk_level: 3.5,
            risk_summary: "Low".to_string(),
        };
        let opportunity = OpportunityOutput {
            opportunity_scores: vec![],
            overall_opportunity_level: 8.0,
            opportunity_summary: "High".to_string(),
        };

        let prompt = strategize_prompt(&input(), &research(), &risk, &opportunity);
        assert!(prompt.contains("Overall Risk Score: 3.5/10"));
        assert!(prompt.contains("Overall Opportunity Score: 8/10"));
        assert!(prompt.contains("- Salary: 3.5/10 (low) - Cost of living"));
        assert!(prompt.contains("Research Context:\nStrong market"));
    }
}

//! Flattened "use case canvas" projection of a StructuredNeed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::need::{StrategicFit, StructuredNeed};

/// Placeholder for every canvas field the interview has not filled yet.
pub const UNDEFINED_FIELD: &str = "À définir";

/// Display-oriented projection of one interview, as shown in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseCanvas {
    pub id: String,
    pub created_at: String,
    /// Interviewee email
    pub submitted_by: String,

    #[serde(rename = "Persona")]
    pub persona: String,
    #[serde(rename = "painpoint")]
    pub painpoint: String,
    #[serde(rename = "opportunitécopilot")]
    pub opportunite_copilot: String,

    pub problem_to_solve: String,
    pub use_case_description: String,
    pub data_and_product_used: Vec<String>,

    pub business_objective: String,
    pub key_results: Vec<String>,
    pub stakeholders: Vec<String>,

    pub strategic_fit: StrategicFit,

    pub votes: u64,
    /// Voter emails
    pub voters: Vec<String>,
}

fn or_undefined(parts: Vec<String>, sep: &str) -> String {
    if parts.is_empty() {
        UNDEFINED_FIELD.to_string()
    } else {
        parts.join(sep)
    }
}

/// Projects `need` into a fresh canvas with a new id and the current timestamp.
pub fn convert_to_canvas(need: &StructuredNeed, submitted_by: &str) -> UseCaseCanvas {
    let problem_to_solve = or_undefined(
        need.pain_points
            .iter()
            .map(|p| format!("{}: {}", p.theme, p.impact))
            .collect(),
        ". ",
    );

    let use_case_description = or_undefined(
        need.copilot_opportunities
            .iter()
            .map(|o| format!("{}: {} → {}", o.name, o.trigger, o.expected_output))
            .collect(),
        ". ",
    );

    let data_and_product_used = need
        .data_footprint
        .sources
        .iter()
        .map(|s| format!("{} ({})", s.label, s.location))
        .chain(need.workflow.current_tools.iter().cloned())
        .collect();

    let business_objective = if need.expected_outcomes.success_kpis.is_empty() {
        UNDEFINED_FIELD.to_string()
    } else {
        format!(
            "Améliorer l'efficacité via Copilot M365. KPIs: {}",
            need.expected_outcomes.success_kpis.join(", ")
        )
    };

    let key_results = need
        .copilot_opportunities
        .iter()
        .filter(|o| !o.success_metric.is_empty())
        .map(|o| format!("{}: {}", o.name, o.success_metric))
        .collect();

    let mut stakeholders: Vec<String> = Vec::new();
    let candidates = need
        .persona
        .role
        .iter()
        .chain(need.data_footprint.sources.iter().filter_map(|s| s.owner.as_ref()))
        .chain(need.automation_wishlist.iter().filter_map(|a| a.owner.as_ref()));
    for who in candidates {
        if !who.is_empty() && !stakeholders.contains(who) {
            stakeholders.push(who.clone());
        }
    }

    let persona = match &need.persona.role {
        Some(role) => format!(
            "{} {} {}",
            need.persona.name.as_deref().unwrap_or("Anonyme"),
            role,
            need.persona.business_unit.as_deref().unwrap_or("")
        ),
        None => UNDEFINED_FIELD.to_string(),
    };

    let painpoint = or_undefined(
        need.pain_points.iter().take(3).map(|p| p.theme.clone()).collect(),
        " • ",
    );

    let opportunite_copilot = match need.copilot_opportunities.first() {
        Some(first) => format!("Propose {} pour {}", first.name, first.trigger),
        None => UNDEFINED_FIELD.to_string(),
    };

    UseCaseCanvas {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now().to_rfc3339(),
        submitted_by: submitted_by.to_string(),
        persona,
        painpoint,
        opportunite_copilot,
        problem_to_solve,
        use_case_description,
        data_and_product_used,
        business_objective,
        key_results,
        stakeholders,
        strategic_fit: need.strategic_fit.clone(),
        votes: 0,
        voters: Vec::new(),
    }
}

/// Plain-text rendering used by the terminal client and the CLI.
pub fn render_text(canvas: &UseCaseCanvas) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            format!("  - {UNDEFINED_FIELD}")
        } else {
            items
                .iter()
                .map(|i| format!("  - {i}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    format!(
        "Persona: {}\nPain points: {}\nOpportunité Copilot: {}\n\n\
         Problème à résoudre: {}\nDescription: {}\nDonnées et produits:\n{}\n\n\
         Objectif métier: {}\nRésultats clés:\n{}\nParties prenantes:\n{}\n\n\
         Strategic fit: importance {} · fréquence {} (score {}/9)\n{}",
        canvas.persona,
        canvas.painpoint,
        canvas.opportunite_copilot,
        canvas.problem_to_solve,
        canvas.use_case_description,
        list(&canvas.data_and_product_used),
        canvas.business_objective,
        list(&canvas.key_results),
        list(&canvas.stakeholders),
        canvas.strategic_fit.importance.label_fr(),
        canvas.strategic_fit.frequency.label_fr(),
        canvas.strategic_fit.score(),
        canvas.strategic_fit.rationale,
    )
}

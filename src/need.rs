//! The StructuredNeed model: one interview's collected answers.
//!
//! Wire format is camelCase JSON. Every section has a default so a need can be
//! created empty and filled progressively by merged partial updates.

use serde::{Deserialize, Serialize};

use crate::deserializers::{de_option_string_forgiving, de_string_lenient, de_string_list};

string_enum! {
    /// Three-step scale used for pain point frequency and strategic fit.
    pub enum FitLevel (default = Medium, lenient) {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl FitLevel {
    /// Weight used by the strategic score (low=1, medium=2, high=3).
    pub fn weight(&self) -> u8 {
        match self {
            FitLevel::Low => 1,
            FitLevel::Medium => 2,
            FitLevel::High => 3,
        }
    }

    pub fn label_fr(&self) -> &'static str {
        match self {
            FitLevel::Low => "Faible",
            FitLevel::Medium => "Moyenne",
            FitLevel::High => "Élevée",
        }
    }
}

string_enum! {
    pub enum PriorityLevel (default = ShouldHave, lenient) {
        MustHave => "must-have",
        ShouldHave => "should-have",
        NiceToHave => "nice-to-have",
    }
}

string_enum! {
    pub enum SourceLocation (default = SharePoint, lenient) {
        SharePoint => "SharePoint",
        OneDrive => "OneDrive",
        Teams => "Teams",
        Local => "Local",
        BusinessApp => "BusinessApp",
        Email => "Email",
        Other => "Other",
    }
}

string_enum! {
    pub enum Sensitivity (default = Internal, lenient) {
        Public => "public",
        Internal => "internal",
        Confidential => "confidential",
    }
}

string_enum! {
    pub enum IngestionNeed (default = Read, lenient) {
        Read => "read",
        Write => "write",
        BiDirectional => "bi-directional",
    }
}

string_enum! {
    /// Lifecycle step an opportunity targets.
    pub enum OpportunityPhase (default = Discover, lenient) {
        Discover => "discover",
        Design => "design",
        Execute => "execute",
        Report => "report",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Persona {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub role: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub business_unit: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub geography: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub seniority: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "de_string_list")]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workflow {
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "de_string_list")]
    pub key_activities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "de_string_list")]
    pub current_tools: Vec<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub weekly_volume: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub cycle_time_pain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PainPoint {
    #[serde(deserialize_with = "de_string_lenient")]
    pub theme: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub root_cause: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub impact: String,
    pub frequency: FitLevel,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub kpi_affected: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSource {
    #[serde(deserialize_with = "de_string_lenient")]
    pub label: String,
    pub location: SourceLocation,
    #[serde(deserialize_with = "de_string_lenient")]
    pub data_type: String,
    pub sensitivity: Sensitivity,
    #[serde(deserialize_with = "de_string_lenient")]
    pub approximate_volume: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub refresh_rate: String,
    pub ingestion_need: IngestionNeed,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataFootprint {
    pub sources: Vec<DataSource>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub manual_files_volume: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub quality_concerns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopilotOpportunity {
    #[serde(deserialize_with = "de_string_lenient")]
    pub name: String,
    pub phase: OpportunityPhase,
    #[serde(deserialize_with = "de_string_lenient")]
    pub trigger: String,
    #[serde(deserialize_with = "de_string_list")]
    pub input_signals: Vec<String>,
    #[serde(deserialize_with = "de_string_lenient")]
    pub expected_output: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub success_metric: String,
    pub priority: PriorityLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationItem {
    #[serde(deserialize_with = "de_string_lenient")]
    pub system: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub action: String,
    #[serde(deserialize_with = "de_string_lenient")]
    pub dependency: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Governance {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub security_considerations: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub compliance_constraints: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub approvals: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub change_management: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpectedOutcomes {
    #[serde(rename = "successKPIs", deserialize_with = "de_string_list")]
    pub success_kpis: Vec<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub timeline: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub adoption_plan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategicFit {
    pub importance: FitLevel,
    pub frequency: FitLevel,
    #[serde(deserialize_with = "de_string_lenient")]
    pub rationale: String,
}

impl StrategicFit {
    /// `importance × frequency`, from 1 (low/low) to 9 (high/high).
    pub fn score(&self) -> u8 {
        self.importance.weight() * self.frequency.weight()
    }
}

/// Nested record accumulating one interview's answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredNeed {
    pub persona: Persona,
    pub workflow: Workflow,
    pub pain_points: Vec<PainPoint>,
    pub data_footprint: DataFootprint,
    pub copilot_opportunities: Vec<CopilotOpportunity>,
    pub automation_wishlist: Vec<AutomationItem>,
    pub governance: Governance,
    pub expected_outcomes: ExpectedOutcomes,
    pub strategic_fit: StrategicFit,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_option_string_forgiving"
    )]
    pub summary_note: Option<String>,
    #[serde(deserialize_with = "de_string_list")]
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_wire_shape() {
        let v = serde_json::to_value(StructuredNeed::default()).unwrap();
        assert_eq!(
            v,
            json!({
                "persona": {},
                "workflow": {},
                "painPoints": [],
                "dataFootprint": { "sources": [] },
                "copilotOpportunities": [],
                "automationWishlist": [],
                "governance": {},
                "expectedOutcomes": { "successKPIs": [] },
                "strategicFit": { "importance": "medium", "frequency": "medium", "rationale": "" },
                "nextSteps": []
            })
        );
    }

    #[test]
    fn test_enums_parse_forgivingly() {
        let fit: StrategicFit =
            serde_json::from_value(json!({"importance": " HIGH ", "frequency": null})).unwrap();
        assert_eq!(fit.importance, FitLevel::High);
        assert_eq!(fit.frequency, FitLevel::Medium);

        let src: DataSource = serde_json::from_value(json!({
            "label": "Plan marketing",
            "location": "sharepoint",
            "ingestionNeed": "Bi-Directional"
        }))
        .unwrap();
        assert_eq!(src.location, SourceLocation::SharePoint);
        assert_eq!(src.ingestion_need, IngestionNeed::BiDirectional);
        assert_eq!(src.sensitivity, Sensitivity::Internal);
    }

    #[test]
    fn test_unknown_enum_value_falls_back_to_default() {
        let fit: StrategicFit =
            serde_json::from_value(json!({"importance": "critique", "frequency": 3})).unwrap();
        assert_eq!(fit.importance, FitLevel::Medium);
        assert_eq!(fit.frequency, FitLevel::Medium);
        assert!("critique".parse::<FitLevel>().is_err());
    }

    #[test]
    fn test_spaced_vocabulary_is_hyphenated() {
        let opp: CopilotOpportunity =
            serde_json::from_value(json!({"name": "Agent", "priority": "Must have"})).unwrap();
        assert_eq!(opp.priority, PriorityLevel::MustHave);
        let src: DataSource =
            serde_json::from_value(json!({"label": "CRM", "ingestionNeed": "bi_directional"}))
                .unwrap();
        assert_eq!(src.ingestion_need, IngestionNeed::BiDirectional);
    }

    #[test]
    fn test_strategic_score_range() {
        let low = StrategicFit {
            importance: FitLevel::Low,
            frequency: FitLevel::Low,
            rationale: String::new(),
        };
        let high = StrategicFit {
            importance: FitLevel::High,
            frequency: FitLevel::High,
            rationale: String::new(),
        };
        assert_eq!(low.score(), 1);
        assert_eq!(StrategicFit::default().score(), 4);
        assert_eq!(high.score(), 9);
    }

    #[test]
    fn test_partial_records_take_defaults() {
        let need: StructuredNeed = serde_json::from_value(json!({
            "painPoints": [{ "theme": "Reporting", "impact": "2h/semaine" }],
            "copilotOpportunities": [{ "name": "Agent veille", "inputSignals": "emails" }]
        }))
        .unwrap();
        assert_eq!(need.pain_points[0].root_cause, "");
        assert_eq!(need.pain_points[0].frequency, FitLevel::Medium);
        assert_eq!(need.copilot_opportunities[0].priority, PriorityLevel::ShouldHave);
        assert_eq!(need.copilot_opportunities[0].input_signals, vec!["emails".to_string()]);
    }
}

//! Guided interview state: phases, agent replies and the conversation machine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NeedCanvasError, Result, flatten_details};
use crate::merge::merge_or_keep;
use crate::need::StructuredNeed;
use crate::transcript::{ChatMessage, numbered_transcript};

pub const INITIAL_ASSISTANT_MESSAGE: &str = "Bonjour, je suis Helios. Prenons 15 minutes pour cartographier votre quotidien de chef·fe de produit marketing chez BMS. Pour commencer, décrivez votre rôle, les marchés couverts et les jalons critiques de vos semaines ?";

pub const TECHNICAL_INCIDENT_MESSAGE: &str = "Je rencontre un incident technique. Veuillez contacter Maxime Latry ou réessayez dans quelques secondes.";

string_enum! {
    /// Section of the guided interview currently active.
    pub enum AgentPhase (default = Contexte) {
        Contexte => "contexte",
        PainPoints => "pain-points",
        Donnees => "donnees",
        Copilot => "copilot",
        AutomationAvancee => "automation-avancee",
        Normalisation => "normalisation",
    }
}

impl AgentPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AgentPhase::Contexte => "Découverte",
            AgentPhase::PainPoints => "Douleurs",
            AgentPhase::Donnees => "Cartographie données",
            AgentPhase::Copilot => "Idées Copilot",
            AgentPhase::AutomationAvancee => "Cas idéaux",
            AgentPhase::Normalisation => "Normalisation",
        }
    }
}

string_enum! {
    pub enum AgentStatus (default = Continue) {
        Continue => "continue",
        Ready => "ready",
    }
}

/// One turn of the interviewer model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub reply: String,
    pub phase: AgentPhase,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_update: Option<Map<String, Value>>,
}

impl AgentReply {
    /// Strict parse: `reply`, `phase` and `status` must be present strings,
    /// `normalizedUpdate` an object when given.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(NeedCanvasError::validation("agent reply must be a JSON object"));
        };
        let mut field_errors = Vec::new();
        for key in ["reply", "phase", "status"] {
            if !obj.get(key).is_some_and(Value::is_string) {
                field_errors.push((key.to_string(), "Required string".to_string()));
            }
        }
        if obj
            .get("normalizedUpdate")
            .is_some_and(|u| !u.is_object() && !u.is_null())
        {
            field_errors.push(("normalizedUpdate".to_string(), "Expected object".to_string()));
        }
        if !field_errors.is_empty() {
            return Err(NeedCanvasError::Validation {
                message: "agent reply does not match the expected shape".to_string(),
                details: flatten_details(&[], &field_errors),
            });
        }
        serde_json::from_value(value).map_err(|e| NeedCanvasError::validation(e.to_string()))
    }

    pub fn update_value(&self) -> Option<Value> {
        self.normalized_update.clone().map(Value::Object)
    }
}

string_enum! {
    /// Client-side readiness, distinct from the agent's own status wording.
    pub enum InterviewStatus (default = Collect) {
        Collect => "collect",
        Ready => "ready",
    }
}

/// Messages, phase, readiness and accumulated need of one interview.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    phase: AgentPhase,
    status: InterviewStatus,
    need: StructuredNeed,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(INITIAL_ASSISTANT_MESSAGE)],
            phase: AgentPhase::Contexte,
            status: InterviewStatus::Collect,
            need: StructuredNeed::default(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    pub fn need(&self) -> &StructuredNeed {
        &self.need
    }

    /// Appends a trimmed user message. Blank input is rejected and nothing changes.
    pub fn push_user(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NeedCanvasError::validation("message vide"));
        }
        self.messages.push(ChatMessage::user(text));
        Ok(())
    }

    pub fn apply_reply(&mut self, reply: AgentReply) {
        let update = reply.update_value();
        self.need = merge_or_keep(&self.need, update.as_ref());
        self.messages.push(ChatMessage::assistant(reply.reply));
        self.phase = reply.phase;
        self.status = match reply.status {
            AgentStatus::Ready => InterviewStatus::Ready,
            AgentStatus::Continue => InterviewStatus::Collect,
        };
    }

    pub fn apply_failure(&mut self) {
        self.messages
            .push(ChatMessage::assistant(TECHNICAL_INCIDENT_MESSAGE));
    }

    pub fn can_finalize(&self) -> bool {
        self.status == InterviewStatus::Ready && !self.need.copilot_opportunities.is_empty()
    }

    pub fn transcript(&self) -> String {
        numbered_transcript(&self.messages)
    }
}

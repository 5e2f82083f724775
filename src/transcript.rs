//! Role-tagged chat messages and their text renderings.

use serde::{Deserialize, Serialize};

string_enum! {
    pub enum Role (default = User) {
        User => "user",
        Assistant => "assistant",
    }
}

impl Role {
    /// Speaker name used in prompts sent upstream.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::Assistant => "Helios",
            Role::User => "Utilisateur",
        }
    }

    /// Speaker name shown to the interviewee.
    pub fn display_label(&self) -> &'static str {
        match self {
            Role::Assistant => "Helios",
            Role::User => "Vous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// `Helios: …` / `Utilisateur: …` blocks separated by blank lines.
pub fn transcript_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.prompt_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `1. Helios · …` lines, one per message.
pub fn numbered_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(idx, m)| format!("{}. {} · {}", idx + 1, m.role.display_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The last `limit` messages.
pub fn recent(messages: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    &messages[messages.len().saturating_sub(limit)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ChatMessage> {
        vec![
            ChatMessage::assistant("Bonjour"),
            ChatMessage::user("Je gère deux marques"),
            ChatMessage::assistant("Combien de rapports ?"),
        ]
    }

    #[test]
    fn test_prompt_transcript() {
        assert_eq!(
            transcript_text(&sample()),
            "Helios: Bonjour\n\nUtilisateur: Je gère deux marques\n\nHelios: Combien de rapports ?"
        );
    }

    #[test]
    fn test_numbered_transcript() {
        assert_eq!(
            numbered_transcript(&sample()),
            "1. Helios · Bonjour\n2. Vous · Je gère deux marques\n3. Helios · Combien de rapports ?"
        );
    }

    #[test]
    fn test_recent_window() {
        let msgs = sample();
        assert_eq!(recent(&msgs, 2).len(), 2);
        assert_eq!(recent(&msgs, 2)[0].content, "Je gère deux marques");
        assert_eq!(recent(&msgs, 20).len(), 3);
    }

    #[test]
    fn test_role_wire_values() {
        let m: ChatMessage =
            serde_json::from_value(serde_json::json!({"role": "assistant", "content": "x"}))
                .unwrap();
        assert_eq!(m.role, Role::Assistant);
        assert!(
            serde_json::from_value::<ChatMessage>(serde_json::json!({"role": "system", "content": "x"}))
                .is_err()
        );
    }
}

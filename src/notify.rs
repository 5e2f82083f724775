//! Recap email for completed legacy interviews, sent through a mail relay webhook.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::clients::WebhookClient;
use crate::error::Result;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_summary(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// Posts `{from, to, subject, html}` to a relay that owns the SMTP side.
pub struct MailRelayNotifier {
    webhooks: Arc<dyn WebhookClient>,
    relay_url: String,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(webhooks: Arc<dyn WebhookClient>, relay_url: String, from: String) -> Self {
        Self {
            webhooks,
            relay_url,
            from,
        }
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send_summary(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let body = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html,
        });
        self.webhooks
            .post_json(&self.relay_url, &body)
            .await?
            .ensure_success("mail relay")?;
        Ok(())
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// HTML body: the session title and the pretty-printed state.
pub fn summarize_for_email(state: &Value) -> String {
    let title = state
        .pointer("/meta/title")
        .and_then(Value::as_str)
        .unwrap_or("Entretien Agent M365 Copilot");
    let pretty = serde_json::to_string_pretty(state).unwrap_or_else(|_| state.to_string());
    format!(
        "<h2>{}</h2><p>Résumé normé de l’entretien. Voir payload JSON en pièce jointe si besoin.</p>\
         <pre style=\"background:#0b1218;color:#e6edf3;padding:12px;border-radius:6px;\">{}</pre>",
        escape_html(title),
        escape_html(&pretty)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"R&D"</b> l'équipe"#),
            "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt; l&#039;équipe"
        );
    }

    #[test]
    fn test_summary_uses_title_and_escapes_state() {
        let html = summarize_for_email(&json!({
            "meta": { "title": "BMS <test>" },
            "summary": "a < b"
        }));
        assert!(html.starts_with("<h2>BMS &lt;test&gt;</h2>"));
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_summary_default_title() {
        let html = summarize_for_email(&json!({}));
        assert!(html.contains("Entretien Agent M365 Copilot"));
    }
}

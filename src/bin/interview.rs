//! Terminal client for the guided interview.
//!
//! Type answers at the prompt. Commands: `/canvas` previews the canvas,
//! `/transcript` prints the numbered transcript, `/finalize` submits the
//! need once the interviewer says it is ready, `/quit` leaves.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use std::time::Duration;

use need_canvas::canvas::{convert_to_canvas, render_text};
use need_canvas::interview::{AgentReply, Conversation};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of a running need-canvas server
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    server: String,

    /// Email sent with the finalized need
    #[arg(long)]
    email: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

struct Session {
    http: reqwest::blocking::Client,
    base: String,
    email: Option<String>,
    conversation: Conversation,
}

impl Session {
    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(body)
            .send()
            .with_context(|| format!("POST {path} failed"))?;
        let status = resp.status();
        let value: Value = resp.json().unwrap_or(Value::Null);
        if !status.is_success() {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("erreur inconnue");
            bail!("{path} answered {status}: {message}");
        }
        Ok(value)
    }

    fn ask(&mut self, text: &str) {
        if self.conversation.push_user(text).is_err() {
            return;
        }
        let body = json!({
            "messages": self.conversation.messages(),
            "phase": self.conversation.phase(),
        });
        let reply = self
            .post("/api/chat", &body)
            .and_then(|v| AgentReply::from_value(v).map_err(anyhow::Error::from));
        match reply {
            Ok(reply) => self.conversation.apply_reply(reply),
            Err(e) => {
                eprintln!("({e})");
                self.conversation.apply_failure();
            }
        }
        if let Some(last) = self.conversation.messages().last() {
            println!("\nHelios · {}\n", last.content);
        }
        println!(
            "[{} · {}]",
            self.conversation.phase().label(),
            self.conversation.status()
        );
    }

    fn finalize(&self) -> Result<()> {
        if !self.conversation.can_finalize() {
            bail!("l'entretien n'est pas encore prêt à être finalisé");
        }
        let mut body = json!({
            "structuredNeed": self.conversation.need(),
            "transcript": self.conversation.messages(),
        });
        if let Some(email) = &self.email {
            body["recipientEmail"] = json!(email);
        }
        self.post("/api/finalize", &body)?;
        Ok(())
    }

    fn preview(&self) -> String {
        let author = self.email.as_deref().unwrap_or("anonymous");
        render_text(&convert_to_canvas(self.conversation.need(), author))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let mut session = Session {
        http,
        base: args.server.trim_end_matches('/').to_string(),
        email: args.email,
        conversation: Conversation::new(),
    };

    if let Some(greeting) = session.conversation.messages().first() {
        println!("Helios · {}\n", greeting.content);
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Vous › ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/canvas" => println!("\n{}\n", session.preview()),
            "/transcript" => println!("\n{}\n", session.conversation.transcript()),
            "/finalize" => match session.finalize() {
                Ok(()) => {
                    println!("\nBesoin transmis. Canevas :\n\n{}\n", session.preview());
                    break;
                }
                Err(e) => eprintln!("Finalisation impossible : {e}"),
            },
            text => session.ask(text),
        }
    }
    Ok(())
}

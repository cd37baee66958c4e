use std::io::{self, Write};
use std::sync::mpsc;

use ask_user_app::response::{answer_reports, AnswerReport};
use ask_user_app::{DeliveryError, ResponseSink, Session};
use clap::ValueEnum;
use serde::Serialize;
use tracing::warn;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Response<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a str>,
    #[serde(skip_serializing_if = "no_answers")]
    answers: &'a [AnswerReport],
}

fn no_answers(answers: &&[AnswerReport]) -> bool {
    answers.is_empty()
}

/// Writes each delivered response to stdout, one line per delivery, and
/// signals `delivered` after every successful write.
pub struct StdoutSink {
    format: OutputFormat,
    answers: Vec<AnswerReport>,
    delivered: mpsc::Sender<()>,
}

impl StdoutSink {
    pub fn new(format: OutputFormat, delivered: mpsc::Sender<()>) -> Self {
        Self {
            format,
            answers: Vec::new(),
            delivered,
        }
    }

    /// Capture the structured answers that accompany the next delivery.
    pub fn prepare(&mut self, session: &Session) {
        if self.format == OutputFormat::Json {
            let flow = session.flow();
            self.answers = answer_reports(flow.questions(), flow.answers());
        }
    }

    fn render(&self, text: &str) -> Result<String, DeliveryError> {
        match self.format {
            OutputFormat::Text => Ok(text.to_string()),
            OutputFormat::Json => serde_json::to_string(&Response {
                status: "selected",
                response: Some(text),
                answers: &self.answers,
            })
            .map_err(|err| DeliveryError::Rejected(err.to_string())),
        }
    }
}

impl ResponseSink for StdoutSink {
    fn deliver(&mut self, text: &str) -> Result<(), DeliveryError> {
        let line = self.render(text)?;
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        if self.delivered.send(()).is_err() {
            warn!("delivery signal dropped; a cancellation record may follow");
        }
        Ok(())
    }
}

/// Record printed when the window closes without any delivery.
pub fn print_cancelled(format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Text {
        return Ok(());
    }
    let line = serde_json::to_string(&Response {
        status: "cancelled",
        response: None,
        answers: &[],
    })?;
    writeln!(io::stdout().lock(), "{line}")
}

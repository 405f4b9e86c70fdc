use std::io::Write;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::interfaces::ui::{Modal, Tone, UiEvent, UiSink};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Renders widget events on a terminal. Markup is reduced to tab-separated rows.
pub struct TerminalSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl TerminalSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Tab-separated text for each `<tr>` in `html`.
    pub fn html_rows(&self, html: &str) -> Vec<String> {
        html.split("</tr>")
            .filter_map(|row| {
                let cells: Vec<String> = row
                    .split("</td>")
                    .map(|cell| unescape(TAG_RE.replace_all(cell, "").trim()))
                    .filter(|cell| !cell.is_empty())
                    .collect();
                if cells.is_empty() || !row.contains("<td") {
                    None
                } else {
                    Some(cells.join("\t"))
                }
            })
            .collect()
    }

    fn render(&self, event: &UiEvent) -> Vec<String> {
        match event {
            UiEvent::Toast { message, tone } => match tone {
                Tone::Ok => vec![format!("✔ {message}")],
                Tone::Err => vec![format!("✖ {message}")],
            },
            UiEvent::Alert(message) => vec![format!("! {message}")],
            UiEvent::TableRendered { html } | UiEvent::ListReplaced { html } => {
                let rows = self.html_rows(html);
                if rows.is_empty() {
                    vec![unescape(TAG_RE.replace_all(html, "").trim())]
                } else {
                    rows
                }
            }
            UiEvent::EmptyState => vec!["(no results)".to_string()],
            UiEvent::ModalOpened {
                modal: Modal::DeleteClient,
                title,
            } => vec![format!(
                "Delete client {}?",
                title.as_deref().unwrap_or_default()
            )],
            UiEvent::TranscriptAppended { line } | UiEvent::DeliveryFailed { line } => {
                vec![line.clone()]
            }
            UiEvent::StatusText(text) if !text.is_empty() => vec![text.clone()],
            _ => Vec::new(),
        }
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

impl UiSink for TerminalSink {
    fn emit(&self, event: UiEvent) {
        tracing::trace!(?event, "ui event");
        let lines = self.render(&event);
        if lines.is_empty() {
            return;
        }
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

use std::io::Write;

use crate::state::Record;
use crate::timer::{PLACEHOLDER_ELAPSED, PLACEHOLDER_MESSAGE, Status, Urgency};

pub const EMPTY_HISTORY_MESSAGE: &str = "No history yet";

/// What the presentation layer gets after every state change or tick.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub record: &'a Record,
    pub status: Option<Status>,
}

impl View<'_> {
    pub fn elapsed_text(&self) -> String {
        match self.status {
            Some(status) => status.elapsed.to_string(),
            None => PLACEHOLDER_ELAPSED.to_string(),
        }
    }

    pub fn message(&self) -> &'static str {
        match self.status {
            Some(status) => status.urgency.message(),
            None => PLACEHOLDER_MESSAGE,
        }
    }

    pub fn urgency_label(&self) -> &'static str {
        match self.status.map(|status| status.urgency) {
            Some(Urgency::Fresh) | None => "fresh",
            Some(Urgency::Warning) => "warning",
            Some(Urgency::Overdue) => "overdue",
        }
    }
}

pub trait Renderer {
    fn render(&mut self, view: &View<'_>);
}

impl<F> Renderer for F
where
    F: FnMut(&View<'_>),
{
    fn render(&mut self, view: &View<'_>) {
        self(view)
    }
}

pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&mut self, _view: &View<'_>) {}
}

/// Writes one status line per render.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, view: &View<'_>) {
        let _ = writeln!(self.out, "{}", status_line(view));
        let _ = self.out.flush();
    }
}

pub fn status_line(view: &View<'_>) -> String {
    format!(
        "{}  [{}] {}",
        view.elapsed_text(),
        view.urgency_label(),
        view.message()
    )
}

pub fn history_lines(record: &Record) -> Vec<String> {
    if record.history.is_empty() {
        return vec![EMPTY_HISTORY_MESSAGE.to_string()];
    }
    record
        .history
        .iter()
        .map(|entry| format!("Shower  {entry}"))
        .collect()
}

pub fn alarm_lines(record: &Record) -> Vec<String> {
    if record.alarms.is_empty() {
        return vec!["No alarms set".to_string()];
    }
    record
        .alarms
        .iter()
        .map(|alarm| format!("{}  (id {})", alarm.time, alarm.id))
        .collect()
}

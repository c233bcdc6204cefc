use crate::types::{AnalysisResult, AnalysisState, InputReference};
use crate::utils::text::capitalize;
use std::fmt::Write;

/// Consumer of the read-only snapshots exposed by the resolver and the
/// orchestrator. Presenters never mutate either component.
pub trait ResultPresenter {
    fn render(&self, reference: &InputReference, state: &AnalysisState) -> String;
}

/// Plain-text rendering used by the CLI
#[derive(Debug, Clone, Default)]
pub struct TextPresenter {
    numbered_sections: Vec<String>,
}

impl TextPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `name` as a numbered list instead of bullets
    pub fn with_numbered_section(mut self, name: impl Into<String>) -> Self {
        self.numbered_sections.push(name.into());
        self
    }

    fn render_result(&self, out: &mut String, result: &AnalysisResult) {
        let _ = writeln!(out, "\nSummary");
        if result.summary().is_empty() {
            let _ = writeln!(out, "  (no summary)");
        } else {
            let _ = writeln!(out, "  {}", result.summary());
        }

        for section in result.sections() {
            let numbered = self.numbered_sections.iter().any(|name| name == section.name());
            let _ = writeln!(out, "\n{}", capitalize(section.name()));
            for (index, item) in section.items().iter().enumerate() {
                if numbered {
                    let _ = writeln!(out, "  {}. {}", index + 1, item);
                } else {
                    let _ = writeln!(out, "  - {}", item);
                }
            }
        }
    }
}

impl ResultPresenter for TextPresenter {
    fn render(&self, reference: &InputReference, state: &AnalysisState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Input: {}", reference);

        match state {
            AnalysisState::Idle => {
                let _ = writeln!(out, "Status: idle");
            }
            AnalysisState::Running { request } => {
                let _ = writeln!(
                    out,
                    "Status: analyzing {} (since {})",
                    request.reference(),
                    request.requested_at().format("%H:%M:%S")
                );
            }
            AnalysisState::Succeeded { result } => {
                let _ = writeln!(out, "Status: complete");
                self.render_result(&mut out, result);
            }
            AnalysisState::Failed { reason } => {
                let _ = writeln!(out, "Status: failed");
                let _ = writeln!(out, "  {}", reason);
                let _ = writeln!(out, "  Try again to start a new analysis.");
            }
        }

        out
    }
}

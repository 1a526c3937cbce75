//! Output shapes for the `resolve` and `plan` commands.

use serde::Serialize;

use refgraph::{ComponentSlot, Placement, Resolution, Summary};

/// One root's entry in `resolve` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootReport {
    pub root: String,
    /// Visited documents in traversal order.
    pub remote_refs: Vec<String>,
    pub missing_remote_refs: Vec<String>,
    pub summary: Summary,
}

impl From<&Resolution> for RootReport {
    fn from(resolution: &Resolution) -> Self {
        Self {
            root: resolution.spec_root.file_name.clone(),
            remote_refs: resolution
                .remote_refs
                .iter()
                .map(|r| r.file_name.clone())
                .collect(),
            missing_remote_refs: resolution
                .missing_remote_refs
                .iter()
                .map(|d| d.path.clone())
                .collect(),
            summary: resolution.summary(),
        }
    }
}

/// A root that could not be resolved.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub file: String,
    pub message: String,
}

/// Totals across every root of a `resolve` run.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub roots: usize,
    pub resolved: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Full `resolve` output.
#[derive(Debug, Default)]
pub struct ResolveReport {
    pub results: Vec<RootReport>,
    pub failures: Vec<Failure>,
    /// Empty roots left out of a multi-root run.
    pub skipped: Vec<String>,
}

impl ResolveReport {
    pub fn push(&mut self, resolution: &Resolution) {
        self.results.push(RootReport::from(resolution));
    }

    pub fn fail(&mut self, file: impl Into<String>, message: impl Into<String>) {
        self.failures.push(Failure {
            file: file.into(),
            message: message.into(),
        });
    }

    pub fn skip(&mut self, file: impl Into<String>) {
        self.skipped.push(file.into());
    }

    pub fn totals(&self) -> Totals {
        Totals {
            roots: self.results.len() + self.failures.len() + self.skipped.len(),
            resolved: self.results.iter().map(|r| r.summary.resolved).sum(),
            missing: self.results.iter().map(|r| r.summary.missing).sum(),
            failed: self.failures.len(),
        }
    }

    pub fn has_missing(&self) -> bool {
        self.results.iter().any(|r| r.summary.missing > 0)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "results": self.results,
            "failures": self.failures,
            "skipped": self.skipped,
            "summary": self.totals(),
        })
    }

    /// Human-readable lines, one block per root.
    pub fn to_text(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for result in &self.results {
            if result.missing_remote_refs.is_empty() {
                lines.push(format!(
                    "✓ {} ({} reference(s) resolved)",
                    result.root, result.summary.resolved
                ));
            } else {
                lines.push(format!(
                    "✗ {} ({} resolved, {} missing)",
                    result.root, result.summary.resolved, result.summary.missing
                ));
            }
            for name in &result.remote_refs {
                lines.push(format!("  -> {name}"));
            }
            for path in &result.missing_remote_refs {
                lines.push(format!("  missing: {path}"));
            }
        }
        for failure in &self.failures {
            lines.push(format!("✗ {}: {}", failure.file, failure.message));
        }
        for file in &self.skipped {
            lines.push(format!("- {} skipped (empty)", file));
        }

        let totals = self.totals();
        lines.push(String::new());
        lines.push(format!(
            "resolved {} root(s): {} reference(s), {} missing, {} failed",
            totals.roots, totals.resolved, totals.missing, totals.failed
        ));
        lines
    }
}

/// Human-readable lines for a `plan` run.
pub fn plan_text(file: &str, slots: &[ComponentSlot]) -> Vec<String> {
    let mut lines = vec![format!("{file}: {} external reference(s)", slots.len())];
    for slot in slots {
        let target = match &slot.placement {
            Placement::Component { pointer } => pointer.clone(),
            Placement::InComponents => "(already in components)".to_string(),
            Placement::Unplaced => "(no component category)".to_string(),
        };
        lines.push(format!("  {} [{}] -> {}", slot.reference, slot.location, target));
    }
    lines
}

//! Summary report generator for shell output.
//!
//! Provides a compact, human-readable summary for terminal usage.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{Drift, DriftEntity, EntityDiff, LibraryContents, LibraryDrift, UNASSIGNED_LIBRARY};
use std::fmt::Write as _;

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str, config: &ReportConfig) -> String {
        ansi_color(text, color, self.colored && config.colored)
    }

    fn library_label(uuid: uuid::Uuid, name: &str) -> String {
        if uuid == UNASSIGNED_LIBRARY {
            "(unassigned)".to_string()
        } else if name.is_empty() {
            uuid.to_string()
        } else {
            format!("{name} ({uuid})")
        }
    }

    fn whole_library(&self, lines: &mut Vec<String>, library: &LibraryContents, sign: &str, color: &str, config: &ReportConfig) {
        lines.push(format!(
            "  {} {}  {} {}, {} {}",
            self.color(sign, color, config),
            Self::library_label(library.uuid(), &library.library.name),
            library.entity_count(),
            plural(library.entity_count(), "entity", "entities"),
            library.mapping_count(),
            plural(library.mapping_count(), "mapping", "mappings"),
        ));
    }

    fn modified_library(&self, lines: &mut Vec<String>, library: &LibraryDrift, config: &ReportConfig) {
        lines.push(format!(
            "  {} {}",
            self.color("~", "yellow", config),
            Self::library_label(library.uuid, &library.name)
        ));
        for change in &library.field_changes {
            lines.push(format!(
                "      {} {} → {}",
                self.color(&change.field, "cyan", config),
                change.old_value.as_deref().unwrap_or("∅"),
                change.new_value.as_deref().unwrap_or("∅"),
            ));
        }
        self.entity_section(lines, "components", &library.components, config);
        self.entity_section(lines, "threats", &library.threats, config);
        self.entity_section(lines, "security requirements", &library.security_requirements, config);
        self.entity_section(lines, "test cases", &library.test_cases, config);
        self.entity_section(lines, "properties", &library.properties, config);
    }

    fn entity_section<T: DriftEntity>(
        &self,
        lines: &mut Vec<String>,
        label: &str,
        diff: &EntityDiff<T>,
        config: &ReportConfig,
    ) {
        if diff.is_empty() {
            return;
        }
        lines.push(format!(
            "      {label}: {} {} {}",
            self.color(&format!("+{}", diff.added.len()), "green", config),
            self.color(&format!("-{}", diff.removed.len()), "red", config),
            self.color(&format!("~{}", diff.modified.len()), "yellow", config),
        ));

        let limit = config.max_items.unwrap_or(usize::MAX);
        let names = diff
            .added
            .iter()
            .map(|r| ("+", r.entity.name()))
            .chain(diff.removed.iter().map(|r| ("-", r.entity.name())))
            .chain(diff.modified.iter().map(|r| ("~", r.entity.name())));
        let mut shown = 0;
        for (sign, name) in names {
            if shown == limit {
                lines.push(format!("        {}", self.color("…", "dim", config)));
                break;
            }
            let name = if name.is_empty() { "(unnamed)" } else { name };
            lines.push(format!("        {sign} {name}"));
            shown += 1;
        }
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_drift_report(&self, drift: &Drift, config: &ReportConfig) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        lines.push(self.color("Content Drift Summary", "bold", config));
        lines.push(self.color("─".repeat(40).as_str(), "dim", config));

        if let (Some(baseline), Some(target)) = (&config.metadata.baseline_root, &config.metadata.target_root) {
            let mut roots = format!(
                "{}  {} → {}",
                self.color("Roots:", "cyan", config),
                baseline.display(),
                target.display()
            );
            if let (Some(b), Some(t)) = (&config.metadata.baseline_revision, &config.metadata.target_revision) {
                write!(roots, "  ({b} → {t})")?;
            }
            lines.push(roots);
        }
        lines.push(String::new());

        let summary = &drift.summary;
        if !drift.has_drift() {
            lines.push(format!("  {}", self.color("No drift", "dim", config)));
        }

        if !drift.added_libraries.is_empty() {
            lines.push(self.color("Added libraries:", "bold", config));
            for library in &drift.added_libraries {
                self.whole_library(&mut lines, library, "+", "green", config);
            }
        }
        if !drift.deleted_libraries.is_empty() {
            lines.push(self.color("Deleted libraries:", "bold", config));
            for library in &drift.deleted_libraries {
                self.whole_library(&mut lines, library, "-", "red", config);
            }
        }
        if !drift.modified_libraries.is_empty() {
            lines.push(self.color("Modified libraries:", "bold", config));
            for library in &drift.modified_libraries {
                self.modified_library(&mut lines, library, config);
            }
        }

        if !drift.global.is_empty() {
            lines.push(self.color("Global entities:", "bold", config));
            for (entity_type, changes) in &drift.global {
                lines.push(format!(
                    "  {entity_type}: +{} -{} ~{}",
                    changes.added.len(),
                    changes.deleted.len(),
                    changes.modified.len()
                ));
            }
        }

        if !drift.kind_changes.is_empty() {
            lines.push(self.color("Kind changes:", "bold", config));
            for change in &drift.kind_changes {
                lines.push(format!("  {} ({} → {})", change.path, change.from, change.to));
            }
        }

        if !drift.skipped.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "{}  {} {} skipped",
                self.color("Warning:", "yellow", config),
                drift.skipped.len(),
                plural(drift.skipped.len(), "document", "documents")
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "{}  {} total, {} entities +{} -{} ~{}, mappings +{} -{}",
            self.color("Changes:", "cyan", config),
            summary.total_changes,
            summary.entities_added + summary.entities_removed + summary.entities_modified,
            summary.entities_added,
            summary.entities_removed,
            summary.entities_modified,
            summary.mappings_added,
            summary.mappings_removed,
        ));
        let fingerprint = drift
            .fingerprint()
            .map_err(|e| ReportError::SerializationError(e.to_string()))?;
        lines.push(format!(
            "{}  {fingerprint:016x}",
            self.color("Fingerprint:", "cyan", config)
        ));

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

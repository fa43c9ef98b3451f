use console::style;
use graft_install::{Counts, DiscoveryReport, OperationKind, OperationResult, Outcome, RunReport};
use graft_manifest::Discovery;
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Formatter {
    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }
        if let Some(footer) = self.footer {
            table.with(Panel::footer(footer));
        }
        table.with(Style::blank());
        table
    }
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "step")]
    kind: String,
    name: String,
    outcome: String,
    #[tabled(rename = "detail")]
    note: String,
}

impl From<&OperationResult> for StepRow {
    fn from(result: &OperationResult) -> Self {
        Self {
            kind: result.kind.to_string(),
            name: result.name.clone(),
            outcome: paint(result.kind, result.outcome),
            note: result
                .error
                .clone()
                .or_else(|| result.detail.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct NodeRow {
    node_type: String,
    name: String,
    version: String,
    category: String,
}

fn label(kind: OperationKind, outcome: Outcome) -> &'static str {
    match (kind, outcome) {
        (OperationKind::Mount, Outcome::Applied) => "established",
        (OperationKind::Mount, Outcome::AlreadyApplied) => "in place",
        (_, Outcome::Applied) => "applied",
        (_, Outcome::AlreadyApplied) => "already applied",
        (_, Outcome::Planned) => "planned",
        (_, Outcome::Pending) => "not applied",
        (_, Outcome::Skipped) => "skipped",
        (_, Outcome::Failed) => "failed",
    }
}

fn paint(kind: OperationKind, outcome: Outcome) -> String {
    let text = label(kind, outcome);
    match outcome {
        Outcome::Applied | Outcome::Planned => style(text).green().to_string(),
        Outcome::AlreadyApplied | Outcome::Skipped => style(text).yellow().to_string(),
        Outcome::Pending | Outcome::Failed => style(text).red().to_string(),
    }
}

fn summarize(counts: &Counts, applied: &str) -> String {
    let mut parts = vec![format!("{} {applied}", counts.applied)];
    for (n, what) in [
        (counts.already_applied, "already applied"),
        (counts.planned, "planned"),
        (counts.pending, "not applied"),
        (counts.skipped, "skipped"),
    ] {
        if n > 0 {
            parts.push(format!("{n} {what}"));
        }
    }
    parts.push(format!("{} failed", counts.failed));
    parts.join(", ")
}

pub fn run_report(report: &RunReport) -> String {
    let mut out = String::new();
    let rows: Vec<StepRow> = report.results().map(StepRow::from).collect();

    if !rows.is_empty() {
        let header = if report.dry_run {
            format!("{} (dry run)", report.host_root.display())
        } else {
            report.host_root.display().to_string()
        };
        let table = Formatter {
            header: Some(header),
            ..Formatter::default()
        }
        .build(rows);
        out.push_str(&table.to_string());
        out.push('\n');
    }

    if let Some(discovery) = &report.discovery {
        out.push_str(&discovery_summary(discovery));
        out.push('\n');
    }

    let verdict = if report.success() {
        style("ok").green().bold()
    } else {
        style("failed").red().bold()
    };
    out.push_str(&format!(
        "patches: {}; mounts: {}; {verdict}",
        summarize(&report.patch_counts(), "applied"),
        summarize(&report.mount_counts(), "established"),
    ));
    out
}

fn discovery_summary(report: &DiscoveryReport) -> String {
    let mut lines = Vec::new();
    match &report.error {
        Some(e) => lines.push(format!("{} {e}", style("discovery failed:").red())),
        None => lines.push(format!(
            "discovered {} node type(s) in {}: {}",
            report.node_types.len(),
            report.root.display(),
            report.node_types.join(", ")
        )),
    }
    for rejected in &report.rejected {
        lines.push(format!(
            "{} {}: {}",
            style("rejected").red(),
            rejected.path.display(),
            rejected.reason
        ));
    }
    lines.join("\n")
}

pub fn discovery(discovery: &Discovery) -> String {
    let rows: Vec<NodeRow> = discovery
        .registry
        .iter()
        .map(|record| NodeRow {
            node_type: record.node_type.clone(),
            name: record.name.clone(),
            version: record.version.clone(),
            category: record.category.clone().unwrap_or_default(),
        })
        .collect();

    let mut out = if rows.is_empty() {
        "no manifests found".to_string()
    } else {
        Formatter::default().build(rows).to_string()
    };
    for rejected in &discovery.rejected {
        out.push_str(&format!(
            "\n{} {}: {}",
            style("rejected").red(),
            rejected.path.display(),
            rejected.reason
        ));
    }
    out
}

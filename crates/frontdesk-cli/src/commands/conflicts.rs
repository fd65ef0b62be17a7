//! Conflicts command - Inspect and resolve sync conflicts
//!
//! Provides the `frontdesk conflicts` CLI command which works on a JSON file
//! of pending conflicts exported by the sync layer:
//! 1. Lists conflicts in a table format
//! 2. Previews local vs remote field by field, with the merged result
//! 3. Prints the merged value of one conflict
//! 4. Resolves one conflict with a chosen strategy
//! 5. Reviews every conflict in order, interactively
//!
//! Interactive prompts are written to stderr so stdout stays clean for
//! `--json` output.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use frontdesk_conflict::{
    compute_resolved_value, policy::PolicyEngine, ConflictError, Decision, Outcome,
    RecordingSink, ReviewSession,
};
use frontdesk_core::domain::{ConflictResolutionStrategy, SyncConflict};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use super::{CommandContext, Reported};
use crate::output::OutputFormatter;

type Conflict = SyncConflict<Value>;

#[derive(Debug, Subcommand)]
pub enum ConflictsCommand {
    /// List conflicts in a file
    List {
        /// JSON file holding one conflict or an array of conflicts
        file: PathBuf,
    },
    /// Preview conflict details
    Preview {
        /// JSON file holding one conflict or an array of conflicts
        file: PathBuf,
        /// Conflict ID (a unique prefix is enough)
        id: String,
    },
    /// Print the merged value of a conflict
    Merge {
        /// JSON file holding one conflict or an array of conflicts
        file: PathBuf,
        /// Conflict ID (a unique prefix is enough)
        id: String,
    },
    /// Resolve a single conflict
    Resolve {
        /// JSON file holding one conflict or an array of conflicts
        file: PathBuf,
        /// Conflict ID (a unique prefix is enough)
        id: String,
        /// Resolution strategy: keep-local, keep-remote, merge, manual
        #[arg(long)]
        strategy: String,
        /// Resolved value as JSON, required with --strategy manual
        #[arg(long)]
        value: Option<String>,
        /// Write the outcome to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Review every conflict in order
    Review {
        /// JSON file holding one conflict or an array of conflicts
        file: PathBuf,
        /// Write the outcomes to this file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write ignored and unreviewed conflicts to this file
        #[arg(long)]
        pending: Option<PathBuf>,
    },
}

impl ConflictsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConflictsCommand::List { file } => self.execute_list(ctx, file).await,
            ConflictsCommand::Preview { file, id } => self.execute_preview(ctx, file, id).await,
            ConflictsCommand::Merge { file, id } => self.execute_merge(ctx, file, id).await,
            ConflictsCommand::Resolve {
                file,
                id,
                strategy,
                value,
                out,
            } => {
                self.execute_resolve(ctx, file, id, strategy, value.as_deref(), out.as_deref())
                    .await
            }
            ConflictsCommand::Review { file, out, pending } => {
                self.execute_review(ctx, file, out.as_deref(), pending.as_deref())
                    .await
            }
        }
    }

    async fn execute_list(&self, ctx: &CommandContext, file: &Path) -> Result<()> {
        let formatter = ctx.formatter();
        let conflicts = load_conflicts(file).await?;

        info!(count = conflicts.len(), "Loaded conflicts");

        if ctx.is_json() {
            let conflicts_json: Vec<Value> = conflicts.iter().map(summary_json).collect();
            formatter.print_json(&json!({
                "count": conflicts.len(),
                "conflicts": conflicts_json,
            }));
            return Ok(());
        }

        if conflicts.is_empty() {
            formatter.success("No pending conflicts");
            return Ok(());
        }

        formatter.success(&format!(
            "{} pending conflict{}",
            conflicts.len(),
            if conflicts.len() == 1 { "" } else { "s" }
        ));
        formatter.info("");
        formatter.info("  ID (short)     Collection     Local  Remote  Changed fields");
        formatter.info("  -------------- -------------- ------ ------  --------------");

        for conflict in &conflicts {
            formatter.info(&format!(
                "  {:<14} {:<14} {:>6} {:>6}  {}",
                truncate(conflict.id().as_str(), 14),
                truncate(conflict.collection().unwrap_or("-"), 14),
                conflict.local_version(),
                conflict.remote_version(),
                conflict.field_changes().join(", ")
            ));
        }

        formatter.info("");
        formatter.info("Use 'frontdesk conflicts preview <file> <id>' for details.");
        formatter.info("Use 'frontdesk conflicts review <file>' to resolve them one by one.");

        Ok(())
    }

    async fn execute_preview(&self, ctx: &CommandContext, file: &Path, id: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let conflicts = load_conflicts(file).await?;

        let conflict = match find_conflict(&conflicts, id) {
            Ok(c) => c,
            Err(e) => {
                return Err(report_failure(ctx, &*formatter, &e.to_string()));
            }
        };
        warn_unknown_fields(&*formatter, conflict);

        let policy = PolicyEngine::from_config(&ctx.config);
        let preselected = policy.preselect(conflict);
        let merged = compute_resolved_value(conflict, ConflictResolutionStrategy::Merge);

        if ctx.is_json() {
            let mut json = summary_json(conflict);
            json["local"] = conflict.local_value().clone();
            json["remote"] = conflict.remote_value().clone();
            json["merged"] = merged.unwrap_or(Value::Null);
            json["preselected"] = json!(preselected.as_str());
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Conflict Details: {}", conflict.id()));
        formatter.info("");
        formatter.info(&format!(
            "Collection:  {}",
            conflict.collection().unwrap_or("-")
        ));
        formatter.info(&format!(
            "Local:       v{} ({})",
            conflict.local_version(),
            format_modified(conflict.local_modified_at())
        ));
        formatter.info(&format!(
            "Remote:      v{} ({})",
            conflict.remote_version(),
            format_modified(conflict.remote_modified_at())
        ));
        formatter.info("");

        let rows = field_rows(conflict);
        if rows.is_empty() {
            formatter.info(&format!("Local value:   {}", conflict.local_value()));
            formatter.info(&format!("Remote value:  {}", conflict.remote_value()));
        } else {
            formatter.info("  Field            Local                      Remote");
            formatter.info("  ---------------- -------------------------- --------------------------");
            for row in &rows {
                formatter.info(&row.render());
            }
            formatter.info("");
            formatter.info("(* = changed field, remote wins on merge)");
        }

        if let Some(merged) = merged {
            formatter.info("");
            formatter.info(&format!("Merged:      {}", merged));
        }

        formatter.info("");
        formatter.info("To resolve, run:");
        formatter.info(&format!(
            "  frontdesk conflicts resolve {} {} --strategy {}",
            file.display(),
            truncate(conflict.id().as_str(), 14),
            preselected
        ));

        Ok(())
    }

    async fn execute_merge(&self, ctx: &CommandContext, file: &Path, id: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let conflicts = load_conflicts(file).await?;

        let conflict = match find_conflict(&conflicts, id) {
            Ok(c) => c,
            Err(e) => {
                return Err(report_failure(ctx, &*formatter, &e.to_string()));
            }
        };
        warn_unknown_fields(&*formatter, conflict);

        let merged = compute_resolved_value(conflict, ConflictResolutionStrategy::Merge)
            .unwrap_or(Value::Null);
        debug!(conflict_id = %conflict.id(), "Computed merge preview");

        if ctx.is_json() {
            formatter.print_json(&json!({
                "id": conflict.id().as_str(),
                "merged": merged,
            }));
        } else {
            let pretty =
                serde_json::to_string_pretty(&merged).context("Failed to format merged value")?;
            println!("{}", pretty);
        }

        Ok(())
    }

    async fn execute_resolve(
        &self,
        ctx: &CommandContext,
        file: &Path,
        id: &str,
        strategy: &str,
        value: Option<&str>,
        out: Option<&Path>,
    ) -> Result<()> {
        let formatter = ctx.formatter();
        let conflicts = load_conflicts(file).await?;

        let conflict = match find_conflict(&conflicts, id) {
            Ok(c) => c,
            Err(e) => {
                return Err(report_failure(ctx, &*formatter, &e.to_string()));
            }
        };

        let strategy: ConflictResolutionStrategy = match strategy.parse() {
            Ok(s) => s,
            Err(e) => {
                return Err(report_failure(ctx, &*formatter, &e.to_string()));
            }
        };

        let manual_value = value
            .map(serde_json::from_str::<Value>)
            .transpose()
            .context("--value is not valid JSON")?;
        if manual_value.is_some() && strategy.is_automatic() {
            formatter.warn(&format!("--value is ignored with --strategy {}", strategy));
        }

        let decision = match Decision::from_strategy(conflict, strategy, manual_value) {
            Ok(d) => d,
            Err(e) => {
                let message = format!("{} (pass --value <json>)", e);
                return Err(report_failure(ctx, &*formatter, &message));
            }
        };
        let resolved = decision.resolve(conflict);

        info!(
            conflict_id = %conflict.id(),
            strategy = %strategy,
            "Resolving conflict"
        );

        let outcome = json!({
            "id": conflict.id().as_str(),
            "status": "resolved",
            "strategy": strategy.as_str(),
            "collection": conflict.collection(),
            "value": resolved,
        });

        if let Some(out) = out {
            write_json(out, &Value::Array(vec![outcome.clone()])).await?;
        }

        if ctx.is_json() {
            formatter.print_json(&outcome);
        } else {
            formatter.success(&format!(
                "Conflict {} resolved with strategy: {}",
                truncate(conflict.id().as_str(), 14),
                strategy
            ));
            formatter.info(&format!("Value: {}", resolved));
            if let Some(out) = out {
                formatter.info(&format!("Saved to {}", out.display()));
            }
        }

        Ok(())
    }

    async fn execute_review(
        &self,
        ctx: &CommandContext,
        file: &Path,
        out: Option<&Path>,
        pending: Option<&Path>,
    ) -> Result<()> {
        let formatter = ctx.formatter();
        let conflicts = load_conflicts(file).await?;
        for conflict in &conflicts {
            warn_unknown_fields(&*formatter, conflict);
        }

        let policy = PolicyEngine::from_config(&ctx.config);
        let snapshot = conflicts.clone();
        let mut session = ReviewSession::new(conflicts);
        let mut sink = RecordingSink::new();

        let end = if session.is_empty() {
            ReviewEnd::Completed
        } else {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            run_review(&mut session, &policy, &mut sink, &mut lines).await?
        };

        let outcomes = sink.into_outcomes();
        let unreviewed = session.abandon();
        let unreviewed_count = unreviewed.len();
        let still_pending = pending_conflicts(&snapshot, &outcomes, unreviewed);

        let outcomes_json: Vec<Value> = outcomes
            .iter()
            .zip(&snapshot)
            .map(|(outcome, conflict)| outcome_json(outcome, conflict))
            .collect();
        let resolved = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Resolved { .. }))
            .count();
        let ignored = outcomes.len() - resolved;

        if let Some(out) = out {
            write_json(out, &Value::Array(outcomes_json.clone())).await?;
        }
        if let Some(pending) = pending {
            let pending_json =
                serde_json::to_value(&still_pending).context("Failed to serialize conflicts")?;
            write_json(pending, &pending_json).await?;
        }

        info!(
            resolved,
            ignored,
            unreviewed = unreviewed_count,
            "Review finished"
        );

        if ctx.is_json() {
            formatter.print_json(&json!({
                "completed": end == ReviewEnd::Completed,
                "resolved": resolved,
                "ignored": ignored,
                "unreviewed": unreviewed_count,
                "outcomes": outcomes_json,
            }));
            return Ok(());
        }

        if snapshot.is_empty() {
            formatter.success("No conflicts to review");
            return Ok(());
        }

        match end {
            ReviewEnd::Completed => formatter.success(&format!(
                "Reviewed {} conflict{}",
                snapshot.len(),
                if snapshot.len() == 1 { "" } else { "s" }
            )),
            ReviewEnd::Quit => formatter.warn(&format!(
                "Review stopped with {} conflict{} unreviewed",
                unreviewed_count,
                if unreviewed_count == 1 { "" } else { "s" }
            )),
        }
        formatter.info(&format!(
            "{} resolved, {} ignored, {} still pending",
            resolved,
            ignored,
            still_pending.len()
        ));
        if let Some(out) = out {
            formatter.info(&format!("Outcomes saved to {}", out.display()));
        }
        if let Some(pending) = pending {
            formatter.info(&format!("Pending conflicts saved to {}", pending.display()));
        } else if !still_pending.is_empty() {
            formatter.info("Use --pending <file> to keep the unresolved conflicts.");
        }

        Ok(())
    }
}

/// How an interactive review ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewEnd {
    /// Every conflict was resolved or ignored
    Completed,
    /// The operator quit, or input ran out
    Quit,
}

/// One keystroke-level choice in the review prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewInput {
    /// Take the preselected strategy
    Accept,
    Choose(ConflictResolutionStrategy),
    Ignore,
    Quit,
}

fn parse_review_input(line: &str) -> Option<ReviewInput> {
    use ConflictResolutionStrategy::*;

    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(ReviewInput::Accept),
        "l" | "local" => Some(ReviewInput::Choose(KeepLocal)),
        "r" | "remote" => Some(ReviewInput::Choose(KeepRemote)),
        "m" | "merge" => Some(ReviewInput::Choose(Merge)),
        "e" | "edit" | "manual" => Some(ReviewInput::Choose(Manual)),
        "i" | "ignore" => Some(ReviewInput::Ignore),
        "q" | "quit" => Some(ReviewInput::Quit),
        _ => None,
    }
}

/// Walks the session until it is done or the operator quits
async fn run_review<R>(
    session: &mut ReviewSession<Value>,
    policy: &PolicyEngine,
    sink: &mut RecordingSink<Value>,
    lines: &mut Lines<R>,
) -> Result<ReviewEnd>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(conflict) = session.current() {
        let preselected = policy.preselect(conflict);
        if let Some((position, total)) = session.position() {
            eprintln!();
            eprintln!("[{}/{}] {}", position, total, conflict_heading(conflict));
        }
        for row in field_rows(conflict) {
            eprintln!("{}", row.render());
        }
        eprint!(
            "[l]ocal [r]emote [m]erge [e]dit [i]gnore [q]uit (Enter = {}) > ",
            preselected
        );

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            debug!("Input closed, ending review");
            return Ok(ReviewEnd::Quit);
        };

        let strategy = match parse_review_input(&line) {
            Some(ReviewInput::Quit) => return Ok(ReviewEnd::Quit),
            Some(ReviewInput::Ignore) => {
                session.ignore(&mut *sink)?;
                continue;
            }
            Some(ReviewInput::Accept) => preselected,
            Some(ReviewInput::Choose(strategy)) => strategy,
            None => {
                eprintln!("Unknown choice '{}'", line.trim());
                continue;
            }
        };

        let manual_value = if strategy == ConflictResolutionStrategy::Manual {
            match read_manual_value(lines).await? {
                Some(value) => Some(value),
                None => continue,
            }
        } else {
            None
        };

        session.resolve_with(strategy, manual_value, &mut *sink)?;
    }

    Ok(ReviewEnd::Completed)
}

/// Prompts for a manual value; `None` returns to the strategy prompt
async fn read_manual_value<R>(lines: &mut Lines<R>) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    eprint!("value (JSON, empty to go back) > ");
    let Some(line) = lines.next_line().await.context("Failed to read input")? else {
        return Ok(None);
    };
    if line.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(&line) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            eprintln!("Invalid JSON: {}", e);
            Ok(None)
        }
    }
}

/// Reads conflicts from a JSON file holding one conflict or an array
async fn load_conflicts(path: &Path) -> Result<Vec<Conflict>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_conflicts(&content).with_context(|| format!("Invalid conflict file {}", path.display()))
}

fn parse_conflicts(content: &str) -> Result<Vec<Conflict>, ConflictError> {
    let value: Value = serde_json::from_str(content)?;
    let conflicts: Vec<Conflict> = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        single => vec![serde_json::from_value(single)?],
    };
    Ok(conflicts)
}

/// Finds a conflict by exact id, then by a prefix matching exactly one id
fn find_conflict<'a>(conflicts: &'a [Conflict], id: &str) -> Result<&'a Conflict, ConflictError> {
    if let Some(exact) = conflicts.iter().find(|c| c.id().as_str() == id) {
        return Ok(exact);
    }

    let matches: Vec<&Conflict> = conflicts
        .iter()
        .filter(|c| c.id().matches_prefix(id))
        .collect();
    match matches.as_slice() {
        [] => Err(ConflictError::NotFound(id.to_string())),
        [only] => Ok(*only),
        _ => Err(ConflictError::Ambiguous {
            prefix: id.to_string(),
            candidates: matches.iter().map(|c| c.id().to_string()).collect(),
        }),
    }
}

/// Conflicts still pending after a review: ignored ones, then the unreviewed tail
fn pending_conflicts(
    snapshot: &[Conflict],
    outcomes: &[Outcome<Value>],
    unreviewed: Vec<Conflict>,
) -> Vec<Conflict> {
    snapshot
        .iter()
        .zip(outcomes)
        .filter(|(_, outcome)| matches!(outcome, Outcome::Ignored { .. }))
        .map(|(conflict, _)| conflict.clone())
        .chain(unreviewed)
        .collect()
}

/// Outcome as written to `--out`, with the value to write back
fn outcome_json(outcome: &Outcome<Value>, conflict: &Conflict) -> Value {
    match outcome {
        Outcome::Resolved { id, strategy, .. } => json!({
            "id": id.as_str(),
            "status": "resolved",
            "strategy": strategy.as_str(),
            "collection": conflict.collection(),
            "value": outcome.resolved_value(conflict),
        }),
        Outcome::Ignored { id } => json!({
            "id": id.as_str(),
            "status": "ignored",
        }),
    }
}

fn summary_json(conflict: &Conflict) -> Value {
    json!({
        "id": conflict.id().as_str(),
        "collection": conflict.collection(),
        "localVersion": conflict.local_version(),
        "remoteVersion": conflict.remote_version(),
        "localModifiedAt": conflict.local_modified_at().map(|t| t.to_rfc3339()),
        "remoteModifiedAt": conflict.remote_modified_at().map(|t| t.to_rfc3339()),
        "fieldChanges": conflict.field_changes(),
    })
}

fn conflict_heading(conflict: &Conflict) -> String {
    format!(
        "{} ({})  local v{} {}  |  remote v{} {}",
        truncate(conflict.id().as_str(), 14),
        conflict.collection().unwrap_or("-"),
        conflict.local_version(),
        format_modified(conflict.local_modified_at()),
        conflict.remote_version(),
        format_modified(conflict.remote_modified_at()),
    )
}

fn warn_unknown_fields(formatter: &dyn OutputFormatter, conflict: &Conflict) {
    let unknown = conflict.unknown_field_changes();
    if !unknown.is_empty() {
        formatter.warn(&format!(
            "Conflict {} lists changed fields present on neither side: {}",
            truncate(conflict.id().as_str(), 14),
            unknown.join(", ")
        ));
    }
}

/// Shows a failure and returns it as a [`Reported`] error
fn report_failure(
    ctx: &CommandContext,
    formatter: &dyn OutputFormatter,
    message: &str,
) -> anyhow::Error {
    if ctx.is_json() {
        formatter.print_json(&json!({
            "success": false,
            "error": message,
        }));
    } else {
        formatter.error(message);
        formatter.info("Use 'frontdesk conflicts list <file>' to see pending conflicts.");
    }
    Reported(message.to_string()).into()
}

async fn write_json(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// One top-level field of a conflict, side by side
#[derive(Debug, PartialEq)]
struct FieldRow<'a> {
    name: &'a str,
    local: Option<&'a Value>,
    remote: Option<&'a Value>,
    changed: bool,
}

impl FieldRow<'_> {
    fn render(&self) -> String {
        let side = |value: Option<&Value>| match value {
            Some(v) => truncate(&v.to_string(), 26),
            None => "(absent)".to_string(),
        };
        format!(
            "{} {:<16} {:<26} {}",
            if self.changed { "*" } else { " " },
            truncate(self.name, 16),
            side(self.local),
            side(self.remote)
        )
    }
}

/// Union of both sides' fields in name order; empty for non-object values
fn field_rows(conflict: &Conflict) -> Vec<FieldRow<'_>> {
    let (Some(local), Some(remote)) = (
        conflict.local_value().as_object(),
        conflict.remote_value().as_object(),
    ) else {
        return Vec::new();
    };

    let names: BTreeSet<&str> = local
        .keys()
        .chain(remote.keys())
        .map(String::as_str)
        .collect();

    names
        .into_iter()
        .map(|name| FieldRow {
            name,
            local: local.get(name),
            remote: remote.get(name),
            changed: conflict.is_field_changed(name),
        })
        .collect()
}

fn format_modified(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Shortens text for table cells, keeping at most `max_len` characters
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{config::ConfigBuilder, domain::ConflictId};

    const ROOMS: &str = r#"[
        {
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "localValue": {"name": "Room 101", "status": "occupied", "rate": 150},
            "remoteValue": {"name": "Room 101", "status": "vacant", "rate": 150, "cleanedAt": 1700000000000},
            "localVersion": 4,
            "remoteVersion": 5,
            "localTimestamp": 1699999000000,
            "remoteTimestamp": 1700000000000,
            "fieldChanges": ["status"],
            "collection": "rooms"
        },
        {
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "localValue": {"guest": "Ana", "nights": 2},
            "remoteValue": {"guest": "Ana", "nights": 3},
            "fieldChanges": ["nights"],
            "collection": "reservations"
        }
    ]"#;

    fn conflicts(n: usize) -> Vec<Conflict> {
        (0..n)
            .map(|i| {
                SyncConflict::new(
                    ConflictId::parse(format!("c-{i}")).unwrap(),
                    json!({"n": i, "side": "local"}),
                    json!({"n": i, "side": "remote"}),
                )
                .with_field_changes(["side"])
            })
            .collect()
    }

    async fn review(
        input: &'static str,
        conflicts: Vec<Conflict>,
        policy: &PolicyEngine,
    ) -> (ReviewEnd, Vec<Outcome<Value>>, Vec<Conflict>) {
        let mut session = ReviewSession::new(conflicts);
        let mut sink = RecordingSink::new();
        let mut lines = BufReader::new(input.as_bytes()).lines();

        let end = run_review(&mut session, policy, &mut sink, &mut lines)
            .await
            .unwrap();
        (end, sink.into_outcomes(), session.abandon())
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("abc123", 14), "abc123");
    }

    #[test]
    fn test_truncate_long() {
        let result = truncate("550e8400-e29b-41d4-a716-446655440000", 14);
        assert_eq!(result, "550e8400-e2...");
        assert_eq!(result.chars().count(), 14);
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Habitación doble", 10), "Habitac...");
    }

    #[test]
    fn test_parse_conflicts_array_and_single() {
        let all = parse_conflicts(ROOMS).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].collection(), Some("rooms"));
        assert_eq!(all[1].local_version(), 0);

        let single = parse_conflicts(
            r#"{"id": "c-1", "localValue": 1, "remoteValue": 2}"#,
        )
        .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].id().as_str(), "c-1");
    }

    #[test]
    fn test_parse_conflicts_rejects_bad_input() {
        assert!(matches!(
            parse_conflicts("not json"),
            Err(ConflictError::Serialization(_))
        ));
        assert!(parse_conflicts(r#"[{"id": "c-1"}]"#).is_err());
        assert!(parse_conflicts(r#"{"id": "", "localValue": 1, "remoteValue": 2}"#).is_err());
    }

    #[test]
    fn test_find_conflict() {
        let all = parse_conflicts(ROOMS).unwrap();

        assert_eq!(
            find_conflict(&all, "7c9e6679-7425-40de-944b-e07fc1f90ae7")
                .unwrap()
                .collection(),
            Some("reservations")
        );
        assert_eq!(
            find_conflict(&all, "550e").unwrap().collection(),
            Some("rooms")
        );
        assert!(matches!(
            find_conflict(&all, "ffff"),
            Err(ConflictError::NotFound(_))
        ));
        assert!(find_conflict(&all, "").is_err());
    }

    #[test]
    fn test_find_conflict_ambiguous_prefix() {
        let all: Vec<Conflict> = ["room-101", "room-102"]
            .into_iter()
            .map(|id| SyncConflict::new(ConflictId::parse(id).unwrap(), json!(1), json!(2)))
            .collect();

        match find_conflict(&all, "room-") {
            Err(ConflictError::Ambiguous { prefix, candidates }) => {
                assert_eq!(prefix, "room-");
                assert_eq!(candidates, vec!["room-101", "room-102"]);
            }
            other => panic!("expected an ambiguous prefix error, got {other:?}"),
        }
        assert_eq!(find_conflict(&all, "room-101").unwrap().id().as_str(), "room-101");
        assert_eq!(find_conflict(&all, "room-102").unwrap().id().as_str(), "room-102");
        assert_eq!(find_conflict(&all, "room-10").map(|c| c.id().as_str()).ok(), None);
    }

    #[test]
    fn test_parse_review_input() {
        use ConflictResolutionStrategy::*;

        assert_eq!(parse_review_input(""), Some(ReviewInput::Accept));
        assert_eq!(parse_review_input("  \n"), Some(ReviewInput::Accept));
        assert_eq!(parse_review_input("L"), Some(ReviewInput::Choose(KeepLocal)));
        assert_eq!(parse_review_input("remote"), Some(ReviewInput::Choose(KeepRemote)));
        assert_eq!(parse_review_input("m"), Some(ReviewInput::Choose(Merge)));
        assert_eq!(parse_review_input("e"), Some(ReviewInput::Choose(Manual)));
        assert_eq!(parse_review_input("i"), Some(ReviewInput::Ignore));
        assert_eq!(parse_review_input("q"), Some(ReviewInput::Quit));
        assert_eq!(parse_review_input("x"), None);
    }

    #[test]
    fn test_field_rows() {
        let all = parse_conflicts(ROOMS).unwrap();
        let rows = field_rows(&all[0]);

        let names: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["cleanedAt", "name", "rate", "status"]);

        assert_eq!(rows[0].local, None);
        assert!(!rows[0].changed);
        assert!(rows[3].changed);
        assert!(rows[3].render().starts_with("* status"));
        assert!(rows[0].render().contains("(absent)"));
    }

    #[test]
    fn test_field_rows_scalar_values() {
        let conflict = SyncConflict::new(ConflictId::new(), json!(1), json!({"a": 1}));
        assert!(field_rows(&conflict).is_empty());
    }

    #[test]
    fn test_outcome_json_carries_value() {
        let all = parse_conflicts(ROOMS).unwrap();
        let outcome = Outcome::Resolved {
            id: all[0].id().clone(),
            strategy: ConflictResolutionStrategy::Merge,
            custom_value: None,
        };

        let json = outcome_json(&outcome, &all[0]);
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["strategy"], "merge");
        assert_eq!(json["collection"], "rooms");
        assert_eq!(json["value"]["status"], "vacant");
        assert_eq!(json["value"]["cleanedAt"], 1700000000000i64);

        let ignored = Outcome::Ignored {
            id: all[1].id().clone(),
        };
        assert_eq!(
            outcome_json(&ignored, &all[1]),
            json!({"id": "7c9e6679-7425-40de-944b-e07fc1f90ae7", "status": "ignored"})
        );
    }

    #[test]
    fn test_pending_conflicts_keeps_order() {
        let snapshot = conflicts(4);
        let outcomes = vec![
            Outcome::Ignored {
                id: snapshot[0].id().clone(),
            },
            Outcome::Resolved {
                id: snapshot[1].id().clone(),
                strategy: ConflictResolutionStrategy::KeepLocal,
                custom_value: None,
            },
        ];
        let unreviewed = snapshot[2..].to_vec();

        let pending = pending_conflicts(&snapshot, &outcomes, unreviewed);
        let ids: Vec<&str> = pending.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["c-0", "c-2", "c-3"]);
    }

    #[tokio::test]
    async fn test_review_mixed_actions_then_quit() {
        let input = "m\ni\ne\n{\"n\": 2, \"side\": \"edited\"}\nq\n";
        let (end, outcomes, unreviewed) =
            review(input, conflicts(4), &PolicyEngine::default()).await;

        assert_eq!(end, ReviewEnd::Quit);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            &outcomes[0],
            Outcome::Resolved { strategy: ConflictResolutionStrategy::Merge, .. }
        ));
        assert!(matches!(&outcomes[1], Outcome::Ignored { .. }));
        assert!(matches!(
            &outcomes[2],
            Outcome::Resolved { strategy: ConflictResolutionStrategy::Manual, custom_value: Some(v), .. }
                if v["side"] == "edited"
        ));
        assert_eq!(unreviewed.len(), 1);
        assert_eq!(unreviewed[0].id().as_str(), "c-3");
    }

    #[tokio::test]
    async fn test_review_enter_takes_preselected() {
        let config = ConfigBuilder::new()
            .conflicts_default_strategy("keep-remote")
            .build();
        let policy = PolicyEngine::from_config(&config);

        let (end, outcomes, unreviewed) = review("\n\n", conflicts(2), &policy).await;

        assert_eq!(end, ReviewEnd::Completed);
        assert!(unreviewed.is_empty());
        assert!(outcomes.iter().all(|o| matches!(
            o,
            Outcome::Resolved { strategy: ConflictResolutionStrategy::KeepRemote, .. }
        )));
    }

    #[tokio::test]
    async fn test_review_retries_unknown_and_invalid_input() {
        let input = "x\ne\nnot json\n\nl\n";
        let (end, outcomes, _) = review(input, conflicts(1), &PolicyEngine::default()).await;

        assert_eq!(end, ReviewEnd::Completed);
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            &outcomes[0],
            Outcome::Resolved { strategy: ConflictResolutionStrategy::KeepLocal, custom_value: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_review_eof_leaves_everything_pending() {
        let (end, outcomes, unreviewed) =
            review("", conflicts(3), &PolicyEngine::default()).await;

        assert_eq!(end, ReviewEnd::Quit);
        assert!(outcomes.is_empty());
        assert_eq!(unreviewed.len(), 3);
    }

    #[tokio::test]
    async fn test_load_conflicts_and_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pending.json");
        tokio::fs::write(&input, ROOMS).await.unwrap();

        let loaded = load_conflicts(&input).await.unwrap();
        assert_eq!(loaded.len(), 2);

        let output = dir.path().join("out.json");
        write_json(&output, &json!([{"id": "c-1", "status": "ignored"}]))
            .await
            .unwrap();
        let written: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&output).await.unwrap()).unwrap();
        assert_eq!(written[0]["status"], "ignored");

        assert!(load_conflicts(&dir.path().join("missing.json")).await.is_err());
    }

    fn json_context() -> CommandContext {
        CommandContext {
            format: crate::output::OutputFormat::Json,
            quiet: true,
            config_path: PathBuf::from("/nonexistent/frontdesk/config.yaml"),
            config: frontdesk_core::config::Config::default(),
        }
    }

    fn resolve_command(
        file: &Path,
        id: &str,
        strategy: &str,
        out: Option<&Path>,
    ) -> ConflictsCommand {
        ConflictsCommand::Resolve {
            file: file.to_path_buf(),
            id: id.to_string(),
            strategy: strategy.to_string(),
            value: None,
            out: out.map(Path::to_path_buf),
        }
    }

    #[tokio::test]
    async fn test_resolve_failures_are_reported_errors() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pending.json");
        tokio::fs::write(&input, ROOMS).await.unwrap();
        let ctx = json_context();

        for (id, strategy) in [("550e", "manual"), ("ffff", "merge"), ("550e", "keep_both")] {
            let err = resolve_command(&input, id, strategy, None)
                .execute(&ctx)
                .await
                .unwrap_err();
            assert!(err.is::<Reported>(), "{id} {strategy}: {err:#}");
        }

        let missing = dir.path().join("missing.json");
        let err = resolve_command(&missing, "550e", "merge", None)
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(!err.is::<Reported>());
    }

    #[tokio::test]
    async fn test_resolve_writes_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pending.json");
        let output = dir.path().join("resolved.json");
        tokio::fs::write(&input, ROOMS).await.unwrap();

        resolve_command(&input, "550e", "merge", Some(&output))
            .execute(&json_context())
            .await
            .unwrap();

        let written: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&output).await.unwrap()).unwrap();
        assert_eq!(written[0]["strategy"], "merge");
        assert_eq!(written[0]["value"]["status"], "vacant");
        assert_eq!(written[0]["value"]["cleanedAt"], 1700000000000u64);
    }
}

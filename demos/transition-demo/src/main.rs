//! Cascade demo: declarative parent transitions over a record hierarchy.
//!
//! Seeds an in-memory hierarchy (an epic, a user story, and its tasks) plus
//! a small rule set, then walks three scenarios:
//!
//! 1. Closing the only task of a story resolves the story.
//! 2. A lagging sibling blocks the transition until it closes too.
//! 3. A fired rule with parent processing cascades up to the epic.

use std::sync::Arc;

use colored::Colorize;
use cascade_executor::{AppliedTransition, TransitionExecutor};
use cascade_store::{InMemoryRecords, InMemoryRules, InMemoryTypes};
use cascade_types::{Record, RecordId, Rule, RuleDocument, TypeDescriptor, TypeId};

fn header(title: &str) {
    println!();
    println!("{}", "═".repeat(72).cyan());
    println!("  {}", title.cyan().bold());
    println!("{}", "═".repeat(72).cyan());
}

fn type_descriptors() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new(TypeId::new("task"), "Task")
            .with_state("New", "b2b2b2")
            .with_state("Active", "007acc")
            .with_state("Closed", "339933"),
        TypeDescriptor::new(TypeId::new("user_story"), "User Story")
            .with_state("New", "b2b2b2")
            .with_state("Active", "007acc")
            .with_state("Resolved", "ff9d00")
            .with_state("Closed", "339933"),
        TypeDescriptor::new(TypeId::new("epic"), "Epic")
            .with_state("Active", "ff7b00")
            .with_state("Resolved", "ff9d00"),
    ]
}

fn rule_documents() -> Vec<RuleDocument> {
    // Tasks resolve their story once every sibling is closed, then ask for
    // the story's own parent to be processed.
    let close_task = Rule::new(
        TypeId::new("task"),
        TypeId::new("user_story"),
        "Closed",
        "Resolved",
    )
    .with_excluded_status("Resolved")
    .with_excluded_status("Closed")
    .with_children_lookup()
    .with_process_parent();

    // Resolved stories resolve their epic once every sibling story agrees.
    let resolve_story = Rule::new(
        TypeId::new("user_story"),
        TypeId::new("epic"),
        "Resolved",
        "Resolved",
    )
    .with_excluded_status("Resolved")
    .with_children_lookup();

    vec![
        RuleDocument::new(TypeId::new("task")).with_rule(close_task),
        RuleDocument::new(TypeId::new("user_story")).with_rule(resolve_story),
    ]
}

fn print_applied(applied: &[AppliedTransition]) {
    if applied.is_empty() {
        println!("  {}   applied:  {}", "│".dimmed(), "none".yellow());
        return;
    }
    for transition in applied {
        println!(
            "  {}   applied:  {} {} → {} (rule {})",
            "│".dimmed(),
            transition.parent_id,
            transition.from_status.red(),
            transition.to_status.green().bold(),
            transition.rule_id.to_string().dimmed(),
        );
    }
}

async fn show_status(records: &InMemoryRecords, id: RecordId) {
    use cascade_store::RecordSource;
    let record = records.fetch(id).await.unwrap();
    println!(
        "  {}   {} {:<12} {}",
        "│".dimmed(),
        record.id,
        record.title,
        record.status.blue()
    );
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    let records = Arc::new(InMemoryRecords::new());
    records.insert(Record::new(RecordId(1), TypeId::new("epic"), "Active", "Checkout"));
    records.insert(
        Record::new(RecordId(9), TypeId::new("user_story"), "Active", "Login flow")
            .with_parent(RecordId(1)),
    );
    records.insert(
        Record::new(RecordId(11), TypeId::new("task"), "Active", "Fix session")
            .with_parent(RecordId(9)),
    );
    records.insert(
        Record::new(RecordId(12), TypeId::new("task"), "Active", "Add retries")
            .with_parent(RecordId(9)),
    );

    let mut rules = InMemoryRules::new();
    for document in rule_documents() {
        rules = rules.with_document(document);
    }

    let executor = TransitionExecutor::new(
        records.clone(),
        Arc::new(rules),
        Arc::new(InMemoryTypes::new(type_descriptors())),
    );

    use cascade_store::RecordSource;

    // ── Scenario 1: one task closes, its sibling lags ───────────────────
    header("Scenario 1: first task closes — sibling still active");

    records.update_status(RecordId(11), "Closed").await.unwrap();
    let applied = executor.process(RecordId(11)).await.unwrap();
    print_applied(&applied);
    show_status(&records, RecordId(9)).await;
    println!(
        "  {} story stays {} until every task agrees",
        "└".dimmed(),
        "Active".blue()
    );

    // ── Scenario 2: the lagging sibling closes too ──────────────────────
    header("Scenario 2: last task closes — story resolves, epic cascades");

    records.update_status(RecordId(12), "Closed").await.unwrap();
    let applied = executor.process(RecordId(12)).await.unwrap();
    print_applied(&applied);
    show_status(&records, RecordId(9)).await;
    show_status(&records, RecordId(1)).await;
    println!(
        "  {} one rule fired per level: story → {} and epic → {}",
        "└".dimmed(),
        "Resolved".green(),
        "Resolved".green()
    );

    // ── Scenario 3: re-firing is idempotent ─────────────────────────────
    header("Scenario 3: reprocessing the same change is a no-op");

    let applied = executor.process(RecordId(12)).await.unwrap();
    print_applied(&applied);
    println!(
        "  {} the excluded-status convention keeps rules from re-firing",
        "└".dimmed()
    );
    println!();
}

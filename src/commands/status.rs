//! Status command: a debug report of everything the engine would act on.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::engine::{CleaningEngine, RunState};
use crate::guard::ProcessHandle;
use crate::rules::{CategorySet, CleanCategory};

use super::resolve;

#[derive(Debug, Serialize)]
struct CategoryStatus {
    category: CleanCategory,
    base: PathBuf,
    scan_roots: Vec<String>,
    safe: Vec<String>,
    subtrees: Vec<String>,
    items: u64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    version: &'static str,
    os: &'static str,
    arch: &'static str,
    layout: &'static str,
    project: PathBuf,
    valid: bool,
    reason: Option<String>,
    editor_version: Option<String>,
    engine_state: RunState,
    lock_holders: Vec<ProcessHandle>,
    protected: Vec<String>,
    categories: Vec<CategoryStatus>,
    credential_roots: Vec<PathBuf>,
    credential_files: usize,
    recent_file: PathBuf,
}

/// Run the status command.
pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let engine = CleaningEngine::from_config(config)?;
    let path = resolve(&args.path);
    let report = build_report(&engine, config, path);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn build_report(engine: &CleaningEngine, config: &Config, project: PathBuf) -> StatusReport {
    let validation = engine.validator().validate(&project);
    let file_categories: CategorySet = CleanCategory::ALL
        .iter()
        .copied()
        .filter(|c| c.counts_files())
        .collect();

    // Counting walks the project, only worth it for a valid one
    let plans = if validation.valid {
        engine.count(&project, &file_categories)
    } else {
        Vec::new()
    };

    let categories = file_categories
        .iter()
        .filter_map(|category| {
            let rules = engine.rules().category(category)?;
            let base = match category {
                CleanCategory::EditorCache => engine.locations().editor_data.clone(),
                _ => project.clone(),
            };
            let items = plans
                .iter()
                .find(|p| p.category == category)
                .map(|p| p.len())
                .unwrap_or(0);
            Some(CategoryStatus {
                category,
                base,
                scan_roots: rules.scan_roots.clone(),
                safe: rules.safe.iter().map(|r| r.path().to_string()).collect(),
                subtrees: rules.subtrees.clone(),
                items,
            })
        })
        .collect();

    StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        layout: engine.validator().layout().id(),
        valid: validation.valid,
        reason: validation.reason.as_ref().map(|r| r.to_string()),
        editor_version: validation.editor_version.clone(),
        project,
        engine_state: engine.state(),
        lock_holders: engine.guard().map(|g| g.list_blocking()).unwrap_or_default(),
        protected: engine
            .rules()
            .protected_rules()
            .iter()
            .map(|r| r.path().to_string())
            .collect(),
        categories,
        credential_roots: engine.locations().credential_roots.clone(),
        credential_files: engine.credential_files().len(),
        recent_file: config.recent_file(),
    }
}

fn print_report(report: &StatusReport) {
    println!("unity-sweeper {} ({}/{})", report.version, report.os, report.arch);
    println!("Layout:         {}", report.layout);
    println!("Project:        {}", report.project.display());
    match &report.reason {
        None => println!("Valid:          yes"),
        Some(reason) => println!("Valid:          no ({})", reason),
    }
    if let Some(version) = &report.editor_version {
        println!("Editor version: {}", version);
    }
    println!("Engine state:   {:?}", report.engine_state);
    println!("Recent file:    {}", report.recent_file.display());

    if report.lock_holders.is_empty() {
        println!("Lock holders:   none");
    } else {
        println!("Lock holders:");
        for handle in &report.lock_holders {
            println!("  {:>8}  {}", handle.pid, handle.name);
        }
    }

    println!("\nProtected paths:");
    for path in &report.protected {
        println!("  {}", path);
    }

    for category in &report.categories {
        println!(
            "\n{} ({} item(s) under {})",
            category.category,
            category.items,
            category.base.display()
        );
        println!("  safe:     {}", category.safe.join(", "));
        if !category.subtrees.is_empty() {
            println!("  subtrees: {}", category.subtrees.join(", "));
        }
    }

    println!("\nCredential roots ({} credential file(s)):", report.credential_files);
    for root in &report.credential_roots {
        println!("  {}", root.display());
    }
}

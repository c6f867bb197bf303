//! CLI entry point for the attribution repair job.
//!
//! Plans first, prints what would change, and only mutates after explicit
//! confirmation (`--yes` skips the prompt, `--dry-run` never mutates).
//! Ctrl-C during the mutating phase sets the stop flag; the current update
//! finishes and the rest is left for a later run.

use std::io::{BufRead, Write};

use reattrib::aliases::AliasTable;
use reattrib::config::JobConfig;
use reattrib::job;
use reattrib::store::http::HttpStore;
use reattrib::updater::StopFlag;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let assume_yes = args.iter().any(|a| a == "--yes" || a == "-y");

    if let Err(e) = run(dry_run, assume_yes).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(dry_run: bool, assume_yes: bool) -> Result<(), String> {
    let config = JobConfig::load()?;
    let aliases = AliasTable::load(&config.aliases_path()?)?;
    let store = HttpStore::new(config.base_url()?, config.store.api_key.clone());

    let plan = job::build_plan(&store, &aliases)
        .await
        .map_err(|e| format!("plan phase failed: {}", e))?;

    let counts = plan.summary();
    println!(
        "{} record(s): {} correct, {} fixable, {} ambiguous, {} unmatched",
        counts.total, counts.correct, counts.fixable, counts.ambiguous, counts.unmatched
    );
    for fix in plan.fixes() {
        println!(
            "  fix {}: -> {} ({}) via {:?}",
            fix.record_id, fix.identity.display_name, fix.identity.id, fix.rule
        );
    }
    for ro in plan.needs_review() {
        println!(
            "  needs review: {} (personnel name '{}')",
            ro.record.id, ro.record.personnel_name
        );
    }

    if dry_run {
        println!("dry run, nothing applied");
        return Ok(());
    }
    if plan.fixes().is_empty() {
        println!("nothing to fix");
        return Ok(());
    }

    if !assume_yes && !prompt_confirmation(plan.fixes().len())? {
        println!("aborted");
        return Ok(());
    }

    let stop = StopFlag::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupt received, stopping after the current update");
                stop.stop();
            }
        });
    }

    let summary = job::apply(&store, plan.confirm(), &config.batch, &stop).await;
    let rendered = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    println!("{}", rendered);

    if summary.halted {
        return Err("run halted before completing all updates".to_string());
    }
    Ok(())
}

fn prompt_confirmation(count: usize) -> Result<bool, String> {
    print!("Apply {} update(s)? [y/N] ", count);
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| e.to_string())?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

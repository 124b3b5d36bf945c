use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sealedger::{CheckReport, FeedConfig, FeedHandle, Ledger, LedgerConfig, RecordId};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let ledger = Ledger::open(&config)
        .with_context(|| format!("opening ledger in {}", config.data_dir.display()))?;

    match cli.command {
        Command::Add(args) => cmd_add(&ledger, args),
        Command::Show(args) => cmd_show(&ledger, args),
        Command::Check(args) => cmd_check(&ledger, args),
        Command::Alter(args) => cmd_alter(&ledger, args),
        Command::Audit => cmd_audit(&ledger),
        Command::Feed(args) => cmd_feed(ledger, args),
    }
}

/// Config file (or defaults), then `--data-dir` on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Parse a record id, reporting a malformed one instead of failing.
fn parse_id(raw: &str) -> Option<RecordId> {
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!(error = %e, "rejected record id");
            println!("{raw:?} is not a valid record id.");
            None
        }
    }
}

fn cmd_add<S: sealedger::ContainerStore>(ledger: &Ledger<S>, args: AddArgs) -> anyhow::Result<()> {
    let receipt = ledger.submit(args.sender, args.receiver, args.payload)?;
    println!(
        "Inserted {} into container {} at position {}",
        receipt.record_id, receipt.container_index, receipt.position
    );
    if let Some(attempts) = receipt.sealed {
        println!("Container {} sealed after {attempts} attempts", receipt.container_index);
    }
    Ok(())
}

fn cmd_show<S: sealedger::ContainerStore>(ledger: &Ledger<S>, args: ShowArgs) -> anyhow::Result<()> {
    let records = ledger.recent(args.count)?;
    if records.is_empty() {
        println!("No records.");
    }
    for record in records {
        println!("{}", record.summary());
    }
    Ok(())
}

fn cmd_check<S: sealedger::ContainerStore>(ledger: &Ledger<S>, args: RecordArgs) -> anyhow::Result<()> {
    let Some(id) = parse_id(&args.id) else {
        return Ok(());
    };
    match ledger.check(&id)? {
        Some(report) => print_report(&report),
        None => println!("Record {id} not found."),
    }
    Ok(())
}

fn cmd_alter<S: sealedger::ContainerStore>(ledger: &Ledger<S>, args: RecordArgs) -> anyhow::Result<()> {
    let Some(id) = parse_id(&args.id) else {
        return Ok(());
    };
    if !ledger.tamper(&id)? {
        println!("Record {id} not found.");
        return Ok(());
    }
    println!("Record {id} altered in memory.");
    if let Some(report) = ledger.check(&id)? {
        print_report(&report);
    }
    Ok(())
}

fn cmd_audit<S: sealedger::ContainerStore>(ledger: &Ledger<S>) -> anyhow::Result<()> {
    let report = ledger.audit()?;
    for c in &report.containers {
        println!(
            "container {:>4}  records {:>3}  sealed {:<5}  valid {:<5}  consistent {:<5}  linked {}",
            c.index, c.records, c.sealed, c.valid, c.consistent, c.linked
        );
    }
    if report.is_clean() {
        println!("All {} containers intact.", report.containers.len());
    } else {
        let bad: Vec<String> = report.problems().map(|c| c.index.to_string()).collect();
        println!("Problems in containers: {}", bad.join(", "));
    }
    Ok(())
}

fn cmd_feed(ledger: Ledger<sealedger::FsContainerStore>, args: FeedArgs) -> anyhow::Result<()> {
    let config = FeedConfig {
        min_interval: Duration::from_millis(args.min_interval_ms),
        max_interval: Duration::from_millis(args.max_interval_ms.max(args.min_interval_ms)),
    };
    let ledger = Arc::new(ledger);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let stats = runtime.block_on(async {
        let feed = FeedHandle::spawn(Arc::clone(&ledger), config);
        tokio::time::sleep(Duration::from_secs(args.seconds)).await;
        feed.stop().await
    })?;

    tracing::info!(inserted = stats.inserted, failed = stats.failed, "feed finished");
    println!(
        "Feed inserted {} records ({} failed); ledger now holds {} records in {} containers.",
        stats.inserted,
        stats.failed,
        ledger.record_count()?,
        ledger.container_count()?
    );
    Ok(())
}

fn print_report(report: &CheckReport) {
    let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
    println!("Record {} (container {})", report.record_id, report.container_index);
    println!("  hash:      {}", mark(report.hash_valid));
    println!("  signature: {}", mark(report.signature_valid));
    println!("  container: {}", mark(report.container_valid));
}

use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use redline_engine::{redline_archive, Archive, EditOutcome, EditSet, PatchReport};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Unpacked document package directory
    pub package: PathBuf,

    /// JSON file with the edits to apply
    #[arg(short, long)]
    pub edits: PathBuf,

    /// Output directory (defaults to rewriting the package in place)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Apply only these edit ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub accept: Vec<String>,

    /// Author attributed on the tracked changes
    #[arg(long)]
    pub author: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    if !args.package.is_dir() {
        return Err(anyhow!(
            "Package directory does not exist: {}",
            args.package.display()
        ));
    }

    let config = Config::load(cwd)?;
    let options = config.patch_options(args.author.as_deref());

    let mut edits = EditSet::load(&args.edits)?;
    if !args.accept.is_empty() {
        edits.retain_accepted(&args.accept);
    }
    tracing::info!(edits = edits.len(), package = %args.package.display(), "starting redline");

    let mut archive = Archive::load_dir(&args.package)?;
    let result = redline_archive(&mut archive, &edits, &options)?;

    let out = args.out.unwrap_or_else(|| args.package.clone());
    archive.write_dir(&out)?;

    let report = result.report();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, &out),
    }

    Ok(())
}

fn print_report(report: &PatchReport, out: &std::path::Path) {
    println!("✏️  {} Redline", "Applying".green().bold());
    println!();

    for edit in &report.edits {
        let label = match &edit.clause {
            Some(clause) => format!("{} ({})", edit.id, clause),
            None => edit.id.clone(),
        };
        match edit.outcome {
            EditOutcome::Applied { identity } => {
                println!(
                    "  {} {} [changes {}-{}]",
                    "✓".green(),
                    label,
                    identity,
                    identity.saturating_add(1)
                )
            }
            EditOutcome::NotFound => println!("  {} {} text not found", "✗".red(), label),
            EditOutcome::SplitAcrossFragments => println!(
                "  {} {} text spans several runs, apply manually",
                "✗".red(),
                label
            ),
            EditOutcome::InvalidTarget => println!("  {} {} no text to locate", "✗".red(), label),
            EditOutcome::DeleteOutsideTarget => println!(
                "  {} {} deleted text is not part of the located text",
                "✗".red(),
                label
            ),
            EditOutcome::Skipped => println!("  {} {} nothing to change", "-".dimmed(), label),
        }
    }

    println!();
    println!(
        "✨ {} Applied {}, failed {}, skipped {}",
        if report.failed > 0 {
            "Done".yellow().bold()
        } else {
            "Done".green().bold()
        },
        report.applied,
        report.failed,
        report.skipped
    );
    println!("   Output: {}", out.display());

    if report.failed > 0 {
        println!(
            "   {} {}",
            "Needs manual review:".yellow(),
            report.failed_ids.join(", ")
        );
    }
}

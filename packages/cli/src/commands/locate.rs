use super::text::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use redline_engine::{locate as locate_target, FragmentScanner, Location};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Unpacked document package directory
    pub package: PathBuf,

    /// Literal text to look for
    pub target: String,
}

pub fn locate(args: LocateArgs, _cwd: &str) -> Result<()> {
    let document = load_document(&args.package)?;
    let location = locate_target(&FragmentScanner::new(), &document, &args.target, "cli")?;

    match location {
        Location::Direct { fragment } => {
            println!("{} direct (text fragment #{})", "✓".green(), fragment + 1)
        }
        Location::Reconstructed => println!(
            "{} reconstructed: the text spans several runs and cannot be redlined automatically",
            "⚠️".yellow()
        ),
        Location::NotFound => println!("{} not found", "✗".red()),
    }

    Ok(())
}

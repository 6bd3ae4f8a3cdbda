use anyhow::{anyhow, Result};
use clap::Args;
use redline_engine::{plain_text, read_text_part, Archive, DOCUMENT_PART};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TextArgs {
    /// Unpacked document package directory
    pub package: PathBuf,
}

pub fn text(args: TextArgs, _cwd: &str) -> Result<()> {
    let document = load_document(&args.package)?;
    println!("{}", plain_text(&document));
    Ok(())
}

/// Read the main document part of an unpacked package
pub(crate) fn load_document(package: &std::path::Path) -> Result<String> {
    if !package.is_dir() {
        return Err(anyhow!("Package directory does not exist: {}", package.display()));
    }
    let archive = Archive::load_dir(package)?;
    read_text_part(&archive, DOCUMENT_PART)?
        .ok_or_else(|| anyhow!("Invalid document package: missing {}", DOCUMENT_PART))
}

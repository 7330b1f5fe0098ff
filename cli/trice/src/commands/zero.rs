//! `trice zero` — reset every call-site ID in a source tree to zero.

use std::path::PathBuf;

use anyhow::Result;

use trice_id::zero_tree;

pub fn run(src: &[PathBuf], dry_run: bool) -> Result<()> {
    let report = zero_tree(src, dry_run)?;
    let action = if dry_run { "would zero" } else { "zeroed" };
    println!(
        "{} files scanned, {action} {} IDs in {} files",
        report.files_scanned, report.sites_zeroed, report.files_changed
    );
    Ok(())
}

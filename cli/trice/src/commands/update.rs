//! `trice update` — scan source trees and assign trace IDs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use trice_id::{update_tree, IdRegistry};

pub fn run(src: &[PathBuf], idlist: &Path, dry_run: bool) -> Result<()> {
    // An ID list of "none" allocates in memory without persisting.
    let idlist = (idlist.as_os_str() != "none").then_some(idlist);
    let mut registry = IdRegistry::load(idlist).context("loading ID list")?;
    let before = registry.len();

    let report = update_tree(src, &mut registry, dry_run)?;

    for change in &report.changes {
        let action = if dry_run { "would set" } else { "set" };
        println!(
            "{action} {} -> {} in {}",
            change.old_id,
            change.new_id,
            change.path.display()
        );
    }
    println!(
        "{} files scanned, {} sites, {} rewrites, {} conflicts, {} skipped",
        report.files_scanned,
        report.sites_found,
        report.changes.len(),
        report.conflicts,
        report.skipped
    );

    let Some(idlist) = idlist else {
        println!("ID list disabled, nothing persisted");
        return Ok(());
    };
    if dry_run {
        println!(
            "dry run: {} would gain {} entries",
            idlist.display(),
            registry.len() - before
        );
        return Ok(());
    }

    if registry
        .persist(idlist)
        .with_context(|| format!("writing {}", idlist.display()))?
    {
        println!(
            "{}: {} entries ({} new)",
            idlist.display(),
            registry.len(),
            registry.len() - before
        );
    } else {
        println!("{} unchanged", idlist.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn update_allocates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("fw");
        fs::create_dir(&src).unwrap();
        fs::write(
            src.join("main.c"),
            "TRICE16_1( Id(0), \"temp %d\\n\", t );\n",
        )
        .unwrap();
        let idlist = dir.path().join("til.json");

        run(&[src.clone()], &idlist, false).unwrap();

        assert!(idlist.is_file());
        let rewritten = fs::read_to_string(src.join("main.c")).unwrap();
        assert!(!rewritten.contains("Id(0)"), "ID should be assigned");

        let reg = IdRegistry::load(Some(&idlist)).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("fw");
        fs::create_dir(&src).unwrap();
        let file = src.join("main.c");
        let text = "TRICE8_1( Id(0), \"b %u\\n\", b );\n";
        fs::write(&file, text).unwrap();
        let idlist = dir.path().join("til.json");

        run(&[src], &idlist, true).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), text);
        assert!(!idlist.exists());
    }
}

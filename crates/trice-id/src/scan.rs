//! Source-tree scanning for trace call sites.
//!
//! A call site is a textual trace macro invocation holding an ID
//! field: `TRICE16_1( Id(4242), "speed %d\n", v );`. The scanner
//! records the byte span of the ID digits so rewrites touch nothing
//! else in the file.

use std::ops::Range;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

/// Source file extensions the allocation engine looks at.
const SOURCE_EXTENSIONS: [&str; 5] = ["c", "h", "cc", "cpp", "hpp"];

static CALL_SITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(TRICE0|TRICE(?:8|16|32|64)_\d|TRICE_S)\s*\(\s*Id\s*\(\s*(\d+)\s*\)\s*,\s*"((?:[^"\\]|\\.)*)""#,
    )
    .expect("call site pattern is valid")
});

/// A located trace macro invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// File the site was found in.
    pub path: PathBuf,
    /// Macro name, e.g. `TRICE16_1`.
    pub macro_name: String,
    /// ID currently written at the site (0 means unallocated).
    pub id: u32,
    /// Byte span of the ID digits within the file contents.
    pub id_span: Range<usize>,
    /// Format string literal, escapes left as written.
    pub fmt: String,
}

/// Recursively enumerate source files under the given roots.
///
/// A root that is itself a file is taken as-is; directories are walked
/// depth-first. Non-source files are skipped.
pub fn scan_tree(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        collect(root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            collect(&entry?.path(), files)?;
        }
        return Ok(());
    }
    let is_source = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
    if is_source {
        files.push(path.to_path_buf());
    }
    Ok(())
}

/// Scan already-loaded file contents.
pub fn scan_text(path: &Path, text: &str) -> Vec<CallSite> {
    CALL_SITE
        .captures_iter(text)
        .filter_map(|cap| {
            let digits = cap.get(2)?;
            // IDs wider than u32 are treated as garbage, not matched.
            let id: u32 = digits.as_str().parse().ok()?;
            Some(CallSite {
                path: path.to_path_buf(),
                macro_name: cap[1].to_string(),
                id,
                id_span: digits.range(),
                fmt: cap[3].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sites_with_spans() {
        let text = r#"
void f(void) {
    TRICE0( Id(0), "boot\n" );
    TRICE16_1( Id(4242), "speed %d\n", v );
    TRICE_S( Id( 300 ), "name %s\n", s );
}
"#;
        let sites = scan_text(Path::new("a.c"), text);
        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].macro_name, "TRICE0");
        assert_eq!(sites[0].id, 0);
        assert_eq!(sites[1].id, 4242);
        assert_eq!(&text[sites[1].id_span.clone()], "4242");
        assert_eq!(sites[2].id, 300);
        assert_eq!(sites[2].fmt, "name %s\\n");
    }

    #[test]
    fn ignores_non_trace_calls() {
        let text = r#"printf("hello %d\n", x); MYTRICE0( Id(1), "no" );"#;
        assert!(scan_text(Path::new("a.c"), text).is_empty());
    }

    #[test]
    fn format_string_with_escaped_quote() {
        let text = r#"TRICE16_1( Id(7), "say \"%d\"\n", x );"#;
        let sites = scan_text(Path::new("a.c"), text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].fmt, r#"say \"%d\"\n"#);
    }

    #[test]
    fn tree_walk_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("a.c"), "").unwrap();
        std::fs::write(sub.join("b.hpp"), "").unwrap();
        std::fs::write(sub.join("notes.txt"), "").unwrap();

        let files = scan_tree(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() != "txt"));
    }

    #[test]
    fn file_root_taken_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.c");
        std::fs::write(&file, "TRICE0( Id(0), \"x\" );").unwrap();
        let files = scan_tree(&[file.clone()]).unwrap();
        assert_eq!(files, vec![file]);
    }
}

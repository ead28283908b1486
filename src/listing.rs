//! Discover the input files of a report directory.
//!
//! Only files with a supported extension are listed; spreadsheet lock files (names starting with
//! `~$`) are always skipped. The default order is the natural order of the file name, so
//! `report2.csv` sorts before `report10.csv`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::ReportResult;
use crate::ingestion::SourceFormat;

/// Prefix of the temporary files spreadsheet editors leave next to open workbooks.
pub const LOCK_FILE_PREFIX: &str = "~$";

/// Sort key for [`list_tabular_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Natural order of the file name (default).
    #[default]
    Name,
    /// Natural order of the path relative to the listed directory.
    Path,
    /// Last modification time.
    Modified,
}

/// Options for [`list_tabular_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingOptions {
    pub sort_by: SortKey,
    pub reverse: bool,
}

/// Returns `true` for names the engine will try to load.
pub fn is_supported_file(name: &str) -> bool {
    !name.starts_with(LOCK_FILE_PREFIX) && SourceFormat::from_path(Path::new(name)).is_some()
}

/// List the supported files under `dir` (recursively), as paths relative to `dir`.
pub fn list_tabular_files(dir: impl AsRef<Path>, options: &ListingOptions) -> ReportResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut found: Vec<(PathBuf, SystemTime)> = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_supported_file(name) {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        found.push((relative, modified));
    }

    found.sort_by(|a, b| {
        let ord = match options.sort_by {
            SortKey::Name => natural_cmp(&file_name_of(&a.0), &file_name_of(&b.0)),
            SortKey::Path => natural_cmp(&a.0.to_string_lossy(), &b.0.to_string_lossy()),
            SortKey::Modified => a.1.cmp(&b.1),
        };
        if options.reverse { ord.reverse() } else { ord }
    });

    tracing::debug!(dir = %dir.display(), files = found.len(), "listed tabular files");
    Ok(found.into_iter().map(|(p, _)| p).collect())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One piece of a [`natural_key`]: keys alternate text and number chunks, starting with text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalChunk {
    /// Lower-cased text run (possibly empty).
    Text(String),
    /// Digit run compared by numeric value: (significant digit count, digits without leading zeros).
    Number(usize, String),
}

/// Split `s` into alternating text and digit runs for natural ordering.
pub fn natural_key(s: &str) -> Vec<NaturalChunk> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            out.push(NaturalChunk::Text(std::mem::take(&mut text).to_lowercase()));
            let mut digits = String::from(c);
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            let significant = digits.trim_start_matches('0').to_owned();
            out.push(NaturalChunk::Number(significant.len(), significant));
        } else {
            text.push(c);
        }
    }
    out.push(NaturalChunk::Text(text.to_lowercase()));
    out
}

/// Compare two strings in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{is_supported_file, list_tabular_files, natural_cmp, ListingOptions, SortKey};
    use std::cmp::Ordering;

    fn tmp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("sheet-summary-listing-{name}-{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn natural_order_compares_digit_runs_numerically() {
        assert_eq!(natural_cmp("report2.csv", "report10.csv"), Ordering::Less);
        assert_eq!(natural_cmp("Report2.csv", "report2.csv"), Ordering::Equal);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("b1", "a2"), Ordering::Greater);
        assert_eq!(natural_cmp("1a", "a1"), Ordering::Less);
    }

    #[test]
    fn supported_file_filter() {
        assert!(is_supported_file("ledger.CSV"));
        assert!(is_supported_file("ledger.xlsx"));
        assert!(is_supported_file("ledger.xls"));
        assert!(!is_supported_file("~$ledger.xlsx"));
        assert!(!is_supported_file("notes.txt"));
        assert!(!is_supported_file("project.json"));
    }

    #[test]
    fn lists_supported_files_in_natural_order_recursively() {
        let dir = tmp_dir("order");
        for name in ["r10.csv", "r2.csv", "notes.txt", "~$r3.xlsx", "r1.xlsx"] {
            fs::write(dir.join(name), "id\n1\n").unwrap();
        }
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub").join("r3.csv"), "id\n1\n").unwrap();

        let files = list_tabular_files(&dir, &ListingOptions::default()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("r1.xlsx"),
                PathBuf::from("r2.csv"),
                PathBuf::from("sub").join("r3.csv"),
                PathBuf::from("r10.csv"),
            ]
        );

        let reversed = list_tabular_files(
            &dir,
            &ListingOptions {
                sort_by: SortKey::Path,
                reverse: true,
            },
        )
        .unwrap();
        assert_eq!(reversed.first(), Some(&PathBuf::from("sub").join("r3.csv")));

        let _ = fs::remove_dir_all(&dir);
    }
}

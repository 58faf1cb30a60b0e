use std::fs::Metadata;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};

use super::Rule;

/// The subset of file metadata rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub size: u64,
    /// Birth time; `None` when the filesystem does not record it.
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
}

impl FileStats {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            created: meta.created().ok().map(DateTime::<Local>::from),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        }
    }
}

/// Whether `path` satisfies `rule`.
///
/// Pure: only `path`, `stats` and `rule` are consulted.
pub fn matches(path: &Path, stats: &FileStats, rule: &Rule) -> bool {
    match rule {
        // Suffix of the name, so `.tar.gz` works; the stem must be non-empty.
        Rule::Extension(extensions) => match path.file_name() {
            Some(name) => {
                let name = name.to_string_lossy().to_ascii_lowercase();
                extensions
                    .iter()
                    .any(|e| name.len() > e.len() && name.ends_with(e.as_str()))
            }
            None => false,
        },
        Rule::CreationDate(date) => same_day(stats.created.as_ref(), date),
        Rule::ModificationDate(date) => same_day(stats.modified.as_ref(), date),
        // Unanchored search over the whole base name.
        Rule::Pattern(regex) => path
            .file_name()
            .map(|name| regex.is_match(&name.to_string_lossy()))
            .unwrap_or(false),
    }
}

fn same_day(time: Option<&DateTime<Local>>, date: &NaiveDate) -> bool {
    time.map(|t| t.date_naive() == *date).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleCriteria;
    use chrono::TimeZone;

    fn stats_on(created: (i32, u32, u32), modified: (i32, u32, u32)) -> FileStats {
        FileStats {
            size: 10,
            created: Local
                .with_ymd_and_hms(created.0, created.1, created.2, 10, 30, 0)
                .single(),
            modified: Local
                .with_ymd_and_hms(modified.0, modified.1, modified.2, 23, 59, 0)
                .single(),
        }
    }

    #[test]
    fn test_extension_match() {
        let rule = Rule::extensions(".pdf,.docx").unwrap();
        let stats = stats_on((2024, 1, 1), (2024, 1, 1));

        assert!(matches(Path::new("/in/report.pdf"), &stats, &rule));
        assert!(matches(Path::new("/in/REPORT.PDF"), &stats, &rule));
        assert!(matches(Path::new("/in/cv.docx"), &stats, &rule));
        assert!(!matches(Path::new("/in/photo.png"), &stats, &rule));
        assert!(!matches(Path::new("/in/pdf"), &stats, &rule));
        assert!(!matches(Path::new("/in/archive.pdf.zip"), &stats, &rule));
    }

    #[test]
    fn test_multi_part_extension_match() {
        let rule = Rule::extensions("tar.gz, .pdf").unwrap();
        let stats = stats_on((2024, 1, 1), (2024, 1, 1));

        assert!(matches(Path::new("/in/backup.tar.gz"), &stats, &rule));
        assert!(matches(Path::new("/in/BACKUP.TAR.GZ"), &stats, &rule));
        assert!(!matches(Path::new("/in/notes.gz"), &stats, &rule));
        assert!(!matches(Path::new("/in/.tar.gz"), &stats, &rule));
        assert!(!matches(Path::new("/in/.pdf"), &stats, &rule));
    }

    #[test]
    fn test_creation_date_exact_day() {
        let rule = Rule::parse(RuleCriteria::CreationDate, "15/06/2024").unwrap();

        assert!(matches(
            Path::new("a.txt"),
            &stats_on((2024, 6, 15), (2020, 1, 1)),
            &rule
        ));
        assert!(!matches(
            Path::new("a.txt"),
            &stats_on((2024, 6, 16), (2024, 6, 15)),
            &rule
        ));
    }

    #[test]
    fn test_missing_birth_time_never_matches() {
        let rule = Rule::parse(RuleCriteria::CreationDate, "15/06/2024").unwrap();
        let mut stats = stats_on((2024, 6, 15), (2024, 6, 15));
        stats.created = None;

        assert!(!matches(Path::new("a.txt"), &stats, &rule));
    }

    #[test]
    fn test_modification_date_exact_day() {
        let rule = Rule::parse(RuleCriteria::ModificationDate, "01/02/2023").unwrap();

        assert!(matches(
            Path::new("a.txt"),
            &stats_on((2020, 1, 1), (2023, 2, 1)),
            &rule
        ));
        assert!(!matches(
            Path::new("a.txt"),
            &stats_on((2023, 2, 1), (2023, 1, 2)),
            &rule
        ));
    }

    #[test]
    fn test_pattern_searches_base_name_only() {
        let rule = Rule::pattern("^invoice_\\d+").unwrap();
        let stats = stats_on((2024, 1, 1), (2024, 1, 1));

        assert!(matches(Path::new("/x/invoice_42.pdf"), &stats, &rule));
        assert!(!matches(Path::new("/invoice_42/readme.md"), &stats, &rule));

        let unanchored = Rule::pattern("draft").unwrap();
        assert!(matches(Path::new("/x/my-draft-v2.txt"), &stats, &unanchored));
    }

    #[test]
    fn test_match_is_repeatable() {
        let rule = Rule::pattern("[0-9]{4}").unwrap();
        let stats = stats_on((2024, 1, 1), (2024, 1, 1));
        let path = Path::new("/x/scan-2024.jpg");

        let first = matches(path, &stats, &rule);
        for _ in 0..10 {
            assert_eq!(matches(path, &stats, &rule), first);
        }
    }
}

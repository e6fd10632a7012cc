//! Aggregation adapter: turns document-store notes into publishable records.

use tracing::{debug, info};

use crate::contract::{Note, Record};

/// Line prefix after which a note's description starts.
pub const LINK_MARKER: &str = "## Link: ";

/// Which notes take part in a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFilter {
    /// Vault-relative path prefixes that are never published (e.g. `Templates/`).
    pub exclude_prefixes: Vec<String>,
    /// Accepted frontmatter `type` values.
    pub types: Vec<String>,
}

impl Default for NoteFilter {
    fn default() -> Self {
        Self {
            exclude_prefixes: vec!["Templates/".to_string()],
            types: ["tool", "link", "library", "dataset"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl NoteFilter {
    pub fn accepts(&self, note: &Note) -> bool {
        if self
            .exclude_prefixes
            .iter()
            .any(|prefix| note.path.starts_with(prefix.as_str()))
        {
            return false;
        }
        match note.kind.as_deref() {
            Some(kind) => self.types.iter().any(|t| t == kind),
            None => false,
        }
    }
}

/// Everything after the first line starting with [`LINK_MARKER`], or `""` when no line does.
pub fn extract_description(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    match lines.iter().position(|line| line.starts_with(LINK_MARKER)) {
        Some(idx) => lines[idx + 1..].join("\n"),
        None => String::new(),
    }
}

/// Map one note onto the record model.
pub fn to_record(note: &Note) -> Record {
    Record {
        name: note.basename.clone(),
        link: note.link.clone().unwrap_or_default(),
        tags: note.linked_basenames.clone(),
        description: extract_description(&note.content),
        kind: note.kind.clone().unwrap_or_default(),
    }
}

/// Select the notes accepted by `filter` and map them to records, preserving order.
pub fn aggregate(notes: &[Note], filter: &NoteFilter) -> Vec<Record> {
    let records: Vec<Record> = notes
        .iter()
        .filter(|note| {
            let accepted = filter.accepts(note);
            if !accepted {
                debug!(path = %note.path, "[AGGREGATE] Skipping note");
            }
            accepted
        })
        .map(to_record)
        .collect();
    info!(
        notes = notes.len(),
        records = records.len(),
        "[AGGREGATE] Aggregated notes into records"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockNoteSource, NoteSource};

    fn note(path: &str, kind: Option<&str>) -> Note {
        let basename = path
            .rsplit('/')
            .next()
            .unwrap_or(path)
            .trim_end_matches(".md")
            .to_string();
        Note {
            path: path.to_string(),
            basename,
            link: Some("https://example.com".into()),
            kind: kind.map(String::from),
            content: "---\ntype: tool\n---\n# Title\n## Link: https://example.com\nA tool.".into(),
            linked_basenames: vec!["Rust".into()],
        }
    }

    #[test]
    fn description_is_everything_after_marker_line() {
        assert_eq!(extract_description("foo\n## Link: \nhello\nworld"), "hello\nworld");
    }

    #[test]
    fn description_is_empty_without_marker() {
        assert_eq!(extract_description("foo\n## Links\nhello"), "");
        assert_eq!(extract_description(""), "");
    }

    #[test]
    fn description_uses_first_marker_only() {
        let body = "## Link: a\none\n## Link: b\ntwo";
        assert_eq!(extract_description(body), "one\n## Link: b\ntwo");
    }

    #[test]
    fn marker_line_at_end_gives_empty_description() {
        assert_eq!(extract_description("intro\n## Link: https://x"), "");
    }

    #[test]
    fn to_record_maps_note_fields() {
        let record = to_record(&note("Tools/ripgrep.md", Some("tool")));
        assert_eq!(
            record,
            Record {
                name: "ripgrep".into(),
                link: "https://example.com".into(),
                tags: vec!["Rust".into()],
                description: "A tool.".into(),
                kind: "tool".into(),
            }
        );
    }

    #[test]
    fn missing_frontmatter_fields_become_empty_strings() {
        let mut n = note("ripgrep.md", None);
        n.link = None;
        let record = to_record(&n);
        assert_eq!(record.link, "");
        assert_eq!(record.kind, "");
    }

    #[test]
    fn filter_skips_templates_and_unknown_types() {
        let notes = vec![
            note("Tools/ripgrep.md", Some("tool")),
            note("Templates/tool.md", Some("tool")),
            note("Journal/2026-10-15.md", Some("daily")),
            note("Untyped.md", None),
            note("Data/imagenet.md", Some("dataset")),
        ];

        let records = aggregate(&notes, &NoteFilter::default());
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ripgrep", "imagenet"]);
    }

    #[tokio::test]
    async fn aggregates_notes_collected_from_a_source() {
        let mut source = MockNoteSource::new();
        source.expect_collect_notes().times(1).returning(|| {
            Ok(vec![
                note("Templates/tool.md", Some("tool")),
                note("Tools/ripgrep.md", Some("tool")),
                note("Links/rust-book.md", Some("link")),
            ])
        });

        let notes = source.collect_notes().await.unwrap();
        let records = aggregate(&notes, &NoteFilter::default());

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ripgrep", "rust-book"]);
    }
}

//! Filesystem vault: a directory tree of markdown notes with YAML frontmatter and
//! internal links, read into [`Note`]s for the aggregation step.
//!
//! Links are `[[wikilinks]]`, `![[embeds]]` and markdown links to vault files
//! (`[text](Some%20Note.md)`). Links inside code spans and fenced blocks do not count.
//! Targets resolve against every non-hidden file in the vault, attachments included.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{Note, NoteSource, NoteSourceError};

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[\[([^\]]+)\]\]").expect("wikilink regex"));

static MARKDOWN_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[[^\]\n]*\]\((?:<([^>\n]+)>|([^)\s]+))").expect("markdown link regex")
});

// Unclosed fences run to the end of the note.
static CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```[\s\S]*?(?:^```|\z)|^~~~[\s\S]*?(?:^~~~|\z)|`[^`\n]+`")
        .expect("code regex")
});

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Frontmatter fields the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub link: Option<String>,
    pub kind: Option<String>,
}

/// Return the YAML between a leading `---` line and the next `---` line, if any.
pub fn split_frontmatter(content: &str) -> Option<&str> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    if rest.starts_with("---") {
        return Some("");
    }
    let end = rest.find("\n---")?;
    Some(rest[..end].trim_end_matches('\r'))
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse the `link` and `type` fields out of a note's frontmatter.
///
/// Malformed YAML is logged and treated as no frontmatter.
pub fn parse_frontmatter(content: &str) -> Frontmatter {
    let Some(yaml) = split_frontmatter(content) else {
        return Frontmatter::default();
    };
    let value: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "[VAULT] Ignoring malformed frontmatter");
            return Frontmatter::default();
        }
    };
    Frontmatter {
        link: value.get("link").and_then(scalar_to_string),
        kind: value.get("type").and_then(scalar_to_string),
    }
}

fn is_external(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:")
}

fn link_path(raw: &str) -> Option<String> {
    let target = raw.split('#').next()?.trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// Link targets in document order, with aliases (`|`) and headings (`#`) stripped.
///
/// Markdown link targets are percent-decoded; external URLs are skipped.
pub fn extract_link_targets(content: &str) -> Vec<String> {
    let code: Vec<Range<usize>> = CODE_REGEX.find_iter(content).map(|m| m.range()).collect();
    let in_code = |offset: usize| code.iter().any(|range| range.contains(&offset));

    let mut found: Vec<(usize, String)> = Vec::new();
    for cap in WIKILINK_REGEX.captures_iter(content) {
        let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if in_code(whole.start()) {
            continue;
        }
        let Some(target) = inner.as_str().split('|').next().and_then(link_path) else {
            continue;
        };
        found.push((whole.start(), target));
    }
    for cap in MARKDOWN_LINK_REGEX.captures_iter(content) {
        let (Some(whole), Some(raw)) = (cap.get(0), cap.get(1).or_else(|| cap.get(2))) else {
            continue;
        };
        if in_code(whole.start()) || is_external(raw.as_str()) {
            continue;
        }
        let decoded = urlencoding::decode(raw.as_str())
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| raw.as_str().to_string());
        if let Some(target) = link_path(&decoded) {
            found.push((whole.start(), target));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, target)| target).collect()
}

fn strip_md(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Join `rel` onto `dir`, folding `.` and `..`. `None` when it climbs out of the vault.
fn join_relative(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

/// Any non-hidden file in the vault; only notes are read.
struct VaultFile {
    path: String,
    abs: PathBuf,
    basename: String,
    is_note: bool,
}

impl VaultFile {
    /// Name a link uses to reach this file: notes drop `.md`, attachments keep their extension.
    fn link_name(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        if self.is_note {
            strip_md(name)
        } else {
            name
        }
    }
}

/// Resolves link targets the way a vault does: exact path first, then file name.
struct LinkIndex {
    by_path: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl LinkIndex {
    fn new(files: &[VaultFile]) -> Self {
        let mut by_path = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, file) in files.iter().enumerate() {
            let path = if file.is_note {
                strip_md(&file.path)
            } else {
                file.path.as_str()
            };
            by_path.insert(path.to_lowercase(), idx);
            by_name.entry(file.link_name().to_lowercase()).or_insert(idx);
        }
        Self { by_path, by_name }
    }

    fn resolve(&self, target: &str, source_dir: &str) -> Option<usize> {
        let lowered = strip_md(target).to_lowercase();
        let key = lowered.trim_start_matches('/');
        let relative = || {
            join_relative(&source_dir.to_lowercase(), key)
                .and_then(|path| self.by_path.get(&path).copied())
        };

        if key.starts_with("./") || key.starts_with("../") {
            return relative();
        }
        if let Some(idx) = self.by_path.get(key) {
            return Some(*idx);
        }
        if key.contains('/') {
            return relative();
        }
        self.by_name.get(key).copied()
    }
}

/// A vault rooted at a directory on disk.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read every note under the root, sorted by vault-relative path.
    ///
    /// A note that cannot be read is logged and skipped; only a missing or
    /// unlistable directory fails the whole read.
    pub fn read_notes(&self) -> Result<Vec<Note>, VaultError> {
        if !self.root.is_dir() {
            error!(root = %self.root.display(), "[VAULT] Vault root is not a directory");
            return Err(VaultError::NotADirectory(self.root.clone()));
        }

        let mut files = Vec::new();
        visit_dir(&self.root, &self.root, &mut files)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let index = LinkIndex::new(&files);
        let mut notes = Vec::new();
        for file in files.iter().filter(|f| f.is_note) {
            let Some(content) = read_note(file) else {
                continue;
            };
            let frontmatter = parse_frontmatter(&content);
            let source_dir = parent_dir(&file.path);
            let mut seen = HashSet::new();
            let linked_basenames = extract_link_targets(&content)
                .iter()
                .filter_map(|target| index.resolve(target, source_dir))
                .filter(|idx| seen.insert(*idx))
                .map(|idx| files[idx].basename.clone())
                .collect();
            notes.push(Note {
                path: file.path.clone(),
                basename: file.basename.clone(),
                link: frontmatter.link,
                kind: frontmatter.kind,
                content,
                linked_basenames,
            });
        }

        info!(
            root = %self.root.display(),
            files = files.len(),
            count = notes.len(),
            "[VAULT] Read notes"
        );
        Ok(notes)
    }
}

fn read_note(file: &VaultFile) -> Option<String> {
    let bytes = match std::fs::read(&file.abs) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %file.path, error = %e, "[VAULT] Skipping unreadable note");
            return None;
        }
    };
    debug!(path = %file.path, "[VAULT] Read note");
    match String::from_utf8(bytes) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = %file.path, "[VAULT] Note is not valid UTF-8, decoding lossily");
            Some(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

fn visit_dir(dir: &Path, root: &Path, out: &mut Vec<VaultFile>) -> Result<(), VaultError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| VaultError::Io { path, source }
    };

    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        // .obsidian, .git, .trash, .DS_Store
        if file_name.starts_with('.') {
            debug!(path = %path.display(), "[VAULT] Skipping hidden entry");
            continue;
        }

        let file_type = entry.file_type().map_err(io_err(&path))?;
        let is_file = if file_type.is_symlink() {
            // Symlinked directories are never followed; symlinked files are read.
            std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
        } else if file_type.is_dir() {
            visit_dir(&path, root, out)?;
            false
        } else {
            file_type.is_file()
        };
        if !is_file {
            continue;
        }

        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push(VaultFile {
            path: rel_path,
            abs: path.clone(),
            basename,
            is_note: path.extension().and_then(|e| e.to_str()) == Some("md"),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl NoteSource for FsVault {
    async fn collect_notes(&self) -> Result<Vec<Note>, NoteSourceError> {
        let vault = FsVault::new(self.root.clone());
        tokio::task::spawn_blocking(move || vault.read_notes())
            .await
            .map_err(|e| -> NoteSourceError { Box::new(e) })?
            .map_err(|e| -> NoteSourceError { Box::new(e) })
    }
}

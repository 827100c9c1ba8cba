//! Input acquisition — turns drops and picker submissions into one selection.
//!
//! A terminal has no drag-and-drop API of its own.  Dropping a file onto the
//! window makes the terminal paste its path (plain, shell-quoted, or as a
//! `file://` URI), so the drop target treats a bracketed paste as the drop and
//! pointer movement over its area as the enter/over/leave lifecycle.  The
//! picker prompt produces the same kind of path list.  Both end up in
//! [`first_file`], which keeps the first existing file and ignores the rest.

use std::path::{Path, PathBuf};

use sheetdrop_proto::client::SelectedFile;

/// Drag lifecycle as seen by the drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<PathBuf>),
}

/// Result of feeding one drag event to the drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    /// Always true: drag events never fall through to anything else (a pasted
    /// drop is never typed into a text field).
    pub default_prevented: bool,
    pub selection: Option<SelectedFile>,
}

/// The drop target's highlight state.
#[derive(Debug, Default)]
pub struct DropZone {
    active: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the "active drop target" highlight is on.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&mut self, event: DragEvent) -> DropOutcome {
        let selection = match event {
            DragEvent::Enter | DragEvent::Over => {
                self.active = true;
                None
            }
            DragEvent::Leave => {
                self.active = false;
                None
            }
            DragEvent::Drop(files) => {
                self.active = false;
                first_file(files)
            }
        };
        DropOutcome {
            default_prevented: true,
            selection,
        }
    }
}

/// First entry of a file list, or `None` for an empty list.
pub fn first_file(files: Vec<PathBuf>) -> Option<SelectedFile> {
    files.into_iter().next().map(SelectedFile::from_path)
}

/// Paths named by dropped or typed text that point at existing regular files,
/// in the order they appear.
pub fn files_from_text(text: &str) -> Vec<PathBuf> {
    candidate_paths(text)
        .into_iter()
        .filter(|p| p.is_file())
        .collect()
}

/// Every path the text could be naming.
///
/// The whole trimmed text is tried first so an unquoted path containing
/// spaces still works; otherwise each line is read either as a `file://` URI
/// or as shell-style words.
pub fn candidate_paths(text: &str) -> Vec<PathBuf> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let whole = expand_tilde(trimmed);
    if whole.is_file() {
        return vec![whole];
    }

    let mut out = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("file://") {
            if let Some(path) = path_from_file_uri(line) {
                out.push(path);
            }
            continue;
        }
        out.extend(split_words(line).iter().map(|w| expand_tilde(w)));
    }
    out
}

fn path_from_file_uri(uri: &str) -> Option<PathBuf> {
    reqwest::Url::parse(uri).ok()?.to_file_path().ok()
}

#[cfg(not(windows))]
const ESCAPE: Option<char> = Some('\\');
#[cfg(windows)]
const ESCAPE: Option<char> = None;

/// Split on unquoted whitespace, honouring '…', "…" and backslash escapes.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if Some(c) == ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_word = true;
            }
            None if Some(c) == ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(raw).to_path_buf()
}

//! Generic settings file reader/writer
//!
//! A settings file is a sequence of `[section]` headers each followed by
//! `key=value` lines. Pairs are dispatched to the registered
//! [`SettingsSection`] whose category matches; sections nobody registered are
//! kept and written back untouched so several components can share one file.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CredStoreError, Result};
use crate::section::SettingsSection;

/// File name used inside the default configuration directory
const DEFAULT_FILE_NAME: &str = "credentials.conf";

/// Default settings file location in the user's configuration directory
pub fn default_settings_path() -> Result<PathBuf> {
    ProjectDirs::from("org", "credstore", "credstore")
        .map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
        .ok_or_else(|| CredStoreError::StorageError("Could not determine config directory".to_string()))
}

/// One `[name]` block as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub pairs: Vec<(String, String)>,
}

/// Parsed settings text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsDocument {
    pub sections: Vec<RawSection>,
}

impl SettingsDocument {
    /// Parse settings text.
    ///
    /// Blank lines and lines starting with `#` or `;` are skipped. Keys are
    /// trimmed, values are taken verbatim after the first `=`. Pairs before
    /// the first header belong to a section with an empty name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut sections: Vec<RawSection> = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') {
                let name = trimmed
                    .strip_suffix(']')
                    .map(|s| s[1..].trim())
                    .ok_or_else(|| CredStoreError::ParseError {
                        line: number + 1,
                        message: format!("unterminated section header {:?}", trimmed),
                    })?;
                sections.push(RawSection {
                    name: name.to_string(),
                    pairs: Vec::new(),
                });
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| CredStoreError::ParseError {
                line: number + 1,
                message: format!("expected key=value, got {:?}", trimmed),
            })?;
            let value = value.strip_suffix('\r').unwrap_or(value);

            if sections.is_empty() {
                sections.push(RawSection {
                    name: String::new(),
                    pairs: Vec::new(),
                });
            }
            if let Some(section) = sections.last_mut() {
                section.pairs.push((key.trim().to_string(), value.to_string()));
            }
        }

        Ok(Self { sections })
    }

    /// Render sections back to text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if !section.name.is_empty() {
                out.push_str(&format!("[{}]\n", section.name));
            }
            for (key, value) in &section.pairs {
                out.push_str(&format!("{}={}\n", key, value));
            }
        }
        out
    }
}

/// What happened during a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Pairs accepted by a registered section
    pub consumed: usize,
    /// Pairs offered to a registered section but rejected
    pub unhandled: Vec<String>,
    /// Sections with no registered owner, kept for the next save
    pub foreign_sections: Vec<String>,
}

/// Deliver every pair of `document` to its registered section.
///
/// Each registered section is finalized and reset afterwards, so freshly
/// loaded data is not reported as unsaved. Returns the report together with
/// the sections nobody claimed.
pub fn dispatch(
    document: SettingsDocument,
    sections: &mut [&mut dyn SettingsSection],
) -> (LoadReport, Vec<RawSection>) {
    let mut report = LoadReport::default();
    let mut foreign = Vec::new();

    for raw in document.sections {
        let Some(section) = sections.iter_mut().find(|s| s.category() == raw.name) else {
            debug!("No handler for settings section [{}]", raw.name);
            report.foreign_sections.push(raw.name.clone());
            foreign.push(raw);
            continue;
        };

        for (key, value) in &raw.pairs {
            if section.set_property(key, value).is_consumed() {
                report.consumed += 1;
            } else {
                warn!("Unhandled key in [{}]: {}", raw.name, key);
                report.unhandled.push(key.clone());
            }
        }
    }

    for section in sections.iter_mut() {
        section.finish_load();
        section.reset();
    }

    (report, foreign)
}

/// Settings file shared by several sections
pub struct SettingsFile {
    path: PathBuf,
    /// Sections read from disk that no registered component owns
    foreign: Vec<RawSection>,
}

impl SettingsFile {
    /// Create a settings file handle; nothing is read until [`load`](Self::load)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            foreign: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file and feed its pairs to `sections`.
    /// A missing file loads as empty.
    pub async fn load(&mut self, sections: &mut [&mut dyn SettingsSection]) -> Result<LoadReport> {
        let document = if self.path.exists() {
            let text = tokio::fs::read_to_string(&self.path).await?;
            SettingsDocument::parse(&text)?
        } else {
            debug!("No settings file at {:?}, starting empty", self.path);
            SettingsDocument::default()
        };

        let (report, foreign) = dispatch(document, sections);
        self.foreign = foreign;

        info!(
            "Loaded settings from {:?} ({} keys, {} unhandled)",
            self.path,
            report.consumed,
            report.unhandled.len()
        );
        Ok(report)
    }

    /// Render registered sections followed by preserved foreign sections.
    /// Pairs that preceded the first header have no header of their own and
    /// are written first so they stay outside every named section.
    pub fn render(&self, sections: &[&mut dyn SettingsSection]) -> String {
        let (preamble, named): (Vec<RawSection>, Vec<RawSection>) =
            self.foreign.iter().cloned().partition(|s| s.name.is_empty());

        let mut blocks: Vec<String> = Vec::new();
        let preamble = SettingsDocument { sections: preamble }.render();
        if !preamble.is_empty() {
            blocks.push(preamble);
        }

        blocks.extend(sections.iter().map(|s| s.save()));

        let foreign = SettingsDocument { sections: named }.render();
        if !foreign.is_empty() {
            blocks.push(foreign);
        }

        blocks.join("\n")
    }

    /// Write all sections atomically, then acknowledge the save on each.
    /// Sections are disabled while the write runs.
    pub async fn save(&self, sections: &mut [&mut dyn SettingsSection]) -> Result<()> {
        for section in sections.iter_mut() {
            section.set_enabled(false);
        }

        let result = self.write(&self.render(sections)).await;

        for section in sections.iter_mut() {
            if result.is_ok() {
                section.acknowledge_saved();
            }
            section.set_enabled(true);
        }

        result
    }

    async fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

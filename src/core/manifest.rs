//! `forge.ini` manifest parsing and serialization.
//!
//! The manifest is a sectioned key/value file:
//!
//! ```ini
//! [info]
//! name = mylib
//! type = lib
//!
//! [dependencies]
//! local:core = ../core
//! ```
//!
//! Keys are addressed with dotted paths (`info.name`). Section names may
//! themselves contain dots (`[win32.debug]`), so lookups pick the longest
//! section name that prefixes the key.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The manifest file name.
pub const MANIFEST_NAME: &str = "forge.ini";

const COMMENT_CHAR: char = '#';

/// Errors raised while reading or writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not open `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid `forge.ini` file `{}` at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    /// Entries in insertion order. Commented entries are kept for writing only.
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    commented: bool,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    fn find(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| !e.commented && e.key == key)
    }
}

/// A parsed `forge.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    sections: Vec<Section>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    /// Parse manifest content. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let mut manifest = Manifest::new();
        let mut current = String::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT_CHAR) {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(end) = rest.find(']') else {
                    return Err(ManifestError::Parse {
                        path: path.to_path_buf(),
                        line: index + 1,
                        reason: "unterminated section header".to_string(),
                    });
                };
                current = rest[..end].trim().to_string();
                manifest.ensure_section(&current);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ManifestError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("expected `key = value`, found `{}`", line),
                });
            };

            let key = trim_value(key);
            if key.is_empty() {
                return Err(ManifestError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: "empty key".to_string(),
                });
            }

            manifest.push_entry(&current, key, trim_value(value), false);
        }

        Ok(manifest)
    }

    /// Get a value by dotted key, or an empty string if absent.
    pub fn get(&self, key: &str) -> &str {
        self.try_get(key).unwrap_or("")
    }

    /// Get a value by dotted key, falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.try_get(key).unwrap_or(default)
    }

    /// Get a value by dotted key if present.
    pub fn try_get(&self, key: &str) -> Option<&str> {
        let (section, sub_key) = self.locate(key)?;
        section.find(sub_key).map(|e| e.value.as_str())
    }

    /// All live entries of a section in declaration order. A missing section
    /// yields an empty list.
    pub fn fetch_section(&self, name: &str) -> Vec<(String, String)> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| {
                s.entries
                    .iter()
                    .filter(|e| !e.commented)
                    .map(|e| (e.key.clone(), e.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a section is declared, even if empty.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    /// Declare a section without adding keys to it.
    pub fn add_section(&mut self, name: &str) {
        self.ensure_section(name);
    }

    /// Set a value by dotted key. The part before the first dot names the
    /// section, unless a longer existing section already matches.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let (section, sub_key) = self.split_for_write(key);
        let value = value.into();

        let sect = self.ensure_section(&section);
        match sect
            .entries
            .iter_mut()
            .find(|e| !e.commented && e.key == sub_key)
        {
            Some(entry) => entry.value = value,
            None => sect.entries.push(Entry {
                key: sub_key,
                value,
                commented: false,
            }),
        }
    }

    /// Write a commented-out entry (`# key = value`), used as a hint in
    /// generated manifests. It is never returned by lookups.
    pub fn comment(&mut self, key: &str, value: impl Into<String>) {
        let (section, sub_key) = self.split_for_write(key);
        self.push_entry(&section, sub_key, value.into(), true);
    }

    /// Render the manifest in ini form.
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();

        for section in &self.sections {
            if !section.name.is_empty() {
                out.push_str(&format!("[{}]\n", section.name));
            }
            for entry in &section.entries {
                if entry.commented {
                    out.push_str(&format!("{} {} = {}\n", COMMENT_CHAR, entry.key, entry.value));
                } else {
                    out.push_str(&format!("{} = {}\n", entry.key, entry.value));
                }
            }
            out.push('\n');
        }

        out
    }

    /// Write the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        fs::write(path, self.to_ini_string()).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn locate<'s, 'k>(&'s self, key: &'k str) -> Option<(&'s Section, &'k str)> {
        let mut best: Option<(&'s Section, &'k str)> = None;

        for section in &self.sections {
            let sub_key = if section.name.is_empty() {
                Some(key)
            } else {
                key.strip_prefix(section.name.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
            };

            if let Some(sub_key) = sub_key {
                let longer = best.map_or(true, |(b, _)| section.name.len() > b.name.len());
                if longer && section.find(sub_key).is_some() {
                    best = Some((section, sub_key));
                }
            }
        }

        best
    }

    fn split_for_write(&self, key: &str) -> (String, String) {
        if let Some((section, sub_key)) = self.locate(key) {
            return (section.name.clone(), sub_key.to_string());
        }

        let longest = self
            .sections
            .iter()
            .filter(|s| !s.name.is_empty())
            .filter(|s| {
                key.strip_prefix(s.name.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|s| s.name.len());

        match longest {
            Some(s) => (s.name.clone(), key[s.name.len() + 1..].to_string()),
            None => match key.split_once('.') {
                Some((section, sub_key)) => (section.to_string(), sub_key.to_string()),
                None => (String::new(), key.to_string()),
            },
        }
    }

    fn ensure_section(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    fn push_entry(&mut self, section: &str, key: String, value: String, commented: bool) {
        let sect = self.ensure_section(section);
        if !commented {
            if let Some(existing) = sect
                .entries
                .iter_mut()
                .find(|e| !e.commented && e.key == key)
            {
                existing.value = value;
                return;
            }
        }
        sect.entries.push(Entry {
            key,
            value,
            commented,
        });
    }
}

fn trim_value(s: &str) -> String {
    s.trim().trim_matches('"').trim().to_string()
}

/// Check whether a directory holds a manifest.
pub fn is_project_dir(path: &Path) -> bool {
    path.join(MANIFEST_NAME).is_file()
}

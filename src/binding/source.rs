use crate::error::BindingError;
use crate::Result;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where rule documents come from
pub trait RuleSource {
    /// Fetches the document at `path`, relative to the current resource
    fn fetch(&self, path: &str) -> Result<String>;
}

/// Reads rule documents from disk, relative to a base directory
#[derive(Debug, Clone)]
pub struct FsRuleSource {
    base: PathBuf,
}

impl FsRuleSource {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }
}

impl RuleSource for FsRuleSource {
    fn fetch(&self, path: &str) -> Result<String> {
        let full = self.base.join(path);
        fs::read_to_string(&full)
            .map_err(|err| BindingError::RuleFetch(format!("{}: {}", full.display(), err)))
    }
}

/// Serves rule documents from memory
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    documents: HashMap<String, String>,
}

impl StaticRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under `path`
    pub fn with_document(mut self, path: &str, document: &str) -> Self {
        self.documents.insert(normalize(path).to_string(), document.to_string());
        self
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./")
}

impl RuleSource for StaticRuleSource {
    fn fetch(&self, path: &str) -> Result<String> {
        self.documents
            .get(normalize(path))
            .cloned()
            .ok_or_else(|| BindingError::RuleFetch(format!("{}: not found", path)))
    }
}

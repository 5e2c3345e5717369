//! User-maintained list of project names matched against statement
//! descriptions.
//!
//! The list is ordered, case-sensitive and free of duplicates. Every mutation
//! writes the whole list back to the store as a JSON array of strings.

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;

use crate::store::KeyValueStore;

/// Store key holding the persisted list
pub const PROJECTS_KEY: &str = "statement_ai_projects";
/// Suggested file name for exports
pub const EXPORT_FILE_NAME: &str = "project_config.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid project file: {0}")]
    InvalidImport(String),

    #[error("clearing the project list needs explicit confirmation")]
    NotConfirmed,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Proof that the user agreed to a destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug)]
pub struct ProjectList<S: KeyValueStore> {
    names: Vec<String>,
    store: S,
}

impl<S: KeyValueStore> ProjectList<S> {
    /// Load the persisted list, falling back to `seed` when nothing is stored
    /// or the stored value is not an array of strings.
    pub fn load(store: S, seed: &[String]) -> Result<Self> {
        let stored = store.get(PROJECTS_KEY).context("read project list")?;
        let names = match stored.as_deref().map(serde_json::from_str::<Vec<String>>) {
            Some(Ok(names)) => dedupe(names),
            Some(Err(e)) => {
                log::warn!("stored project list is unreadable, using defaults: {e}");
                dedupe(seed.to_vec())
            }
            None => dedupe(seed.to_vec()),
        };
        Ok(Self { names, store })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Add a trimmed name. Blank and duplicate names are ignored; returns
    /// whether the list changed.
    pub fn add(&mut self, name: &str) -> Result<bool, ProjectError> {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return Ok(false);
        }
        self.names.push(name.to_string());
        self.persist()?;
        Ok(true)
    }

    pub fn remove(&mut self, name: &str) -> Result<bool, ProjectError> {
        let name = name.trim();
        let before = self.names.len();
        self.names.retain(|n| n != name);
        if self.names.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn clear(&mut self, confirmation: Confirmation) -> Result<(), ProjectError> {
        if confirmation != Confirmation::Confirmed {
            return Err(ProjectError::NotConfirmed);
        }
        self.names.clear();
        self.persist()?;
        Ok(())
    }

    /// Replace the whole list. The value must be an array whose every element
    /// is a string; anything else leaves the list untouched.
    pub fn replace_all(&mut self, value: &Value) -> Result<(), ProjectError> {
        let items = value
            .as_array()
            .ok_or_else(|| ProjectError::InvalidImport("expected a JSON array of project names".into()))?;

        let mut names = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let s = item.as_str().ok_or_else(|| {
                ProjectError::InvalidImport(format!("element {i} is not a string"))
            })?;
            names.push(s.trim().to_string());
        }

        self.names = dedupe(names);
        self.persist()?;
        Ok(())
    }

    pub fn import_json(&mut self, text: &str) -> Result<(), ProjectError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ProjectError::InvalidImport(format!("not valid JSON: {e}")))?;
        self.replace_all(&value)
    }

    /// Pretty-printed JSON array of the current names
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.names).context("serialize project list")
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.names).context("serialize project list")?;
        self.store
            .set(PROJECTS_KEY, &json)
            .context("save project list")
    }
}

/// Drop blank entries and later duplicates, keeping first-seen order.
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for n in names {
        if !n.trim().is_empty() && !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn list(names: &[&str]) -> ProjectList<MemoryStore> {
        let json = serde_json::to_string(names).unwrap();
        ProjectList::load(MemoryStore::with_entry(PROJECTS_KEY, &json), &[]).unwrap()
    }

    #[test]
    fn test_load_falls_back_to_seed() {
        let seed = vec!["Alpha".to_string()];
        let p = ProjectList::load(MemoryStore::new(), &seed).unwrap();
        assert_eq!(p.names(), &["Alpha"]);

        let p = ProjectList::load(MemoryStore::with_entry(PROJECTS_KEY, "{not json"), &seed).unwrap();
        assert_eq!(p.names(), &["Alpha"]);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut p = list(&["Alpha"]);
        assert!(!p.add("Alpha").unwrap());
        assert!(!p.add("  Alpha  ").unwrap());
        assert!(!p.add("   ").unwrap());
        assert_eq!(p.names(), &["Alpha"]);
        assert_eq!(p.store.writes(), 0);
    }

    #[test]
    fn test_add_trims_and_persists() {
        let mut p = list(&["Alpha"]);
        assert!(p.add("  Beta Launch ").unwrap());
        assert_eq!(p.names(), &["Alpha", "Beta Launch"]);
        assert_eq!(
            p.store.get(PROJECTS_KEY).unwrap().as_deref(),
            Some(r#"["Alpha","Beta Launch"]"#)
        );
    }

    #[test]
    fn test_add_is_case_sensitive() {
        let mut p = list(&["Alpha"]);
        assert!(p.add("alpha").unwrap());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut p = list(&["Alpha", "Beta"]);
        assert!(p.remove("Alpha").unwrap());
        assert!(!p.remove("Gamma").unwrap());
        assert_eq!(p.names(), &["Beta"]);
    }

    #[test]
    fn test_remove_trims_like_add() {
        let mut p = list(&["Alpha", "Beta"]);
        assert!(p.remove("  Alpha ").unwrap());
        assert_eq!(p.names(), &["Beta"]);
        assert_eq!(p.store.writes(), 1);
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut p = list(&["Alpha"]);
        assert!(matches!(p.clear(Confirmation::Declined), Err(ProjectError::NotConfirmed)));
        assert_eq!(p.len(), 1);
        p.clear(Confirmation::Confirmed).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.store.get(PROJECTS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_import_rejects_object() {
        let mut p = list(&["Alpha"]);
        let err = p.import_json(r#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidImport(_)));
        assert_eq!(p.names(), &["Alpha"]);
        assert_eq!(p.store.writes(), 0);
    }

    #[test]
    fn test_import_rejects_mixed_array() {
        let mut p = list(&["Alpha"]);
        assert!(p.import_json(r#"["Beta", 3]"#).is_err());
        assert!(p.import_json("not json").is_err());
        assert_eq!(p.names(), &["Alpha"]);
    }

    #[test]
    fn test_import_replaces_list() {
        let mut p = list(&["Alpha"]);
        p.import_json(r#"["Beta", " Gamma ", "Beta", ""]"#).unwrap();
        assert_eq!(p.names(), &["Beta", "Gamma"]);
    }

    #[test]
    fn test_reload_sees_saved_list() {
        let store = MemoryStore::new();
        {
            let mut p = ProjectList::load(&store, &[]).unwrap();
            p.add("Alpha").unwrap();
            p.add("Beta").unwrap();
        }
        assert_eq!(store.writes(), 2);
        let p = ProjectList::load(&store, &["Seed".to_string()]).unwrap();
        assert_eq!(p.names(), &["Alpha", "Beta"]);
    }

    #[test]
    fn test_export_is_pretty_array() {
        let p = list(&["Alpha", "Beta"]);
        let out = p.export_json().unwrap();
        assert_eq!(out, "[\n  \"Alpha\",\n  \"Beta\"\n]");
    }
}

use anyhow::{bail, Context, Result};
use statement_core::{Confirmation, ProjectList, EXPORT_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::state::FileStore;

pub fn open_projects(cfg: &Config) -> Result<ProjectList<FileStore>> {
    let store = FileStore::open_default()?;
    ProjectList::load(store, &cfg.projects.seed)
}

pub fn list(projects: &ProjectList<FileStore>) {
    if projects.is_empty() {
        println!("No projects configured.");
        return;
    }
    for name in projects.names() {
        println!("{name}");
    }
}

pub fn add(projects: &mut ProjectList<FileStore>, name: &str) -> Result<()> {
    if projects.add(name)? {
        println!("Added project: {}", name.trim());
    } else if name.trim().is_empty() {
        bail!("project name is blank");
    } else {
        println!("Project already configured: {}", name.trim());
    }
    Ok(())
}

pub fn remove(projects: &mut ProjectList<FileStore>, name: &str) -> Result<()> {
    if projects.remove(name)? {
        println!("Removed project: {}", name.trim());
    } else {
        println!("No project named: {}", name.trim());
    }
    Ok(())
}

pub fn clear(projects: &mut ProjectList<FileStore>, yes: bool) -> Result<()> {
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    };
    projects
        .clear(confirmation)
        .context("pass --yes to remove every project")?;
    println!("Cleared all projects.");
    Ok(())
}

pub fn import(projects: &mut ProjectList<FileStore>, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    projects.import_json(&text)?;
    println!("Imported {} projects from {}", projects.len(), path.display());
    Ok(())
}

pub fn export(projects: &ProjectList<FileStore>, out: Option<PathBuf>) -> Result<()> {
    let path = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    let json = projects.export_json()?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    println!("Exported {} projects to {}", projects.len(), path.display());
    Ok(())
}

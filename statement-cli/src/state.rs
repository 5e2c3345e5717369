use anyhow::{Context, Result};
use statement_core::KeyValueStore;
use std::fs;
use std::path::PathBuf;

/// Application directory: `$STATEMENT_AI_HOME`, else `~/.statement-ai`
pub fn app_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STATEMENT_AI_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".statement-ai"))
}

pub fn ensure_app_home() -> Result<PathBuf> {
    let dir = app_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Key-value store keeping one `<key>.json` file per entry
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(ensure_app_home()?)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let p = self.path_for(key);
        if !p.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&p).with_context(|| format!("read {}", p.display()))?;
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Some(s)),
            Err(e) => {
                // Lossy text fails to parse downstream and the caller falls back.
                log::warn!("{} is not valid UTF-8", p.display());
                Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let p = self.path_for(key);
        // Readers only ever see a complete file.
        let tmp = p.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &p).with_context(|| format!("replace {}", p.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::{ProjectList, PROJECTS_KEY};

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set(PROJECTS_KEY, r#"["Alpha"]"#).unwrap();
        assert_eq!(store.get(PROJECTS_KEY).unwrap().as_deref(), Some(r#"["Alpha"]"#));
        assert!(dir.path().join("statement_ai_projects.json").exists());
    }

    #[test]
    fn test_project_list_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            let mut list = ProjectList::load(store, &[]).unwrap();
            list.add("Alpha Upgrade").unwrap();
            list.add("Beta").unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        let list = ProjectList::load(store, &[]).unwrap();
        assert_eq!(list.names(), &["Alpha Upgrade", "Beta"]);
    }

    #[test]
    fn test_corrupt_project_file_falls_back_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("statement_ai_projects.json"), [0xff, 0xfe, 0x00]).unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        let mut list = ProjectList::load(store, &["Seed".to_string()]).unwrap();
        assert_eq!(list.names(), &["Seed"]);

        list.add("Alpha").unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let list = ProjectList::load(store, &[]).unwrap();
        assert_eq!(list.names(), &["Seed", "Alpha"]);
    }

    #[test]
    fn test_keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use statement_extract::Provider;
use std::fs;
use std::io::{self, Write};

use crate::state::ensure_app_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl AuthState {
    fn slot(&mut self, provider: Provider) -> &mut Option<String> {
        match provider {
            Provider::Gemini => &mut self.gemini_api_key,
            Provider::OpenAI => &mut self.openai_api_key,
            Provider::Anthropic => &mut self.anthropic_api_key,
        }
    }

    fn stored(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
        }
    }
}

pub fn env_var_for(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "GEMINI_API_KEY",
        Provider::OpenAI => "OPENAI_API_KEY",
        Provider::Anthropic => "ANTHROPIC_API_KEY",
    }
}

fn auth_path() -> Result<std::path::PathBuf> {
    Ok(ensure_app_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// API key for `provider`: environment first, then `auth.json`.
pub fn api_key(provider: Provider) -> Result<String> {
    if let Ok(key) = std::env::var(env_var_for(provider)) {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }
    let auth = load_auth()?;
    match auth.stored(provider) {
        Some(k) if !k.is_empty() => Ok(k.to_string()),
        _ => bail!(
            "missing {provider} API key; set {} or run: statement-ai auth set-key {provider} \
(or pass --offline to use the built-in rules)",
            env_var_for(provider)
        ),
    }
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn set_key(provider: Provider) -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret(&format!("Paste {provider} API key"))?;
    if key.is_empty() {
        bail!("no key entered; nothing saved");
    }
    *auth.slot(provider) = Some(key);
    save_auth(&auth)?;
    println!("Saved {provider} API key to {}", auth_path()?.display());
    Ok(())
}

//! CLI Configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub tool_name: Option<String>,
    pub to_url: Option<String>,
    pub ats_major_version: Option<u32>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    /// Set a key by name
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            "tool_name" => self.tool_name = Some(value),
            "to_url" => self.to_url = Some(value),
            "ats_major_version" => {
                self.ats_major_version = Some(
                    value
                        .parse()
                        .with_context(|| format!("ats_major_version must be a number, got {}", value))?,
                )
            }
            "default_format" => self.default_format = Some(value),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a key by name
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(match key {
            "tool_name" => self.tool_name.clone(),
            "to_url" => self.to_url.clone(),
            "ats_major_version" => self.ats_major_version.map(|v| v.to_string()),
            "default_format" => self.default_format.clone(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        })
    }

    pub const KEYS: [&'static str; 4] = ["tool_name", "to_url", "ats_major_version", "default_format"];

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".parentcfg").join(filename))
    }
}

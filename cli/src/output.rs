//! Output formatting

use anyhow::Result;
use clap::ValueEnum;
use parentcfg_compiler::ParentDotConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The parent.config file itself
    Text,
    /// File plus skip report as JSON
    Json,
    /// File plus skip report as YAML
    Yaml,
}

impl OutputFormat {
    pub fn render(&self, config: &ParentDotConfig) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => config.text.clone(),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(config)?;
                json.push('\n');
                json
            }
            OutputFormat::Yaml => serde_yaml::to_string(config)?,
        })
    }
}

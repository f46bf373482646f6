//! Compile command

use crate::config::Config;
use crate::output::OutputFormat;
use crate::snapshot;
use anyhow::{Context, Result};
use parentcfg_compiler::{compile, CompileOptions};
use std::fs;
use std::path::PathBuf;

/// Flags of the compile command, unset ones fall back to the config file
pub struct CompileArgs {
    pub snapshot: PathBuf,
    pub tool_name: Option<String>,
    pub to_url: Option<String>,
    pub ats_major_version: Option<u32>,
    pub output: Option<PathBuf>,
}

/// Merge flags over the config file over the built-in defaults
pub fn options(args: &CompileArgs, config: &Config) -> CompileOptions {
    let defaults = CompileOptions::default();
    CompileOptions {
        ats_major_version: args
            .ats_major_version
            .or(config.ats_major_version)
            .unwrap_or(defaults.ats_major_version),
        tool_name: args
            .tool_name
            .clone()
            .or_else(|| config.tool_name.clone())
            .unwrap_or(defaults.tool_name),
        to_url: args
            .to_url
            .clone()
            .or_else(|| config.to_url.clone())
            .unwrap_or(defaults.to_url),
    }
}

pub fn handle(args: CompileArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let input = snapshot::load(&args.snapshot)?;
    let options = options(&args, config);

    let compiled = compile(&input, &options)
        .with_context(|| format!("compiling {}", args.snapshot.display()))?;

    for skip in &compiled.skipped {
        tracing::info!(delivery_service = %skip.name, reason = %skip.reason, "Skipped");
    }

    let rendered = format.render(&compiled)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote parent.config");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

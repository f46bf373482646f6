//! Snapshot loading

use parentcfg_common::{ParentConfigError, Result};
use parentcfg_compiler::ParentConfigInput;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            other => Err(ParentConfigError::Snapshot(format!(
                "unsupported snapshot extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Load a snapshot, format chosen by file extension
pub fn load(path: &Path) -> Result<ParentConfigInput> {
    let format = SnapshotFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| ParentConfigError::Snapshot(format!("{}: {}", path.display(), e)))?;

    let input: ParentConfigInput = match format {
        SnapshotFormat::Json => serde_json::from_str(&content)
            .map_err(|e| ParentConfigError::Snapshot(format!("{}: {}", path.display(), e)))?,
        SnapshotFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| ParentConfigError::Snapshot(format!("{}: {}", path.display(), e)))?,
    };

    tracing::debug!(
        path = %path.display(),
        delivery_services = input.delivery_services.len(),
        servers = input.servers.len(),
        topologies = input.topologies.len(),
        "Loaded snapshot"
    );

    Ok(input)
}

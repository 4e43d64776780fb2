use std::collections::HashSet;
use std::path::PathBuf;

use crate::AppPaths;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentSource {
    pub mod_id: String,
    pub source_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DiscoveryError {
    EmptyModId,
    DuplicateMod { mod_id: String },
    ModMissing { mod_id: String, expected_dir: PathBuf },
}

/// Base content first, then enabled mods in the order given. Later sources override earlier ones.
pub(crate) fn discover_content_sources(
    app_paths: &AppPaths,
    enabled_mods: &[String],
) -> Result<Vec<ContentSource>, DiscoveryError> {
    let mut seen = HashSet::<&str>::new();
    let mut sources = vec![ContentSource {
        mod_id: "base".to_string(),
        source_dir: app_paths.base_content_dir.clone(),
    }];

    for mod_id in enabled_mods {
        let trimmed = mod_id.trim();
        if trimmed.is_empty() {
            return Err(DiscoveryError::EmptyModId);
        }
        if !seen.insert(trimmed) {
            return Err(DiscoveryError::DuplicateMod {
                mod_id: trimmed.to_string(),
            });
        }
        let mod_dir = app_paths.mods_dir.join(trimmed);
        if !mod_dir.is_dir() {
            return Err(DiscoveryError::ModMissing {
                mod_id: trimmed.to_string(),
                expected_dir: mod_dir,
            });
        }
        sources.push(ContentSource {
            mod_id: trimmed.to_string(),
            source_dir: mod_dir,
        });
    }

    Ok(sources)
}

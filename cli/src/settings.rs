use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gemdig_core::{Catalog, EngineConfig, MemoryProgress, PickaxeLedger, ProgressStore, StageId};
use serde::{Deserialize, Serialize};

/// Contents of the `--config` TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pickaxes: u32,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pickaxes: PickaxeLedger::DEFAULT_PICKAXES,
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }
}

pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
    Catalog::from_json_str(&json).with_context(|| format!("Invalid catalog in {}", path.display()))
}

/// Progress kept in a JSON file, written back with [`JsonProgress::save`].
#[derive(Debug, Default)]
pub struct JsonProgress {
    path: Option<PathBuf>,
    progress: MemoryProgress,
    dirty: bool,
}

impl JsonProgress {
    /// Reads `path` if it exists; a missing file is an empty progress record.
    pub fn open(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let progress = match &path {
            Some(path) if path.exists() => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read progress from {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Invalid progress in {}", path.display()))?
            }
            _ => MemoryProgress::default(),
        };
        Ok(Self {
            path,
            progress,
            dirty: false,
        })
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.progress)?;
        fs::write(path, json).with_context(|| format!("Failed to write progress to {}", path.display()))?;
        log::debug!("Progress saved to {}", path.display());
        self.dirty = false;
        Ok(())
    }
}

impl ProgressStore for JsonProgress {
    fn highest_reached(&self) -> Option<StageId> {
        self.progress.highest_reached()
    }

    fn record_reached(&mut self, stage: StageId) -> bool {
        let changed = self.progress.record_reached(stage);
        self.dirty |= changed;
        changed
    }

    fn is_reward_claimed(&self, stage: StageId) -> bool {
        self.progress.is_reward_claimed(stage)
    }

    fn mark_reward_claimed(&mut self, stage: StageId) {
        self.progress.mark_reward_claimed(stage);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            pickaxes = 40

            [engine]
            reveal_chance = 0.5
            placement = "upfront"
            "#,
        )
        .unwrap();

        assert_eq!(settings.pickaxes, 40);
        assert_eq!(settings.engine.reveal_chance, 0.5);
        assert_eq!(settings.engine.placement, gemdig_core::PlacementMode::Upfront);
        assert_eq!(settings.engine.packer_retries, 50);
    }

    #[test]
    fn missing_progress_file_starts_empty() {
        let progress = JsonProgress::open(Some(PathBuf::from("/nonexistent/gemdig-progress.json"))).unwrap();

        assert_eq!(progress.highest_reached(), None);
    }
}

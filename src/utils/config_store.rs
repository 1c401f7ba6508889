// JSON-file backed store for per-guild settings
// The whole file is read once at startup and rewritten wholesale on save.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use poise::serenity_prelude as serenity;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::guild::GuildConfig;

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("config file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Guild ID (as string) -> settings, plus the file it lives in
#[derive(Debug, Default)]
pub struct ConfigStore {
    path: PathBuf,
    guilds: HashMap<String, GuildConfig>,
}

impl ConfigStore {
    /// Empty store that will save to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guilds: HashMap::new(),
        }
    }

    /// Load the store, falling back to an empty one on any failure
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(store) => {
                info!("Loaded config for {} guild(s) from {}", store.len(), path.display());
                store
            }
            Err(e) => {
                warn!("{}; starting with an empty config", e);
                Self::new(path)
            }
        }
    }

    /// Strict load: a missing file is an empty store, anything else unreadable is an error
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigStoreError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::new(path));
            }
            Err(source) => {
                return Err(ConfigStoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let guilds = serde_json::from_str(&raw).map_err(|source| ConfigStoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            guilds,
        })
    }

    /// Overwrite the file with the full mapping (2-space indent, UTF-8 kept as-is)
    pub async fn save(&self) -> Result<(), ConfigStoreError> {
        let io_err = |source| ConfigStoreError::Io {
            path: self.path.clone(),
            source,
        };

        let body = serde_json::to_string_pretty(&self.guilds).map_err(|source| {
            ConfigStoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&self.path, body).await.map_err(io_err)?;

        debug!("Saved config for {} guild(s) to {}", self.len(), self.path.display());
        Ok(())
    }

    /// Settings for a guild, if any were ever stored
    pub fn get(&self, guild_id: serenity::GuildId) -> Option<&GuildConfig> {
        self.guilds.get(&guild_id.to_string())
    }

    /// Settings for a guild, inserting an empty record first if needed
    pub fn get_or_create(&mut self, guild_id: serenity::GuildId) -> &mut GuildConfig {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    /// Edit a guild's record (creating it if needed) and save.
    /// If the save fails the record is put back the way it was.
    pub async fn update(
        &mut self,
        guild_id: serenity::GuildId,
        edit: impl FnOnce(&mut GuildConfig),
    ) -> Result<(), ConfigStoreError> {
        let previous = self.get(guild_id).cloned();
        edit(self.get_or_create(guild_id));

        if let Err(e) = self.save().await {
            warn!("Rolling back config change for guild {}", guild_id);
            let key = guild_id.to_string();
            match previous {
                Some(cfg) => {
                    self.guilds.insert(key, cfg);
                }
                None => {
                    self.guilds.remove(&key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Drop everything stored for a guild and save. Returns whether there was
    /// anything to drop; a failed save keeps the record.
    pub async fn reset(&mut self, guild_id: serenity::GuildId) -> Result<bool, ConfigStoreError> {
        let key = guild_id.to_string();
        let Some(previous) = self.guilds.remove(&key) else {
            return Ok(false);
        };

        if let Err(e) = self.save().await {
            warn!("Rolling back config reset for guild {}", guild_id);
            self.guilds.insert(key, previous);
            return Err(e);
        }
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }
}

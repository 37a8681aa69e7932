use std::path::PathBuf;

use tokio::fs;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::metrics;
use crate::models::{parse_configs, ComparisonConfig};
use crate::Result;

/// The configured comparisons, mirrored to a local file.
///
/// A calculation pass holds the read guard for its whole duration, so a
/// replace waits for the pass in flight and a new pass waits for the replace.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    configs: RwLock<Vec<ComparisonConfig>>,
}

impl ConfigStore {
    /// Loads the persisted list. A missing or unreadable file yields an empty list.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let configs = match fs::read(&path).await {
            Ok(raw) => match parse_configs(&raw) {
                Ok(configs) => {
                    info!(path = %path.display(), count = configs.len(), "loaded comparison config");
                    configs
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt comparison config, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "comparison config not readable, starting empty");
                Vec::new()
            }
        };
        metrics::set_configured_comparisons(configs.len());
        Self {
            path,
            configs: RwLock::new(configs),
        }
    }

    /// Parses `raw`, persists it verbatim, then swaps the in-memory list.
    ///
    /// Nothing changes if parsing or persisting fails.
    pub async fn replace_all(&self, raw: &[u8]) -> Result<usize> {
        let parsed = parse_configs(raw)?;

        let mut configs = self.configs.write().await;
        self.persist(raw).await?;
        let count = parsed.len();
        *configs = parsed;
        metrics::set_configured_comparisons(count);

        info!(path = %self.path.display(), count, "replaced comparison config");
        Ok(count)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Vec<ComparisonConfig>> {
        self.configs.read().await
    }

    pub async fn snapshot(&self) -> Vec<ComparisonConfig> {
        self.configs.read().await.clone()
    }

    // Write to a sibling temp file and rename over the target.
    async fn persist(&self, raw: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, raw).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

//! On-disk store for comparison charts served under `/static`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::chart_service::ChartError;

const CHART_SUBDIR: &str = "charts";

/// Every saved chart gets its own file name, so concurrent submissions never
/// overwrite each other. Only the newest `retention` files are kept.
#[derive(Debug, Clone)]
pub struct ChartStore {
    dir: PathBuf,
    url_prefix: String,
    retention: usize,
}

impl ChartStore {
    /// `static_dir` is the directory mounted at `url_prefix` (e.g. `/static`)
    pub fn new(static_dir: impl AsRef<Path>, url_prefix: &str, retention: usize) -> Self {
        Self {
            dir: static_dir.as_ref().join(CHART_SUBDIR),
            url_prefix: format!("{}/{}", url_prefix.trim_end_matches('/'), CHART_SUBDIR),
            retention: retention.max(1),
        }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the PNG and return the URL it is served from
    pub fn save(&self, png: &[u8]) -> Result<String, ChartError> {
        fs::create_dir_all(&self.dir)?;

        let file_name = format!("chart-{}.png", Uuid::new_v4());
        let path = self.dir.join(&file_name);
        fs::write(&path, png)?;
        debug!("Saved chart {} ({} bytes)", file_name, png.len());

        if let Err(e) = self.prune(&path) {
            warn!("Failed to prune old charts in {}: {}", self.dir.display(), e);
        }

        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    /// Delete the oldest charts beyond the retention limit, never `current`
    fn prune(&self, current: &Path) -> std::io::Result<()> {
        let mut charts: Vec<(SystemTime, PathBuf)> = fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("chart-") && name.ends_with(".png")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, entry.path()))
            })
            .filter(|(_, path)| path != current)
            .collect();

        let keep = self.retention - 1;
        if charts.len() <= keep {
            return Ok(());
        }

        // Newest first
        charts.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in charts.into_iter().skip(keep) {
            // Another request may have pruned it already
            match fs::remove_file(&path) {
                Ok(()) => debug!("Pruned {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

//! Per-item algorithm: skip, pace, fetch, write.

use crate::catalog::CatalogItem;
use crate::identity::asset_file_name;
use crate::progress::{DownloadOutcome, SkipReason};
use crate::storage;

use super::DownloadCoordinator;

impl DownloadCoordinator {
    /// Decide the outcome of one item. Remote and disk errors become `Failed`.
    /// Success is logged by the caller once the outcome is counted.
    pub(super) fn process_item(&self, item: &CatalogItem) -> DownloadOutcome {
        let Some(url) = item.asset_url() else {
            self.log
                .warn(&format!("No audio URL for item {}, skipping", item.id));
            return DownloadOutcome::Skipped(SkipReason::NoUrl);
        };

        let Some(file_name) = asset_file_name(&item.id, &self.extension) else {
            let message = "item id has no usable characters for a file name".to_string();
            self.log.error(&format!("item {:?}: {}", item.id, message));
            return DownloadOutcome::Failed(message);
        };

        if let Err(e) = url::Url::parse(url) {
            let message = format!("invalid asset URL: {}", e);
            self.log.error(&format!("✗ {}: {}", file_name, message));
            return DownloadOutcome::Failed(message);
        }

        self.limiter.before_download();

        let bytes = match self.fetcher.asset(url, &self.log) {
            Ok(b) => b,
            Err(e) => {
                let message = e.to_string();
                self.log.error(&format!("✗ {}: {}", file_name, message));
                return DownloadOutcome::Failed(message);
            }
        };

        let out_path = self.download_dir.join(&file_name);
        if let Err(e) = storage::write_atomic(&out_path, &bytes) {
            let message = format!("write {}: {}", out_path.display(), e);
            self.log.error(&format!("✗ {}: {}", file_name, message));
            return DownloadOutcome::Failed(message);
        }

        DownloadOutcome::Downloaded
    }
}

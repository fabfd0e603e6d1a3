use crate::color_utils::HexColor;
use crate::config::Configuration;
use crate::live_preview::PreviewChannel;
use crate::shades::{ShadeRole, BACKGROUND_VARIABLE};
use crate::store::PreferenceStore;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tracing::{debug, warn};

/// Everything the generator does to the outside world. Writes are treated
/// as always succeeding; implementations swallow and log their own failures.
pub trait Environment {
    fn apply_live_style(&mut self, role: ShadeRole, color: HexColor);

    fn apply_background(&mut self, color: HexColor);

    fn persist(&mut self, config: &Configuration);
}

/// Production environment: styles go to the preview channel, the
/// configuration goes to the preference store.
pub struct LivePage {
    preview: Arc<PreviewChannel>,
    store: Box<dyn PreferenceStore>,
}

impl LivePage {
    pub fn new(preview: Arc<PreviewChannel>, store: Box<dyn PreferenceStore>) -> Self {
        Self { preview, store }
    }
}

impl Environment for LivePage {
    fn apply_live_style(&mut self, role: ShadeRole, color: HexColor) {
        self.preview.set_property(role.variable_name(), color.to_hex());
    }

    fn apply_background(&mut self, color: HexColor) {
        self.preview.set_property(BACKGROUND_VARIABLE, color.to_hex());
    }

    fn persist(&mut self, config: &Configuration) {
        let text = config.to_stored();
        let store = &self.store;
        // Store writes hit the filesystem; keep them off the async worker
        // when the runtime can hand its other tasks to another thread.
        let result = match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => block_in_place(|| store.set(&text)),
            _ => store.set(&text),
        };
        match result {
            Ok(()) => debug!("Persisted theme colors"),
            Err(e) => warn!("Failed to persist theme colors: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};

    #[test]
    fn test_live_page_writes_preview_and_store() {
        let preview = Arc::new(PreviewChannel::new());
        let store = MemoryStore::default();
        let mut page = LivePage::new(preview.clone(), Box::new(store.clone()));

        page.apply_live_style(ShadeRole::Darker, HexColor::from_rgb(0x1f, 0xa5, 0x88));
        page.apply_background(HexColor::from_rgb(0xff, 0xff, 0xff));
        page.persist(&Configuration::default());

        assert_eq!(
            preview.property("--ifm-color-primary-darker").as_deref(),
            Some("#1fa588")
        );
        assert_eq!(
            preview.property("--ifm-background-color").as_deref(),
            Some("#ffffff")
        );
        assert_eq!(
            Configuration::from_stored(store.get().as_deref()),
            Configuration::default()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_persist_from_async_worker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), crate::config::STORAGE_KEY);
        let path = store.path().to_path_buf();
        let mut page = LivePage::new(Arc::new(PreviewChannel::new()), Box::new(store));

        let mut config = Configuration::default();
        config.base_color = "#3578e5".parse().unwrap();
        page.persist(&config);

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(Configuration::from_stored(Some(&text)), config);
    }

    #[tokio::test]
    async fn test_persist_on_current_thread_runtime() {
        let store = MemoryStore::default();
        let mut page = LivePage::new(Arc::new(PreviewChannel::new()), Box::new(store.clone()));

        page.persist(&Configuration::default());
        assert!(store.get().is_some());
    }
}

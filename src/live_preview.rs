use crate::models::{SseEvent, StyleEvent};
use futures_util::stream::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 100;

type Properties = Arc<Mutex<BTreeMap<String, String>>>;

/// The page's root style scope, mirrored to every connected page.
pub struct PreviewChannel {
    sender: broadcast::Sender<SseEvent>,
    properties: Properties,
}

impl Default for PreviewChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            properties: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[cfg(test)]
    pub fn property(&self, name: &str) -> Option<String> {
        self.snapshot().remove(name)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        snapshot_of(&self.properties)
    }

    /// Set a custom property; only actual changes are broadcast.
    pub fn set_property(&self, name: &str, value: String) {
        {
            let mut properties = self
                .properties
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if properties.get(name) == Some(&value) {
                return;
            }
            properties.insert(name.to_string(), value.clone());
        }

        // No subscribers is fine
        let _ = self.sender.send(style_event(name, value));
    }

    /// Current styles first, then live changes. A subscriber that lags far
    /// enough to lose events is sent the whole current snapshot again.
    pub fn subscribe(&self) -> Pin<Box<dyn Stream<Item = SseEvent> + Send>> {
        // Subscribe before taking the snapshot so nothing falls in between
        let mut receiver = self.sender.subscribe();
        let properties = self.properties.clone();

        Box::pin(async_stream::stream! {
            for (name, value) in snapshot_of(&properties) {
                yield style_event(&name, value);
            }

            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        yield event;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Preview stream lagged by {} events, resending styles", skipped);
                        for (name, value) in snapshot_of(&properties) {
                            yield style_event(&name, value);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Preview stream closed");
        })
    }
}

fn snapshot_of(properties: &Properties) -> BTreeMap<String, String> {
    properties
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn style_event(name: &str, value: String) -> SseEvent {
    let event = StyleEvent {
        property: name.to_string(),
        value,
        time: chrono::Utc::now().timestamp_millis(),
    };
    SseEvent {
        event_type: "style".to_string(),
        data: serde_json::to_string(&event).unwrap_or_default(),
    }
}

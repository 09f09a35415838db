use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{model::Event, provider::EventsApi};

use super::StateCell;

pub const EVENTS_ERROR: &str = "Failed to load events";

/// How many events are surfaced to views and the map.
pub const UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsState {
    pub events: Vec<Event>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct EventsStore {
    api: Arc<dyn EventsApi>,
    state: StateCell<EventsState>,
}

impl EventsStore {
    /// An empty store. Nothing is fetched until [`EventsStore::fetch_events`] runs.
    pub fn new(api: Arc<dyn EventsApi>) -> Self {
        Self { api, state: StateCell::new(EventsState::default()) }
    }

    /// Construct the store and launch its one start-up fetch on the current runtime.
    pub fn spawn(api: Arc<dyn EventsApi>) -> (Arc<Self>, JoinHandle<()>) {
        let store = Arc::new(Self::new(api));
        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.fetch_events().await }
        });
        (store, task)
    }

    pub async fn fetch_events(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        tracing::debug!("fetching events");

        match self.api.fetch_events().await {
            Ok(events) => {
                tracing::debug!(count = events.len(), "events loaded");
                self.state.update(|s| {
                    s.events = events;
                    s.loading = false;
                });
            }
            Err(err) => {
                tracing::error!(error = ?err, "events fetch failed");
                self.state.update(|s| {
                    s.error = Some(EVENTS_ERROR.to_string());
                    s.loading = false;
                });
            }
        }
    }

    pub fn snapshot(&self) -> EventsState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<EventsState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.read(|s| s.events.clone())
    }

    pub fn loading(&self) -> bool {
        self.state.read(|s| s.loading)
    }

    pub fn error(&self) -> Option<String> {
        self.state.read(|s| s.error.clone())
    }

    /// The first [`UPCOMING_LIMIT`] events in fetch order.
    pub fn upcoming_events(&self) -> Vec<Event> {
        self.state
            .read(|s| s.events.iter().take(UPCOMING_LIMIT).cloned().collect())
    }

    pub fn find(&self, id: &str) -> Option<Event> {
        self.state.read(|s| s.events.iter().find(|e| e.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{ScriptedEvents, sample_events};

    #[tokio::test]
    async fn successful_fetch_replaces_events() {
        let api = Arc::new(ScriptedEvents::new(vec![Ok(sample_events(3))]));
        let store = EventsStore::new(api);

        store.fetch_events().await;

        let state = store.snapshot();
        assert_eq!(state.events.len(), 3);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_empty_list_and_sets_message() {
        let api = Arc::new(ScriptedEvents::new(vec![Err("connection refused".into())]));
        let store = EventsStore::new(api);

        store.fetch_events().await;

        assert!(store.events().is_empty());
        assert_eq!(store.error().as_deref(), Some("Failed to load events"));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn failure_after_success_keeps_previous_events() {
        let api = Arc::new(ScriptedEvents::new(vec![
            Ok(sample_events(2)),
            Err("timeout".into()),
        ]));
        let store = EventsStore::new(api);

        store.fetch_events().await;
        store.fetch_events().await;

        assert_eq!(store.events().len(), 2);
        assert_eq!(store.error().as_deref(), Some(EVENTS_ERROR));
    }

    #[tokio::test]
    async fn retry_clears_error() {
        let api = Arc::new(ScriptedEvents::new(vec![Err("down".into()), Ok(sample_events(1))]));
        let store = EventsStore::new(api);

        store.fetch_events().await;
        assert!(store.error().is_some());

        store.fetch_events().await;
        assert_eq!(store.error(), None);
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn loading_is_only_true_during_fetch() {
        let api = Arc::new(ScriptedEvents::gated(vec![Ok(sample_events(1))]));
        let store = Arc::new(EventsStore::new(api.clone()));
        assert!(!store.loading());

        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.fetch_events().await }
        });

        api.gate().entered().await;
        assert!(store.loading());
        assert_eq!(store.error(), None);

        api.gate().release();
        task.await.expect("fetch task");
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn spawn_fetches_exactly_once() {
        let api = Arc::new(ScriptedEvents::new(vec![Ok(sample_events(4))]));
        let (store, startup) = EventsStore::spawn(api.clone());

        startup.await.expect("startup fetch");

        assert_eq!(api.calls(), 1);
        assert_eq!(store.events().len(), 4);
    }

    #[tokio::test]
    async fn upcoming_is_capped_and_ordered() {
        let api = Arc::new(ScriptedEvents::new(vec![Ok(sample_events(13))]));
        let store = EventsStore::new(api);
        store.fetch_events().await;

        let upcoming = store.upcoming_events();
        assert_eq!(upcoming.len(), UPCOMING_LIMIT);
        let ids: Vec<_> = upcoming.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2", "e3", "e4", "e5", "e6", "e7", "e8", "e9", "e10"]);

        assert!(store.find("e12").is_some());
        assert!(store.find("missing").is_none());
    }
}

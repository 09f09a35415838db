use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Coordinates, EventMarker, MarkerKind};

use super::{EventsStore, StateCell};

/// Pin position and the event it belongs to, if any.
///
/// `selected_event_id == None` means the pin is a free-form location.
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub location: Coordinates,
    pub selected_event_id: Option<String>,
}

#[derive(Debug)]
pub struct MapStore {
    events: Arc<EventsStore>,
    state: StateCell<MapState>,
}

impl MapStore {
    pub fn new(events: Arc<EventsStore>, initial: Coordinates) -> Self {
        Self {
            events,
            state: StateCell::new(MapState { location: initial, selected_event_id: None }),
        }
    }

    pub fn snapshot(&self) -> MapState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapState> {
        self.state.subscribe()
    }

    pub fn location(&self) -> Coordinates {
        self.state.read(|s| s.location)
    }

    pub fn selected_event_id(&self) -> Option<String> {
        self.state.read(|s| s.selected_event_id.clone())
    }

    /// Move the pin to a free-form location. Any selected event is dropped.
    pub fn set_location(&self, coords: Coordinates) {
        self.state.update(|s| {
            s.location = coords;
            s.selected_event_id = None;
        });
    }

    /// Select an event and move the pin onto it in one commit.
    pub fn select_event(&self, event_id: impl Into<String>, coords: Coordinates) {
        let event_id = event_id.into();
        self.state.update(|s| {
            s.selected_event_id = Some(event_id);
            s.location = coords;
        });
    }

    /// Forget the selected event; the pin stays where it is.
    pub fn clear_selected_event(&self) {
        self.state.update(|s| s.selected_event_id = None);
    }

    /// Markers for the upcoming events, rebuilt on every call.
    pub fn event_markers(&self) -> Vec<EventMarker> {
        let selected = self.selected_event_id();

        self.events
            .upcoming_events()
            .into_iter()
            .map(|event| EventMarker {
                selected: selected.as_deref() == Some(event.id.as_str()),
                id: event.id,
                lat: event.lat,
                lng: event.lng,
                name: event.name,
                kind: MarkerKind::Event,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOCATION;
    use crate::store::testing::{ScriptedEvents, sample_events};

    async fn map_with_events(count: usize) -> MapStore {
        let api = Arc::new(ScriptedEvents::new(vec![Ok(sample_events(count))]));
        let events = Arc::new(EventsStore::new(api));
        events.fetch_events().await;
        MapStore::new(events, DEFAULT_LOCATION)
    }

    #[tokio::test]
    async fn starts_at_default_without_selection() {
        let map = map_with_events(0).await;
        assert_eq!(map.location(), DEFAULT_LOCATION);
        assert_eq!(map.selected_event_id(), None);
    }

    #[tokio::test]
    async fn select_event_pins_and_keeps_selection() {
        let map = map_with_events(2).await;
        let c = Coordinates::new(40.0, -3.7);

        map.select_event("e2", c);

        assert_eq!(map.selected_event_id().as_deref(), Some("e2"));
        assert_eq!(map.location(), c);
    }

    #[tokio::test]
    async fn free_relocation_clears_selection() {
        let map = map_with_events(2).await;
        map.select_event("e1", Coordinates::new(1.0, 1.0));

        let c2 = Coordinates::new(2.0, 2.0);
        map.set_location(c2);

        assert_eq!(map.selected_event_id(), None);
        assert_eq!(map.location(), c2);
    }

    #[tokio::test]
    async fn operation_sequences_hold_selection_invariant() {
        let map = map_with_events(3).await;

        for step in 0..12_u32 {
            let c = Coordinates::new(f64::from(step), -f64::from(step));
            match step % 3 {
                0 => {
                    let id = format!("e{}", step % 3 + 1);
                    map.select_event(id.clone(), c);
                    assert_eq!(map.selected_event_id(), Some(id));
                    assert_eq!(map.location(), c);
                }
                1 => {
                    map.set_location(c);
                    assert_eq!(map.selected_event_id(), None);
                    assert_eq!(map.location(), c);
                }
                _ => {
                    let before = map.location();
                    map.clear_selected_event();
                    assert_eq!(map.selected_event_id(), None);
                    assert_eq!(map.location(), before);
                }
            }
        }
    }

    #[tokio::test]
    async fn clear_selected_event_leaves_pin() {
        let map = map_with_events(1).await;
        let c = Coordinates::new(10.0, 20.0);
        map.select_event("e1", c);

        map.clear_selected_event();

        assert_eq!(map.selected_event_id(), None);
        assert_eq!(map.location(), c);
    }

    #[tokio::test]
    async fn markers_follow_events_and_cap_at_ten() {
        for count in [0, 3, 10, 14] {
            let map = map_with_events(count).await;
            let markers = map.event_markers();
            assert_eq!(markers.len(), count.min(10), "events: {count}");
            assert!(markers.iter().all(|m| m.kind == MarkerKind::Event));
        }
    }

    #[tokio::test]
    async fn markers_flag_the_selected_event() {
        let map = map_with_events(3).await;
        map.select_event("e2", Coordinates::new(0.0, 0.0));

        let selected: Vec<_> = map
            .event_markers()
            .into_iter()
            .filter(|m| m.selected)
            .map(|m| m.id)
            .collect();
        assert_eq!(selected, ["e2"]);

        map.set_location(Coordinates::new(1.0, 1.0));
        assert!(map.event_markers().iter().all(|m| !m.selected));
    }

    #[test]
    fn marker_serializes_with_type_tag() {
        let marker = EventMarker {
            id: "e1".into(),
            lat: 1.5,
            lng: 2.5,
            name: "Fair".into(),
            kind: MarkerKind::Event,
            selected: false,
        };
        let json = serde_json::to_value(&marker).expect("serializes");
        assert_eq!(json["type"], "event");
        assert_eq!(json["id"], "e1");
    }
}

//! Observable state containers.
//!
//! Each store keeps its state in a [`tokio::sync::watch`] channel. Mutations
//! go through [`StateCell::update`], which commits and wakes every
//! subscriber; views either take a [`StateCell::snapshot`] or hold a
//! receiver from `subscribe()` and re-render on change.
//!
//! Stores are shared as `Arc` and every operation takes `&self`. Nothing is
//! held across an `.await`, so overlapping fetches interleave and whichever
//! finishes last wins.

use tokio::sync::watch;

pub mod events;
pub mod forecast;
pub mod input;
pub mod map;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{EventsState, EventsStore};
pub use forecast::{ForecastState, ForecastStore};
pub use input::{InputState, InputStore};
pub use map::{MapState, MapStore};

#[derive(Debug)]
pub(crate) struct StateCell<S> {
    tx: watch::Sender<S>,
}

impl<S: Clone> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_committed_updates() {
        let cell = StateCell::new(0_u32);
        let mut rx = cell.subscribe();

        cell.update(|n| *n += 1);

        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(cell.snapshot(), 1);
        assert_eq!(cell.read(|n| n * 10), 10);
    }

    #[test]
    fn updates_without_subscribers_still_commit() {
        let cell = StateCell::new(String::from("a"));
        cell.update(|s| s.push('b'));
        assert_eq!(cell.snapshot(), "ab");
    }
}

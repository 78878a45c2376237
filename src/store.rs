//! Selection store: the destination currently looked at plus the ones the
//! user discovered by searching.
//!
//! The store is an explicit object owned by the composition root. Dependents
//! call [`SelectionStore::subscribe`] and get woken on every change.

use crate::catalog;
use crate::models::Destination;
use tokio::sync::watch;
use tracing::{debug, info};

/// Snapshot published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub selected: Destination,
    /// Destinations added during this session, in insertion order
    pub custom: Vec<Destination>,
}

#[derive(Debug)]
pub struct SelectionStore {
    state: watch::Sender<SelectionState>,
}

impl SelectionStore {
    #[must_use]
    pub fn new(initial: Destination) -> Self {
        let (state, _) = watch::channel(SelectionState {
            selected: initial,
            custom: Vec::new(),
        });
        Self { state }
    }

    #[must_use]
    pub fn selected(&self) -> Destination {
        self.state.borrow().selected.clone()
    }

    /// Make `destination` the current one. Always succeeds.
    pub fn select(&self, destination: Destination) {
        info!("Selecting destination '{}'", destination.id);
        self.state.send_modify(|state| state.selected = destination);
    }

    /// Remember a user-discovered destination.
    ///
    /// Appends without checking for duplicate ids, against the catalog or
    /// earlier additions.
    pub fn add_custom(&self, destination: Destination) {
        debug!("Adding custom destination '{}'", destination.id);
        self.state.send_modify(|state| state.custom.push(destination));
    }

    #[must_use]
    pub fn custom(&self) -> Vec<Destination> {
        self.state.borrow().custom.clone()
    }

    /// Catalog destinations followed by custom ones
    #[must_use]
    pub fn all_destinations(&self) -> Vec<Destination> {
        let state = self.state.borrow();
        catalog::destinations()
            .iter()
            .cloned()
            .chain(state.custom.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every later change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(catalog::default_destination().clone())
    }
}

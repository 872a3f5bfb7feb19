//! Change notification for UI bindings.

use std::sync::Arc;

use crate::settings::SettingKey;
use crate::types::Hover;

/// Something observable about the controller changed.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    /// Analysis was switched on or off
    Enabled(bool),
    /// The go-deeper flag changed
    Deeper(bool),
    /// The hovered move changed
    Hovering(Option<Hover>),
    /// The estimator picked a new target depth
    MaxDepth(u32),
    /// A persisted setting was updated
    Settings(SettingKey),
}

pub type Observer = Arc<dyn Fn(&ControllerEvent) + Send + Sync>;

/// Registered observers, notified in subscription order.
#[derive(Clone, Default)]
pub struct Observers {
    list: Vec<Observer>,
}

impl Observers {
    pub fn push(&mut self, observer: Observer) {
        self.list.push(observer);
    }

    /// Snapshot for notifying outside of any lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Observer> {
        self.list.clone()
    }

    pub fn notify_all(list: &[Observer], events: &[ControllerEvent]) {
        for event in events {
            for observer in list {
                observer(event);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

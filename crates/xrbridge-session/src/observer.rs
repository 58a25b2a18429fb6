//! Observer registry for the typed events the session emits.
//!
//! Observers are invoked synchronously during the update pass, in
//! registration order. All methods default to no-ops so an observer only
//! implements what it cares about.

use std::sync::Arc;

use xrbridge_core::{ControllerState, HandFrame, HeadsetFrame, HitTestPose};

use crate::state::{ViewRect, VisibilityState, XrCapabilities, XrMode};

/// Events the session fans out to the rest of the host application.
#[allow(unused_variables)]
pub trait XrObserver {
    /// Presentation mode changed. Fires before any data event of the new
    /// mode.
    fn on_xr_change(&self, mode: XrMode, views: u32, left: ViewRect, right: ViewRect) {}

    /// A new headset frame was decoded.
    fn on_headset_update(&self, headset: &HeadsetFrame) {}

    /// A controller slot changed (including its final disabled update).
    fn on_controller_update(&self, controller: &ControllerState) {}

    /// A hand slot changed (including its final disabled update).
    fn on_hand_update(&self, hand: &HandFrame) {}

    /// The viewer hit-test result changed.
    fn on_viewer_hit_test_update(&self, hit: &HitTestPose) {}

    /// The producer advertised its presentation capabilities.
    fn on_capabilities_update(&self, capabilities: &XrCapabilities) {}

    /// The producer's visibility state changed.
    fn on_visibility_change(&self, visibility: VisibilityState) {}
}

/// Handle returned by [`ObserverRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Ordered list of observer handles.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn XrObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn XrObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Returns false if the id was already gone.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Invoke `f` for every observer, in registration order.
    pub fn notify(&self, f: impl Fn(&dyn XrObserver)) {
        for (_, observer) in &self.observers {
            f(observer.as_ref());
        }
    }
}

//! The session context: mode state machine, per-tick update pass, and the
//! command surface back to the producer.
//!
//! One [`XrSession`] is constructed at startup and owns everything: the
//! shared buffers, the decoded per-slot state, the input tables, and the
//! observer registry. The embedder writes producer frames into
//! [`XrSession::buffers_mut`] and calls [`XrSession::on_update`] once per
//! host tick; both sides run on the same cooperative schedule, so no lock
//! guards the buffers.

use tracing::{debug, info, warn};

use xrbridge_core::decode;
use xrbridge_core::layout::{CONTROLLER_SLOTS, HAND_SLOTS};
use xrbridge_core::{ControllerState, Hand, HandFrame, HeadsetFrame, HitTestPose, SharedBuffers};

use crate::input::{InputConfig, InputTable};
use crate::link::BrowserLink;
use crate::observer::{ObserverId, ObserverRegistry, XrObserver};
use crate::state::{ControllerProfiles, ViewRect, VisibilityState, XrCapabilities, XrMode};

/// Session-wide configuration.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub input: InputConfig,
}

/// Owned session context. See the module docs for the driving contract.
pub struct XrSession {
    link: Box<dyn BrowserLink>,
    buffers: SharedBuffers,
    observers: ObserverRegistry,

    mode: XrMode,
    views_count: u32,
    left_rect: ViewRect,
    right_rect: ViewRect,
    visibility: VisibilityState,
    capabilities: XrCapabilities,

    // Producer signals arrive between ticks; these latches defer the
    // notifications into the next update pass so observers always hear
    // about a mode switch before any data decoded under it.
    mode_dirty: bool,
    visibility_dirty: bool,
    flush_disabled_pending: bool,

    hit_test_active: bool,

    headset: HeadsetFrame,
    controllers: [ControllerState; CONTROLLER_SLOTS],
    controller_input: [InputTable; CONTROLLER_SLOTS],
    hands: [HandFrame; HAND_SLOTS],
    hand_input: [InputTable; HAND_SLOTS],
    hit_test: HitTestPose,
}

impl XrSession {
    pub fn new(config: SessionConfig, link: Box<dyn BrowserLink>) -> Self {
        Self {
            link,
            buffers: SharedBuffers::new(),
            observers: ObserverRegistry::new(),
            mode: XrMode::Normal,
            views_count: 1,
            left_rect: ViewRect::default(),
            right_rect: ViewRect::default(),
            visibility: VisibilityState::Visible,
            capabilities: XrCapabilities::default(),
            mode_dirty: false,
            visibility_dirty: false,
            flush_disabled_pending: false,
            hit_test_active: false,
            headset: HeadsetFrame::default(),
            controllers: Default::default(),
            controller_input: std::array::from_fn(|_| InputTable::new(config.input)),
            hands: Default::default(),
            hand_input: std::array::from_fn(|_| InputTable::new(config.input)),
            hit_test: HitTestPose::default(),
        }
    }

    pub fn register_observer(&mut self, observer: std::sync::Arc<dyn XrObserver>) -> ObserverId {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// The shared transport buffers, for the producer side to fill.
    pub fn buffers_mut(&mut self) -> &mut SharedBuffers {
        &mut self.buffers
    }

    pub fn buffers(&self) -> &SharedBuffers {
        &self.buffers
    }

    pub fn mode(&self) -> XrMode {
        self.mode
    }

    pub fn views_count(&self) -> u32 {
        self.views_count
    }

    pub fn view_rects(&self) -> (ViewRect, ViewRect) {
        (self.left_rect, self.right_rect)
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn capabilities(&self) -> XrCapabilities {
        self.capabilities
    }

    pub fn headset(&self) -> &HeadsetFrame {
        &self.headset
    }

    pub fn controller(&self, slot: usize) -> Option<&ControllerState> {
        self.controllers.get(slot)
    }

    pub fn controller_input(&self, slot: usize) -> Option<&InputTable> {
        self.controller_input.get(slot)
    }

    pub fn hand(&self, slot: usize) -> Option<&HandFrame> {
        self.hands.get(slot)
    }

    pub fn hand_input(&self, slot: usize) -> Option<&InputTable> {
        self.hand_input.get(slot)
    }

    pub fn hit_test(&self) -> &HitTestPose {
        &self.hit_test
    }

    // ---- producer → consumer signals ----

    /// The browser granted an immersive VR session.
    pub fn start_vr(&mut self, views_count: u32, left: ViewRect, right: ViewRect) {
        info!(views_count, "entering VR presentation");
        self.set_xr_state(XrMode::Vr, views_count, left, right);
    }

    /// The browser granted an immersive AR session.
    pub fn start_ar(&mut self, views_count: u32, left: ViewRect, right: ViewRect) {
        info!(views_count, "entering AR presentation");
        self.set_xr_state(XrMode::Ar, views_count, left, right);
    }

    /// The XR session ended. The next update pass emits one final
    /// disabled notification for every input source that was live, even
    /// if the producer never writes another frame.
    pub fn end_xr(&mut self) {
        info!("leaving XR presentation");
        self.set_xr_state(XrMode::Normal, 1, ViewRect::default(), ViewRect::default());
        self.flush_disabled_pending = true;
        self.hit_test.available = false;
    }

    /// Visibility changed on the producer side. Duplicate reports are
    /// dropped.
    pub fn set_visibility(&mut self, visibility: VisibilityState) {
        if self.visibility != visibility {
            self.visibility = visibility;
            self.visibility_dirty = true;
        }
    }

    /// The browser advertised what it can present. Observers hear about
    /// it immediately; nothing else in the session depends on timing here.
    pub fn set_capabilities(&mut self, capabilities: XrCapabilities) {
        self.capabilities = capabilities;
        self.observers
            .notify(|o| o.on_capabilities_update(&self.capabilities));
    }

    /// Attach input profile identifiers to the controller slots, from the
    /// producer's JSON document. Malformed JSON is dropped with a warning.
    pub fn set_input_profiles_json(&mut self, json: &str) {
        match serde_json::from_str::<ControllerProfiles>(json) {
            Ok(profiles) => self.set_input_profiles(profiles),
            Err(err) => warn!("ignoring malformed input profiles: {err}"),
        }
    }

    pub fn set_input_profiles(&mut self, profiles: ControllerProfiles) {
        self.controllers[0].profiles = profiles.controller1;
        self.controllers[1].profiles = profiles.controller2;
    }

    // ---- consumer → producer commands ----

    /// Ask the browser to enter/leave AR. No-op unless the advertised
    /// capabilities include AR; callers are expected to check first.
    pub fn toggle_ar(&mut self) {
        if !self.capabilities.can_present_ar {
            debug!("toggle_ar ignored: AR presentation not supported");
            return;
        }
        self.link.toggle_ar();
    }

    /// Ask the browser to enter/leave VR. No-op unless supported.
    pub fn toggle_vr(&mut self) {
        if !self.capabilities.can_present_vr {
            debug!("toggle_vr ignored: VR presentation not supported");
            return;
        }
        self.link.toggle_vr();
    }

    /// Subscribe to viewer hit-test results. Latched: only the first call
    /// in AR reaches the producer.
    pub fn start_viewer_hit_test(&mut self) {
        if self.mode != XrMode::Ar || self.hit_test_active {
            debug!("start_viewer_hit_test ignored");
            return;
        }
        self.hit_test_active = true;
        self.link.toggle_viewer_hit_test();
    }

    /// Unsubscribe from viewer hit-test results.
    pub fn stop_viewer_hit_test(&mut self) {
        if self.mode != XrMode::Ar || !self.hit_test_active {
            debug!("stop_viewer_hit_test ignored");
            return;
        }
        self.hit_test_active = false;
        self.link.toggle_viewer_hit_test();
    }

    /// Fire a controller's haptic actuator. Intensity is clamped to
    /// [0, 1] before it crosses the boundary.
    pub fn haptic_pulse(&mut self, hand: Hand, intensity: f32, duration_ms: f32) {
        self.link
            .haptic_pulse(hand, intensity.clamp(0.0, 1.0), duration_ms);
    }

    // ---- per-tick update pass ----

    /// Poll the shared buffers once and fan out whatever changed.
    ///
    /// Order within a tick: pending mode change, end-of-session flush,
    /// pending visibility change, then (only while presenting) headset,
    /// hands, controllers, hit-test. Hands decode before controllers so
    /// hand tracking can suppress the gamepad view of the same hand.
    pub fn on_update(&mut self) {
        if self.mode_dirty {
            self.mode_dirty = false;
            self.observers.notify(|o| {
                o.on_xr_change(self.mode, self.views_count, self.left_rect, self.right_rect)
            });
        }
        if self.flush_disabled_pending {
            self.flush_disabled_pending = false;
            self.flush_input_sources();
        }
        if self.visibility_dirty {
            self.visibility_dirty = false;
            self.observers
                .notify(|o| o.on_visibility_change(self.visibility));
        }
        if self.mode == XrMode::Normal {
            return;
        }

        self.update_headset();
        self.update_hands();
        self.update_controllers();
        if self.mode == XrMode::Ar {
            self.update_hit_test();
        }
    }

    fn set_xr_state(&mut self, mode: XrMode, views_count: u32, left: ViewRect, right: ViewRect) {
        self.visibility = VisibilityState::Visible;
        self.mode = mode;
        self.views_count = views_count;
        self.left_rect = left;
        self.right_rect = right;
        self.hit_test_active = false;
        self.mode_dirty = true;
        if mode.is_immersive() {
            self.visibility_dirty = true;
        }
    }

    fn update_headset(&mut self) {
        let frame = self.buffers.headset_frame();
        // Frame 0 means the producer has not written yet.
        if frame == 0 || frame == self.headset.frame {
            return;
        }
        match decode::decode_headset(frame, self.buffers.headset()) {
            Ok(headset) => {
                self.headset = headset;
                self.observers.notify(|o| o.on_headset_update(&self.headset));
            }
            Err(err) => warn!("headset decode failed: {err}"),
        }
    }

    fn update_hands(&mut self) {
        for slot in 0..HAND_SLOTS {
            let was_enabled = self.hands[slot].enabled;
            let changed =
                match decode::decode_hand(self.buffers.hands(), slot, &mut self.hands[slot]) {
                    Ok(changed) => changed,
                    Err(err) => {
                        warn!(slot, "hand decode failed: {err}");
                        continue;
                    }
                };
            // Notify enabled updates and the disable transition, but not
            // a stream of already-disabled records.
            if !changed || (!self.hands[slot].enabled && !was_enabled) {
                continue;
            }
            self.hand_input[slot].apply_hand(&self.hands[slot]);
            self.observers.notify(|o| o.on_hand_update(&self.hands[slot]));
        }
    }

    fn update_controllers(&mut self) {
        for slot in 0..CONTROLLER_SLOTS {
            let was_enabled = self.controllers[slot].enabled;
            let changed = match decode::decode_controller(
                self.buffers.controllers(),
                slot,
                &mut self.controllers[slot],
            ) {
                Ok(changed) => changed,
                Err(err) => {
                    warn!(slot, "controller decode failed: {err}");
                    continue;
                }
            };
            if !changed {
                continue;
            }
            let controller = &self.controllers[slot];
            // Hand tracking owns this hand; the gamepad view of it stays
            // silent so no controller model shows up alongside the hand.
            if controller.enabled && self.hand_tracked(controller.hand) {
                continue;
            }
            if !controller.enabled && !was_enabled {
                continue;
            }
            self.controller_input[slot].apply_controller(controller);
            self.observers.notify(|o| o.on_controller_update(controller));
        }
    }

    fn update_hit_test(&mut self) {
        match decode::decode_hit_test(self.buffers.hit_test(), &mut self.hit_test) {
            Ok(true) => self
                .observers
                .notify(|o| o.on_viewer_hit_test_update(&self.hit_test)),
            Ok(false) => {}
            Err(err) => warn!("hit-test decode failed: {err}"),
        }
    }

    fn hand_tracked(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left => self.hands[0].enabled,
            Hand::Right => self.hands[1].enabled,
            Hand::None => false,
        }
    }

    /// Emit the final disabled notification for every input source that
    /// was still live when the session ended.
    fn flush_input_sources(&mut self) {
        for slot in 0..HAND_SLOTS {
            if !self.hands[slot].enabled {
                continue;
            }
            let frame = self.hands[slot].frame;
            self.hands[slot].reset_to_disabled(frame);
            self.hand_input[slot].apply_hand(&self.hands[slot]);
            self.observers.notify(|o| o.on_hand_update(&self.hands[slot]));
        }
        for slot in 0..CONTROLLER_SLOTS {
            if !self.controllers[slot].enabled {
                continue;
            }
            let frame = self.controllers[slot].frame;
            self.controllers[slot].reset_to_disabled(frame);
            self.controller_input[slot].apply_controller(&self.controllers[slot]);
            self.observers
                .notify(|o| o.on_controller_update(&self.controllers[slot]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::NullLink;
    use std::sync::{Arc, Mutex};
    use xrbridge_core::{ControllerSample, HandSample};

    #[derive(Default)]
    struct CountingLink {
        ar: usize,
        vr: usize,
        hit_test: usize,
        pulses: Vec<(Hand, f32, f32)>,
    }

    #[derive(Clone, Default)]
    struct SharedLink(Arc<Mutex<CountingLink>>);

    impl BrowserLink for SharedLink {
        fn toggle_ar(&mut self) {
            self.0.lock().unwrap().ar += 1;
        }
        fn toggle_vr(&mut self) {
            self.0.lock().unwrap().vr += 1;
        }
        fn toggle_viewer_hit_test(&mut self) {
            self.0.lock().unwrap().hit_test += 1;
        }
        fn haptic_pulse(&mut self, hand: Hand, intensity: f32, duration_ms: f32) {
            self.0
                .lock()
                .unwrap()
                .pulses
                .push((hand, intensity, duration_ms));
        }
    }

    fn session_with_link() -> (XrSession, SharedLink) {
        let link = SharedLink::default();
        let session = XrSession::new(SessionConfig::default(), Box::new(link.clone()));
        (session, link)
    }

    #[test]
    fn toggles_gated_on_capabilities() {
        let (mut session, link) = session_with_link();
        session.toggle_ar();
        session.toggle_vr();
        assert_eq!(link.0.lock().unwrap().ar, 0);
        assert_eq!(link.0.lock().unwrap().vr, 0);

        session.set_capabilities(XrCapabilities {
            can_present_vr: true,
            ..Default::default()
        });
        session.toggle_ar();
        session.toggle_vr();
        assert_eq!(link.0.lock().unwrap().ar, 0);
        assert_eq!(link.0.lock().unwrap().vr, 1);
    }

    #[test]
    fn hit_test_latch() {
        let (mut session, link) = session_with_link();
        // Not in AR: ignored.
        session.start_viewer_hit_test();
        assert_eq!(link.0.lock().unwrap().hit_test, 0);

        session.start_ar(1, ViewRect::full(), ViewRect::default());
        session.on_update();
        session.start_viewer_hit_test();
        session.start_viewer_hit_test();
        assert_eq!(link.0.lock().unwrap().hit_test, 1);
        session.stop_viewer_hit_test();
        session.stop_viewer_hit_test();
        assert_eq!(link.0.lock().unwrap().hit_test, 2);
    }

    #[test]
    fn haptic_intensity_clamped() {
        let (mut session, link) = session_with_link();
        session.haptic_pulse(Hand::Left, 3.0, 50.0);
        session.haptic_pulse(Hand::Right, -1.0, 10.0);
        let pulses = link.0.lock().unwrap().pulses.clone();
        assert_eq!(pulses, vec![(Hand::Left, 1.0, 50.0), (Hand::Right, 0.0, 10.0)]);
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl XrObserver for EventLog {
        fn on_xr_change(&self, mode: XrMode, _views: u32, _l: ViewRect, _r: ViewRect) {
            self.0.lock().unwrap().push(format!("mode:{mode:?}"));
        }
        fn on_controller_update(&self, c: &ControllerState) {
            self.0
                .lock()
                .unwrap()
                .push(format!("controller:{:?}:{}", c.hand, c.enabled));
        }
        fn on_hand_update(&self, h: &HandFrame) {
            self.0
                .lock()
                .unwrap()
                .push(format!("hand:{:?}:{}", h.hand, h.enabled));
        }
        fn on_visibility_change(&self, v: VisibilityState) {
            self.0.lock().unwrap().push(format!("visibility:{v:?}"));
        }
    }

    fn logged_session() -> (XrSession, Arc<EventLog>) {
        let mut session = XrSession::new(SessionConfig::default(), Box::new(NullLink));
        let log = Arc::new(EventLog::default());
        session.register_observer(log.clone());
        (session, log)
    }

    fn drain(log: &EventLog) -> Vec<String> {
        std::mem::take(&mut *log.0.lock().unwrap())
    }

    #[test]
    fn visibility_reset_and_dedup() {
        let (mut session, log) = logged_session();
        session.start_vr(2, ViewRect::full(), ViewRect::full());
        session.on_update();
        assert_eq!(
            drain(&log),
            vec!["mode:Vr", "visibility:Visible"],
            "entering VR reports visibility once"
        );

        session.set_visibility(VisibilityState::Visible);
        session.on_update();
        assert!(drain(&log).is_empty(), "duplicate visibility is dropped");

        session.set_visibility(VisibilityState::Hidden);
        session.set_visibility(VisibilityState::Hidden);
        session.on_update();
        assert_eq!(drain(&log), vec!["visibility:Hidden"]);
    }

    #[test]
    fn end_xr_flushes_live_sources_once() {
        let (mut session, log) = logged_session();
        session.start_vr(2, ViewRect::full(), ViewRect::full());
        session
            .buffers_mut()
            .write_controller(
                0,
                1,
                &ControllerSample {
                    hand: Hand::Left,
                    trigger: 1.0,
                    ..Default::default()
                },
            )
            .unwrap();
        session
            .buffers_mut()
            .write_hand(
                1,
                1,
                &HandSample {
                    hand: Hand::Right,
                    ..Default::default()
                },
            )
            .unwrap();
        session.on_update();
        assert_eq!(
            drain(&log),
            vec![
                "mode:Vr",
                "visibility:Visible",
                "hand:Right:true",
                "controller:Left:true"
            ]
        );
        assert!(session.controller_input(0).unwrap().pressed(crate::Action::Trigger));

        session.end_xr();
        session.on_update();
        assert_eq!(
            drain(&log),
            vec!["mode:Normal", "hand:Right:false", "controller:Left:false"]
        );
        // The trigger released with a final edge during the flush.
        assert!(session.controller_input(0).unwrap().button_up(crate::Action::Trigger));

        // No producer frames, no repeats.
        session.on_update();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn hand_suppresses_controller_for_same_hand() {
        let (mut session, log) = logged_session();
        session.start_vr(2, ViewRect::full(), ViewRect::full());
        session.on_update();
        drain(&log);

        session
            .buffers_mut()
            .write_hand(
                0,
                1,
                &HandSample {
                    hand: Hand::Left,
                    ..Default::default()
                },
            )
            .unwrap();
        session
            .buffers_mut()
            .write_controller(
                0,
                1,
                &ControllerSample {
                    hand: Hand::Left,
                    ..Default::default()
                },
            )
            .unwrap();
        session
            .buffers_mut()
            .write_controller(
                1,
                1,
                &ControllerSample {
                    hand: Hand::Right,
                    ..Default::default()
                },
            )
            .unwrap();
        session.on_update();
        assert_eq!(
            drain(&log),
            vec!["hand:Left:true", "controller:Right:true"],
            "the left controller stays silent while the left hand is tracked"
        );
    }

    #[test]
    fn input_profiles_attach_to_slots() {
        let (mut session, _log) = logged_session();
        session.set_input_profiles_json(
            r#"{"controller1":["oculus-touch-v3"],"controller2":["generic-button"]}"#,
        );
        assert_eq!(
            session.controller(0).unwrap().profiles,
            vec!["oculus-touch-v3".to_string()]
        );
        assert_eq!(
            session.controller(1).unwrap().profiles,
            vec!["generic-button".to_string()]
        );
        // Garbage is dropped without touching the slots.
        session.set_input_profiles_json("not json");
        assert_eq!(session.controller(0).unwrap().profiles.len(), 1);
    }
}

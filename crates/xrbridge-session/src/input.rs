//! Per-slot input state tables with edge-triggered button detection.
//!
//! Each controller or hand slot owns one [`InputTable`]. Once per tick the
//! session applies the slot's freshly decoded state; the table derives
//! pressed/touched from the raw values and computes the one-tick `down` /
//! `up` edges against the previous tick. Reads between updates are pure
//! and stable.

use serde::{Deserialize, Serialize};
use xrbridge_core::{ControllerState, HandFrame};

use crate::ParseError;

/// Logical buttons, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger,
    Squeeze,
    Thumbstick,
    Touchpad,
    ButtonA,
    ButtonB,
}

impl Action {
    const COUNT: usize = 6;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Trigger,
        Action::Squeeze,
        Action::Thumbstick,
        Action::Touchpad,
        Action::ButtonA,
        Action::ButtonB,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Parse a host-configured action name.
    pub fn parse(name: &str) -> Result<Self, ParseError> {
        match name {
            "trigger" => Ok(Action::Trigger),
            "squeeze" => Ok(Action::Squeeze),
            "thumbstick" => Ok(Action::Thumbstick),
            "touchpad" => Ok(Action::Touchpad),
            "button_a" => Ok(Action::ButtonA),
            "button_b" => Ok(Action::ButtonB),
            other => Err(ParseError::UnknownAction(other.to_string())),
        }
    }
}

/// Logical axes, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Trigger,
    Squeeze,
    ThumbstickX,
    ThumbstickY,
    TouchpadX,
    TouchpadY,
}

impl Axis {
    const COUNT: usize = 6;

    const fn index(self) -> usize {
        self as usize
    }

    /// Parse a host-configured axis name.
    pub fn parse(name: &str) -> Result<Self, ParseError> {
        match name {
            "trigger" => Ok(Axis::Trigger),
            "squeeze" => Ok(Axis::Squeeze),
            "thumbstick_x" => Ok(Axis::ThumbstickX),
            "thumbstick_y" => Ok(Axis::ThumbstickY),
            "touchpad_x" => Ok(Axis::TouchpadX),
            "touchpad_y" => Ok(Axis::TouchpadY),
            other => Err(ParseError::UnknownAction(other.to_string())),
        }
    }
}

/// Derived state of one logical button. `down` and `up` hold for exactly
/// one tick after the transition that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
    pub down: bool,
    pub up: bool,
}

/// Input thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InputConfig {
    /// Value at or above which a button counts as pressed. Default 1.0,
    /// matching fully depressed triggers on the web gamepad API.
    pub press_threshold: f32,
    /// Value above which a button counts as touched. Default 0.0.
    pub touch_threshold: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            press_threshold: 1.0,
            touch_threshold: 0.0,
        }
    }
}

/// Button and axis state for one controller or hand slot.
#[derive(Debug, Clone)]
pub struct InputTable {
    config: InputConfig,
    buttons: [ButtonState; Action::COUNT],
    axes: [f32; Axis::COUNT],
}

impl InputTable {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            buttons: [ButtonState::default(); Action::COUNT],
            axes: [0.0; Axis::COUNT],
        }
    }

    /// Full derived state of a button.
    pub fn button(&self, action: Action) -> ButtonState {
        self.buttons[action.index()]
    }

    /// Whether the button is currently held.
    pub fn pressed(&self, action: Action) -> bool {
        self.buttons[action.index()].pressed
    }

    /// Whether the button transitioned to pressed on the last update.
    pub fn button_down(&self, action: Action) -> bool {
        self.buttons[action.index()].down
    }

    /// Whether the button transitioned to released on the last update.
    pub fn button_up(&self, action: Action) -> bool {
        self.buttons[action.index()].up
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis.index()]
    }

    /// Name-based lookup for host-configured bindings. Unknown names read
    /// as a neutral button rather than failing.
    pub fn button_by_name(&self, name: &str) -> ButtonState {
        Action::parse(name)
            .map(|action| self.button(action))
            .unwrap_or_default()
    }

    /// Name-based axis lookup; unknown names read as 0.
    pub fn axis_by_name(&self, name: &str) -> f32 {
        Axis::parse(name).map(|axis| self.axis(axis)).unwrap_or(0.0)
    }

    /// Feed one button sample and derive pressed/touched and the edges
    /// against the previous tick.
    pub fn update_button(&mut self, action: Action, value: f32) {
        let state = &mut self.buttons[action.index()];
        let pressed = value >= self.config.press_threshold;
        state.down = pressed && !state.pressed;
        state.up = !pressed && state.pressed;
        state.pressed = pressed;
        state.touched = pressed || value > self.config.touch_threshold;
        state.value = value;
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        self.axes[axis.index()] = value;
    }

    /// Apply a decoded controller record. A disabled record carries
    /// neutral values, which releases any held buttons with a final `up`
    /// edge.
    pub fn apply_controller(&mut self, controller: &ControllerState) {
        self.update_button(Action::Trigger, controller.trigger);
        self.update_button(Action::Squeeze, controller.squeeze);
        self.update_button(Action::Thumbstick, controller.thumbstick);
        self.update_button(Action::Touchpad, controller.touchpad);
        self.update_button(Action::ButtonA, controller.button_a);
        self.update_button(Action::ButtonB, controller.button_b);
        self.set_axis(Axis::Trigger, controller.trigger);
        self.set_axis(Axis::Squeeze, controller.squeeze);
        self.set_axis(Axis::ThumbstickX, controller.thumbstick_x);
        self.set_axis(Axis::ThumbstickY, controller.thumbstick_y);
        self.set_axis(Axis::TouchpadX, controller.touchpad_x);
        self.set_axis(Axis::TouchpadY, controller.touchpad_y);
    }

    /// Apply a decoded hand record. Hands drive only the pinch (trigger)
    /// and grasp (squeeze) pseudo-buttons; everything else stays neutral.
    pub fn apply_hand(&mut self, hand: &HandFrame) {
        self.update_button(Action::Trigger, hand.trigger);
        self.update_button(Action::Squeeze, hand.squeeze);
        self.set_axis(Axis::Trigger, hand.trigger);
        self.set_axis(Axis::Squeeze, hand.squeeze);
    }
}

use std::collections::HashMap;
use std::time::Duration;

use crate::geometry::ButtonRole;
use crate::layout::PressSettings;

/// Short-lived "press" feedback for the card buttons.
///
/// Pressing a button that is still pressed cancels the pending restore and
/// starts a new one; the button is never shrunk twice. Time is a monotonic
/// offset supplied by the host.
#[derive(Debug, Clone)]
pub struct PressAnimator {
    settings: PressSettings,
    active: HashMap<ButtonRole, Duration>,
}

impl PressAnimator {
    pub fn new(settings: PressSettings) -> Self {
        Self {
            settings,
            active: HashMap::new(),
        }
    }

    /// Starts (or restarts) the press on `role`. Returns the scale factor to
    /// apply relative to the button's resting scale.
    pub fn press(&mut self, role: ButtonRole, now: Duration) -> f32 {
        self.active.insert(role, now + self.settings.duration);
        self.settings.scale
    }

    /// Cancels a pending press without waiting for it to expire.
    pub fn cancel(&mut self, role: ButtonRole) -> bool {
        self.active.remove(&role).is_some()
    }

    pub fn is_pressed(&self, role: ButtonRole) -> bool {
        self.active.contains_key(&role)
    }

    /// Ends every press whose deadline has passed and returns those buttons
    /// in registration order.
    pub fn advance(&mut self, now: Duration) -> Vec<ButtonRole> {
        let mut expired: Vec<ButtonRole> = self
            .active
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(role, _)| *role)
            .collect();
        expired.sort();
        for role in &expired {
            self.active.remove(role);
        }
        expired
    }

    /// Deadline of the earliest pending restore, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.active.values().copied().min()
    }
}

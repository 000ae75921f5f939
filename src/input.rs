use std::str::FromStr;

use anyhow::{anyhow, Error, Result};
use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEventKind {
    Move,
    Click,
}

/// Pointer activity in viewport pixel space, as delivered by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Vec2,
}

impl PointerEvent {
    pub fn click(x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Click,
            position: Vec2::new(x, y),
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Move,
            position: Vec2::new(x, y),
        }
    }
}

impl FromStr for PointerEvent {
    type Err = Error;

    /// Parses `click:X,Y` or `move:X,Y`.
    fn from_str(text: &str) -> Result<Self> {
        let (kind, coords) = text
            .split_once(':')
            .ok_or_else(|| anyhow!("pointer event {text:?} must look like click:X,Y"))?;
        let kind = match kind.trim() {
            "click" => PointerEventKind::Click,
            "move" => PointerEventKind::Move,
            other => return Err(anyhow!("unknown pointer event kind {other:?}")),
        };
        let (x, y) = coords
            .split_once(',')
            .ok_or_else(|| anyhow!("pointer position {coords:?} must be X,Y"))?;
        let x = x
            .trim()
            .parse::<f32>()
            .map_err(|err| anyhow!("invalid x coordinate {x:?}: {err}"))?;
        let y = y
            .trim()
            .parse::<f32>()
            .map_err(|err| anyhow!("invalid y coordinate {y:?}: {err}"))?;
        Ok(Self {
            kind,
            position: Vec2::new(x, y),
        })
    }
}

/// Last pointer position reported by the host. Lets the card re-resolve
/// hover after it changes underneath a pointer that has not moved.
#[derive(Debug, Default)]
pub struct InputState {
    pointer: RwLock<Option<Vec2>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the event's position and hands the event back for dispatch.
    pub fn apply(&self, event: PointerEvent) -> PointerEvent {
        *self.pointer.write() = Some(event.position);
        event
    }

    pub fn pointer(&self) -> Option<Vec2> {
        *self.pointer.read()
    }

    /// The pointer left the viewport.
    pub fn clear(&self) {
        *self.pointer.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_click_and_move() {
        assert_eq!(
            "click:640,360".parse::<PointerEvent>().unwrap(),
            PointerEvent::click(640.0, 360.0)
        );
        assert_eq!(
            "move: 1.5 , 2".parse::<PointerEvent>().unwrap(),
            PointerEvent::moved(1.5, 2.0)
        );
    }

    #[test]
    fn rejects_malformed_events() {
        assert!("tap:1,2".parse::<PointerEvent>().is_err());
        assert!("click:1".parse::<PointerEvent>().is_err());
        assert!("click".parse::<PointerEvent>().is_err());
        assert!("click:a,2".parse::<PointerEvent>().is_err());
    }

    #[test]
    fn input_state_tracks_pointer() {
        let state = InputState::new();
        assert_eq!(state.pointer(), None);
        let event = state.apply(PointerEvent::moved(10.0, 20.0));
        assert_eq!(event, PointerEvent::moved(10.0, 20.0));
        assert_eq!(state.pointer(), Some(Vec2::new(10.0, 20.0)));
        state.apply(PointerEvent::click(3.0, 4.0));
        assert_eq!(state.pointer(), Some(Vec2::new(3.0, 4.0)));
        state.clear();
        assert_eq!(state.pointer(), None);
    }
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3};
use parking_lot::RwLock;

use crate::geometry::{ButtonRole, CardGeometry, Mesh, PanelSection};
use crate::text::{TextField, TextVisual};

/// What a visual in the card group represents.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    Panel(PanelSection),
    Button(ButtonRole),
    Text(TextField, TextVisual),
}

/// One renderable element attached to the card group.
#[derive(Debug, Clone)]
pub struct Visual {
    pub name: String,
    pub kind: VisualKind,
    pub position: Vec3,
    pub scale: Vec3,
    pub color: Vec3,
    pub mesh: Option<Arc<Mesh>>,
}

impl Visual {
    pub fn is_text(&self) -> bool {
        matches!(self.kind, VisualKind::Text(..))
    }
}

#[derive(Debug)]
struct GroupInner {
    transform: Mat4,
    visuals: Vec<Visual>,
}

impl Default for GroupInner {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            visuals: Vec::new(),
        }
    }
}

/// Scene-graph node the card attaches its visuals to. Clones share state,
/// so the rendering host can hold one handle while the card mutates another.
#[derive(Debug, Default)]
pub struct VisualGroup {
    inner: Arc<RwLock<GroupInner>>,
}

impl Clone for VisualGroup {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl VisualGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a group placed at `position` in world space.
    pub fn at(position: Vec3) -> Self {
        let group = Self::new();
        group.set_transform(Mat4::from_translation(position));
        group
    }

    pub fn transform(&self) -> Mat4 {
        self.inner.read().transform
    }

    pub fn set_transform(&self, transform: Mat4) {
        self.inner.write().transform = transform;
    }

    /// Attaches a visual. Names must be unique within the group.
    pub fn add(&self, visual: Visual) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.visuals.iter().any(|existing| existing.name == visual.name) {
            return Err(anyhow!("visual {} is already attached", visual.name));
        }
        inner.visuals.push(visual);
        Ok(())
    }

    /// Detaches and returns the named visual.
    pub fn remove(&self, name: &str) -> Option<Visual> {
        let mut inner = self.inner.write();
        let index = inner.visuals.iter().position(|visual| visual.name == name)?;
        Some(inner.visuals.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<Visual> {
        self.inner
            .read()
            .visuals
            .iter()
            .find(|visual| visual.name == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .visuals
            .iter()
            .any(|visual| visual.name == name)
    }

    /// Returns a snapshot of all attached visuals.
    pub fn all_visuals(&self) -> Vec<Visual> {
        self.inner.read().visuals.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().visuals.is_empty()
    }

    pub fn text_count(&self) -> usize {
        self.inner
            .read()
            .visuals
            .iter()
            .filter(|visual| visual.is_text())
            .count()
    }

    /// Applies a mutation to the named visual.
    pub fn update<F, R>(&self, name: &str, mut updater: F) -> Option<R>
    where
        F: FnMut(&mut Visual) -> R,
    {
        let mut inner = self.inner.write();
        let visual = inner.visuals.iter_mut().find(|visual| visual.name == name)?;
        Some(updater(visual))
    }

    pub fn set_color(&self, name: &str, color: Vec3) -> bool {
        self.update(name, |visual| visual.color = color).is_some()
    }

    pub fn set_scale(&self, name: &str, scale: Vec3) -> bool {
        self.update(name, |visual| visual.scale = scale).is_some()
    }

    /// Attaches the static panels and buttons of `geometry`.
    pub fn attach_geometry(&self, geometry: &CardGeometry) -> Result<()> {
        for panel in &geometry.panels {
            self.add(Visual {
                name: panel.section.visual_name().to_string(),
                kind: VisualKind::Panel(panel.section),
                position: panel.position,
                scale: Vec3::ONE,
                color: panel.color,
                mesh: Some(Arc::clone(&panel.mesh)),
            })?;
        }
        for button in &geometry.buttons {
            self.add(Visual {
                name: button.role.visual_name().to_string(),
                kind: VisualKind::Button(button.role),
                position: button.position,
                scale: Vec3::ONE,
                color: button.original_color,
                mesh: Some(Arc::clone(&button.mesh)),
            })?;
        }
        Ok(())
    }
}

//! Text measurement and placement for the card's labels.
//!
//! Glyph outlines are produced by the host's text-mesh generator; this module
//! only needs advance widths and vertical extents to centre each label the
//! way the generator will lay it out.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::{debug, warn};
use serde::Deserialize;

use crate::geometry::ButtonRole;
use crate::layout::TextStyle;
use crate::scene::{Visual, VisualGroup, VisualKind};

/// Axis-aligned 2D bounds of laid-out text, relative to the text origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Source of glyph metrics for a loaded font.
pub trait GlyphMetrics {
    fn measure(&self, text: &str, size: f32) -> TextBounds;
}

/// Fixed-advance metrics, used when no typeface file is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            ascent: 0.75,
            descent: 0.25,
            line_height: 1.2,
        }
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn measure(&self, text: &str, size: f32) -> TextBounds {
        let lines: Vec<&str> = text.split('\n').collect();
        let longest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        if longest == 0 {
            return TextBounds::default();
        }
        let extra_lines = (lines.len() - 1) as f32;
        TextBounds {
            min: Vec2::new(0.0, -self.descent * size - extra_lines * self.line_height * size),
            max: Vec2::new(longest as f32 * self.advance * size, self.ascent * size),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TypefaceGlyph {
    ha: f32,
    #[serde(default)]
    x_min: f32,
    #[serde(default)]
    x_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceBoundingBox {
    y_min: f32,
    y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceFile {
    glyphs: HashMap<String, TypefaceGlyph>,
    resolution: f32,
    bounding_box: TypefaceBoundingBox,
    #[serde(default)]
    underline_thickness: f32,
    #[serde(default)]
    family_name: Option<String>,
}

/// Metrics read from a typeface JSON font (the format consumed by
/// browser text-geometry generators).
#[derive(Debug, Clone)]
pub struct TypefaceFont {
    family: String,
    glyphs: HashMap<char, TypefaceGlyph>,
    resolution: f32,
    y_min: f32,
    y_max: f32,
    underline_thickness: f32,
}

impl TypefaceFont {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TypefaceFile =
            serde_json::from_str(json).context("invalid typeface JSON")?;
        if !(file.resolution > 0.0) {
            return Err(anyhow!("typeface resolution must be positive"));
        }
        let glyphs = file
            .glyphs
            .into_iter()
            .filter_map(|(key, glyph)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some((ch, glyph)),
                    _ => None,
                }
            })
            .collect();
        Ok(Self {
            family: file.family_name.unwrap_or_else(|| "unknown".to_string()),
            glyphs,
            resolution: file.resolution,
            y_min: file.bounding_box.y_min,
            y_max: file.bounding_box.y_max,
            underline_thickness: file.underline_thickness,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("unable to read font {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("unable to parse font {}", path.display()))
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    fn glyph(&self, ch: char) -> Option<&TypefaceGlyph> {
        self.glyphs.get(&ch).or_else(|| {
            debug!("font {} has no glyph for {ch:?}", self.family);
            self.glyphs.get(&'?')
        })
    }
}

impl GlyphMetrics for TypefaceFont {
    fn measure(&self, text: &str, size: f32) -> TextBounds {
        let scale = size / self.resolution;
        let line_height = (self.y_max - self.y_min + self.underline_thickness) * scale;
        let mut bounds: Option<TextBounds> = None;
        for (line_index, line) in text.split('\n').enumerate() {
            let offset_y = -(line_index as f32) * line_height;
            let mut offset_x = 0.0;
            for ch in line.chars() {
                let Some(glyph) = self.glyph(ch) else {
                    continue;
                };
                let glyph_bounds = TextBounds {
                    min: Vec2::new(offset_x + glyph.x_min * scale, offset_y + self.y_min * scale),
                    max: Vec2::new(offset_x + glyph.x_max * scale, offset_y + self.y_max * scale),
                };
                bounds = Some(match bounds {
                    Some(current) => TextBounds {
                        min: current.min.min(glyph_bounds.min),
                        max: current.max.max(glyph_bounds.max),
                    },
                    None => glyph_bounds,
                });
                offset_x += glyph.ha * scale;
            }
        }
        bounds.unwrap_or_default()
    }
}

/// Display field owning one text visual at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Header,
    Body,
    Footer,
    AffirmativeLabel,
    NegativeLabel,
}

impl TextField {
    pub const ALL: [TextField; 5] = [
        TextField::Header,
        TextField::Body,
        TextField::Footer,
        TextField::AffirmativeLabel,
        TextField::NegativeLabel,
    ];

    pub fn for_button(role: ButtonRole) -> Self {
        match role {
            ButtonRole::Affirmative => Self::AffirmativeLabel,
            ButtonRole::Negative => Self::NegativeLabel,
        }
    }

    pub fn visual_name(self) -> &'static str {
        match self {
            Self::Header => "text.header",
            Self::Body => "text.body",
            Self::Footer => "text.footer",
            Self::AffirmativeLabel => "text.button.affirmative",
            Self::NegativeLabel => "text.button.negative",
        }
    }
}

/// A positioned piece of text ready for the host's text-mesh generator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextVisual {
    pub text: String,
    pub style: TextStyle,
    /// Origin of the generated text mesh in card-local space.
    pub position: Vec3,
    pub bounds: TextBounds,
}

/// Centres text on anchors using the attached font's metrics.
#[derive(Clone)]
pub struct TextLayoutEngine {
    metrics: Arc<dyn GlyphMetrics>,
}

impl TextLayoutEngine {
    pub fn new(metrics: Arc<dyn GlyphMetrics>) -> Self {
        Self { metrics }
    }

    /// Horizontally centred on `anchor.x`, baseline at `anchor.y`.
    pub fn layout(&self, text: &str, style: TextStyle, anchor: Vec3) -> TextVisual {
        let bounds = self.metrics.measure(text, style.size);
        TextVisual {
            text: text.to_string(),
            style,
            position: Vec3::new(anchor.x - bounds.width() / 2.0, anchor.y, anchor.z),
            bounds,
        }
    }

    /// Centred on the button face in both axes and lifted off it by `button_depth`.
    pub fn layout_button_label(
        &self,
        text: &str,
        style: TextStyle,
        button_position: Vec3,
        button_depth: f32,
    ) -> TextVisual {
        let bounds = self.metrics.measure(text, style.size);
        TextVisual {
            text: text.to_string(),
            style,
            position: Vec3::new(
                button_position.x - bounds.width() / 2.0,
                button_position.y - bounds.height() / 2.0,
                button_position.z + button_depth,
            ),
            bounds,
        }
    }
}

/// Tracks which text fields currently own a visual in the group. Installing
/// into an occupied slot releases the previous visual first.
#[derive(Debug, Default)]
pub struct TextSlots {
    occupied: HashSet<TextField>,
    installed: u64,
    released: u64,
}

impl TextSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, group: &VisualGroup, field: TextField, text: TextVisual) -> Result<()> {
        self.release(group, field);
        group.add(Visual {
            name: field.visual_name().to_string(),
            position: text.position,
            scale: Vec3::ONE,
            color: text.style.color,
            kind: VisualKind::Text(field, text),
            mesh: None,
        })?;
        self.occupied.insert(field);
        self.installed += 1;
        Ok(())
    }

    /// Detaches the field's visual, if any. Returns whether one was released.
    pub fn release(&mut self, group: &VisualGroup, field: TextField) -> bool {
        if !self.occupied.remove(&field) {
            return false;
        }
        if group.remove(field.visual_name()).is_some() {
            self.released += 1;
            true
        } else {
            warn!("text slot {field:?} was occupied but its visual was already detached");
            false
        }
    }

    pub fn clear(&mut self, group: &VisualGroup) {
        for field in TextField::ALL {
            self.release(group, field);
        }
    }

    pub fn live(&self) -> usize {
        self.occupied.len()
    }

    pub fn installed(&self) -> u64 {
        self.installed
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    const FONT_JSON: &str = r#"{
        "glyphs": {
            "A": {"ha": 600, "x_min": 0, "x_max": 600, "o": ""},
            "B": {"ha": 500, "x_min": 50, "x_max": 450, "o": ""},
            "?": {"ha": 400, "x_min": 0, "x_max": 400, "o": ""},
            " ": {"ha": 300, "x_min": 0, "x_max": 0, "o": ""}
        },
        "familyName": "Test Sans",
        "resolution": 1000,
        "underlineThickness": 50,
        "boundingBox": {"yMin": -200, "xMin": 0, "yMax": 800, "xMax": 600}
    }"#;

    static FONT: Lazy<TypefaceFont> = Lazy::new(|| TypefaceFont::from_json(FONT_JSON).unwrap());

    fn style(size: f32) -> TextStyle {
        TextStyle {
            size,
            depth: 0.05,
            color: Vec3::ZERO,
        }
    }

    #[test]
    fn typeface_measures_advances() {
        assert_eq!(FONT.family(), "Test Sans");
        let bounds = FONT.measure("AB", 1.0);
        assert!((bounds.min.x - 0.0).abs() < 1e-6);
        assert!((bounds.max.x - 1.05).abs() < 1e-6);
        assert!((bounds.min.y + 0.2).abs() < 1e-6);
        assert!((bounds.max.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn typeface_falls_back_to_question_mark() {
        let known = FONT.measure("?", 2.0);
        let unknown = FONT.measure("Z", 2.0);
        assert_eq!(known, unknown);
        assert!((unknown.width() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn typeface_stacks_lines_downward() {
        let single = FONT.measure("A", 1.0);
        let double = FONT.measure("A\nA", 1.0);
        assert!((double.height() - single.height() - 1.05).abs() < 1e-5);
    }

    #[test]
    fn rejects_font_without_resolution() {
        let json = r#"{"glyphs": {}, "resolution": 0, "boundingBox": {"yMin": 0, "yMax": 1}}"#;
        assert!(TypefaceFont::from_json(json).is_err());
    }

    #[test]
    fn monospace_measures_longest_line() {
        let metrics = MonospaceMetrics::default();
        let bounds = metrics.measure("abc\nabcde", 1.0);
        assert!((bounds.width() - 3.0).abs() < 1e-6);
        assert_eq!(metrics.measure("", 1.0), TextBounds::default());
    }

    #[test]
    fn layout_centres_horizontally_on_anchor() {
        let engine = TextLayoutEngine::new(Arc::new(MonospaceMetrics::default()));
        let visual = engine.layout("abcd", style(0.5), Vec3::new(1.0, 2.0, 0.1));
        assert!((visual.position.x - (1.0 - 0.6)).abs() < 1e-6);
        assert_eq!(visual.position.y, 2.0);
        assert_eq!(visual.position.z, 0.1);
    }

    #[test]
    fn button_labels_centre_vertically_and_sit_above_face() {
        let engine = TextLayoutEngine::new(Arc::new(MonospaceMetrics::default()));
        let visual = engine.layout_button_label("Yes", style(0.2), Vec3::new(-1.85, -4.5, 0.05), 0.1);
        assert!((visual.position.x - (-1.85 - 0.18)).abs() < 1e-6);
        assert!((visual.position.y - (-4.5 - 0.1)).abs() < 1e-6);
        assert!((visual.position.z - 0.15).abs() < 1e-6);
    }

    #[test]
    fn slots_release_before_install() {
        let engine = TextLayoutEngine::new(Arc::new(MonospaceMetrics::default()));
        let group = VisualGroup::new();
        let mut slots = TextSlots::new();
        for round in 0..10 {
            let text = format!("Question {round}");
            slots
                .install(&group, TextField::Header, engine.layout(&text, style(0.4), Vec3::ZERO))
                .unwrap();
            assert_eq!(group.text_count(), 1);
        }
        assert_eq!(slots.installed(), 10);
        assert_eq!(slots.released(), 9);
        slots.clear(&group);
        assert_eq!(group.text_count(), 0);
        assert_eq!(slots.live(), 0);
        assert!(!slots.release(&group, TextField::Header));
    }
}

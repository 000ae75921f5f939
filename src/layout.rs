use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;

/// Physical size of the card and its buttons, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub header_height: f32,
    pub footer_height: f32,
    pub button_height: f32,
    pub button_width: f32,
    pub button_depth: f32,
    pub button_spacing: f32,
}

impl Default for CardDimensions {
    fn default() -> Self {
        Self {
            width: 7.0,
            height: 10.0,
            depth: 0.1,
            header_height: 1.2,
            footer_height: 1.0,
            button_height: 0.6,
            button_width: 1.6,
            button_depth: 0.1,
            button_spacing: 0.5,
        }
    }
}

impl CardDimensions {
    pub fn body_height(&self) -> f32 {
        self.height - self.header_height - self.footer_height
    }
}

/// Linear RGB colours in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardColors {
    pub header: Vec3,
    pub body: Vec3,
    pub footer: Vec3,
    pub affirmative_button: Vec3,
    pub negative_button: Vec3,
    pub text: Vec3,
    pub text_light: Vec3,
}

impl Default for CardColors {
    fn default() -> Self {
        Self {
            header: hex_color(0x4CAF50),
            body: hex_color(0xFFFFFF),
            footer: hex_color(0x2196F3),
            affirmative_button: hex_color(0xFF5722),
            negative_button: hex_color(0xFFC107),
            text: hex_color(0x000000),
            text_light: hex_color(0xFFFFFF),
        }
    }
}

/// Converts a packed `0xRRGGBB` value into a colour vector.
pub fn hex_color(rgb: u32) -> Vec3 {
    let r = (rgb >> 16) & 0xFF;
    let g = (rgb >> 8) & 0xFF;
    let b = rgb & 0xFF;
    Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// Size, extrusion depth and colour of one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f32,
    pub depth: f32,
    pub color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyles {
    pub header: TextStyle,
    pub body: TextStyle,
    pub footer: TextStyle,
    pub button: TextStyle,
}

impl TextStyles {
    pub fn from_colors(colors: &CardColors) -> Self {
        Self {
            header: TextStyle {
                size: 0.4,
                depth: 0.05,
                color: colors.text_light,
            },
            body: TextStyle {
                size: 0.3,
                depth: 0.05,
                color: colors.text,
            },
            footer: TextStyle {
                size: 0.3,
                depth: 0.05,
                color: colors.text,
            },
            button: TextStyle {
                size: 0.2,
                depth: 0.05,
                color: colors.text,
            },
        }
    }
}

/// Click feedback: the button shrinks to `scale` for `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressSettings {
    pub scale: f32,
    pub duration: Duration,
}

impl Default for PressSettings {
    fn default() -> Self {
        Self {
            scale: 0.9,
            duration: Duration::from_millis(100),
        }
    }
}

/// Complete card configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLayout {
    /// Card origin in world space, as placed by the AR anchor.
    pub position: Vec3,
    pub dimensions: CardDimensions,
    pub colors: CardColors,
    pub text: TextStyles,
    pub camera: CameraSettings,
    pub press: PressSettings,
    /// Per-channel brightness multiplier applied to hovered buttons.
    pub hover_factor: f32,
    /// Optional typeface JSON used to measure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

impl Default for CardLayout {
    fn default() -> Self {
        let colors = CardColors::default();
        Self {
            position: Vec3::ZERO,
            dimensions: CardDimensions::default(),
            text: TextStyles::from_colors(&colors),
            colors,
            camera: CameraSettings::default(),
            press: PressSettings::default(),
            hover_factor: 1.2,
            font: None,
        }
    }
}

impl CardLayout {
    /// Parses a `<card>` layout document. Every element is optional.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid card layout XML")?;
        let root = document.root_element();
        if !root.has_tag_name("card") {
            return Err(anyhow!(
                "expected <card> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut layout = Self::default();
        layout.position = parse_vec3(optional_text(&root, "position"), layout.position)
            .context("invalid <position>")?;
        layout.font = optional_text(&root, "font");

        if let Some(node) = child(&root, "dimensions") {
            let dims = &mut layout.dimensions;
            dims.width = parse_f32(optional_text(&node, "width"), dims.width)?;
            dims.height = parse_f32(optional_text(&node, "height"), dims.height)?;
            dims.depth = parse_f32(optional_text(&node, "depth"), dims.depth)?;
            dims.header_height =
                parse_f32(optional_text(&node, "headerHeight"), dims.header_height)?;
            dims.footer_height =
                parse_f32(optional_text(&node, "footerHeight"), dims.footer_height)?;
            dims.button_height =
                parse_f32(optional_text(&node, "buttonHeight"), dims.button_height)?;
            dims.button_width = parse_f32(optional_text(&node, "buttonWidth"), dims.button_width)?;
            dims.button_depth = parse_f32(optional_text(&node, "buttonDepth"), dims.button_depth)?;
            dims.button_spacing =
                parse_f32(optional_text(&node, "buttonSpacing"), dims.button_spacing)?;
        }

        if let Some(node) = child(&root, "colors") {
            let colors = &mut layout.colors;
            colors.header = parse_color(optional_text(&node, "header"), colors.header)?;
            colors.body = parse_color(optional_text(&node, "body"), colors.body)?;
            colors.footer = parse_color(optional_text(&node, "footer"), colors.footer)?;
            colors.affirmative_button =
                parse_color(optional_text(&node, "button1"), colors.affirmative_button)?;
            colors.negative_button =
                parse_color(optional_text(&node, "button2"), colors.negative_button)?;
            colors.text = parse_color(optional_text(&node, "text"), colors.text)?;
            colors.text_light = parse_color(optional_text(&node, "textLight"), colors.text_light)?;
            layout.text = TextStyles::from_colors(colors);
        }

        if let Some(node) = child(&root, "camera") {
            let camera = &mut layout.camera;
            camera.position = parse_vec3(optional_text(&node, "position"), camera.position)
                .context("invalid camera <position>")?;
            camera.rotation = parse_vec3(optional_text(&node, "rotation"), camera.rotation)
                .context("invalid camera <rotation>")?;
            camera.fov = parse_f32(optional_text(&node, "fov"), camera.fov)?;
            camera.near = parse_f32(optional_text(&node, "near"), camera.near)?;
            camera.far = parse_f32(optional_text(&node, "far"), camera.far)?;
        }

        if let Some(node) = child(&root, "press") {
            layout.press.scale = parse_f32(optional_text(&node, "scale"), layout.press.scale)?;
            let millis = parse_f32(
                optional_text(&node, "durationMs"),
                layout.press.duration.as_millis() as f32,
            )?;
            if millis < 0.0 {
                return Err(anyhow!("press duration must not be negative"));
            }
            layout.press.duration = Duration::from_millis(millis as u64);
        }

        if let Some(node) = child(&root, "hover") {
            layout.hover_factor = parse_f32(optional_text(&node, "factor"), layout.hover_factor)?;
        }

        layout.validate()?;
        Ok(layout)
    }

    /// Rejects layouts that cannot produce a usable card.
    pub fn validate(&self) -> Result<()> {
        let dims = &self.dimensions;
        let sizes = [
            ("width", dims.width),
            ("height", dims.height),
            ("depth", dims.depth),
            ("headerHeight", dims.header_height),
            ("footerHeight", dims.footer_height),
            ("buttonHeight", dims.button_height),
            ("buttonWidth", dims.button_width),
            ("buttonDepth", dims.button_depth),
        ];
        for (name, value) in sizes {
            if !(value > 0.0) {
                return Err(anyhow!("{name} must be positive (got {value})"));
            }
        }
        if dims.button_spacing < 0.0 {
            return Err(anyhow!("buttonSpacing must not be negative"));
        }
        if dims.body_height() <= 0.0 {
            return Err(anyhow!(
                "header ({}) and footer ({}) leave no room for the body in a card of height {}",
                dims.header_height,
                dims.footer_height,
                dims.height
            ));
        }
        if !(self.press.scale > 0.0 && self.press.scale <= 1.0) {
            return Err(anyhow!("press scale must be in (0, 1]"));
        }
        if !(self.hover_factor > 0.0) {
            return Err(anyhow!("hover factor must be positive"));
        }
        Ok(())
    }

    pub fn header_anchor(&self) -> Vec3 {
        let dims = &self.dimensions;
        Vec3::new(0.0, dims.height / 2.0 - dims.header_height / 2.0, dims.depth)
    }

    pub fn body_anchor(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.dimensions.depth)
    }

    pub fn footer_anchor(&self) -> Vec3 {
        Vec3::new(0.0, -self.dimensions.height / 3.0, self.dimensions.depth)
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "vector needs 3 components, found {}",
            numbers.len()
        )),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let digits = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(&value);
    if digits.len() != 6 {
        return Err(anyhow!("colour {value:?} must have 6 hex digits"));
    }
    let rgb = u32::from_str_radix(digits, 16)
        .map_err(|err| anyhow!("invalid colour {value:?}: {err}"))?;
    Ok(hex_color(rgb))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::layout::CardLayout;

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Axis-aligned box centred on the origin.
    pub fn cuboid(size: Vec3) -> Self {
        let half = size * 0.5;
        // (normal, u axis, v axis) per face; corners wind counter-clockwise
        // when seen from outside.
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = (normal + u * su + v * sv) * half;
                vertices.push(Vertex {
                    position: corner.to_array(),
                    normal: normal.to_array(),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Which of the two response controls a button is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonRole {
    Affirmative,
    Negative,
}

impl ButtonRole {
    /// Registration order; also the tie-break order for hit testing.
    pub const ALL: [ButtonRole; 2] = [ButtonRole::Affirmative, ButtonRole::Negative];

    pub fn visual_name(self) -> &'static str {
        match self {
            Self::Affirmative => "button.affirmative",
            Self::Negative => "button.negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelSection {
    Header,
    Body,
    Footer,
}

impl PanelSection {
    pub fn visual_name(self) -> &'static str {
        match self {
            Self::Header => "panel.header",
            Self::Body => "panel.body",
            Self::Footer => "panel.footer",
        }
    }
}

/// Static, non-interactive card section.
#[derive(Debug, Clone)]
pub struct Panel {
    pub section: PanelSection,
    pub position: Vec3,
    pub size: Vec3,
    pub color: Vec3,
    pub mesh: Arc<Mesh>,
}

/// Clickable shape with its hover colours precomputed.
#[derive(Debug, Clone)]
pub struct VisualButton {
    pub role: ButtonRole,
    pub position: Vec3,
    pub size: Vec3,
    pub original_color: Vec3,
    pub hover_color: Vec3,
    pub mesh: Arc<Mesh>,
}

/// Panels and buttons of one card, in card-local coordinates.
#[derive(Debug, Clone)]
pub struct CardGeometry {
    pub panels: Vec<Panel>,
    pub buttons: Vec<VisualButton>,
}

impl CardGeometry {
    pub fn button(&self, role: ButtonRole) -> Option<&VisualButton> {
        self.buttons.iter().find(|button| button.role == role)
    }
}

/// Scales a colour per channel, clamped to the displayable range.
pub fn brighten(color: Vec3, factor: f32) -> Vec3 {
    (color * factor).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Builds the static card geometry from a layout. Pure.
pub struct CardGeometryBuilder;

impl CardGeometryBuilder {
    pub fn build(layout: &CardLayout) -> CardGeometry {
        let dims = &layout.dimensions;
        let colors = &layout.colors;
        let sections = [
            (
                PanelSection::Header,
                dims.header_height,
                dims.height / 2.0 - dims.header_height / 2.0,
                colors.header,
            ),
            (PanelSection::Body, dims.body_height(), 0.0, colors.body),
            (
                PanelSection::Footer,
                dims.footer_height,
                -dims.height / 2.0 + dims.footer_height / 2.0,
                colors.footer,
            ),
        ];
        let panels = sections
            .into_iter()
            .map(|(section, height, y, color)| {
                let size = Vec3::new(dims.width, height, dims.depth);
                Panel {
                    section,
                    position: Vec3::new(0.0, y, 0.0),
                    size,
                    color,
                    mesh: Arc::new(Mesh::cuboid(size)),
                }
            })
            .collect();

        let button_size = Vec3::new(dims.button_width, dims.button_height, dims.button_depth);
        let button_mesh = Arc::new(Mesh::cuboid(button_size));
        let button_y = -dims.height / 2.0 + dims.footer_height / 2.0;
        let button_z = dims.button_depth / 2.0;
        let buttons = ButtonRole::ALL
            .into_iter()
            .map(|role| {
                let (x, color) = match role {
                    ButtonRole::Affirmative => (
                        -dims.button_width - dims.button_spacing / 2.0,
                        colors.affirmative_button,
                    ),
                    ButtonRole::Negative => (dims.button_spacing / 2.0, colors.negative_button),
                };
                VisualButton {
                    role,
                    position: Vec3::new(x, button_y, button_z),
                    size: button_size,
                    original_color: color,
                    hover_color: brighten(color, layout.hover_factor),
                    mesh: Arc::clone(&button_mesh),
                }
            })
            .collect();

        CardGeometry { panels, buttons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::hex_color;

    #[test]
    fn cuboid_has_outward_normals() {
        let mesh = Mesh::cuboid(Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for triangle in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(mesh.vertices[triangle[i] as usize].position));
            let winding = (b - a).cross(c - a).normalize();
            let normal = Vec3::from(mesh.vertices[triangle[0] as usize].normal);
            assert!(winding.dot(normal) > 0.99);
        }
        let max = mesh
            .vertices
            .iter()
            .map(|v| Vec3::from(v.position))
            .fold(Vec3::splat(f32::MIN), Vec3::max);
        assert_eq!(max, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(mesh.vertex_bytes().len(), 24 * 24);
        assert_eq!(mesh.index_bytes().len(), 36 * 4);
    }

    #[test]
    fn sections_stack_top_to_bottom() {
        let geometry = CardGeometryBuilder::build(&CardLayout::default());
        let ys: Vec<f32> = geometry.panels.iter().map(|p| p.position.y).collect();
        assert!((ys[0] - 4.4).abs() < 1e-5);
        assert_eq!(ys[1], 0.0);
        assert!((ys[2] + 4.5).abs() < 1e-5);
        assert!((geometry.panels[1].size.y - 7.8).abs() < 1e-5);
    }

    #[test]
    fn buttons_sit_on_footer_either_side_of_centre() {
        let geometry = CardGeometryBuilder::build(&CardLayout::default());
        let yes = geometry.button(ButtonRole::Affirmative).unwrap();
        let no = geometry.button(ButtonRole::Negative).unwrap();
        assert!((yes.position.x + 1.85).abs() < 1e-5);
        assert!((no.position.x - 0.25).abs() < 1e-5);
        assert_eq!(yes.position.y, -4.5);
        assert!((yes.position.z - 0.05).abs() < 1e-6);
        assert_eq!(yes.original_color, hex_color(0xFF5722));
    }

    #[test]
    fn hover_colour_is_brighter_and_clamped() {
        let color = hex_color(0xFF5722);
        let hover = brighten(color, 1.2);
        assert_eq!(hover.x, 1.0);
        assert!((hover.y - color.y * 1.2).abs() < 1e-6);
        assert_eq!(brighten(Vec3::ONE, 3.0), Vec3::ONE);
    }
}

use glam::{Mat4, Vec2, Vec3};

use crate::camera::{Camera, CameraSettings};
use crate::geometry::{ButtonRole, VisualButton};
use crate::scene::VisualGroup;

/// Converts a viewport pixel position into normalized device coordinates.
/// Screen y grows downward, NDC y grows upward.
pub fn pointer_to_ndc(pointer: Vec2, (width, height): (u32, u32)) -> Vec2 {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    Vec2::new(
        (pointer.x / width) * 2.0 - 1.0,
        -(pointer.y / height) * 2.0 + 1.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray from the camera's near plane through `ndc`.
    pub fn from_ndc(camera: &Camera, ndc: Vec2) -> Self {
        let near = camera.unproject(ndc, -1.0);
        let far = camera.unproject(ndc, 1.0);
        Self {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Expresses the ray in the space of `transform`'s inverse. Distances
    /// along the result stay comparable between targets in that space.
    pub fn into_local(self, transform: Mat4) -> Self {
        let inverse = transform.inverse();
        Self {
            origin: inverse.transform_point3(self.origin),
            direction: inverse.transform_vector3(self.direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Slab test. Returns the distance to the nearest intersection in front
    /// of the ray origin (zero when the origin is inside).
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inverse = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inverse;
        let t2 = (self.max - ray.origin) * inverse;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_far.is_nan() || t_near.is_nan() || t_far < 0.0 || t_near > t_far {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub role: ButtonRole,
    pub distance: f32,
}

/// Resolves pointer positions to the card's buttons. Panels are never hit.
#[derive(Debug, Clone)]
pub struct HitTester {
    settings: CameraSettings,
    active_camera: Option<Camera>,
}

impl HitTester {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            active_camera: None,
        }
    }

    /// Uses the host's camera instead of the configured one.
    pub fn set_active_camera(&mut self, camera: Option<Camera>) {
        self.active_camera = camera;
    }

    pub fn camera(&self, viewport: (u32, u32)) -> Camera {
        match &self.active_camera {
            Some(camera) => camera.clone(),
            None => self.settings.camera_for_viewport(viewport),
        }
    }

    /// Nearest button under `pointer`. On an exact distance tie the button
    /// registered first (affirmative) wins.
    pub fn pick(
        &self,
        pointer: Vec2,
        viewport: (u32, u32),
        group: &VisualGroup,
        buttons: &[VisualButton],
    ) -> Option<Hit> {
        let camera = self.camera(viewport);
        let ray = Ray::from_ndc(&camera, pointer_to_ndc(pointer, viewport));
        let local_ray = ray.into_local(group.transform());

        let mut nearest: Option<Hit> = None;
        for button in buttons {
            let Some(visual) = group.get(button.role.visual_name()) else {
                continue;
            };
            let bounds = Aabb::from_center_size(visual.position, button.size * visual.scale);
            let Some(distance) = bounds.intersect_ray(&local_ray) else {
                continue;
            };
            if nearest.map_or(true, |hit| distance < hit.distance) {
                nearest = Some(Hit {
                    role: button.role,
                    distance,
                });
            }
        }
        nearest
    }

    /// Restores every button's original colour, then highlights the one under
    /// `pointer`. Returns the hovered button.
    pub fn update_hover(
        &self,
        pointer: Vec2,
        viewport: (u32, u32),
        group: &VisualGroup,
        buttons: &[VisualButton],
    ) -> Option<ButtonRole> {
        let hovered = self
            .pick(pointer, viewport, group, buttons)
            .map(|hit| hit.role);
        for button in buttons {
            group.set_color(button.role.visual_name(), button.original_color);
        }
        if let Some(role) = hovered {
            if let Some(button) = buttons.iter().find(|button| button.role == role) {
                group.set_color(role.visual_name(), button.hover_color);
            }
        }
        hovered
    }
}

/// Pixel position at which `local_point` on the card appears. Used by hosts
/// that want to place overlay UI, and by tests.
pub fn project_to_pixel(
    camera: &Camera,
    card_transform: Mat4,
    local_point: Vec3,
    (width, height): (u32, u32),
) -> Vec2 {
    let ndc = camera.project(card_transform.transform_point3(local_point));
    Vec2::new(
        (ndc.x + 1.0) / 2.0 * width as f32,
        (1.0 - ndc.y) / 2.0 * height as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CardGeometryBuilder;
    use crate::layout::CardLayout;

    const VIEWPORT: (u32, u32) = (1280, 720);

    fn card() -> (VisualGroup, Vec<VisualButton>, HitTester) {
        let layout = CardLayout::default();
        let geometry = CardGeometryBuilder::build(&layout);
        let group = VisualGroup::at(layout.position);
        group.attach_geometry(&geometry).unwrap();
        (group, geometry.buttons, HitTester::new(layout.camera))
    }

    fn pixel_of(tester: &HitTester, group: &VisualGroup, point: Vec3) -> Vec2 {
        project_to_pixel(&tester.camera(VIEWPORT), group.transform(), point, VIEWPORT)
    }

    #[test]
    fn ndc_corners() {
        assert_eq!(pointer_to_ndc(Vec2::ZERO, (200, 100)), Vec2::new(-1.0, 1.0));
        assert_eq!(
            pointer_to_ndc(Vec2::new(200.0, 100.0), (200, 100)),
            Vec2::new(1.0, -1.0)
        );
        assert_eq!(
            pointer_to_ndc(Vec2::new(100.0, 50.0), (200, 100)),
            Vec2::ZERO
        );
    }

    #[test]
    fn slab_test_hits_front_face() {
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::splat(2.0));
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert_eq!(bounds.intersect_ray(&ray), Some(9.0));
        let away = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::Z,
        };
        assert_eq!(bounds.intersect_ray(&away), None);
        let beside = Ray {
            origin: Vec3::new(5.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert_eq!(bounds.intersect_ray(&beside), None);
    }

    #[test]
    fn picks_button_under_pointer() {
        let (group, buttons, tester) = card();
        for button in &buttons {
            let pixel = pixel_of(&tester, &group, button.position);
            let hit = tester.pick(pixel, VIEWPORT, &group, &buttons).unwrap();
            assert_eq!(hit.role, button.role);
        }
    }

    #[test]
    fn panels_are_not_hit_testable() {
        let (group, buttons, tester) = card();
        let header = pixel_of(&tester, &group, Vec3::new(0.0, 4.4, 0.0));
        assert!(tester.pick(header, VIEWPORT, &group, &buttons).is_none());
        assert!(tester
            .pick(Vec2::new(5.0, 5.0), VIEWPORT, &group, &buttons)
            .is_none());
    }

    #[test]
    fn card_transform_moves_hit_area() {
        let (group, buttons, tester) = card();
        let button = &buttons[0];
        let before = pixel_of(&tester, &group, button.position);
        group.set_transform(Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));
        assert!(tester.pick(before, VIEWPORT, &group, &buttons).is_none());
        let after = pixel_of(&tester, &group, button.position);
        assert_eq!(
            tester.pick(after, VIEWPORT, &group, &buttons).unwrap().role,
            button.role
        );
    }

    #[test]
    fn overlapping_buttons_resolve_to_first_registered() {
        let (group, mut buttons, tester) = card();
        let shared = buttons[0].position;
        buttons[1].position = shared;
        group.update(ButtonRole::Negative.visual_name(), |visual| {
            visual.position = shared
        });
        let pixel = pixel_of(&tester, &group, shared);
        let hit = tester.pick(pixel, VIEWPORT, &group, &buttons).unwrap();
        assert_eq!(hit.role, ButtonRole::Affirmative);
    }

    #[test]
    fn hover_is_idempotent() {
        let (group, buttons, tester) = card();
        let pixel = pixel_of(&tester, &group, buttons[1].position);
        for _ in 0..2 {
            let hovered = tester.update_hover(pixel, VIEWPORT, &group, &buttons);
            assert_eq!(hovered, Some(ButtonRole::Negative));
            let highlighted: Vec<_> = buttons
                .iter()
                .filter(|button| {
                    group.get(button.role.visual_name()).unwrap().color == button.hover_color
                })
                .collect();
            assert_eq!(highlighted.len(), 1);
        }
        assert_eq!(
            tester.update_hover(Vec2::ZERO, VIEWPORT, &group, &buttons),
            None
        );
        for button in &buttons {
            assert_eq!(
                group.get(button.role.visual_name()).unwrap().color,
                button.original_color
            );
        }
    }
}

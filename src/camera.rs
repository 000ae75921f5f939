use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Active camera as supplied by the rendering host.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub view_proj: Mat4,
    pub position: Vec3,
}

impl Camera {
    /// Projects a world-space point into normalized device coordinates.
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_proj.project_point3(point)
    }

    /// Maps an NDC point back to world space at the given NDC depth.
    pub fn unproject(&self, ndc: Vec2, depth: f32) -> Vec3 {
        self.view_proj
            .inverse()
            .project_point3(ndc.extend(depth))
    }
}

/// Camera placement used when the host does not drive the camera itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub position: Vec3,
    /// Euler rotation in degrees, applied Z * Y * X.
    pub rotation: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 15.0),
            rotation: Vec3::ZERO,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraSettings {
    pub fn camera(&self, aspect: f32) -> Camera {
        let rotation_matrix = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        let forward = (rotation_matrix * Vec3::new(0.0, 0.0, -1.0).extend(0.0)).truncate();
        let up = (rotation_matrix * Vec3::Y.extend(0.0)).truncate();
        let target = if forward.length_squared() > f32::EPSILON {
            self.position + forward.normalize()
        } else {
            Vec3::ZERO
        };
        let view = Mat4::look_at_rh(self.position, target, up);
        let projection = Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            aspect.max(0.01),
            self.near,
            self.far,
        );
        Camera {
            view_proj: projection * view,
            position: self.position,
        }
    }

    /// Builds the camera for a viewport of `width` x `height` pixels.
    pub fn camera_for_viewport(&self, (width, height): (u32, u32)) -> Camera {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        self.camera(aspect)
    }
}

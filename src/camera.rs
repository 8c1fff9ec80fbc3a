//! Tracking poses and per-eye stereo view/projection math

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Default near clip plane in metres
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clip plane in metres
pub const DEFAULT_FAR: f32 = 100.0;

/// Rigid transform reported by the tracking system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Expresses `child` (given relative to `self`) in the frame `self` lives in
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            position: self.position + self.orientation * child.position,
            orientation: (self.orientation * child.orientation).normalize(),
        }
    }

    pub fn inverse(&self) -> Pose {
        let orientation = self.orientation.inverse();
        Pose {
            position: orientation * -self.position,
            orientation,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.orientation * point
    }

    /// Pointing direction (-Z)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Field of view as half-angle tangents, all positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

impl Fov {
    /// Symmetric field of view from full horizontal and vertical angles in degrees
    pub fn symmetric(horizontal_deg: f32, vertical_deg: f32) -> Self {
        let h = (horizontal_deg.to_radians() * 0.5).tan();
        let v = (vertical_deg.to_radians() * 0.5).tan();
        Self {
            up_tan: v,
            down_tan: v,
            left_tan: h,
            right_tan: h,
        }
    }

    /// From signed angles in radians (left and down are negative), as OpenXR reports them
    pub fn from_angles(left: f32, right: f32, up: f32, down: f32) -> Self {
        Self {
            up_tan: up.tan(),
            down_tan: (-down).tan(),
            left_tan: (-left).tan(),
            right_tan: right.tan(),
        }
    }

    /// Right-handed asymmetric perspective looking down -Z with depth in `[0, 1]`
    pub fn projection(&self, near: f32, far: f32) -> Mat4 {
        let width = self.left_tan + self.right_tan;
        let height = self.up_tan + self.down_tan;
        let depth = near - far;

        Mat4::from_cols(
            glam::vec4(2.0 / width, 0.0, 0.0, 0.0),
            glam::vec4(0.0, 2.0 / height, 0.0, 0.0),
            glam::vec4(
                (self.right_tan - self.left_tan) / width,
                (self.up_tan - self.down_tan) / height,
                far / depth,
                -1.0,
            ),
            glam::vec4(0.0, 0.0, near * far / depth, 0.0),
        )
    }

    /// Width over height of the frustum cross-section
    pub fn aspect_ratio(&self) -> f32 {
        (self.left_tan + self.right_tan) / (self.up_tan + self.down_tan)
    }
}

impl Default for Fov {
    fn default() -> Self {
        Self::symmetric(100.0, 100.0)
    }
}

/// World placement of the tracking origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Camera {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// View matrix of the camera itself, ignoring any eye pose
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation) * Mat4::from_translation(-self.position)
    }

    /// Maps a pose from tracking space into world space
    pub fn to_world(&self, pose: &Pose) -> Pose {
        Pose::new(self.position, self.rotation).compose(pose)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Which eye of the stereo pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

/// Applies head-to-eye offsets to the predicted head pose
pub fn calc_eye_poses(head: &Pose, offsets: &[Pose; 2]) -> [Pose; 2] {
    [head.compose(&offsets[0]), head.compose(&offsets[1])]
}

/// View matrix for an eye pose placed in the world by `camera`
pub fn eye_view(camera: &Camera, eye: &Pose) -> Mat4 {
    let world = camera.to_world(eye);
    Mat4::look_at_rh(world.position, world.position + world.forward(), world.up())
}

/// Matrices needed to draw one eye
#[derive(Debug, Clone, Copy)]
pub struct EyeView {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl EyeView {
    pub fn new(camera: &Camera, eye: &Pose, fov: &Fov, near: f32, far: f32) -> Self {
        Self {
            view: eye_view(camera, eye),
            projection: fov.projection(near, far),
            position: camera.to_world(eye).position,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec4, Vec4Swizzles};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let fov = Fov::symmetric(90.0, 90.0);
        let proj = fov.projection(0.1, 100.0);

        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);

        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projection_frustum_edges_land_on_ndc_bounds() {
        let fov = Fov {
            up_tan: 1.0,
            down_tan: 0.5,
            left_tan: 0.8,
            right_tan: 1.2,
        };
        let proj = fov.projection(0.1, 100.0);

        let right_edge = proj * Vec4::new(1.2, 0.0, -1.0, 1.0);
        let left_edge = proj * Vec4::new(-0.8, 0.0, -1.0, 1.0);
        let top_edge = proj * Vec4::new(0.0, 1.0, -1.0, 1.0);
        let bottom_edge = proj * Vec4::new(0.0, -0.5, -1.0, 1.0);

        assert!((right_edge.x / right_edge.w - 1.0).abs() < 1e-5);
        assert!((left_edge.x / left_edge.w + 1.0).abs() < 1e-5);
        assert!((top_edge.y / top_edge.w - 1.0).abs() < 1e-5);
        assert!((bottom_edge.y / bottom_edge.w + 1.0).abs() < 1e-5);
    }

    #[test]
    fn fov_from_openxr_angles_uses_positive_tangents() {
        let quarter = std::f32::consts::FRAC_PI_4;
        let fov = Fov::from_angles(-quarter, quarter, quarter, -quarter);
        assert!((fov.left_tan - 1.0).abs() < 1e-5);
        assert!((fov.right_tan - 1.0).abs() < 1e-5);
        assert!((fov.up_tan - 1.0).abs() < 1e-5);
        assert!((fov.down_tan - 1.0).abs() < 1e-5);
        assert!((fov.aspect_ratio() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn eye_poses_apply_ipd_in_head_frame() {
        let head = Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let offsets = [
            Pose::new(Vec3::new(-0.032, 0.0, 0.0), Quat::IDENTITY),
            Pose::new(Vec3::new(0.032, 0.0, 0.0), Quat::IDENTITY),
        ];

        let [left, right] = calc_eye_poses(&head, &offsets);

        // Head turned 90 degrees left: its +X now points along -Z in tracking space
        assert!(approx(left.position, Vec3::new(0.0, 1.6, 0.032)));
        assert!(approx(right.position, Vec3::new(0.0, 1.6, -0.032)));
        assert!(left.orientation.abs_diff_eq(head.orientation, 1e-5));
    }

    #[test]
    fn eye_view_moves_world_into_eye_space() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 2.0), Quat::IDENTITY);
        let eye = Pose::new(Vec3::new(0.0, 1.5, 0.0), Quat::IDENTITY);

        let view = eye_view(&camera, &eye);

        // A point one metre in front of the eye ends up on -Z in view space
        let p = view * Vec4::new(0.0, 1.5, 1.0, 1.0);
        assert!(approx(p.xyz(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn eye_view_follows_camera_rotation() {
        let camera = Camera::new(
            Vec3::ZERO,
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let view = eye_view(&camera, &Pose::IDENTITY);

        // Camera yawed left: world -X is straight ahead
        let p = view * Vec4::new(-3.0, 0.0, 0.0, 1.0);
        assert!(approx(p.xyz(), Vec3::new(0.0, 0.0, -3.0)));
    }

    #[test]
    fn pose_inverse_undoes_compose() {
        let pose = Pose::new(Vec3::new(1.0, -2.0, 0.5), Quat::from_rotation_y(0.7));
        let child = Pose::new(Vec3::new(0.3, 0.1, -1.0), Quat::from_rotation_x(0.2));

        let round_trip = pose.inverse().compose(&pose.compose(&child));
        assert!(approx(round_trip.position, child.position));
        assert!(round_trip.orientation.abs_diff_eq(child.orientation, 1e-5));
    }

    #[test]
    fn camera_matrix_translates_then_rotates() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let p = camera.matrix() * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert!(approx(p.xyz(), Vec3::ZERO));
    }

    #[test]
    fn eye_index_is_stable() {
        assert_eq!(Eye::Left.index(), 0);
        assert_eq!(Eye::Right.index(), 1);
        assert_eq!(Eye::BOTH.len(), 2);
    }
}

//! Projects a controller ray onto the world-space GUI quad
//!
//! The panel is the unit quad `(-1,-1) (-1,1) (1,1) (1,-1)` on the XY plane, scaled
//! by `canvas_size / pixels_per_unit` and then placed by the panel model matrix.
//! A hit is converted back into quad-local space and from there into virtual
//! canvas pixels with the origin at the top-left corner.

use glam::{Mat4, UVec2, Vec2, Vec3};

use crate::camera::Pose;

const EPSILON: f32 = 1e-6;

/// Unit quad corners in local space
pub const QUAD_CORNERS: [Vec3; 4] = [
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
];

/// Two triangles covering the quad
pub const QUAD_INDICES: [u32; 6] = [1, 0, 2, 0, 3, 2];

/// Half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always normalized
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray leaving a tracked pose along its forward axis
    pub fn from_pose(pose: &Pose) -> Self {
        Self::new(pose.position, pose.forward())
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Möller–Trumbore ray/triangle test, both faces.
///
/// Returns the barycentric coordinates of the hit relative to `v1` and `v2`
/// together with the distance along the ray.
pub fn intersect_ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(Vec2, f32)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let t = ray.origin - v0;
    let u = t.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = t.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let distance = e2.dot(q) * inv_det;
    if distance <= EPSILON {
        return None;
    }

    Some((Vec2::new(u, v), distance))
}

/// Where the controller ray met the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasHit {
    /// Virtual canvas pixels, origin top-left, y down
    pub canvas_pos: Vec2,
    pub world_pos: Vec3,
    pub distance: f32,
}

/// World-space quad the virtual canvas is textured onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasQuad {
    /// Panel placement
    pub model: Mat4,
    /// Virtual canvas size in pixels
    pub canvas_size: UVec2,
    /// Canvas pixels per world unit
    pub pixels_per_unit: f32,
}

impl CanvasQuad {
    pub fn new(model: Mat4, canvas_size: UVec2, pixels_per_unit: f32) -> Self {
        Self {
            model,
            canvas_size,
            pixels_per_unit,
        }
    }

    /// Model matrix including the canvas-to-world scale
    pub fn scaled_model(&self) -> Mat4 {
        let size = self.canvas_size.as_vec2() / self.pixels_per_unit;
        self.model * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0))
    }

    /// Quad corners in world space, in [`QUAD_CORNERS`] order
    pub fn corners(&self) -> [Vec3; 4] {
        let model = self.scaled_model();
        QUAD_CORNERS.map(|corner| model.transform_point3(corner))
    }

    /// Full width and height of the quad in world units
    pub fn world_extent(&self) -> Vec2 {
        let [p0, p1, _, p3] = self.corners();
        Vec2::new((p3 - p0).length(), (p1 - p0).length())
    }

    /// Converts a quad-local point to canvas pixels
    pub fn local_to_canvas(&self, local: Vec3) -> Vec2 {
        let half = self.canvas_size.as_vec2() * 0.5;
        Vec2::new(half.x * local.x + half.x, half.y - half.y * local.y)
    }

    /// Intersects `ray` with the quad, ignoring hits further than `max_distance`
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<CanvasHit> {
        let model = self.scaled_model();
        if model.determinant().abs() < EPSILON {
            return None;
        }

        let [p0, p1, p2, p3] = self.corners();
        let (_, distance) = intersect_ray_triangle(ray, p1, p0, p2)
            .or_else(|| intersect_ray_triangle(ray, p0, p3, p2))?;

        if distance > max_distance {
            return None;
        }

        let world_pos = ray.at(distance);
        let local = model.inverse().transform_point3(world_pos);

        Some(CanvasHit {
            canvas_pos: self.local_to_canvas(local),
            world_pos,
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn panel_at(z: f32) -> CanvasQuad {
        CanvasQuad::new(
            Mat4::from_translation(Vec3::new(0.0, 0.0, z)),
            UVec2::new(1600, 600),
            1000.0,
        )
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 0.01
    }

    #[test]
    fn triangle_hit_reports_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = intersect_ray_triangle(
            &ray,
            Vec3::new(-1.0, -1.0, -5.0),
            Vec3::new(1.0, -1.0, -5.0),
            Vec3::new(0.0, 1.0, -5.0),
        );
        let (_, distance) = hit.expect("ray through triangle centre");
        assert!((distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_is_hit_from_behind() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        let hit = intersect_ray_triangle(
            &ray,
            Vec3::new(-1.0, -1.0, -5.0),
            Vec3::new(1.0, -1.0, -5.0),
            Vec3::new(0.0, 1.0, -5.0),
        );
        assert!(hit.is_some());
    }

    #[test]
    fn triangle_behind_origin_is_missed() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = intersect_ray_triangle(
            &ray,
            Vec3::new(-1.0, -1.0, -5.0),
            Vec3::new(1.0, -1.0, -5.0),
            Vec3::new(0.0, 1.0, -5.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn centre_of_panel_maps_to_canvas_centre() {
        let quad = panel_at(-2.0);
        let hit = quad
            .raycast(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), f32::INFINITY)
            .expect("straight ahead hits the panel");

        assert!(close(hit.canvas_pos, Vec2::new(800.0, 300.0)));
        assert!((hit.distance - 2.0).abs() < 1e-4);
    }

    #[test]
    fn upper_right_quarter_maps_to_top_right_of_canvas() {
        let quad = panel_at(-2.0);
        // Panel spans 3.2m x 1.2m, so (0.8, 0.3) is local (0.5, 0.5)
        let target = Vec3::new(0.8, 0.3, -2.0);
        let hit = quad
            .raycast(&Ray::new(Vec3::ZERO, target), f32::INFINITY)
            .expect("hit inside panel");

        assert!(close(hit.canvas_pos, Vec2::new(1200.0, 150.0)));
    }

    #[test]
    fn point_on_shared_diagonal_maps_to_canvas() {
        let quad = panel_at(-2.0);
        // Local (-0.5, -0.5) lies on the edge both triangles share
        let target = Vec3::new(-0.8, -0.3, -2.0);
        let hit = quad
            .raycast(&Ray::new(Vec3::ZERO, target), f32::INFINITY)
            .expect("diagonal belongs to the quad");

        assert!(close(hit.canvas_pos, Vec2::new(400.0, 450.0)));
        assert!((hit.distance - target.length()).abs() < 1e-4);
        assert!((hit.world_pos - target).length() < 1e-4);
    }

    #[test]
    fn lower_left_corner_region_maps_near_canvas_bottom_left() {
        let quad = panel_at(-2.0);
        let target = Vec3::new(-1.59, -0.59, -2.0);
        let hit = quad
            .raycast(&Ray::new(Vec3::ZERO, target), f32::INFINITY)
            .expect("hit inside panel");

        assert!(hit.canvas_pos.x < 10.0);
        assert!(hit.canvas_pos.y > 590.0);
    }

    #[test]
    fn ray_beside_panel_misses() {
        let quad = panel_at(-2.0);
        let hit = quad.raycast(
            &Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, -2.0)),
            f32::INFINITY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let quad = panel_at(-2.0);
        let hit = quad.raycast(&Ray::new(Vec3::ZERO, Vec3::X), f32::INFINITY);
        assert!(hit.is_none());
    }

    #[test]
    fn panel_behind_controller_is_ignored() {
        let quad = panel_at(2.0);
        let hit = quad.raycast(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), f32::INFINITY);
        assert!(hit.is_none());
    }

    #[test]
    fn hits_past_max_distance_are_rejected() {
        let quad = panel_at(-40.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(quad.raycast(&ray, 30.0).is_none());
        assert!(quad.raycast(&ray, 50.0).is_some());
    }

    #[test]
    fn rotated_panel_keeps_canvas_orientation() {
        // Panel to the left of the user, facing +X
        let model = Mat4::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(-2.0, 0.0, 0.0),
        );
        let quad = CanvasQuad::new(model, UVec2::new(1600, 600), 1000.0);

        let centre = quad
            .raycast(&Ray::new(Vec3::ZERO, Vec3::NEG_X), f32::INFINITY)
            .expect("facing the panel");
        assert!(close(centre.canvas_pos, Vec2::new(800.0, 300.0)));

        // Panel +X points along -Z after the rotation
        let towards_right = quad
            .raycast(&Ray::new(Vec3::ZERO, Vec3::new(-2.0, 0.0, -0.8)), f32::INFINITY)
            .expect("inside panel");
        assert!(close(towards_right.canvas_pos, Vec2::new(1200.0, 300.0)));
    }

    #[test]
    fn degenerate_canvas_never_hits() {
        let quad = CanvasQuad::new(Mat4::IDENTITY, UVec2::new(0, 600), 1000.0);
        let hit = quad.raycast(
            &Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z),
            f32::INFINITY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn world_extent_follows_pixels_per_unit() {
        let quad = panel_at(-2.0);
        let extent = quad.world_extent();
        assert!((extent.x - 3.2).abs() < 1e-4);
        assert!((extent.y - 1.2).abs() < 1e-4);
    }

    #[test]
    fn ray_from_pose_points_forward() {
        let pose = Pose::new(Vec3::ONE, Quat::IDENTITY);
        let ray = Ray::from_pose(&pose);
        assert_eq!(ray.origin, Vec3::ONE);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
    }
}

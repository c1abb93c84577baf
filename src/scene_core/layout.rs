//! Fixed placement of everything in the scene.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};

use super::color::hex_to_linear;

pub const GROUND_SIZE: Vec2 = Vec2::new(80.0, 80.0);
pub const ROAD_SIZE: Vec2 = Vec2::new(10.0, 80.0);
/// Lifts the road above the grass to avoid z-fighting.
pub const ROAD_ORIGIN: Vec3 = Vec3::new(0.0, 0.01, 0.0);
/// Car root height above the ground plane.
pub const SUBJECT_ELEVATION: f32 = 0.01;

pub const CAMERA_START: Vec3 = Vec3::new(-1.0, 2.0, 5.0);

pub const CELESTIAL_RADIUS: f32 = 3.0;
pub const CELESTIAL_SEGMENTS: u32 = 32;
pub const CELESTIAL_START: Vec3 = Vec3::new(20.0, 50.0, 20.0);

pub const AMBIENT_INTENSITY: f32 = 0.3;
pub const WHEEL_SPIN_PER_FRAME: f32 = 0.1;
pub const WHEEL_NODES: [&str; 4] = ["wheel_fl", "wheel_fr", "wheel_bl", "wheel_br"];

/// Planes are authored in XY and laid flat on the ground.
pub fn ground_transform(origin: Vec3) -> Mat4 {
    Mat4::from_translation(origin) * Mat4::from_rotation_x(-FRAC_PI_2)
}

/// Texture-space transform matching `offset`/`repeat`/`rotation`/`center`
/// texture settings: rotate about `center`, then scale by `repeat`, then
/// shift by `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub offset: Vec2,
    pub repeat: Vec2,
    pub rotation: f32,
    pub center: Vec2,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            repeat: Vec2::ONE,
            rotation: 0.0,
            center: Vec2::ZERO,
        }
    }
}

impl UvTransform {
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        let (s, c) = self.rotation.sin_cos();
        let Vec2 { x: u, y: v } = uv;
        let Vec2 { x: cx, y: cy } = self.center;
        let Vec2 { x: sx, y: sy } = self.repeat;

        Vec2::new(
            sx * (c * u + s * v) - sx * (c * cx + s * cy) + cx + self.offset.x,
            sy * (-s * u + c * v) - sy * (-s * cx + c * cy) + cy + self.offset.y,
        )
    }
}

pub fn ground_uv() -> UvTransform {
    UvTransform::default()
}

/// Road stripes run along the 80-unit length.
pub fn road_uv() -> UvTransform {
    UvTransform {
        repeat: Vec2::new(8.0, 1.0),
        rotation: -FRAC_PI_2,
        center: Vec2::splat(0.5),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightSpec {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Range cutoff; zero means unbounded.
    pub distance: f32,
    pub decay: f32,
}

impl PointLightSpec {
    fn new(position: Vec3, color: u32, intensity: f32, distance: f32) -> Self {
        Self {
            position,
            color: hex_to_linear(color),
            intensity,
            distance,
            decay: 2.0,
        }
    }
}

/// The light the user drags around with the mouse.
pub fn pointer_light() -> PointLightSpec {
    PointLightSpec::new(Vec3::new(0.0, 2.0, 2.0), 0xffff2e, 20.0, 40.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleLightKind {
    Headlight,
    Taillight,
}

/// Vehicle lights in car space, with their full (night) intensity.
pub fn vehicle_lights() -> [(VehicleLightKind, PointLightSpec); 4] {
    use VehicleLightKind::{Headlight, Taillight};
    [
        (
            Headlight,
            PointLightSpec::new(Vec3::new(-0.6, 0.85, 1.8), 0xdff1f4, 2.0, 10.0),
        ),
        (
            Headlight,
            PointLightSpec::new(Vec3::new(0.6, 0.85, 1.8), 0xdff1f4, 2.0, 10.0),
        ),
        (
            Taillight,
            PointLightSpec::new(Vec3::new(-0.95, 0.8, -1.8), 0xff0000, 1.0, 20.0),
        ),
        (
            Taillight,
            PointLightSpec::new(Vec3::new(0.95, 0.8, -1.8), 0xff0000, 1.0, 20.0),
        ),
    ]
}

pub fn ambient_color() -> Vec3 {
    Vec3::ONE * AMBIENT_INTENSITY
}

pub fn celestial_start_color() -> (Vec3, Vec3) {
    (hex_to_linear(0xd3d3d3), hex_to_linear(0xd6e6ff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_uv_transform_is_a_no_op() {
        let uv = Vec2::new(0.3, 0.8);
        assert!(ground_uv().apply(uv).abs_diff_eq(uv, 1e-6));
    }

    #[test]
    fn repeat_scales_about_the_origin() {
        let t = UvTransform {
            repeat: Vec2::new(8.0, 1.0),
            ..Default::default()
        };
        assert!(t.apply(Vec2::new(1.0, 1.0)).abs_diff_eq(Vec2::new(8.0, 1.0), 1e-6));
    }

    #[test]
    fn road_uv_rotates_about_center_then_repeats() {
        let t = road_uv();
        // the rotation center is a fixed point
        assert!(t.apply(Vec2::splat(0.5)).abs_diff_eq(Vec2::splat(0.5), 1e-5));
        // walking along the plane's V axis walks the texture's U axis
        let a = t.apply(Vec2::new(0.5, 0.0));
        let b = t.apply(Vec2::new(0.5, 1.0));
        assert!((b.x - a.x).abs() > 7.9);
        assert!((b.y - a.y).abs() < 1e-5);
    }

    #[test]
    fn ground_transform_lays_planes_flat() {
        let m = ground_transform(ROAD_ORIGIN);
        let up = m.transform_vector3(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
        let far_edge = m.transform_point3(Vec3::new(0.0, 40.0, 0.0));
        assert!(far_edge.abs_diff_eq(Vec3::new(0.0, 0.01, -40.0), 1e-5));
    }

    #[test]
    fn headlights_face_forward_and_taillights_back() {
        for (kind, light) in vehicle_lights() {
            match kind {
                VehicleLightKind::Headlight => assert!(light.position.z > 0.0),
                VehicleLightKind::Taillight => assert!(light.position.z < 0.0),
            }
            assert_eq!(light.decay, 2.0);
        }
    }
}

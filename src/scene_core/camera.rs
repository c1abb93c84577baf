use glam::{Mat3, Mat4, Quat, Vec3};

use super::input::InputState;

#[derive(Debug, Clone, Copy)]
pub struct CameraParams {
    /// World units per frame along X/Z.
    pub move_speed: f32,
    /// Radians per frame.
    pub rotate_speed: f32,
    /// World units per frame along the view direction.
    pub zoom_speed: f32,
    pub min_zoom_distance: f32,
    pub max_zoom_distance: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            move_speed: 0.2,
            rotate_speed: 0.02,
            zoom_speed: 0.2,
            min_zoom_distance: 4.0,
            max_zoom_distance: 30.0,
        }
    }
}

/// Camera position plus the view direction fixed by the last look-at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    forward: Vec3,
}

impl CameraState {
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
        };
        camera.look_at(target);
        camera
    }

    /// Re-aim at `target`. A target at the camera position keeps the
    /// previous direction.
    pub fn look_at(&mut self, target: Vec3) {
        let direction = (target - self.position).normalize_or_zero();
        if direction != Vec3::ZERO {
            self.forward = direction;
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn view(&self) -> Mat4 {
        // Straight up/down has no usable Y-up basis.
        let up = if self.forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        };
        Mat4::look_to_rh(self.position, self.forward, up)
    }
}

pub struct Projection {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_radians: 75.0f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, camera: &CameraState, aspect: f32) -> Mat4 {
        self.matrix(aspect) * camera.view()
    }

    /// View-projection with the camera translation removed, so the sky box
    /// stays infinitely far away.
    pub fn sky_view_projection(&self, camera: &CameraState, aspect: f32) -> Mat4 {
        self.matrix(aspect) * Mat4::from_mat3(Mat3::from_mat4(camera.view()))
    }
}

pub struct CameraController {
    pub params: CameraParams,
}

impl CameraController {
    pub fn new(params: CameraParams) -> Self {
        Self { params }
    }

    /// Advance the camera one frame: translate, then rotate, then zoom.
    ///
    /// `subject` is the tracked object's position, `None` until it has
    /// loaded. Rotations orbit the world origin and re-aim at the subject
    /// (or the origin). Zoom is guarded by the subject distance, which is
    /// zero without a subject.
    pub fn update_camera(
        &self,
        camera: CameraState,
        input: &InputState,
        subject: Option<Vec3>,
    ) -> CameraState {
        let p = &self.params;
        let mut next = camera;

        if input.move_up {
            next.position.z -= p.move_speed;
        }
        if input.move_down {
            next.position.z += p.move_speed;
        }
        if input.move_left {
            next.position.x -= p.move_speed;
        }
        if input.move_right {
            next.position.x += p.move_speed;
        }

        let aim = subject.unwrap_or(Vec3::ZERO);
        let rotations = [
            (input.rotate_up, Vec3::X, -p.rotate_speed),
            (input.rotate_down, Vec3::X, p.rotate_speed),
            (input.rotate_left, Vec3::Y, -p.rotate_speed),
            (input.rotate_right, Vec3::Y, p.rotate_speed),
        ];
        for (active, axis, angle) in rotations {
            if active {
                next.position = Quat::from_axis_angle(axis, angle) * next.position;
                next.look_at(aim);
            }
        }

        let forward = next.forward;
        let distance = subject.map_or(0.0, |s| next.position.distance(s));

        if input.zoom_in && distance > p.min_zoom_distance {
            let step = subject
                .and_then(|s| {
                    first_sphere_crossing(next.position - s, forward, p.min_zoom_distance)
                })
                .map_or(p.zoom_speed, |t| t.min(p.zoom_speed));
            next.position += forward * step;
        }
        if input.zoom_out && distance < p.max_zoom_distance {
            let step = subject
                .and_then(|s| {
                    first_sphere_crossing(next.position - s, -forward, p.max_zoom_distance)
                })
                .map_or(p.zoom_speed, |t| t.min(p.zoom_speed));
            next.position -= forward * step;
        }

        next
    }
}

/// Smallest positive `t` where `offset + t * direction` lies on the sphere of
/// `radius` around the origin. `direction` must be unit length.
fn first_sphere_crossing(offset: Vec3, direction: Vec3, radius: f32) -> Option<f32> {
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    if c > 0.0 {
        // outside: only an approaching ray reaches the surface
        (b < 0.0).then(|| (-b - root).max(0.0))
    } else {
        Some((-b + root).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> CameraController {
        CameraController::new(CameraParams::default())
    }

    fn start() -> CameraState {
        CameraState::looking_at(Vec3::new(-1.0, 2.0, 5.0), Vec3::ZERO)
    }

    #[test]
    fn move_flags_translate_along_x_and_z() {
        let input = InputState {
            move_up: true,
            move_right: true,
            ..Default::default()
        };
        let next = controller().update_camera(start(), &input, None);
        assert!(next.position.abs_diff_eq(Vec3::new(-0.8, 2.0, 4.8), 1e-5));
        // translation alone keeps the view direction
        assert_eq!(next.forward(), start().forward());
    }

    #[test]
    fn all_four_move_flags_cancel_out() {
        let input = InputState {
            move_up: true,
            move_down: true,
            move_left: true,
            move_right: true,
            ..Default::default()
        };
        let next = controller().update_camera(start(), &input, None);
        assert!(next.position.abs_diff_eq(start().position, 1e-6));
    }

    #[test]
    fn rotate_left_orbits_origin_about_y_and_reaims() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO);
        let input = InputState {
            rotate_left: true,
            ..Default::default()
        };
        let next = controller().update_camera(camera, &input, None);

        assert!((next.position.length() - camera.position.length()).abs() < 1e-4);
        assert!((next.position.y - 2.0).abs() < 1e-5);
        // negative angle about +Y swings +Z toward -X
        assert!(next.position.x < 0.0);
        let to_origin = (-next.position).normalize();
        assert!(next.forward().abs_diff_eq(to_origin, 1e-5));
    }

    #[test]
    fn rotation_reaims_at_subject_when_present() {
        let subject = Vec3::new(1.0, 0.0, -1.0);
        let input = InputState {
            rotate_down: true,
            ..Default::default()
        };
        let next = controller().update_camera(start(), &input, Some(subject));
        let expected = (subject - next.position).normalize();
        assert!(next.forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn translate_happens_before_rotate() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let input = InputState {
            move_right: true,
            rotate_right: true,
            ..Default::default()
        };
        let next = controller().update_camera(camera, &input, None);
        let expected = Quat::from_axis_angle(Vec3::Y, 0.02) * Vec3::new(0.2, 0.0, 10.0);
        assert!(next.position.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn zoom_in_without_subject_is_a_no_op() {
        let input = InputState {
            zoom_in: true,
            ..Default::default()
        };
        let next = controller().update_camera(start(), &input, None);
        assert_eq!(next, start());
    }

    #[test]
    fn zoom_in_moves_along_view_direction() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let input = InputState {
            zoom_in: true,
            ..Default::default()
        };
        let next = controller().update_camera(camera, &input, Some(Vec3::ZERO));
        assert!(next.position.abs_diff_eq(Vec3::new(0.0, 0.0, 9.8), 1e-5));
    }

    #[test]
    fn repeated_zoom_in_never_passes_min_distance() {
        let subject = Vec3::new(0.5, 0.0, 0.0);
        let mut camera = CameraState::looking_at(Vec3::new(0.0, 1.0, 9.0), subject);
        let input = InputState {
            zoom_in: true,
            ..Default::default()
        };
        for _ in 0..200 {
            camera = controller().update_camera(camera, &input, Some(subject));
            assert!(camera.position.distance(subject) >= 4.0 - 1e-4);
        }
        assert!((camera.position.distance(subject) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn repeated_zoom_out_never_passes_max_distance() {
        let subject = Vec3::ZERO;
        let mut camera = CameraState::looking_at(Vec3::new(-1.0, 2.0, 5.0), subject);
        let input = InputState {
            zoom_out: true,
            ..Default::default()
        };
        for _ in 0..400 {
            camera = controller().update_camera(camera, &input, Some(subject));
            assert!(camera.position.distance(subject) <= 30.0 + 1e-4);
        }
        assert!((camera.position.distance(subject) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn opposing_zoom_flags_cancel_inside_the_range() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let input = InputState {
            zoom_in: true,
            zoom_out: true,
            ..Default::default()
        };
        let next = controller().update_camera(camera, &input, Some(Vec3::ZERO));
        assert!(next.position.abs_diff_eq(camera.position, 1e-5));
    }

    #[test]
    fn zoom_in_off_axis_moves_full_step_when_ray_misses_min_sphere() {
        // looking past the subject: the view ray never enters the 4-unit sphere
        let camera =
            CameraState::looking_at(Vec3::new(10.0, 0.0, 10.0), Vec3::new(10.0, 0.0, 0.0));
        let input = InputState {
            zoom_in: true,
            ..Default::default()
        };
        let next = controller().update_camera(camera, &input, Some(Vec3::ZERO));
        assert!(next.position.abs_diff_eq(Vec3::new(10.0, 0.0, 9.8), 1e-5));
    }

    #[test]
    fn look_at_own_position_keeps_direction() {
        let mut camera = start();
        let before = camera.forward();
        camera.look_at(camera.position);
        assert_eq!(camera.forward(), before);
    }

    #[test]
    fn sky_projection_ignores_camera_translation() {
        let projection = Projection::default();
        let near = CameraState::looking_at(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 2.0, 0.0));
        let far = CameraState::looking_at(Vec3::new(30.0, 2.0, 5.0), Vec3::new(30.0, 2.0, 0.0));
        let a = projection.sky_view_projection(&near, 1.5);
        let b = projection.sky_view_projection(&far, 1.5);
        assert!(a.abs_diff_eq(b, 1e-5));
        assert!(!projection
            .view_projection(&near, 1.5)
            .abs_diff_eq(projection.view_projection(&far, 1.5), 1e-3));
    }

    #[test]
    fn view_matrix_is_finite_when_looking_straight_down() {
        let camera = CameraState::looking_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(camera.view().is_finite());
    }
}

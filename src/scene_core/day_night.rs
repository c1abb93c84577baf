use std::f32::consts::PI;
use std::f64::consts::TAU;

use glam::Vec3;

use super::color::hex_to_linear;

/// Cycle angle advanced per millisecond of elapsed time.
pub const CYCLE_SPEED: f64 = 0.00015;
/// Radius of the arc traced by the sun/moon.
pub const ORBIT_RADIUS: f32 = 50.0;

pub const DAY_LIGHT_INTENSITY: f32 = 2.0;
pub const NIGHT_LIGHT_INTENSITY: f32 = 0.2;
pub const DAY_SKY_BRIGHTNESS: f32 = 3.0;
pub const NIGHT_SKY_BRIGHTNESS: f32 = 0.3;
pub const NIGHT_HEADLIGHT_INTENSITY: f32 = 2.0;
pub const NIGHT_TAILLIGHT_INTENSITY: f32 = 1.0;

const DAY_BODY_COLOR: u32 = 0xffdd44;
const NIGHT_BODY_COLOR: u32 = 0xd3d3d3;
const NIGHT_BODY_EMISSIVE: u32 = 0xd6e6ff;

/// Everything the renderer needs to light one frame, derived from the
/// cycle angle alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingSnapshot {
    pub angle: f32,
    pub is_day_time: bool,
    /// Sun/moon position; the directional light sits here too.
    pub celestial_position: Vec3,
    pub light_intensity: f32,
    pub celestial_color: Vec3,
    pub celestial_emissive: Vec3,
    pub sky_brightness: f32,
    pub sky_time_of_day: f32,
    pub headlight_intensity: f32,
    pub taillight_intensity: f32,
}

/// Cycle angle in `[0, 2π)` for `elapsed_ms` since start.
pub fn cycle_angle(elapsed_ms: f64, speed: f64) -> f32 {
    let angle = (elapsed_ms * speed).rem_euclid(TAU) as f32;
    // narrowing can round up onto 2π
    if angle >= std::f32::consts::TAU {
        0.0
    } else {
        angle
    }
}

/// `angle == π` counts as day.
pub fn is_day(angle: f32) -> bool {
    angle <= PI
}

/// Celestial body position along its arc.
///
/// Two branches: the day half traces `(cos, sin)` and the night half traces
/// `(-cos, -sin)`. Both halves sweep the same upper semicircle from +X to
/// -X, so the body jumps back to +X at `π` and again at `2π`.
pub fn celestial_position(angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    if is_day(angle) {
        Vec3::new(cos * ORBIT_RADIUS, sin * ORBIT_RADIUS, 0.0)
    } else {
        Vec3::new(-cos * ORBIT_RADIUS, -sin * ORBIT_RADIUS, 0.0)
    }
}

/// Sky blend position in `[0, 1)`, restarting at each half cycle.
pub fn sky_time_of_day(angle: f32) -> f32 {
    let half = if is_day(angle) {
        angle / PI
    } else {
        (angle - PI) / PI
    };
    // angle == π lands on 1.0 for the day branch; 1.0 and 0.0 blend to the
    // same night color.
    half.rem_euclid(1.0)
}

pub fn lighting_snapshot(angle: f32) -> LightingSnapshot {
    let is_day_time = is_day(angle);
    let (light_intensity, color, emissive, sky_brightness, headlights, taillights) = if is_day_time
    {
        (
            DAY_LIGHT_INTENSITY,
            hex_to_linear(DAY_BODY_COLOR),
            hex_to_linear(DAY_BODY_COLOR),
            DAY_SKY_BRIGHTNESS,
            0.0,
            0.0,
        )
    } else {
        (
            NIGHT_LIGHT_INTENSITY,
            hex_to_linear(NIGHT_BODY_COLOR),
            hex_to_linear(NIGHT_BODY_EMISSIVE),
            NIGHT_SKY_BRIGHTNESS,
            NIGHT_HEADLIGHT_INTENSITY,
            NIGHT_TAILLIGHT_INTENSITY,
        )
    };

    LightingSnapshot {
        angle,
        is_day_time,
        celestial_position: celestial_position(angle),
        light_intensity,
        celestial_color: color,
        celestial_emissive: emissive,
        sky_brightness,
        sky_time_of_day: sky_time_of_day(angle),
        headlight_intensity: headlights,
        taillight_intensity: taillights,
    }
}

pub struct DayNightCycle {
    speed: f64,
    is_day_time: bool,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(CYCLE_SPEED)
    }
}

impl DayNightCycle {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            is_day_time: true,
        }
    }

    /// Derive this frame's lighting and record the day/night phase.
    pub fn update(&mut self, elapsed_ms: f64) -> LightingSnapshot {
        let snapshot = lighting_snapshot(cycle_angle(elapsed_ms, self.speed));
        if snapshot.is_day_time != self.is_day_time {
            log::info!(
                "{} at cycle angle {:.3}",
                if snapshot.is_day_time { "day breaks" } else { "night falls" },
                snapshot.angle
            );
        }
        self.is_day_time = snapshot.is_day_time;
        snapshot
    }

    pub fn is_day_time(&self) -> bool {
        self.is_day_time
    }

    /// Milliseconds for one full day and night.
    pub fn period_ms(&self) -> f64 {
        TAU / self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI as PI32, TAU as TAU32};

    #[test]
    fn angle_wraps_into_full_cycle() {
        let period = DayNightCycle::default().period_ms();
        assert!((period - 41_887.9).abs() < 0.1);

        let a = cycle_angle(period * 3.0 + period * 0.25, CYCLE_SPEED);
        assert!((a - FRAC_PI_2).abs() < 1e-3, "got {a}");
        assert!(cycle_angle(0.0, CYCLE_SPEED) == 0.0);
    }

    #[test]
    fn day_and_night_halves_split_at_pi() {
        for i in 1..100 {
            let t = i as f32 / 100.0;
            assert!(is_day(t * PI32), "angle {} should be day", t * PI32);
            assert!(!is_day(PI32 + t * PI32 * 0.999), "angle should be night");
        }
        assert!(is_day(PI32));
    }

    #[test]
    fn celestial_body_stays_on_radius() {
        for i in 0..720 {
            let angle = i as f32 / 720.0 * TAU32;
            let p = celestial_position(angle);
            assert!((p.length() - ORBIT_RADIUS).abs() < 1e-3);
            assert_eq!(p.z, 0.0);
            assert!(p.y >= -1e-3, "arc stays above the horizon, got {p:?}");
        }
    }

    #[test]
    fn night_branch_mirrors_day_branch() {
        let day = celestial_position(0.3);
        let night = celestial_position(PI32 + 0.3);
        assert!(day.abs_diff_eq(night, 1e-3));

        // the arc restarts at +X right after π
        let dusk = celestial_position(PI32);
        let after = celestial_position(PI32 + 1e-3);
        assert!((dusk.x + ORBIT_RADIUS).abs() < 1e-3);
        assert!((after.x - ORBIT_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn midday_snapshot() {
        let s = lighting_snapshot(FRAC_PI_2);
        assert!(s.is_day_time);
        assert_eq!(s.light_intensity, 2.0);
        assert_eq!(s.sky_brightness, 3.0);
        assert_eq!(s.headlight_intensity, 0.0);
        assert_eq!(s.taillight_intensity, 0.0);
        assert!(s
            .celestial_position
            .abs_diff_eq(Vec3::new(0.0, ORBIT_RADIUS, 0.0), 1e-3));
        assert_eq!(s.celestial_color, s.celestial_emissive);
    }

    #[test]
    fn midnight_snapshot() {
        let s = lighting_snapshot(3.0 * FRAC_PI_2);
        assert!(!s.is_day_time);
        assert!((s.light_intensity - 0.2).abs() < 1e-6);
        assert!((s.sky_brightness - 0.3).abs() < 1e-6);
        assert_eq!(s.headlight_intensity, 2.0);
        assert_eq!(s.taillight_intensity, 1.0);
        assert!(s
            .celestial_position
            .abs_diff_eq(Vec3::new(0.0, ORBIT_RADIUS, 0.0), 1e-3));
        assert_ne!(s.celestial_color, s.celestial_emissive);
    }

    #[test]
    fn sky_time_of_day_stays_in_unit_range() {
        for i in 0..2000 {
            let angle = i as f32 / 2000.0 * TAU32;
            let t = sky_time_of_day(angle);
            assert!((0.0..1.0).contains(&t), "angle {angle} gave {t}");
        }
        assert_eq!(sky_time_of_day(PI32), 0.0);
        assert!((sky_time_of_day(FRAC_PI_2) - 0.5).abs() < 1e-6);
        assert!((sky_time_of_day(3.0 * FRAC_PI_2) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cycle_tracks_phase_across_updates() {
        let mut cycle = DayNightCycle::default();
        assert!(cycle.is_day_time());

        let quarter = cycle.period_ms() / 4.0;
        assert!(cycle.update(quarter).is_day_time);
        assert!(cycle.is_day_time());

        let s = cycle.update(quarter * 3.0);
        assert!(!s.is_day_time);
        assert!(!cycle.is_day_time());

        assert!(cycle.update(cycle.period_ms() + quarter).is_day_time);
        assert!(cycle.is_day_time());
    }
}

use glam::Vec3;

use super::color::hex_to_linear;

pub struct SkyPalette {
    pub day: Vec3,
    pub night: Vec3,
    pub dawn_dusk: Vec3,
}

impl Default for SkyPalette {
    fn default() -> Self {
        Self {
            day: hex_to_linear(0x87ceeb),
            night: hex_to_linear(0x000033),
            dawn_dusk: hex_to_linear(0xb33000),
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl SkyPalette {
    /// Sky tint for a time-of-day in `[0, 1]`.
    ///
    /// Four equal quarters: night → dawn, dawn → day, day → dusk, dusk →
    /// night. The sky shader evaluates the same curve per pixel.
    pub fn color_at(&self, time_of_day: f32) -> Vec3 {
        let t = time_of_day;
        if t < 0.25 {
            self.night.lerp(self.dawn_dusk, smoothstep(0.0, 0.25, t))
        } else if t < 0.5 {
            self.dawn_dusk.lerp(self.day, smoothstep(0.25, 0.5, t))
        } else if t < 0.75 {
            self.day.lerp(self.dawn_dusk, smoothstep(0.5, 0.75, t))
        } else {
            self.dawn_dusk.lerp(self.night, smoothstep(0.75, 1.0, t))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_marks_hit_the_named_stops() {
        let palette = SkyPalette::default();
        assert!(palette.color_at(0.0).abs_diff_eq(palette.night, 1e-6));
        assert!(palette.color_at(0.25).abs_diff_eq(palette.dawn_dusk, 1e-6));
        assert!(palette.color_at(0.5).abs_diff_eq(palette.day, 1e-6));
        assert!(palette.color_at(0.75).abs_diff_eq(palette.dawn_dusk, 1e-6));
        assert!(palette.color_at(1.0).abs_diff_eq(palette.night, 1e-6));
    }

    #[test]
    fn blend_is_continuous_through_the_cycle() {
        let palette = SkyPalette::default();
        let steps = 4000;
        let mut previous = palette.color_at(0.0);
        for i in 1..=steps {
            let color = palette.color_at(i as f32 / steps as f32);
            assert!(
                (color - previous).length() < 0.01,
                "jump at step {i}: {previous:?} -> {color:?}"
            );
            previous = color;
        }
    }

    #[test]
    fn wrap_from_one_to_zero_is_seamless() {
        let palette = SkyPalette::default();
        assert!(palette
            .color_at(0.9999)
            .abs_diff_eq(palette.color_at(0.0), 1e-4));
    }

    #[test]
    fn smoothstep_is_flat_at_the_edges() {
        let near_start = smoothstep(0.0, 1.0, 0.001);
        let near_end = smoothstep(0.0, 1.0, 0.999);
        assert!(near_start < 1e-5);
        assert!(1.0 - near_end < 1e-5);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }
}

use glam::{Vec2, Vec3};
use rand::Rng;

use super::color::hex_to_linear;

pub const TRUNK_RADIUS: f32 = 0.5;
pub const TRUNK_SEGMENTS: u32 = 8;
pub const TRUNK_HEIGHT_MIN: f32 = 2.5;
pub const TRUNK_HEIGHT_RANGE: f32 = 1.5;
pub const CANOPY_SEGMENTS: u32 = 4;

const TRUNK_COLOR: u32 = 0x654321;
const CANOPY_COLOR: u32 = 0x00ff00;

/// One cone of the stacked canopy.
#[derive(Debug, Clone, Copy)]
pub struct CanopyTier {
    pub radius: f32,
    pub height: f32,
    /// Cone center height above the trunk top.
    pub lift: f32,
}

pub const CANOPY_TIERS: [CanopyTier; 3] = [
    CanopyTier {
        radius: 1.8,
        height: 3.0,
        lift: 0.0,
    },
    CanopyTier {
        radius: 1.5,
        height: 2.0,
        lift: 0.5,
    },
    CanopyTier {
        radius: 1.0,
        height: 1.0,
        lift: 1.0,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct TreeInstance {
    /// Ground point under the trunk.
    pub position: Vec3,
    pub trunk_height: f32,
}

impl TreeInstance {
    pub fn trunk_center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.trunk_height * 0.5)
    }

    pub fn canopy_center(&self, tier: &CanopyTier) -> Vec3 {
        self.position + Vec3::Y * (self.trunk_height + tier.lift)
    }
}

pub fn trunk_color() -> Vec3 {
    hex_to_linear(TRUNK_COLOR)
}

pub fn canopy_color() -> Vec3 {
    hex_to_linear(CANOPY_COLOR)
}

/// Planting grid beside the road: 7 columns on each side (5 to 35 units
/// out), 15 rows from z = 35 down to z = -35.
pub fn field_offsets() -> Vec<Vec2> {
    let columns = (1..=7)
        .map(|i| -5.0 * i as f32)
        .chain((1..=7).map(|i| 5.0 * i as f32));

    columns
        .flat_map(|x| (-7..=7).rev().map(move |row| Vec2::new(x, 5.0 * row as f32)))
        .collect()
}

pub fn random_trunk_height<R: Rng>(rng: &mut R) -> f32 {
    TRUNK_HEIGHT_MIN + rng.random::<f32>() * TRUNK_HEIGHT_RANGE
}

/// Trees for every field offset around `road_origin`, each with its own
/// random trunk height.
pub fn plant_trees<R: Rng>(rng: &mut R, road_origin: Vec3) -> Vec<TreeInstance> {
    field_offsets()
        .into_iter()
        .map(|offset| TreeInstance {
            position: Vec3::new(road_origin.x + offset.x, 0.0, road_origin.z + offset.y),
            trunk_height: random_trunk_height(rng),
        })
        .collect()
}

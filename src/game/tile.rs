//! Terrain materials and the tiles built from them.
//!
//! Every tile carries its material plus the walkable/transparent flags that
//! derive from it. Flags are recomputed whenever a material is written so the
//! two can never disagree.

use serde::{Deserialize, Serialize};

/// Coherent terrain families assigned by region noise before a concrete
/// material is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionGroup {
    Desert,
    Grassland,
    Earth,
    Rock,
    Frost,
    Cliffs,
}

impl RegionGroup {
    /// All groups, in band order.
    pub const ALL: [RegionGroup; 6] = [
        RegionGroup::Desert,
        RegionGroup::Grassland,
        RegionGroup::Earth,
        RegionGroup::Rock,
        RegionGroup::Frost,
        RegionGroup::Cliffs,
    ];

    /// The material most cells of this group use.
    pub fn dominant(self) -> Material {
        match self {
            RegionGroup::Desert => Material::Sand,
            RegionGroup::Grassland => Material::Grass,
            RegionGroup::Earth => Material::Dirt,
            RegionGroup::Rock => Material::Stone,
            RegionGroup::Frost => Material::Snow,
            RegionGroup::Cliffs => Material::CliffWall,
        }
    }

    /// Occasional variety materials. Each shares its group's flags.
    pub fn accents(self) -> &'static [Material] {
        match self {
            RegionGroup::Desert => &[Material::Sandstone],
            RegionGroup::Grassland => &[Material::LushGrass, Material::Flowers],
            RegionGroup::Earth => &[Material::Mud, Material::Gravel],
            RegionGroup::Rock => &[Material::Cobblestone, Material::Moss],
            RegionGroup::Frost => &[Material::Ice],
            RegionGroup::Cliffs => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegionGroup::Desert => "desert",
            RegionGroup::Grassland => "grassland",
            RegionGroup::Earth => "earth",
            RegionGroup::Rock => "rock",
            RegionGroup::Frost => "frost",
            RegionGroup::Cliffs => "cliffs",
        }
    }
}

/// Broad classification of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialFamily {
    Land,
    Fluid,
    Hazard,
    Transition,
}

/// Concrete terrain material of a tile.
///
/// The discriminants are the stable raw ids used by prebuilt maps and
/// [`Tile::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Material {
    Grass = 0,
    LushGrass = 1,
    Flowers = 2,
    Dirt = 3,
    Mud = 4,
    Gravel = 5,
    Sand = 6,
    Sandstone = 7,
    Stone = 8,
    Cobblestone = 9,
    Moss = 10,
    Snow = 11,
    Ice = 12,
    CliffWall = 13,
    ShallowWater = 14,
    DeepWater = 15,
    Lava = 16,
    GrassDirtEdge = 17,
    GrassStoneEdge = 18,
    SandStoneEdge = 19,
    GrassSnowEdge = 20,
    DirtSnowEdge = 21,
}

impl Material {
    /// Every material, indexed by raw id.
    pub const ALL: [Material; 22] = [
        Material::Grass,
        Material::LushGrass,
        Material::Flowers,
        Material::Dirt,
        Material::Mud,
        Material::Gravel,
        Material::Sand,
        Material::Sandstone,
        Material::Stone,
        Material::Cobblestone,
        Material::Moss,
        Material::Snow,
        Material::Ice,
        Material::CliffWall,
        Material::ShallowWater,
        Material::DeepWater,
        Material::Lava,
        Material::GrassDirtEdge,
        Material::GrassStoneEdge,
        Material::SandStoneEdge,
        Material::GrassSnowEdge,
        Material::DirtSnowEdge,
    ];

    /// Looks up a material by raw id.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::Material;
    ///
    /// assert_eq!(Material::from_id(16), Some(Material::Lava));
    /// assert_eq!(Material::from_id(200), None);
    /// ```
    pub fn from_id(id: u8) -> Option<Material> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn family(self) -> MaterialFamily {
        match self {
            Material::ShallowWater | Material::DeepWater => MaterialFamily::Fluid,
            Material::Lava => MaterialFamily::Hazard,
            Material::GrassDirtEdge
            | Material::GrassStoneEdge
            | Material::SandStoneEdge
            | Material::GrassSnowEdge
            | Material::DirtSnowEdge => MaterialFamily::Transition,
            _ => MaterialFamily::Land,
        }
    }

    /// Region group a land material belongs to. Fluids, hazards and
    /// transition materials have none.
    pub fn region_group(self) -> Option<RegionGroup> {
        match self {
            Material::Grass | Material::LushGrass | Material::Flowers => {
                Some(RegionGroup::Grassland)
            }
            Material::Dirt | Material::Mud | Material::Gravel => Some(RegionGroup::Earth),
            Material::Sand | Material::Sandstone => Some(RegionGroup::Desert),
            Material::Stone | Material::Cobblestone | Material::Moss => Some(RegionGroup::Rock),
            Material::Snow | Material::Ice => Some(RegionGroup::Frost),
            Material::CliffWall => Some(RegionGroup::Cliffs),
            _ => None,
        }
    }

    pub fn is_fluid(self) -> bool {
        self.family() == MaterialFamily::Fluid
    }

    /// Lava and deep water. Hazards are never walkable.
    pub fn is_hazard(self) -> bool {
        matches!(self, Material::Lava | Material::DeepWater)
    }

    pub fn is_walkable(self) -> bool {
        !self.is_hazard() && self != Material::CliffWall
    }

    pub fn is_transparent(self) -> bool {
        self != Material::CliffWall
    }

    /// Fallback render colour as RGB.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Material::Grass => (84, 150, 62),
            Material::LushGrass => (58, 130, 48),
            Material::Flowers => (120, 165, 80),
            Material::Dirt => (120, 88, 58),
            Material::Mud => (92, 68, 46),
            Material::Gravel => (128, 120, 110),
            Material::Sand => (218, 196, 132),
            Material::Sandstone => (196, 160, 108),
            Material::Stone => (120, 120, 126),
            Material::Cobblestone => (104, 104, 112),
            Material::Moss => (88, 116, 84),
            Material::Snow => (236, 240, 246),
            Material::Ice => (176, 214, 236),
            Material::CliffWall => (62, 56, 58),
            Material::ShallowWater => (64, 132, 196),
            Material::DeepWater => (30, 70, 150),
            Material::Lava => (220, 80, 24),
            Material::GrassDirtEdge => (102, 120, 60),
            Material::GrassStoneEdge => (102, 136, 94),
            Material::SandStoneEdge => (170, 158, 128),
            Material::GrassSnowEdge => (160, 196, 150),
            Material::DirtSnowEdge => (178, 164, 150),
        }
    }
}

/// A single cell of the world.
///
/// # Examples
///
/// ```
/// use emberfall::{Material, Tile};
///
/// let tile = Tile::new(Material::Lava);
/// assert!(!tile.walkable);
/// assert!(tile.transparent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub material: Material,
    pub walkable: bool,
    pub transparent: bool,
}

impl Tile {
    /// Creates a tile whose flags follow its material.
    pub fn new(material: Material) -> Self {
        Self {
            material,
            walkable: material.is_walkable(),
            transparent: material.is_transparent(),
        }
    }

    /// Builds a tile from a raw material id, coercing unknown ids to grass.
    pub fn from_raw(id: u8) -> Self {
        match Material::from_id(id) {
            Some(material) => Self::new(material),
            None => {
                log::warn!("Material id {} is out of range, using grass", id);
                Self::new(Material::Grass)
            }
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(Material::Grass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_ids_match_table() {
        for (index, material) in Material::ALL.iter().enumerate() {
            assert_eq!(material.id() as usize, index);
            assert_eq!(Material::from_id(index as u8), Some(*material));
        }
    }

    #[test]
    fn test_out_of_range_id_coerced_to_grass() {
        let tile = Tile::from_raw(99);
        assert_eq!(tile.material, Material::Grass);
        assert!(tile.walkable);
    }

    #[test]
    fn test_hazards_never_walkable() {
        for material in Material::ALL {
            if material.is_hazard() {
                assert!(!Tile::new(material).walkable, "{:?}", material);
            }
        }
    }

    #[test]
    fn test_accents_share_group_flags() {
        for group in RegionGroup::ALL {
            let dominant = group.dominant();
            assert_eq!(dominant.region_group(), Some(group));
            for accent in group.accents() {
                assert_eq!(accent.region_group(), Some(group));
                assert_eq!(accent.is_walkable(), dominant.is_walkable());
                assert_eq!(accent.is_transparent(), dominant.is_transparent());
            }
        }
    }

    #[test]
    fn test_cliff_blocks_sight_and_movement() {
        let cliff = Tile::new(Material::CliffWall);
        assert!(!cliff.walkable);
        assert!(!cliff.transparent);
        assert!(Tile::new(Material::ShallowWater).walkable);
    }
}

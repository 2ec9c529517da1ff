use serde::{Deserialize, Serialize};

pub type EntityId = u64;

/// Coarse entity categories reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Monster,
    Chest,
    IngameIcon,
    MiscellaneousObjects,
    #[default]
    Other,
}

impl EntityKind {
    /// Kinds that can show up in the alert list at all.
    pub fn is_alertable(self) -> bool {
        matches!(
            self,
            Self::Monster | Self::Chest | Self::IngameIcon | Self::MiscellaneousObjects
        )
    }
}

/// Read-only view of an entity for a single evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Metadata path, possibly carrying an `@` instance suffix.
    pub path: String,
    pub render_name: String,
    /// Magic-affix ids. `None` when the entity has no magic properties at all.
    pub modifiers: Option<Vec<String>>,
    pub distance: f32,
    pub is_valid: bool,
    pub is_alive: bool,
    pub is_hostile: bool,
    pub is_opened: bool,
    /// Minimap icon visibility for in-game icons; `None` if it has no icon.
    pub icon_hidden: Option<bool>,
}

impl EntitySnapshot {
    /// Path with any `@` instance suffix removed.
    pub fn base_path(&self) -> &str {
        self.path.split('@').next().unwrap_or(&self.path)
    }
}

/// Straight RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Unpack a color stored with alpha in the high byte and red in the low byte.
    pub const fn from_abgr(abgr: u32) -> Self {
        Self {
            r: (abgr & 0xFF) as u8,
            g: ((abgr >> 8) & 0xFF) as u8,
            b: ((abgr >> 16) & 0xFF) as u8,
            a: (abgr >> 24) as u8,
        }
    }

    /// Parse an `AABBGGRR` hex string.
    pub fn parse_abgr_hex(value: &str) -> Option<Self> {
        u32::from_str_radix(value.trim(), 16).ok().map(Self::from_abgr)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abgr_byte_order() {
        let color = Rgba::parse_abgr_hex("FFFF0000").unwrap();
        assert_eq!(color, Rgba { r: 0, g: 0, b: 255, a: 255 });

        let color = Rgba::parse_abgr_hex("800000FF").unwrap();
        assert_eq!(color, Rgba { r: 255, g: 0, b: 0, a: 128 });
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Rgba::parse_abgr_hex("nothex").is_none());
        assert!(Rgba::parse_abgr_hex("").is_none());
    }

    #[test]
    fn test_base_path_strips_instance_suffix() {
        let entity = EntitySnapshot {
            path: "Metadata/Chests/DelveChests/DelveChestCurrency@72".to_string(),
            ..Default::default()
        };
        assert_eq!(entity.base_path(), "Metadata/Chests/DelveChests/DelveChestCurrency");
    }
}

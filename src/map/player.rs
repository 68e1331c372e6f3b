//! Player slot table.
//!
//! A map always stores eight slots, one per player color, in color order.
//! Slots no one may play carry only the two playability flags followed by
//! a fixed-size filler whose length depends on the map format.

use crate::binary::ByteReader;
use crate::error::Result;

use super::format::MapFormat;

/// Number of player slots in every map.
pub const PLAYER_SLOTS: usize = 8;

/// Marker for "no hero" in hero id fields.
pub const NO_HERO: u8 = 0xFF;

/// Player colors in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerColor {
    /// Slot 0.
    Red,
    /// Slot 1.
    Blue,
    /// Slot 2.
    Tan,
    /// Slot 3.
    Green,
    /// Slot 4.
    Orange,
    /// Slot 5.
    Purple,
    /// Slot 6.
    Teal,
    /// Slot 7.
    Pink,
}

impl PlayerColor {
    /// All colors in slot order.
    pub const ALL: [PlayerColor; PLAYER_SLOTS] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Tan,
        PlayerColor::Green,
        PlayerColor::Orange,
        PlayerColor::Purple,
        PlayerColor::Teal,
        PlayerColor::Pink,
    ];
}

/// Computer player behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiBehavior {
    /// Let the game choose.
    Random,
    /// Prefers hero development.
    Warrior,
    /// Prefers town development.
    Builder,
    /// Prefers exploring.
    Explorer,
    /// Any other stored value.
    Other(u8),
}

impl From<u8> for AiBehavior {
    fn from(value: u8) -> Self {
        match value {
            0 => AiBehavior::Random,
            1 => AiBehavior::Warrior,
            2 => AiBehavior::Builder,
            3 => AiBehavior::Explorer,
            other => AiBehavior::Other(other),
        }
    }
}

/// A player's designated main town.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainTown {
    /// Whether a hero is placed in the town at start.
    pub generate_hero_at_town: bool,
    /// Whether a random hero is generated.
    pub generate_hero: bool,
    /// Town entrance `(x, y, z)`.
    pub position: (u8, u8, u8),
}

/// A hero referenced by a player slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroRef {
    /// Hero type id.
    pub id: u8,
    /// Custom name; empty when the default name is used.
    pub name: String,
}

/// One player slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Slot color.
    pub color: PlayerColor,
    /// A human may take this slot.
    pub can_human: bool,
    /// The computer may take this slot.
    pub can_computer: bool,
    /// Computer behavior.
    pub ai_behavior: AiBehavior,
    /// Whether the faction set was customized, SoD only.
    pub allowed_alignments: Option<bool>,
    /// Bitmask of allowed factions.
    pub allowed_factions: u16,
    /// Faction is chosen at random.
    pub random_faction: bool,
    /// Starting town, if any.
    pub main_town: Option<MainTown>,
    /// A random hero is granted at start.
    pub has_random_hero: bool,
    /// The main hero and its portrait, if any.
    pub main_hero: Option<(HeroRef, u8)>,
    /// Placeholder hero count, AB and later.
    pub placeholder_heroes: u8,
    /// Heroes the player starts with, AB and later.
    pub heroes: Vec<HeroRef>,
}

impl Player {
    /// Returns `true` if anyone, human or computer, may play this slot.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.can_human || self.can_computer
    }

    fn unplayable(color: PlayerColor) -> Self {
        Player {
            color,
            can_human: false,
            can_computer: false,
            ai_behavior: AiBehavior::Random,
            allowed_alignments: None,
            allowed_factions: 0,
            random_faction: false,
            main_town: None,
            has_random_hero: false,
            main_hero: None,
            placeholder_heroes: 0,
            heroes: Vec::new(),
        }
    }

    fn read(reader: &mut ByteReader<'_>, format: MapFormat, color: PlayerColor) -> Result<Self> {
        let can_human = reader.read_bool()?;
        let can_computer = reader.read_bool()?;

        if !can_human && !can_computer {
            let filler = match format {
                MapFormat::RestorationOfErathia => 6,
                MapFormat::ArmageddonsBlade => 12,
                MapFormat::ShadowOfDeath => 13,
            };
            reader.skip(filler)?;
            return Ok(Player::unplayable(color));
        }

        let ai_behavior = AiBehavior::from(reader.read_u8()?);
        let allowed_alignments = if format.at_least_sod() {
            Some(reader.read_bool()?)
        } else {
            None
        };
        let allowed_factions = if format.at_least_ab() {
            reader.read_u16()?
        } else {
            u16::from(reader.read_u8()?)
        };
        let random_faction = reader.read_bool()?;

        let main_town = if reader.read_bool()? {
            let (generate_hero_at_town, generate_hero) = if format.at_least_ab() {
                (reader.read_bool()?, reader.read_bool()?)
            } else {
                (true, false)
            };
            let position = (reader.read_u8()?, reader.read_u8()?, reader.read_u8()?);
            Some(MainTown {
                generate_hero_at_town,
                generate_hero,
                position,
            })
        } else {
            None
        };

        let has_random_hero = reader.read_bool()?;
        let hero_id = reader.read_u8()?;
        let main_hero = if hero_id == NO_HERO {
            None
        } else {
            let portrait = reader.read_u8()?;
            let name = reader.read_string()?;
            Some((HeroRef { id: hero_id, name }, portrait))
        };

        let mut placeholder_heroes = 0;
        let mut heroes = Vec::new();
        if format.at_least_ab() {
            placeholder_heroes = reader.read_u8()?;
            let hero_count = reader.read_u8()?;
            reader.skip(3)?;
            for _ in 0..hero_count {
                let id = reader.read_u8()?;
                let name = reader.read_string()?;
                heroes.push(HeroRef { id, name });
            }
        }

        Ok(Player {
            color,
            can_human,
            can_computer,
            ai_behavior,
            allowed_alignments,
            allowed_factions,
            random_faction,
            main_town,
            has_random_hero,
            main_hero,
            placeholder_heroes,
            heroes,
        })
    }
}

/// All eight player slots of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayersInfo {
    /// Slots in color order.
    pub players: Vec<Player>,
}

impl PlayersInfo {
    pub(crate) fn read(reader: &mut ByteReader<'_>, format: MapFormat) -> Result<Self> {
        let players = PlayerColor::ALL
            .iter()
            .map(|&color| Player::read(reader, format, color))
            .collect::<Result<Vec<_>>>()?;
        Ok(PlayersInfo { players })
    }

    /// Slots someone may play.
    pub fn playable(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_playable())
    }
}

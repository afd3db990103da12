//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use crossterm::style::Color;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::error::Error;

/// Player colors. A color is also the player's slot in the game: a game never has two players
/// with the same color.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

/// All colors, in slot order
pub const PALETTE: [PlayerColor; 6] = [
    PlayerColor::Red,
    PlayerColor::Green,
    PlayerColor::Yellow,
    PlayerColor::Blue,
    PlayerColor::Magenta,
    PlayerColor::Cyan,
];

impl PlayerColor {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Terminal foreground color
    pub fn term_color(self) -> Color {
        match self {
            PlayerColor::Red => Color::Red,
            PlayerColor::Green => Color::Green,
            PlayerColor::Yellow => Color::Yellow,
            PlayerColor::Blue => Color::Blue,
            PlayerColor::Magenta => Color::Magenta,
            PlayerColor::Cyan => Color::Cyan,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Green => "green",
            PlayerColor::Yellow => "yellow",
            PlayerColor::Blue => "blue",
            PlayerColor::Magenta => "magenta",
            PlayerColor::Cyan => "cyan",
        }
    }
}

impl TryFrom<usize> for PlayerColor {
    type Error = Error;

    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        PALETTE.get(idx).copied().ok_or(Error::SlotOutOfRange(idx))
    }
}

impl std::fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The color slots of a single game.
///
/// Slots are handed out lowest palette index first, so that assignment does not depend on any
/// container's iteration order.
#[derive(Clone, Debug)]
pub struct ColorSlots {
    taken: Vec<bool>,
}

impl ColorSlots {
    /// Capacity is clamped to the palette size (and to at least one slot)
    pub fn new(capacity: usize) -> ColorSlots {
        let cap = capacity.clamp(1, PALETTE.len());
        ColorSlots { taken: vec![false; cap] }
    }

    pub fn capacity(&self) -> usize {
        self.taken.len()
    }

    /// Available colors, ordered by palette index
    pub fn available(&self) -> Vec<PlayerColor> {
        self.taken
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(i, _)| PALETTE[i])
            .collect()
    }

    pub fn has_available(&self) -> bool {
        self.taken.iter().any(|t| !t)
    }

    pub fn ntaken(&self) -> usize {
        self.taken.iter().filter(|t| **t).count()
    }

    pub fn is_taken(&self, color: PlayerColor) -> bool {
        self.taken.get(color.index()).copied().unwrap_or(false)
    }

    /// take the lowest available slot
    pub fn take_first(&mut self) -> Option<PlayerColor> {
        let idx = self.taken.iter().position(|t| !t)?;
        self.taken[idx] = true;
        Some(PALETTE[idx])
    }

    /// take a specific slot
    pub fn take(&mut self, color: PlayerColor) -> Result<(), Error> {
        match self.taken.get_mut(color.index()) {
            None => Err(Error::SlotOutOfRange(color.index())),
            Some(true) => Err(Error::SlotTaken(color)),
            Some(slot) => {
                *slot = true;
                Ok(())
            }
        }
    }

    /// Release a slot. Returns false if the slot was not taken.
    pub fn release(&mut self, color: PlayerColor) -> bool {
        match self.taken.get_mut(color.index()) {
            Some(slot) if *slot => {
                *slot = false;
                true
            }
            _ => false,
        }
    }
}

#[test]
fn slots_lowest_first() {
    let mut slots = ColorSlots::new(3);
    assert_eq!(slots.take_first(), Some(PlayerColor::Red));
    assert_eq!(slots.take_first(), Some(PlayerColor::Green));
    assert!(slots.release(PlayerColor::Red));
    assert_eq!(slots.available(), vec![PlayerColor::Red, PlayerColor::Yellow]);
    assert_eq!(slots.take_first(), Some(PlayerColor::Red));
    assert_eq!(slots.take_first(), Some(PlayerColor::Yellow));
    assert_eq!(slots.take_first(), None);
    assert!(!slots.has_available());
}

#[test]
fn slots_take_and_release() {
    let mut slots = ColorSlots::new(2);
    assert!(slots.take(PlayerColor::Green).is_ok());
    assert_eq!(slots.take(PlayerColor::Green), Err(Error::SlotTaken(PlayerColor::Green)));
    assert_eq!(slots.take(PlayerColor::Cyan), Err(Error::SlotOutOfRange(5)));
    assert!(!slots.release(PlayerColor::Red));
    assert!(slots.release(PlayerColor::Green));
    assert_eq!(slots.ntaken(), 0);
    assert_eq!(ColorSlots::new(100).capacity(), PALETTE.len());
}

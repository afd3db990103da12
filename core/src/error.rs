//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use crate::color::PlayerColor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No player with the given color in the game
    NoSuchPlayer(PlayerColor),
    /// Color slot is already assigned to another player
    SlotTaken(PlayerColor),
    /// Slot index does not fit the game's capacity (argument is the index)
    SlotOutOfRange(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NoSuchPlayer(c) => write!(f, "no {} player in game", c),
            Error::SlotTaken(c) => write!(f, "color {} is already taken", c),
            Error::SlotOutOfRange(i) => write!(f, "slot {} is out of range", i),
        }
    }
}

impl std::error::Error for Error {}

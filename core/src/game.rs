//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::color::{ColorSlots, PlayerColor};
use crate::error::Error;
use crate::player::{Direction, Player, PlayerState, Pos};

// Design: the game owns every player, keyed by color. The color slots are the capacity of the
// game, so "is there room for another player" is "is there an available color".
//
// A tick moves every alive player by one cell. Collisions are computed against the board as it
// was before the tick (all trails and heads), plus head-on collisions between players entering
// the same cell.

/// Ticks a crashed player waits before starting over
pub const RESPAWN_TICKS: u32 = 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// arena width, in cells
    pub width: u16,
    /// arena height, in cells
    pub height: u16,
    /// maximum number of players (bounded by the palette)
    pub capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 78,
            height: 22,
            capacity: crate::color::PALETTE.len(),
        }
    }
}

pub struct Game<R: rand::Rng> {
    cfg: GameConfig,
    slots: ColorSlots,
    players: BTreeMap<PlayerColor, Player>,
    ticks: u64,
    rng: R,
}

impl<R: rand::Rng> Game<R> {
    pub fn new(cfg: GameConfig, rng: R) -> Game<R> {
        Game {
            slots: ColorSlots::new(cfg.capacity),
            cfg: cfg,
            players: BTreeMap::new(),
            ticks: 0,
            rng: rng,
        }
    }

    pub fn width(&self) -> u16 {
        self.cfg.width
    }

    pub fn height(&self) -> u16 {
        self.cfg.height
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn player(&self, color: PlayerColor) -> Option<&Player> {
        self.players.get(&color)
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, color: PlayerColor) -> Option<&mut Player> {
        self.players.get_mut(&color)
    }

    /// players, in palette order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Add a player with the given color. Fails if the color is taken or outside the capacity.
    pub fn add_player(&mut self, color: PlayerColor) -> Result<(), Error> {
        self.slots.take(color)?;
        let player = Player::new(self.cfg.width, self.cfg.height, color, &mut self.rng);
        self.players.insert(color, player);
        Ok(())
    }

    /// Remove a player, freeing its color
    pub fn remove_player(&mut self, color: PlayerColor) -> Result<Player, Error> {
        let player = self.players.remove(&color).ok_or(Error::NoSuchPlayer(color))?;
        self.slots.release(color);
        Ok(player)
    }

    pub fn turn(&mut self, color: PlayerColor, dir: Direction) -> Result<(), Error> {
        let player = self.players.get_mut(&color).ok_or(Error::NoSuchPlayer(color))?;
        player.turn(dir);
        Ok(())
    }

    /// Reinitialize a player, keeping its color
    pub fn start_over(&mut self, color: PlayerColor) -> Result<(), Error> {
        if !self.players.contains_key(&color) {
            return Err(Error::NoSuchPlayer(color));
        }
        let player = Player::new(self.cfg.width, self.cfg.height, color, &mut self.rng);
        self.players.insert(color, player);
        Ok(())
    }

    fn in_arena(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.cfg.width as i32 && p.y < self.cfg.height as i32
    }

    /// Cells that are occupied by a trail or a head of a player that is alive
    fn occupied(&self) -> HashSet<Pos> {
        let mut ret = HashSet::new();
        for p in self.players.values().filter(|p| p.is_alive()) {
            ret.insert(p.pos);
            ret.extend(p.trail.iter().copied());
        }
        ret
    }

    /// Advance the simulation by one step. Returns the colors of the players that crashed.
    pub fn tick(&mut self) -> Vec<PlayerColor> {
        self.ticks += 1;

        // respawns
        let mut respawn = vec![];
        for p in self.players.values_mut() {
            if let PlayerState::Crashed { respawn_in } = p.state {
                if respawn_in <= 1 {
                    respawn.push(p.color);
                } else {
                    p.state = PlayerState::Crashed { respawn_in: respawn_in - 1 };
                }
            }
        }
        for color in respawn {
            // the player exists, we just got the color from the map
            let _ = self.start_over(color);
        }

        let occupied = self.occupied();
        let mut heads: BTreeMap<Pos, Vec<PlayerColor>> = BTreeMap::new();
        for p in self.players.values().filter(|p| p.is_alive()) {
            heads.entry(p.next_pos()).or_default().push(p.color);
        }

        let mut crashed = vec![];
        for (pos, colors) in heads.iter() {
            let collision = colors.len() > 1 || !self.in_arena(*pos) || occupied.contains(pos);
            if collision {
                crashed.extend(colors.iter().copied());
            }
        }

        for p in self.players.values_mut() {
            if !p.is_alive() {
                continue;
            }
            if crashed.contains(&p.color) {
                p.crash(RESPAWN_TICKS);
            } else {
                p.advance();
                p.score += 1;
            }
        }

        crashed.sort();
        crashed
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

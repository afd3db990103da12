//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! Game simulation for lightcycles: players steer cycles around an arena, leaving trails
//! behind them. Everything in here is synchronous; the server drives it from a game task.

pub mod color;
pub mod error;
pub mod game;
pub mod player;
pub mod render;

#[cfg(test)]
mod tests;

pub use color::{ColorSlots, PlayerColor, PALETTE};
pub use error::Error;
pub use game::{Game, GameConfig};
pub use player::{Direction, Player, PlayerState, Pos};
pub use render::{put_command, render};

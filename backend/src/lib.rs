//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

// Here's the idea.
//
// Clients connect with a plain ssh client and get a terminal. Every session channel is a
// session: a player in a shared lightcycles arena.
//
// There is the directory actor that controls a mapping from id -> games, and reserves colors
// (i.e., capacity) in them.
// There is a game actor per game that runs the simulation and renders frames for its sessions.
// There is a session task per client that reads keys and steers the client's player.
//
// There is no authentication. Everyone can play.

pub mod acceptor;
pub mod bridge;
pub mod chararr_id;
pub mod config;
pub mod directory;
pub mod directory_task;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod game_task;
pub mod keymap;
pub mod session;
pub mod terminal;

pub use error::{Error, Result};

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::color::PlayerColor;

/// Maximum number of cells a trail keeps behind the head
pub const TRAIL_LEN: usize = 64;
/// Minimum distance from the walls when (re)spawning
pub const SPAWN_MARGIN: i32 = 3;

/// Arena position (column, row), (0,0) is the top-left cell
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const DIRECTIONS: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// glyph used to draw a head moving in this direction
    pub fn glyph(self) -> char {
        match self {
            Direction::Up => '^',
            Direction::Down => 'v',
            Direction::Left => '<',
            Direction::Right => '>',
        }
    }
}

impl Pos {
    pub fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        Pos { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Alive,
    /// crashed, starts over when the counter reaches zero
    Crashed { respawn_in: u32 },
}

#[derive(Clone, Debug)]
pub struct Player {
    pub color: PlayerColor,
    pub pos: Pos,
    /// heading used on the last move
    pub dir: Direction,
    /// heading for the next move
    next_dir: Direction,
    /// older cells first
    pub trail: VecDeque<Pos>,
    pub state: PlayerState,
    pub score: u32,
}

impl Player {
    /// Spawn a new player somewhere in a `width` x `height` arena
    pub fn new<R: rand::Rng>(width: u16, height: u16, color: PlayerColor, rng: &mut R) -> Player {
        let (w, h) = (width as i32, height as i32);
        let x = spawn_coord(w, rng);
        let y = spawn_coord(h, rng);
        let dir = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];

        Player {
            color: color,
            pos: Pos { x, y },
            dir: dir,
            next_dir: dir,
            trail: VecDeque::with_capacity(TRAIL_LEN),
            state: PlayerState::Alive,
            score: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == PlayerState::Alive
    }

    pub fn handle_up(&mut self) {
        self.turn(Direction::Up)
    }

    pub fn handle_down(&mut self) {
        self.turn(Direction::Down)
    }

    pub fn handle_left(&mut self) {
        self.turn(Direction::Left)
    }

    pub fn handle_right(&mut self) {
        self.turn(Direction::Right)
    }

    /// Change heading for the next move. Reversing onto the own trail is ignored, as is steering
    /// a crashed player.
    pub fn turn(&mut self, dir: Direction) {
        if !self.is_alive() || dir == self.dir.opposite() {
            return;
        }
        self.next_dir = dir;
    }

    /// where the head will be after the next move
    pub fn next_pos(&self) -> Pos {
        self.pos.step(self.next_dir)
    }

    /// Move the head one cell, leaving the old position on the trail
    pub fn advance(&mut self) {
        self.trail.push_back(self.pos);
        while self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
        self.dir = self.next_dir;
        self.pos = self.pos.step(self.dir);
    }

    pub fn crash(&mut self, respawn_in: u32) {
        self.state = PlayerState::Crashed { respawn_in };
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, pos: Pos, dir: Direction) {
        self.pos = pos;
        self.dir = dir;
        self.next_dir = dir;
        self.trail.clear();
    }
}

fn spawn_coord<R: rand::Rng>(len: i32, rng: &mut R) -> i32 {
    if len > 2 * SPAWN_MARGIN {
        rng.gen_range(SPAWN_MARGIN..len - SPAWN_MARGIN)
    } else {
        len / 2
    }
}

#[cfg(test)]
fn test_player() -> Player {
    let mut rng = rand::thread_rng();
    let mut p = Player::new(20, 10, PlayerColor::Blue, &mut rng);
    p.place(Pos { x: 5, y: 5 }, Direction::Right);
    p
}

#[test]
fn no_reversal() {
    let mut p = test_player();
    p.handle_left();
    assert_eq!(p.next_pos(), Pos { x: 6, y: 5 });
    p.handle_up();
    p.advance();
    assert_eq!(p.pos, Pos { x: 5, y: 4 });
    assert_eq!(p.dir, Direction::Up);
    // down is now the reverse direction
    p.handle_down();
    assert_eq!(p.next_pos(), Pos { x: 5, y: 3 });
}

#[test]
fn trail_is_bounded() {
    let mut p = test_player();
    p.pos = Pos { x: 0, y: 0 };
    for _ in 0..(TRAIL_LEN + 10) {
        p.advance();
    }
    assert_eq!(p.trail.len(), TRAIL_LEN);
    assert_eq!(p.trail.back(), Some(&Pos { x: (TRAIL_LEN + 9) as i32, y: 0 }));
}

#[test]
fn spawn_inside_margins() {
    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        let p = Player::new(78, 22, PlayerColor::Red, &mut rng);
        assert!(p.pos.x >= SPAWN_MARGIN && p.pos.x < 78 - SPAWN_MARGIN);
        assert!(p.pos.y >= SPAWN_MARGIN && p.pos.y < 22 - SPAWN_MARGIN);
        assert!(p.is_alive());
    }
}

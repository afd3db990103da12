//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! Frame rendering: the whole arena is redrawn on every frame, starting from the top-left corner
//! of the terminal. Frames are plain ANSI/VT100 byte strings.

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;
use std::fmt::Write;

use crate::color::PlayerColor;
use crate::game::Game;

const TRAIL: char = '#';
const CRASH: char = '*';

/// Append the escape sequence of `cmd` to `out`
pub fn put_command(out: &mut String, cmd: impl Command) {
    // writing into a String does not fail
    let _ = cmd.write_ansi(out);
}

fn end_line(out: &mut String) {
    put_command(out, Clear(ClearType::UntilNewLine));
    out.push_str("\r\n");
}

fn set_color(out: &mut String, color: PlayerColor) {
    put_command(out, SetAttribute(Attribute::Bold));
    put_command(out, SetForegroundColor(color.term_color()));
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Cell {
    Empty,
    Trail(PlayerColor),
    Head(PlayerColor, char),
}

/// Render the arena as seen by `viewer`. The viewer's head is drawn in reverse video.
pub fn render<R: rand::Rng>(game: &Game<R>, viewer: PlayerColor) -> Vec<u8> {
    let (w, h) = (game.width() as usize, game.height() as usize);
    let mut grid = vec![Cell::Empty; w * h];
    let idx = |x: i32, y: i32| -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            None
        } else {
            Some(y as usize * w + x as usize)
        }
    };

    for p in game.players() {
        for t in p.trail.iter() {
            if let Some(i) = idx(t.x, t.y) {
                grid[i] = Cell::Trail(p.color);
            }
        }
    }
    // heads go on top of trails
    for p in game.players() {
        if let Some(i) = idx(p.pos.x, p.pos.y) {
            let glyph = if p.is_alive() { p.dir.glyph() } else { CRASH };
            grid[i] = Cell::Head(p.color, glyph);
        }
    }

    let mut out = String::with_capacity((w + 16) * (h + 4));
    put_command(&mut out, MoveTo(0, 0));
    put_command(&mut out, SetAttribute(Attribute::Reset));

    let title = " lightcycles ";
    out.push('+');
    out.push_str(title);
    for _ in title.len()..w {
        out.push('-');
    }
    out.push('+');
    end_line(&mut out);

    for y in 0..h {
        out.push('|');
        let mut curr: Option<(PlayerColor, bool)> = None;
        for x in 0..w {
            let cell = grid[y * w + x];
            let style = match cell {
                Cell::Empty => None,
                Cell::Trail(c) => Some((c, false)),
                Cell::Head(c, _) => Some((c, c == viewer)),
            };
            if style != curr {
                put_command(&mut out, SetAttribute(Attribute::Reset));
                if let Some((c, reverse)) = style {
                    set_color(&mut out, c);
                    if reverse {
                        put_command(&mut out, SetAttribute(Attribute::Reverse));
                    }
                }
                curr = style;
            }
            out.push(match cell {
                Cell::Empty => ' ',
                Cell::Trail(_) => TRAIL,
                Cell::Head(_, g) => g,
            });
        }
        if curr.is_some() {
            put_command(&mut out, SetAttribute(Attribute::Reset));
        }
        out.push('|');
        end_line(&mut out);
    }

    out.push('+');
    for _ in 0..w {
        out.push('-');
    }
    out.push('+');
    end_line(&mut out);

    // status line
    for p in game.players() {
        let marker = if p.color == viewer { "*" } else { "" };
        set_color(&mut out, p.color);
        let _ = write!(out, "{}{}: {}", marker, p.color, p.score);
        put_command(&mut out, SetAttribute(Attribute::Reset));
        out.push(' ');
    }
    out.push_str("  (wasd/hjkl/arrows, esc to leave)");
    put_command(&mut out, Clear(ClearType::UntilNewLine));

    out.into_bytes()
}

#[test]
fn render_dimensions() {
    use crate::game::GameConfig;
    use crate::player::{Direction, Pos};

    let cfg = GameConfig { width: 20, height: 8, capacity: 2 };
    let mut game = Game::new(cfg, rand::thread_rng());
    game.add_player(PlayerColor::Red).unwrap();
    game.add_player(PlayerColor::Green).unwrap();
    // keep the heads apart
    game.player_mut(PlayerColor::Red).unwrap().place(Pos { x: 2, y: 2 }, Direction::Right);
    game.player_mut(PlayerColor::Green).unwrap().place(Pos { x: 12, y: 5 }, Direction::Left);

    let frame = String::from_utf8(render(&game, PlayerColor::Red)).unwrap();
    let mut home = String::new();
    put_command(&mut home, MoveTo(0, 0));
    assert!(frame.starts_with(&home));
    // top border, 8 rows, bottom border and the status line
    assert_eq!(frame.matches("\r\n").count(), 8 + 2);
    assert!(frame.contains("*red: 0"));
    assert!(frame.contains("green: 0"));
    // exactly one reversed head: the viewer's
    let mut reverse = String::new();
    put_command(&mut reverse, SetAttribute(Attribute::Reverse));
    assert_eq!(frame.matches(reverse.as_str()).count(), 1);
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use rand::SeedableRng;

use crate::{
    color::PlayerColor,
    error::Error,
    game::{Game, GameConfig, RESPAWN_TICKS},
    player::{Direction, Pos},
};

type Rng = rand_pcg::Pcg64;

fn mk_game(width: u16, height: u16, capacity: usize) -> Game<Rng> {
    let cfg = GameConfig { width, height, capacity };
    Game::new(cfg, Rng::seed_from_u64(42))
}

fn place(game: &mut Game<Rng>, color: PlayerColor, x: i32, y: i32, dir: Direction) {
    game.player_mut(color).unwrap().place(Pos { x, y }, dir);
}

#[test]
fn add_remove_frees_color() {
    let mut game = mk_game(20, 10, 4);
    assert_eq!(game.players().count(), 0);

    game.add_player(PlayerColor::Red).unwrap();
    game.add_player(PlayerColor::Green).unwrap();
    assert_eq!(game.players().count(), 2);

    // a color is never assigned twice
    assert_eq!(game.add_player(PlayerColor::Red), Err(Error::SlotTaken(PlayerColor::Red)));

    game.remove_player(PlayerColor::Red).unwrap();
    assert!(game.player(PlayerColor::Red).is_none());
    assert!(game.remove_player(PlayerColor::Red).is_err());
    assert_eq!(game.players().count(), 1);
}

#[test]
fn full_game_has_no_colors() {
    let mut game = mk_game(20, 10, 2);
    game.add_player(PlayerColor::Red).unwrap();
    game.add_player(PlayerColor::Green).unwrap();
    assert_eq!(game.add_player(PlayerColor::Yellow), Err(Error::SlotOutOfRange(2)));
}

#[test]
fn wall_crash_and_respawn() {
    let mut game = mk_game(10, 10, 2);
    game.add_player(PlayerColor::Blue).unwrap_err();
    game.add_player(PlayerColor::Red).unwrap();
    place(&mut game, PlayerColor::Red, 9, 5, Direction::Right);

    let crashed = game.tick();
    assert_eq!(crashed, vec![PlayerColor::Red]);
    assert!(!game.player(PlayerColor::Red).unwrap().is_alive());

    // steering a crashed player does nothing, and it keeps its color
    game.turn(PlayerColor::Red, Direction::Up).unwrap();
    for _ in 0..RESPAWN_TICKS {
        game.tick();
    }
    let p = game.player(PlayerColor::Red).unwrap();
    assert!(p.is_alive());
    assert_eq!(p.color, PlayerColor::Red);
    assert_eq!(game.players().count(), 1);
}

#[test]
fn head_on_crash() {
    let mut game = mk_game(20, 10, 2);
    game.add_player(PlayerColor::Red).unwrap();
    game.add_player(PlayerColor::Green).unwrap();
    place(&mut game, PlayerColor::Red, 4, 5, Direction::Right);
    place(&mut game, PlayerColor::Green, 6, 5, Direction::Left);

    let crashed = game.tick();
    assert_eq!(crashed, vec![PlayerColor::Red, PlayerColor::Green]);
}

#[test]
fn trail_crash_scores_the_survivor() {
    let mut game = mk_game(20, 10, 2);
    game.add_player(PlayerColor::Red).unwrap();
    game.add_player(PlayerColor::Green).unwrap();
    // red runs along row 5, green comes down column 6 and hits the trail
    place(&mut game, PlayerColor::Red, 5, 5, Direction::Right);
    place(&mut game, PlayerColor::Green, 6, 2, Direction::Down);

    assert!(game.tick().is_empty()); // red (6,5), green (6,3)
    assert!(game.tick().is_empty()); // red (7,5), green (6,4)
    assert_eq!(game.tick(), vec![PlayerColor::Green]); // green would enter (6,5)

    assert_eq!(game.player(PlayerColor::Red).unwrap().score, 3);
    assert_eq!(game.player(PlayerColor::Green).unwrap().score, 2);
}

#[test]
fn turn_unknown_player() {
    let mut game = mk_game(20, 10, 2);
    assert_eq!(
        game.turn(PlayerColor::Cyan, Direction::Up),
        Err(Error::NoSuchPlayer(PlayerColor::Cyan))
    );
    assert!(game.start_over(PlayerColor::Red).is_err());
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use lightcycles_core::Direction;

use crate::terminal::KeyCode;

/// What a key press asks for
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    /// Leave the game
    Leave,
}

// wasd, vi keys and their Dvorak positions (, a o e)
pub const UP_KEYS: &[char] = &['w', 'k', ','];
pub const LEFT_KEYS: &[char] = &['a', 'h'];
pub const DOWN_KEYS: &[char] = &['s', 'j', 'o'];
pub const RIGHT_KEYS: &[char] = &['d', 'l', 'e'];

/// Map a key code to an action. Letters are case-insensitive; unmapped keys give `None`.
pub fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::CTRL_C | KeyCode::ESCAPE => return Some(Action::Leave),
        KeyCode::UP => return Some(Action::Move(Direction::Up)),
        KeyCode::DOWN => return Some(Action::Move(Direction::Down)),
        KeyCode::LEFT => return Some(Action::Move(Direction::Left)),
        KeyCode::RIGHT => return Some(Action::Move(Direction::Right)),
        _ => (),
    }

    let c = char::from_u32(key.0)?.to_ascii_lowercase();
    let dir = if UP_KEYS.contains(&c) {
        Direction::Up
    } else if LEFT_KEYS.contains(&c) {
        Direction::Left
    } else if DOWN_KEYS.contains(&c) {
        Direction::Down
    } else if RIGHT_KEYS.contains(&c) {
        Direction::Right
    } else {
        return None;
    };
    Some(Action::Move(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: char) -> KeyCode {
        KeyCode(c as u32)
    }

    #[test]
    fn aliases_agree() {
        let sets = [
            (UP_KEYS, Direction::Up),
            (LEFT_KEYS, Direction::Left),
            (DOWN_KEYS, Direction::Down),
            (RIGHT_KEYS, Direction::Right),
        ];
        for (keys, dir) in sets.iter() {
            for k in keys.iter() {
                assert_eq!(action_for(code(*k)), Some(Action::Move(*dir)), "key {:?}", k);
                let upper = k.to_ascii_uppercase();
                assert_eq!(action_for(code(upper)), Some(Action::Move(*dir)), "key {:?}", upper);
            }
        }
    }

    #[test]
    fn special_keys() {
        assert_eq!(action_for(KeyCode::CTRL_C), Some(Action::Leave));
        assert_eq!(action_for(KeyCode::ESCAPE), Some(Action::Leave));
        assert_eq!(action_for(KeyCode::UP), Some(Action::Move(Direction::Up)));
        assert_eq!(action_for(KeyCode::RIGHT), Some(Action::Move(Direction::Right)));
    }

    #[test]
    fn total_and_deterministic() {
        // every code maps to at most one action, the same one every time
        for c in 0..1024u32 {
            assert_eq!(action_for(KeyCode(c)), action_for(KeyCode(c)));
        }
        assert_eq!(action_for(code('x')), None);
        assert_eq!(action_for(KeyCode::NONE), None);
        assert_eq!(action_for(KeyCode(0x11_0000)), None);
    }
}

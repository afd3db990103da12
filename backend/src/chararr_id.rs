//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use rand::{distributions::Alphanumeric, Rng};

/// Macro to define char array ids.

macro_rules! define_chararr_id {
    ($t:ident, $l:expr) => {

        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $t(pub [char; $l]);

        impl $t {
            pub fn len() -> usize { $l }

            pub fn new_random() -> Self {
                let mut rarr: [char; $l] = ['x'; $l];
                let iter = rand::thread_rng().sample_iter(&Alphanumeric).take(rarr.len());
                for (i, c) in iter.enumerate() {
                    rarr[i] = char::from(c);
                }

                Self(rarr)
            }

            pub fn from_string(s: &str) -> Option<Self> {
                if s.chars().count() != $l {
                    return None
                }

                let mut arr: [char; $l] = ['y'; $l];
                for (i,c) in s.chars().enumerate() {
                    arr[i] = c;
                }

                Some(Self(arr))
            }
        }

        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                for c in self.0.iter() {
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
        }
    };
}

// game names show up in the logs, they don't have to be long
define_chararr_id!(GameId, 8);

#[test]
fn game_id_string() {
    let gid = GameId::new_random();
    let s = gid.to_string();
    assert_eq!(s.len(), GameId::len());
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(GameId::from_string(&s), Some(gid));
    assert_eq!(GameId::from_string("short"), None);
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use lightcycles_core::{ColorSlots, GameConfig, PlayerColor};

use crate::{
    directory_task::{Counts, DirReq, DirTaskRx, DirectoryHandle, GameInfo, Seat},
    dispatch::{CriticalSection, DispatchScope},
    game::{spawn_game_task, GameId},
    game_task::{GameHandle, GameReq},
};

/// What the directory needs to create games
#[derive(Debug, Clone, Copy)]
pub struct DirConfig {
    pub world: GameConfig,
    pub tick: Duration,
    pub dispatch: DispatchScope,
}

/**
 * Directory structures
 */

struct GameEntry {
    game: GameHandle,
    /// colors reserved for sessions. The directory is the authority on capacity: the game task
    /// only ever sees colors reserved here.
    slots: ColorSlots,
    gate: Arc<CriticalSection>,
}

struct Directory {
    /// ht: maps game ids to game entries
    ht: HashMap<GameId, GameEntry>,
    self_rx: DirTaskRx,
    cfg: DirConfig,
    /// shared by every game under the global dispatch scope
    global_gate: Arc<CriticalSection>,
}

impl Directory {
    pub fn new(rx: DirTaskRx, cfg: DirConfig) -> Directory {
        Directory {
            ht: HashMap::new(),
            self_rx: rx,
            cfg: cfg,
            global_gate: CriticalSection::new(),
        }
    }

    fn find_with_capacity(&self) -> Option<GameId> {
        self.ht
            .iter()
            .find(|(_, e)| e.slots.has_available())
            .map(|(gid, _)| *gid)
    }

    // create a new game:
    //  - add an entry to the directory
    //  - spawn a task for the game, and keep its handle in the table
    fn new_game(&mut self) -> GameId {
        loop {
            let gid = GameId::new_random();
            match self.ht.entry(gid) {
                Entry::Occupied(_) => continue, // retry
                Entry::Vacant(e) => {
                    let game = spawn_game_task(gid, self.cfg.world, self.cfg.tick);
                    let gate = match self.cfg.dispatch {
                        DispatchScope::Global => self.global_gate.clone(),
                        DispatchScope::PerGame => CriticalSection::new(),
                    };
                    e.insert(GameEntry {
                        game: game,
                        slots: ColorSlots::new(self.cfg.world.capacity),
                        gate: gate,
                    });
                    log::info!("created game {}", gid);
                    return gid;
                }
            }
        }
    }

    fn ensure_game(&mut self) -> Seat {
        let mut gid = match self.find_with_capacity() {
            Some(gid) => gid,
            None => self.new_game(),
        };

        // a game we found has a free color, and a new game has all of them
        loop {
            if let Some(entry) = self.ht.get_mut(&gid) {
                if let Some(color) = entry.slots.take_first() {
                    return Seat {
                        game: entry.game.clone(),
                        color: color,
                        width: self.cfg.world.width,
                        height: self.cfg.world.height,
                        gate: entry.gate.clone(),
                    };
                }
            }
            log::error!("game {} has no free color after all", gid);
            gid = self.new_game();
        }
    }

    async fn leave(&mut self, gid: GameId, color: PlayerColor) -> bool {
        let entry = match self.ht.get_mut(&gid) {
            Some(e) => e,
            None => {
                log::warn!("leave: no game {}", gid);
                return false;
            }
        };
        if !entry.slots.release(color) {
            log::warn!("leave: {} was not taken in game {}", color, gid);
        }
        if entry.slots.ntaken() > 0 {
            return false;
        }
        self.remove_game(gid).await
    }

    async fn remove(&mut self, gid: GameId) -> bool {
        match self.ht.get(&gid) {
            None => false,
            Some(e) if e.slots.ntaken() > 0 => {
                log::warn!("refusing to remove game {}: {} sessions", gid, e.slots.ntaken());
                false
            }
            Some(_) => self.remove_game(gid).await,
        }
    }

    async fn remove_game(&mut self, gid: GameId) -> bool {
        let entry = match self.ht.remove(&gid) {
            Some(e) => e,
            None => return false,
        };
        if entry.game.tx.send(GameReq::Shutdown).await.is_err() {
            log::debug!("game {} already stopped", gid);
        }
        log::info!("removed game {}", gid);
        true
    }

    fn counts(&self) -> Counts {
        Counts {
            sessions: self.ht.values().map(|e| e.slots.ntaken()).sum(),
            games: self.ht.len(),
        }
    }

    fn snapshot(&self) -> Vec<GameInfo> {
        self.ht
            .iter()
            .map(|(gid, e)| GameInfo {
                gid: *gid,
                sessions: e.slots.ntaken(),
                available: e.slots.available(),
            })
            .collect()
    }

    async fn task(mut self) {
        while let Some(cmd) = self.self_rx.recv().await {
            match cmd {
                DirReq::FindWithCapacity(rep_tx) => {
                    reply(rep_tx, self.find_with_capacity());
                }

                DirReq::EnsureGame(rep_tx) => {
                    let seat = self.ensure_game();
                    if let Err(seat) = rep_tx.send(seat) {
                        // requester went away: give the color back
                        log::debug!("EnsureGame requester is gone");
                        self.leave(seat.game.gid, seat.color).await;
                    }
                }

                DirReq::Leave(gid, color, rep_tx) => {
                    let removed = self.leave(gid, color).await;
                    reply(rep_tx, removed);
                }

                DirReq::Remove(gid, rep_tx) => {
                    let removed = self.remove(gid).await;
                    reply(rep_tx, removed);
                }

                DirReq::Counts(rep_tx) => reply(rep_tx, self.counts()),

                DirReq::Snapshot(rep_tx) => reply(rep_tx, self.snapshot()),
            }
        }

        // every handle is gone: so are the sessions
        for (gid, _) in self.ht.drain() {
            log::debug!("directory exiting, dropping game {}", gid);
        }
    }
}

fn reply<T>(rep_tx: oneshot::Sender<T>, val: T) {
    if rep_tx.send(val).is_err() {
        log::error!("Error sending directory reply")
    }
}

pub fn spawn_directory_task(cfg: DirConfig) -> DirectoryHandle {
    let (dir_tx, dir_rx) = tokio::sync::mpsc::channel::<DirReq>(1024);
    let dir = Directory::new(dir_rx, cfg);
    // NB: we are detaching the directory task by dropping its handle
    let _dir_task = tokio::spawn(dir.task());
    DirectoryHandle::new(dir_tx)
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;

use lightcycles_core::{GameConfig, PlayerColor};

use crate::game_task::{FrameTx, GameHandle, GameReq, GameTaskRx};
use rand::SeedableRng;
type Rng = rand_pcg::Pcg64;

/**
 * Backend-side game structures
 */

pub use crate::chararr_id::GameId;

struct Game {
    gid: GameId,
    self_rx: GameTaskRx,
    tick: Duration,
    /// frame queues of the sessions, by their player's color
    sessions: BTreeMap<PlayerColor, FrameTx>,
    sim: lightcycles_core::Game<Rng>,
}

impl Game {
    pub fn new(gid: GameId, cfg: GameConfig, tick: Duration, self_rx: GameTaskRx) -> Game {
        Game {
            gid: gid,
            self_rx: self_rx,
            tick: tick,
            sessions: BTreeMap::new(),
            sim: lightcycles_core::Game::new(cfg, Rng::from_entropy()),
        }
    }

    fn handle_req(&mut self, req: GameReq) {
        match req {
            GameReq::AddSession(color, frames, rep_tx) => {
                let ret = self.sim.add_player(color);
                if ret.is_ok() {
                    self.sessions.insert(color, frames);
                    self.send_frame(color);
                    log::debug!("game {}: {} joined", self.gid, color);
                }
                if rep_tx.send(ret).is_err() {
                    log::debug!("game {}: AddSession requester is gone", self.gid);
                }
            }

            GameReq::RemoveSession(color) => {
                self.sessions.remove(&color);
                match self.sim.remove_player(color) {
                    Ok(p) => log::debug!("game {}: {} left with score {}", self.gid, color, p.score),
                    Err(e) => log::warn!("game {}: removing session: {}", self.gid, e),
                }
            }

            GameReq::Steer(color, dir, rep_tx) => {
                let _ = rep_tx.send(self.sim.turn(color, dir));
            }

            GameReq::StartOver(color, rep_tx) => {
                let _ = rep_tx.send(self.sim.start_over(color));
            }

            GameReq::SessionCount(rep_tx) => {
                let _ = rep_tx.send(self.sessions.len());
            }

            // handled by the task loop
            GameReq::Shutdown => (),
        }
    }

    /// Render the arena for one session and queue it. A full queue drops the frame.
    fn send_frame(&mut self, color: PlayerColor) {
        let tx = match self.sessions.get(&color) {
            Some(tx) => tx,
            None => return,
        };
        let frame = Bytes::from(lightcycles_core::render(&self.sim, color));
        match tx.try_send(frame) {
            Ok(()) | Err(TrySendError::Full(_)) => (),
            Err(TrySendError::Closed(_)) => {
                // the session is on its way out, stop rendering for it
                self.sessions.remove(&color);
            }
        }
    }

    fn step(&mut self) {
        let crashed = self.sim.tick();
        if !crashed.is_empty() {
            log::debug!("game {}: tick {}: crashed: {:?}", self.gid, self.sim.ticks(), crashed);
        }
        let colors: Vec<PlayerColor> = self.sessions.keys().copied().collect();
        for color in colors {
            self.send_frame(color);
        }
    }

    async fn task(mut self) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                req = self.self_rx.recv() => match req {
                    None | Some(GameReq::Shutdown) => break,
                    Some(req) => self.handle_req(req),
                },
                _ = ticker.tick() => self.step(),
            }
        }

        log::info!("game {}: stopped after {} ticks", self.gid, self.sim.ticks());
    }
}

pub fn spawn_game_task(gid: GameId, cfg: GameConfig, tick: Duration) -> GameHandle {
    let (game_tx, game_rx) = mpsc::channel::<GameReq>(1024);
    let game = Game::new(gid, cfg, tick, game_rx);
    // NB: we are detaching the game task by dropping its handle
    let _game_task = tokio::spawn(game.task());
    GameHandle { gid, tx: game_tx }
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

/**
 * Game task structures
 */

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use lightcycles_core::{Direction, PlayerColor};

use crate::error::{Error, Result};
use crate::game::GameId;

/// Rendered frames for one session
pub type FrameTx = mpsc::Sender<Bytes>;
pub type FrameRx = mpsc::Receiver<Bytes>;

/// Frames a session may fall behind before frames are dropped
pub const FRAME_QUEUE: usize = 4;

/// Game task requests
#[derive(Debug)]
pub enum GameReq {
    /// Add a session's player, with the color reserved for it in the directory
    AddSession(PlayerColor, FrameTx, oneshot::Sender<std::result::Result<(), lightcycles_core::Error>>),
    /// Remove a session's player, freeing its color
    RemoveSession(PlayerColor),
    /// Turn a player. The reply is sent once the turn has been applied.
    Steer(PlayerColor, Direction, oneshot::Sender<std::result::Result<(), lightcycles_core::Error>>),
    /// Reinitialize a player, keeping its color
    StartOver(PlayerColor, oneshot::Sender<std::result::Result<(), lightcycles_core::Error>>),
    SessionCount(oneshot::Sender<usize>),
    /// Stop the simulation. Sent by the directory when the game is removed.
    Shutdown,
}

/// Channel for {<sessions>, <directory>} -> <game_task> communication
pub type GameTaskTx = mpsc::Sender<GameReq>;
pub type GameTaskRx = mpsc::Receiver<GameReq>;

#[derive(Debug, Clone)]
pub struct GameHandle {
    pub gid: GameId,
    pub tx: GameTaskTx,
}

impl GameHandle {
    async fn call<T>(&self, mk: impl FnOnce(oneshot::Sender<T>) -> GameReq) -> Result<T> {
        let (rep_tx, rep_rx) = oneshot::channel();
        self.tx.send(mk(rep_tx)).await.map_err(|_| Error::GameGone(self.gid))?;
        rep_rx.await.map_err(|_| Error::GameGone(self.gid))
    }

    pub async fn add_session(&self, color: PlayerColor, frames: FrameTx) -> Result<()> {
        self.call(|rep| GameReq::AddSession(color, frames, rep)).await??;
        Ok(())
    }

    pub async fn remove_session(&self, color: PlayerColor) -> Result<()> {
        self.tx
            .send(GameReq::RemoveSession(color))
            .await
            .map_err(|_| Error::GameGone(self.gid))
    }

    pub async fn steer(&self, color: PlayerColor, dir: Direction) -> Result<()> {
        self.call(|rep| GameReq::Steer(color, dir, rep)).await??;
        Ok(())
    }

    pub async fn start_over(&self, color: PlayerColor) -> Result<()> {
        self.call(|rep| GameReq::StartOver(color, rep)).await??;
        Ok(())
    }

    pub async fn session_count(&self) -> Result<usize> {
        self.call(GameReq::SessionCount).await
    }
}

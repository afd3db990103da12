//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use lightcycles_core::PlayerColor;

use crate::dispatch::CriticalSection;
use crate::error::{Error, Result};
use crate::game::GameId;
use crate::game_task::GameHandle;

/// A reserved place in a game: the color is taken for the caller until it calls `leave`
#[derive(Clone)]
pub struct Seat {
    pub game: GameHandle,
    pub color: PlayerColor,
    pub width: u16,
    pub height: u16,
    /// critical section for the seat's input dispatch
    pub gate: Arc<CriticalSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub sessions: usize,
    pub games: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub gid: GameId,
    pub sessions: usize,
    pub available: Vec<PlayerColor>,
}

/// Directory requests (includes oneshot channels for replies as needed)
pub enum DirReq {
    /// A game with at least one available color, if any
    FindWithCapacity(oneshot::Sender<Option<GameId>>),
    /// Reserve a color in a game with capacity, creating a game if there is none
    EnsureGame(oneshot::Sender<Seat>),
    /// Release a color. Replies whether the game was removed because it became empty.
    Leave(GameId, PlayerColor, oneshot::Sender<bool>),
    /// Remove an empty game. Replies whether the game was removed.
    Remove(GameId, oneshot::Sender<bool>),
    Counts(oneshot::Sender<Counts>),
    Snapshot(oneshot::Sender<Vec<GameInfo>>),
}

/// A channel to send requests to the directory task
pub type DirTaskTx = mpsc::Sender<DirReq>;
/// A channel to receive directory requests
pub type DirTaskRx = mpsc::Receiver<DirReq>;

/// Client side of the directory task
#[derive(Clone)]
pub struct DirectoryHandle {
    tx: DirTaskTx,
}

impl DirectoryHandle {
    pub fn new(tx: DirTaskTx) -> DirectoryHandle {
        DirectoryHandle { tx }
    }

    async fn call<T>(&self, mk: impl FnOnce(oneshot::Sender<T>) -> DirReq) -> Result<T> {
        let (rep_tx, rep_rx) = oneshot::channel();
        self.tx.send(mk(rep_tx)).await.map_err(|_| Error::DirectoryGone)?;
        rep_rx.await.map_err(|_| Error::DirectoryGone)
    }

    pub async fn find_game_with_capacity(&self) -> Result<Option<GameId>> {
        self.call(DirReq::FindWithCapacity).await
    }

    pub async fn ensure_game(&self) -> Result<Seat> {
        self.call(DirReq::EnsureGame).await
    }

    pub async fn leave(&self, gid: GameId, color: PlayerColor) -> Result<bool> {
        self.call(|rep| DirReq::Leave(gid, color, rep)).await
    }

    pub async fn remove(&self, gid: GameId) -> Result<bool> {
        self.call(|rep| DirReq::Remove(gid, rep)).await
    }

    pub async fn counts(&self) -> Result<Counts> {
        self.call(DirReq::Counts).await
    }

    pub async fn session_count(&self) -> Result<usize> {
        Ok(self.counts().await?.sessions)
    }

    pub async fn game_count(&self) -> Result<usize> {
        Ok(self.counts().await?.games)
    }

    pub async fn snapshot(&self) -> Result<Vec<GameInfo>> {
        self.call(DirReq::Snapshot).await
    }
}

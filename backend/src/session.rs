//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! A session binds one terminal to one player in one game.
//!
//! Lifecycle: `join` sets up the terminal and takes a seat (Connected), `run` dispatches keys
//! until the player leaves or the connection goes away (Active), and then gives the seat back
//! (Disconnected). Frames rendered by the game task are drawn as they arrive.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lightcycles_core::PlayerColor;

use crate::directory_task::{DirectoryHandle, Seat};
use crate::dispatch::SessionId;
use crate::error::{Error, Result};
use crate::game::GameId;
use crate::game_task::{FrameRx, FRAME_QUEUE};
use crate::keymap::{action_for, Action};
use crate::terminal::{KeyCode, Terminal};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// seated, not dispatching yet
    Connected,
    /// running the input loop
    Active,
    /// left the game
    Disconnected,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// the player asked to leave
    Quit,
    /// the input stream closed, or the session was cancelled
    Disconnected,
}

pub struct Session<R, W> {
    sid: SessionId,
    seat: Seat,
    terminal: Terminal<R, W>,
    frames: FrameRx,
    state: LinkState,
}

enum Event {
    Cancelled,
    Frame(Option<Bytes>),
    Key(Result<KeyCode>),
}

/// Set a session up on `terminal`: open the screen, take a seat in a game (creating one if
/// needed) and register with that game.
///
/// If the screen cannot be opened, nothing is registered.
pub async fn join<R, W>(dir: &DirectoryHandle, mut terminal: Terminal<R, W>) -> Result<Session<R, W>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    terminal.screen.open().await?;

    let seat = dir.ensure_game().await?;
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_QUEUE);
    if let Err(e) = seat.game.add_session(seat.color, frames_tx).await {
        log::error!("game {}: failed to add session: {}", seat.game.gid, e);
        dir.leave(seat.game.gid, seat.color).await?;
        return Err(e);
    }

    let sid = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    log::debug!("session {}: {} in game {} ({}x{})", sid, seat.color, seat.game.gid, seat.width, seat.height);
    Ok(Session {
        sid: sid,
        seat: seat,
        terminal: terminal,
        frames: frames_rx,
        state: LinkState::Connected,
    })
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn id(&self) -> SessionId {
        self.sid
    }

    pub fn color(&self) -> PlayerColor {
        self.seat.color
    }

    pub fn game_id(&self) -> GameId {
        self.seat.game.gid
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    fn set_state(&mut self, state: LinkState) {
        log::debug!("session {}: {:?} -> {:?}", self.sid, self.state, state);
        self.state = state;
    }

    /// Reinitialize the player, keeping its color
    pub async fn start_over(&self) -> Result<()> {
        self.seat.game.start_over(self.seat.color).await
    }

    /// Run the input loop until the player leaves or `cancel` fires, then leave the game.
    pub async fn run(mut self, dir: &DirectoryHandle, cancel: CancellationToken) -> Result<Exit> {
        self.set_state(LinkState::Active);
        let ret = self.input_loop(&cancel).await;
        self.set_state(LinkState::Disconnected);

        let game = &self.seat.game;
        if let Err(e) = game.remove_session(self.seat.color).await {
            log::debug!("session {}: {}", self.sid, e);
        }
        if dir.leave(game.gid, self.seat.color).await? {
            log::debug!("session {}: was the last one in game {}", self.sid, game.gid);
        }

        if let Err(e) = self.terminal.screen.close().await {
            log::debug!("session {}: closing screen: {}", self.sid, e);
        }
        ret
    }

    async fn next_event(&mut self, cancel: &CancellationToken) -> Event {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Event::Cancelled,
            frame = self.frames.recv() => Event::Frame(frame),
            key = self.terminal.keys.read_key() => Event::Key(key),
        }
    }

    async fn input_loop(&mut self, cancel: &CancellationToken) -> Result<Exit> {
        loop {
            let key = match self.next_event(cancel).await {
                Event::Cancelled => return Ok(Exit::Disconnected),
                Event::Frame(Some(frame)) => {
                    if let Err(e) = self.terminal.screen.draw(&frame).await {
                        log::debug!("session {}: draw failed: {}", self.sid, e);
                        return Ok(Exit::Disconnected);
                    }
                    continue;
                }
                Event::Frame(None) => return Err(Error::GameGone(self.seat.game.gid)),
                Event::Key(Err(Error::ConnectionClosed)) => return Ok(Exit::Disconnected),
                Event::Key(Err(e)) => return Err(e),
                Event::Key(Ok(key)) => key,
            };

            if key.is_none() {
                log::warn!("session {}: error reading key from terminal", self.sid);
                continue;
            }

            let _dispatch = self.seat.gate.enter(self.sid).await;
            match action_for(key) {
                Some(Action::Move(dir)) => self.seat.game.steer(self.seat.color, dir).await?,
                Some(Action::Leave) => return Ok(Exit::Quit),
                None => (),
            }
        }
    }
}

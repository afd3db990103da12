//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, Pty};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::bridge::bridge;
use crate::directory_task::DirectoryHandle;
use crate::error::Error;
use crate::session;
use crate::terminal::Terminal;

/// Channel requests we say yes to. Everything else is refused.
pub fn accepts_request(kind: &str) -> bool {
    matches!(kind, "pty-req" | "shell")
}

/// Per-connection SSH handler.
///
/// Only "session" channels are served. Other channel types are refused by the defaults of
/// `server::Handler` (or by russh itself, for types it does not know).
pub struct Acceptor {
    peer: SocketAddr,
    dir: DirectoryHandle,
}

impl Acceptor {
    pub fn new(peer: SocketAddr, dir: DirectoryHandle) -> Acceptor {
        Acceptor { peer, dir }
    }

    fn reply(&self, channel: ChannelId, kind: &str, session: &mut Session) -> Result<(), Error> {
        if accepts_request(kind) {
            log::debug!("{}: channel request {}: accepted", self.peer, kind);
            session.channel_success(channel)?;
        } else {
            log::debug!("{}: channel request {}: refused", self.peer, kind);
            session.channel_failure(channel)?;
        }
        Ok(())
    }
}

impl server::Handler for Acceptor {
    type Error = Error;

    // There is no authentication. Everyone can play.
    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        log::debug!("{}: user {:?}", self.peer, user);
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        session: &mut Session,
    ) -> Result<bool, Self::Error> {
        start_session(self.peer, self.dir.clone(), channel, session.handle());
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.reply(channel, "pty-req", session)
    }

    async fn shell_request(&mut self, channel: ChannelId, session: &mut Session) -> Result<(), Self::Error> {
        self.reply(channel, "shell", session)
    }

    async fn exec_request(&mut self, channel: ChannelId, _data: &[u8], session: &mut Session) -> Result<(), Self::Error> {
        self.reply(channel, "exec", session)
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        _name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.reply(channel, "subsystem", session)
    }
}

/// Run a game session on an accepted channel: bridge, terminal, session.
/// The channel is closed once the session is over.
fn start_session(peer: SocketAddr, dir: DirectoryHandle, channel: Channel<Msg>, handle: server::Handle) {
    let id = channel.id();
    let cancel = CancellationToken::new();
    let (reader, writer, legs) = bridge(channel.into_stream(), cancel.clone());
    let terminal = Terminal::new(reader, writer);

    tokio::spawn(async move {
        match session::join(&dir, terminal).await {
            Ok(s) => {
                let (sid, color, gid) = (s.id(), s.color(), s.game_id());
                log_stats(&dir, "Player joined").await;
                match s.run(&dir, cancel).await {
                    Ok(exit) => log::info!("{}: session {} ({} in {}): {:?}", peer, sid, color, gid, exit),
                    Err(e) => log::warn!("{}: session {} ended: {}", peer, sid, e),
                }
                log_stats(&dir, "Player left").await;
            }
            Err(e) => log::error!("{}: session setup failed: {}", peer, e),
        }
        legs.finish().await;
        if handle.close(id).await.is_err() {
            log::debug!("{}: connection gone before channel close", peer);
        }
    });
}

/// Serve one client connection until it goes away.
///
/// Errors stay within the connection: they are logged here and never returned.
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, dir: DirectoryHandle, config: Arc<server::Config>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let running = match server::run_stream(config, stream, Acceptor::new(peer, dir)).await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("{}: failed to handshake with new client: {}", peer, e);
            return;
        }
    };
    if let Err(e) = running.await {
        log::debug!("{}: {}", peer, e);
    }
    log::debug!("{}: connection closed", peer);
}

async fn log_stats(dir: &DirectoryHandle, what: &str) {
    match dir.counts().await {
        Ok(c) => log::info!("{}. Current stats: {} users, {} games", what, c.sessions, c.games),
        Err(e) => log::warn!("{}: {}", what, e),
    }
}

//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use futures::future;
use russh::client::{self, Msg};
use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::{Algorithm, PrivateKey, PublicKey};
use russh::{Channel, ChannelMsg, Disconnect};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use lightcycles_backend::{
    acceptor::handle_connection,
    config::ssh_server_config,
    directory::{spawn_directory_task, DirConfig},
    directory_task::{Counts, DirectoryHandle},
    dispatch::DispatchScope,
};
use lightcycles_core::GameConfig;

fn directory(capacity: usize) -> DirectoryHandle {
    spawn_directory_task(DirConfig {
        world: GameConfig { width: 40, height: 15, capacity: capacity },
        tick: Duration::from_millis(30),
        dispatch: DispatchScope::Global,
    })
}

struct Player;

impl client::Handler for Player {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

type Conn = client::Handle<Player>;

/// Serve a connection over an in-memory pipe
fn serve(dir: &DirectoryHandle) -> tokio::io::DuplexStream {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap();
    let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    tokio::spawn(handle_connection(server_io, peer, dir.clone(), ssh_server_config(key)));
    client_io
}

/// Connect as an ssh client, without credentials
async fn client(dir: &DirectoryHandle) -> Conn {
    let config = Arc::new(client::Config::default());
    let mut conn = client::connect_stream(config, serve(dir), Player).await.unwrap();
    assert!(conn.authenticate_none("player").await.unwrap().success());
    conn
}

/// Wait for the answer to a channel request. Returns the screen output that came before it.
async fn answer(chan: &mut Channel<Msg>) -> (bool, Vec<u8>) {
    let mut screen = vec![];
    loop {
        match chan.wait().await {
            Some(ChannelMsg::Success) => return (true, screen),
            Some(ChannelMsg::Failure) => return (false, screen),
            Some(ChannelMsg::Data { data }) => screen.extend_from_slice(&data),
            Some(_) => (),
            None => panic!("channel closed while waiting for an answer"),
        }
    }
}

/// Open a session channel the way `ssh host` does
async fn session(conn: &Conn) -> (Channel<Msg>, Vec<u8>) {
    let mut chan = conn.channel_open_session().await.unwrap();
    chan.request_pty(true, "xterm", 80, 24, 0, 0, &[]).await.unwrap();
    let (ok, mut screen) = answer(&mut chan).await;
    assert!(ok, "pty-req refused");
    chan.request_shell(true).await.unwrap();
    let (ok, more) = answer(&mut chan).await;
    assert!(ok, "shell refused");
    screen.extend(more);
    (chan, screen)
}

/// Read screen output until `pred` holds for it, or the channel closes
async fn screen_until(chan: &mut Channel<Msg>, mut screen: Vec<u8>, pred: impl Fn(&[u8]) -> bool) -> Vec<u8> {
    while !pred(&screen) {
        match chan.wait().await {
            Some(ChannelMsg::Data { data }) => screen.extend_from_slice(&data),
            Some(ChannelMsg::Close) | None => break,
            Some(_) => (),
        }
    }
    screen
}

async fn wait_for(dir: &DirectoryHandle, want: Counts) {
    let poll = async {
        loop {
            if dir.counts().await.unwrap() == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), poll).await.is_err() {
        panic!("wanted {:?}, have {:?}", want, dir.counts().await.unwrap());
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn speaks_ssh() {
    let dir = directory(4);
    let mut io = serve(&dir);
    io.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();

    let mut banner = vec![0u8; 8];
    io.read_exact(&mut banner).await.unwrap();
    assert_eq!(&banner, b"SSH-2.0-");
    assert_eq!(dir.counts().await.unwrap(), Counts::default());
}

#[tokio::test]
async fn other_channel_types_are_rejected() {
    let dir = directory(4);
    let conn = client(&dir).await;

    let res = conn.channel_open_direct_tcpip("localhost", 22, "127.0.0.1", 40000).await;
    assert!(res.is_err(), "direct-tcpip channel was accepted");
    assert_eq!(dir.counts().await.unwrap(), Counts::default());

    // the connection is still usable
    let _chan = session(&conn).await;
    wait_for(&dir, Counts { sessions: 1, games: 1 }).await;
}

#[tokio::test]
async fn session_requests() {
    let dir = directory(4);
    let conn = client(&dir).await;
    let (mut chan, _) = session(&conn).await;

    chan.exec(true, "ls").await.unwrap();
    assert!(!answer(&mut chan).await.0);
    chan.request_subsystem(true, "sftp").await.unwrap();
    assert!(!answer(&mut chan).await.0);
}

#[tokio::test]
async fn single_client_takes_one_slot() {
    let dir = directory(4);
    let conn = client(&dir).await;
    let (mut chan, screen) = session(&conn).await;
    wait_for(&dir, Counts { sessions: 1, games: 1 }).await;

    let games = dir.snapshot().await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].sessions, 1);
    assert_eq!(games[0].available.len(), 3);

    // frames arrive
    let screen = screen_until(&mut chan, screen, |s| contains(s, b"lightcycles")).await;
    assert!(contains(&screen, b"lightcycles"));
}

#[tokio::test]
async fn interrupt_from_sole_member_removes_game() {
    let dir = directory(4);
    let conn = client(&dir).await;
    let (mut chan, screen) = session(&conn).await;
    wait_for(&dir, Counts { sessions: 1, games: 1 }).await;

    chan.data(&b"wd\x1b[B\x1b[1;2D\x03"[..]).await.unwrap();
    wait_for(&dir, Counts { sessions: 0, games: 0 }).await;

    // the session restores the terminal and closes the channel
    let screen = screen_until(&mut chan, screen, |_| false).await;
    let mut leave = String::new();
    lightcycles_core::put_command(&mut leave, crossterm::terminal::LeaveAlternateScreen);
    assert!(screen.ends_with(leave.as_bytes()));
}

#[tokio::test]
async fn disconnect_frees_the_slot() {
    let dir = directory(2);
    let a = client(&dir).await;
    let b = client(&dir).await;
    let _a_chan = session(&a).await;
    let _b_chan = session(&b).await;
    wait_for(&dir, Counts { sessions: 2, games: 1 }).await;

    a.disconnect(Disconnect::ByApplication, "", "en").await.unwrap();
    wait_for(&dir, Counts { sessions: 1, games: 1 }).await;
    let games = dir.snapshot().await.unwrap();
    assert_eq!(games[0].available.len(), 1);
}

#[tokio::test]
async fn arrivals_over_the_wire() {
    let dir = &directory(2);
    let _clients = future::join_all((0..5).map(|_| async move {
        let conn = client(dir).await;
        let chan = session(&conn).await;
        (conn, chan)
    }))
    .await;
    wait_for(dir, Counts { sessions: 5, games: 3 }).await;
    assert!(dir.snapshot().await.unwrap().iter().all(|g| g.sessions <= 2));
}

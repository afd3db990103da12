//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use crate::chararr_id::GameId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ssh: {0}")]
    Ssh(#[from] russh::Error),

    /// The host key could not be loaded or generated
    #[error("host key: {0}")]
    HostKey(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("directory task is gone")]
    DirectoryGone,

    #[error("game {0} is gone")]
    GameGone(GameId),

    #[error("game rejected request: {0}")]
    Game(#[from] lightcycles_core::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

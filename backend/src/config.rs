//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::{Algorithm, PrivateKey};
use russh::server;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lightcycles_core::GameConfig;

use crate::directory::DirConfig;
use crate::dispatch::DispatchScope;
use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 2022;

/// Server configuration. Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: IpAddr,
    pub port: u16,
    pub world: GameConfig,
    /// simulation step, in milliseconds
    pub tick_ms: u64,
    pub dispatch: DispatchScope,
    /// OpenSSH private key file. Without one, a fresh ed25519 key is made at startup.
    pub host_key: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            world: GameConfig::default(),
            tick_ms: 90,
            dispatch: DispatchScope::default(),
            host_key: None,
        }
    }
}

impl ServerConfig {
    pub fn from_json(s: &str) -> Result<ServerConfig> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<ServerConfig> {
        let s = std::fs::read_to_string(path)?;
        ServerConfig::from_json(&s)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn sockaddr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }

    pub fn host_key(&self) -> Result<PrivateKey> {
        match self.host_key {
            Some(ref path) => {
                russh::keys::load_secret_key(path, None).map_err(|e| Error::HostKey(format!("{}: {}", path.display(), e)))
            }
            None => {
                log::info!("no host key configured, generating one");
                PrivateKey::random(&mut OsRng, Algorithm::Ed25519).map_err(|e| Error::HostKey(e.to_string()))
            }
        }
    }

    /// SSH server settings: clients are not authenticated
    pub fn ssh_config(&self) -> Result<Arc<server::Config>> {
        Ok(ssh_server_config(self.host_key()?))
    }

    pub fn dir_config(&self) -> DirConfig {
        DirConfig {
            world: self.world,
            tick: self.tick(),
            dispatch: self.dispatch,
        }
    }
}

pub fn ssh_server_config(host_key: PrivateKey) -> Arc<server::Config> {
    Arc::new(server::Config {
        keys: vec![host_key],
        auth_rejection_time: Duration::from_secs(1),
        auth_rejection_time_initial: Some(Duration::from_secs(0)),
        ..Default::default()
    })
}

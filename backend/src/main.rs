//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use lightcycles_backend::{
    acceptor::handle_connection,
    config::ServerConfig,
    directory::spawn_directory_task,
    directory_task::DirectoryHandle,
    session,
    terminal::Terminal,
    Result,
};

#[derive(Parser, Debug)]
#[command(name = "lightcycles", about = "Multiplayer lightcycles over ssh")]
struct Cli {
    /// Server configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the configuration file)
    #[arg(short, long, env = "SSH_PORT")]
    port: Option<u16>,

    /// Play in the local terminal instead of serving clients
    #[arg(long)]
    single: bool,
}

async fn play_single(dir: DirectoryHandle) -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let terminal = Terminal::new(tokio::io::stdin(), tokio::io::stdout());
    let ret = match session::join(&dir, terminal).await {
        Ok(s) => s.run(&dir, CancellationToken::new()).await.map(|exit| log::debug!("{:?}", exit)),
        Err(e) => Err(e),
    };
    crossterm::terminal::disable_raw_mode()?;
    ret
}

async fn serve(cfg: &ServerConfig, dir: DirectoryHandle) -> Result<()> {
    let ssh = cfg.ssh_config()?;
    let sockaddr = cfg.sockaddr();
    let listener = TcpListener::bind(sockaddr).await?;
    log::info!("Listening on {} ({:?} dispatch)", sockaddr, cfg.dispatch);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(x) => x,
            Err(e) => {
                log::warn!("failed to accept incoming connection: {}", e);
                continue;
            }
        };
        log::debug!("{}: new connection", peer);
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("{}: set_nodelay: {}", peer, e);
        }
        tokio::spawn(handle_connection(stream, peer, dir.clone(), ssh.clone()));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut cfg = match cli.config {
        Some(ref path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    log::debug!("configuration: {:?}", cfg);

    let dir = spawn_directory_task(cfg.dir_config());
    if cli.single {
        let ret = play_single(dir).await;
        if let Err(ref e) = ret {
            log::error!("{}", e);
        }
        // a blocking read on stdin would hold up the runtime shutdown
        std::process::exit(if ret.is_ok() { 0 } else { 1 });
    }
    serve(&cfg, dir).await
}

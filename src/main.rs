//! Peerlink CLI - interactive peer-to-peer messaging node.
//!
//! This is the main binary entry point. See the `peerlink` library for
//! the connection core.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use peerlink::commands::{self, Command, HELP_TEXT};
use peerlink::{Config, Message, NetEvent, Node};

/// Peer-to-peer text messaging node.
#[derive(Parser, Debug)]
#[command(name = "peerlink", version, about)]
struct Cli {
    /// Listen port (overrides the config file; 0 disables listening).
    #[arg(short, long)]
    port: Option<u16>,

    /// Display name stamped on outgoing messages (overrides the config file).
    #[arg(short, long)]
    name: Option<String>,

    /// Dial this peer immediately after startup, as host:port.
    #[arg(long, value_name = "HOST:PORT")]
    connect: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.listen_port = port;
    }
    if let Some(name) = cli.name {
        config.display_name = name;
    }

    let (node, mut event_rx) = Node::with_dial_timeout(Duration::from_secs(config.dial_timeout_secs));

    if config.listen_port != 0 {
        let bound = node.listen(config.listen_port).await?;
        println!("Listening on port {bound}");
    }

    if let Some(target) = &cli.connect {
        let (host, port) = split_host_port(target)?;
        match node.connect(host, port).await {
            Ok(peer) => println!("Connected to {}", peer.id),
            Err(e) => eprintln!("Connect failed: {e}"),
        }
    }

    println!("Type /help for commands.");

    // Render lifecycle events as they arrive, independent of the prompt.
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                NetEvent::PeerConnected(peer) => println!("* {} connected", peer.id),
                NetEvent::PeerDisconnected(peer) => println!("* {} disconnected", peer.id),
                NetEvent::MessageReceived { message, .. } => println!("{message}"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match command {
            Command::Listen(port) => match node.listen(port).await {
                Ok(bound) => println!("Listening on port {bound}"),
                Err(e) => eprintln!("Listen failed: {e}"),
            },
            Command::Connect { host, port } => match node.connect(&host, port).await {
                Ok(peer) => println!("Connected to {}", peer.id),
                Err(e) => eprintln!("Connect failed: {e}"),
            },
            Command::Send { peer_id, content } => {
                node.send(&peer_id, &Message::new(config.display_name.clone(), content));
            }
            Command::Broadcast(content) => {
                node.broadcast(&Message::new(config.display_name.clone(), content));
            }
            Command::Peers => {
                let peers = node.peers();
                if peers.is_empty() {
                    println!("No connected peers.");
                }
                for peer in peers {
                    println!("{} ({:?})", peer.id, peer.direction);
                }
            }
            Command::Disconnect(peer_id) => {
                if !node.disconnect(&peer_id) {
                    println!("No such peer: {peer_id}");
                }
            }
            Command::Help => println!("{HELP_TEXT}"),
            Command::Quit => break,
        }
    }

    node.stop_all().await;
    printer.abort();
    Ok(())
}

/// Split a `host:port` argument on the last colon (hosts may contain none).
fn split_host_port(target: &str) -> Result<(&str, u16)> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected HOST:PORT, got: {target}"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("invalid port in: {target}"))?;
    Ok((host, port))
}

use std::time::Instant;

use anyhow::Context;
use colored::Colorize;
use dsm_link::{build_http_client, HttpPeerLink, PeerLink};
use dsm_server::{DsmNode, ParamServer, ParamServerConfig, Shutdown};
use dsm_types::{ClusterConfig, Peer, PeerId};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Node(args) => cmd_node(args).await,
        Command::ParamServer(args) => cmd_param_server(args).await,
        Command::Counter(args) => cmd_counter(args).await,
        Command::Alloc(args) => cmd_alloc(args).await,
        Command::List(args) => cmd_list(args).await,
        Command::Stop(args) => cmd_stop(args).await,
    }
}

/// Trigger `shutdown` on Ctrl-C.
fn stop_on_ctrl_c(shutdown: Shutdown) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });
}

async fn start_node(config: &std::path::Path) -> anyhow::Result<DsmNode> {
    let config = ClusterConfig::load(config)
        .with_context(|| format!("loading {}", config.display()))?;
    let node = DsmNode::start(config).await?;
    println!(
        "{} Node {} listening on {} ({} peers)",
        "✓".green().bold(),
        node.id().to_string().cyan(),
        node.local_addr().to_string().bold(),
        node.config().peers.len()
    );
    Ok(node)
}

async fn cmd_node(args: NodeArgs) -> anyhow::Result<()> {
    let node = start_node(&args.config).await?;
    stop_on_ctrl_c(node.shutdown_handle());
    node.wait().await?;
    println!("Node stopped.");
    Ok(())
}

async fn cmd_param_server(args: ParamServerArgs) -> anyhow::Result<()> {
    let server = ParamServer::start(&ParamServerConfig { bind_addr: args.bind }).await?;
    println!(
        "{} Parameter server listening on {}",
        "✓".green().bold(),
        server.local_addr().to_string().bold()
    );
    stop_on_ctrl_c(server.shutdown_handle());
    server.wait().await?;
    println!("Parameter server stopped.");
    Ok(())
}

fn decode_counter(bytes: Vec<u8>) -> anyhow::Result<i64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("counter object holds {} bytes, expected 8", b.len()))?;
    Ok(i64::from_le_bytes(raw))
}

async fn cmd_counter(args: CounterArgs) -> anyhow::Result<()> {
    let node = start_node(&args.config).await?;
    node.wait_for_peers().await.context("waiting for peers")?;

    let manager = node.manager();
    let counter = manager.ensure(&args.object, 8).await?;
    let mutex = node.mutex().create_mutex(&args.lock).await?;

    let started = Instant::now();
    for _ in 0..args.iterations {
        mutex.lock().await?;
        let value = decode_counter(counter.read(0, 8).await?)?;
        counter.write(0, &(value + 1).to_le_bytes()).await?;
        mutex.unlock().await?;
    }

    let value = decode_counter(counter.read(0, 8).await?)?;
    let stats = manager.stats();
    println!(
        "{} {} increments in {:.2?}; local {} = {}",
        "✓".green().bold(),
        args.iterations,
        started.elapsed(),
        args.object.yellow(),
        value.to_string().bold()
    );
    if stats.failed > 0 {
        println!("  {} {} peer deliveries failed", "!".red().bold(), stats.failed);
    }
    println!("Serving until stopped (dsm stop --peer {}).", node.local_addr());

    stop_on_ctrl_c(node.shutdown_handle());
    let manager = manager.clone();
    node.wait().await?;
    let value = decode_counter(manager.read(&args.object, 0, 8)?)?;
    println!("Final {} = {}", args.object.yellow(), value.to_string().bold());
    Ok(())
}

async fn cmd_alloc(args: AllocArgs) -> anyhow::Result<()> {
    let node = start_node(&args.config).await?;
    node.wait_for_peers().await.context("waiting for peers")?;
    let manager = node.manager();

    let elements = manager.ensure_array(&args.prefix, args.count, 8).await?;
    for (i, element) in elements.iter().enumerate() {
        element.write(0, &(i as u64).to_le_bytes()).await?;
        println!("  {} {}", "allocated".green(), element.name());
    }

    if let Some(last) = elements.last() {
        manager.remove(last.name()).await?;
        println!("  {} {}", "released".yellow(), last.name());
    }

    for info in manager.find(&args.prefix) {
        println!("  {:<32} {:>6} bytes", info.name, info.size);
    }
    node.shutdown().await?;
    Ok(())
}

fn peer_link(authority: &str) -> anyhow::Result<HttpPeerLink> {
    let (host, port) = authority
        .rsplit_once(':')
        .with_context(|| format!("expected host:port, got {authority}"))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port in {authority}"))?;
    let peer = Peer::new(host, port, PeerId::new(0)?);
    Ok(HttpPeerLink::new(peer, build_http_client(std::time::Duration::from_secs(10))?))
}

async fn cmd_list(args: PeerArgs) -> anyhow::Result<()> {
    let link = peer_link(&args.peer)?;
    let objects = link.list_objects().await?;
    println!("{} objects on {}", objects.len().to_string().bold(), args.peer.bold());
    for info in objects {
        println!("  {:<32} {:>8} bytes", info.name.cyan(), info.size);
    }
    Ok(())
}

async fn cmd_stop(args: PeerArgs) -> anyhow::Result<()> {
    peer_link(&args.peer)?.stop().await?;
    println!("{} Stop sent to {}", "✓".green().bold(), args.peer.bold());
    Ok(())
}

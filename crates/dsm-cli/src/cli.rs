use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dsm",
    about = "Distributed shared memory: replicated named objects and a parameter-server mutex",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a cluster node until it receives /stop
    Node(NodeArgs),
    /// Run the parameter server
    ParamServer(ParamServerArgs),
    /// Increment a shared counter under the distributed mutex
    Counter(CounterArgs),
    /// Allocate, fill and release an array of element objects
    Alloc(AllocArgs),
    /// Dump the objects held by a node
    List(PeerArgs),
    /// Ask a node or parameter server to shut down
    Stop(PeerArgs),
}

#[derive(Args)]
pub struct NodeArgs {
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct ParamServerArgs {
    #[arg(long, default_value = "127.0.0.1:9000")]
    pub bind: String,
}

#[derive(Args)]
pub struct CounterArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short = 'n', long, default_value = "1000")]
    pub iterations: u64,
    #[arg(long, default_value = "counter-lock")]
    pub lock: String,
    /// Object holding the counter, an 8-byte little-endian integer
    #[arg(long, default_value = "counter")]
    pub object: String,
}

#[derive(Args)]
pub struct AllocArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(long, default_value = "vec")]
    pub prefix: String,
    #[arg(long, default_value = "4")]
    pub count: usize,
}

#[derive(Args)]
pub struct PeerArgs {
    /// Listener address as host:port
    #[arg(short, long)]
    pub peer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counter_defaults() {
        let cli = Cli::parse_from(["dsm", "counter", "--config", "node.json"]);
        match cli.command {
            Command::Counter(args) => {
                assert_eq!(args.iterations, 1000);
                assert_eq!(args.lock, "counter-lock");
                assert_eq!(args.config, PathBuf::from("node.json"));
            }
            _ => panic!("expected counter"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["dsm", "list", "--peer", "127.0.0.1:9090", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn param_server_bind() {
        let cli = Cli::parse_from(["dsm", "param-server", "--bind", "0.0.0.0:9100"]);
        assert!(matches!(cli.command, Command::ParamServer(ref a) if a.bind == "0.0.0.0:9100"));
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dnz-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long, help = "Port to serve the node API on (overrides config)")]
        port: Option<u16>,
        #[arg(long, help = "TOML config file; CHAIN_* environment variables otherwise")]
        config: Option<PathBuf>,
        #[arg(long, help = "Address to send mining rewards to; a new wallet otherwise")]
        address: Option<String>,
    },
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_startnode() {
        let opt = Opt::parse_from(["dnz-chain", "startnode", "--port", "5001", "--address", "A"]);
        match opt.command {
            Command::StartNode {
                port,
                config,
                address,
            } => {
                assert_eq!(port, Some(5001));
                assert!(config.is_none());
                assert_eq!(address.as_deref(), Some("A"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_createwallet() {
        let opt = Opt::parse_from(["dnz-chain", "createwallet"]);
        assert!(matches!(opt.command, Command::Createwallet));
    }
}

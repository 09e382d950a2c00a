// Entry point for the node binary: starts a ledger node or creates a wallet.
use clap::Parser;
use dnz_chain::{run_server, Blockchain, ChainConfig, Command, Opt, Wallet};
use log::{error, info, LevelFilter};
use std::process;
use std::sync::Arc;

#[actix_web::main]
async fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command).await {
        error!("Error: {e}");
        process::exit(1);
    }
}

async fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode {
            port,
            config,
            address,
        } => {
            let mut config = match config {
                Some(path) => ChainConfig::from_toml_file(&path)?,
                None => ChainConfig::from_env()?,
            };
            if let Some(port) = port {
                config.port = port;
            }

            // Without an explicit address the node mines into a throwaway wallet
            let address = match address {
                Some(address) => address,
                None => {
                    let wallet = Wallet::new()?;
                    info!("Generated node wallet {}", wallet.get_address());
                    wallet.get_address()
                }
            };

            let port = config.port;
            let ledger = Arc::new(Blockchain::open(&address, config)?);
            let tasks = ledger.run()?;
            let served = run_server(Arc::clone(&ledger), port).await;
            tasks.stop();
            served?;
        }
        Command::Createwallet => {
            let wallet = Wallet::new()?;
            println!("Your new address: {}", wallet.get_address());
            println!("Public key: {}", wallet.get_public_key().to_hex());
            println!("Private key (PKCS#8): {}", wallet.pkcs8_hex());
        }
    }
    Ok(())
}

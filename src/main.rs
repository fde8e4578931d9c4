// Entry point for the minichain CLI: mines blocks on a fresh in-memory chain
// and manages the proof artifacts the node can be started with.
use clap::Parser;
use log::{error, LevelFilter};
use std::fs;
use std::process;
use std::sync::Arc;
use zk_minichain::{
    merkle_root, write_dev_artifacts, Command, Config, FsArtifactLoader, Node, Opt, Signer,
    Transaction, Wallet, GLOBAL_CONFIG,
};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Mine {
            blocks,
            difficulty,
            amount,
            artifacts,
            config,
        } => {
            let mut config = match config {
                Some(path) => Config::load(&path)?,
                None => GLOBAL_CONFIG.clone(),
            };
            if let Some(difficulty) = difficulty {
                config.difficulty = difficulty;
            }
            if amount.is_some() {
                config.amount = amount;
            }
            if artifacts.is_some() {
                config.artifacts_dir = artifacts;
            }

            let wallet = Wallet::new()?;
            println!("Signing as {}", wallet.address());
            let signer: Arc<dyn Signer> = Arc::new(wallet);

            // proofs are all-or-nothing: a configured artifact dir must load
            let node = match &config.artifacts_dir {
                Some(dir) => Node::with_artifacts(&config, signer, &FsArtifactLoader::new(dir))?,
                None => Node::new(&config, signer)?,
            };

            let genesis = node.init_genesis()?;
            println!(
                "Genesis: {} (difficulty {})",
                genesis.get_hash(),
                node.get_chain().get_difficulty().get_nibbles()
            );

            for height in 1..=blocks {
                let header = node.mine_block()?;
                println!("Block {height}: {}", header.hash());
                println!("  previous: {}", header.previous_hash);
                println!("  merkle root: {}", header.merkle_root);
                println!("  nonce: {}", header.nonce);
            }

            node.get_chain().validate_chain()?;
            let tip = node.current_tip()?;
            println!(
                "Tip {} ({})",
                tip.get_hash(),
                if tip.get_proof().is_some() { "proven" } else { "unproven" }
            );
            for utxo in node.spendable_entries()? {
                println!(
                    "- {} = {} to {}",
                    utxo.id,
                    utxo.output.get_amount(),
                    utxo.output.get_owner().unwrap_or("<none>")
                );
            }
            println!("Balance: {}", node.balance()?);
        }
        Command::CheckArtifacts { dir } => {
            let loader = FsArtifactLoader::new(&dir);
            println!("Checking {}", loader.dir().display());
            let mut missing = 0;
            for status in loader.check_files() {
                match status.size {
                    Some(size) => println!("{}: {} bytes", status.name, size),
                    None => {
                        missing += 1;
                        println!("{}: missing ({})", status.name, status.path.display());
                    }
                }
            }
            if missing > 0 {
                return Err(format!("{missing} artifact(s) missing in {}", dir.display()).into());
            }
            println!("All artifacts present");
        }
        Command::InitArtifacts { dir } => {
            write_dev_artifacts(&dir)?;
            println!("Done!");
        }
        Command::MerkleRoot { file } => {
            let transactions = match file {
                Some(path) => Transaction::list_from_json(&fs::read(&path)?)?,
                None => vec![],
            };
            for tx in &transactions {
                println!("leaf {}", tx.id()?);
            }
            println!("{}", merkle_root(&transactions)?);
        }
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "zk-minichain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "mine", about = "Initialize genesis and mine blocks on a fresh chain")]
    Mine {
        #[arg(long, default_value_t = 1, help = "Number of blocks to mine")]
        blocks: usize,
        #[arg(long, help = "Leading zero hex digits required in each block hash")]
        difficulty: Option<u32>,
        #[arg(long, help = "Pay this amount per block instead of sweeping")]
        amount: Option<u64>,
        #[arg(long, help = "Directory holding the proof artifacts")]
        artifacts: Option<PathBuf>,
        #[arg(long, help = "TOML configuration file")]
        config: Option<PathBuf>,
    },
    #[command(name = "checkartifacts", about = "Report which proof artifacts are present")]
    CheckArtifacts {
        #[arg(long, help = "Artifact directory")]
        dir: PathBuf,
    },
    #[command(
        name = "initartifacts",
        about = "Write a development artifact set for the digest oracle"
    )]
    InitArtifacts {
        #[arg(long, help = "Artifact directory")]
        dir: PathBuf,
    },
    #[command(
        name = "merkleroot",
        about = "Print the Merkle root of a JSON array of transactions"
    )]
    MerkleRoot {
        #[arg(long, help = "JSON file of transactions; the empty set when omitted")]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mine() {
        let opt = Opt::parse_from([
            "zk-minichain",
            "mine",
            "--blocks",
            "3",
            "--difficulty",
            "2",
        ]);
        match opt.command {
            Command::Mine {
                blocks,
                difficulty,
                amount,
                artifacts,
                config,
            } => {
                assert_eq!(blocks, 3);
                assert_eq!(difficulty, Some(2));
                assert!(amount.is_none());
                assert!(artifacts.is_none());
                assert!(config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_mine_defaults_to_one_block() {
        let opt = Opt::parse_from(["zk-minichain", "mine"]);
        assert!(matches!(opt.command, Command::Mine { blocks: 1, .. }));
    }

    #[test]
    fn test_artifact_commands_require_dir() {
        assert!(Opt::try_parse_from(["zk-minichain", "checkartifacts"]).is_err());
        let opt = Opt::try_parse_from(["zk-minichain", "initartifacts", "--dir", "build"]).unwrap();
        assert!(matches!(opt.command, Command::InitArtifacts { dir } if dir == PathBuf::from("build")));
    }

    #[test]
    fn test_parse_mine_amount() {
        let opt = Opt::parse_from(["zk-minichain", "mine", "--amount", "25"]);
        assert!(matches!(opt.command, Command::Mine { amount: Some(25), .. }));
        assert!(Opt::try_parse_from(["zk-minichain", "mine", "--amount", "-1"]).is_err());
    }

    #[test]
    fn test_parse_merkleroot() {
        let opt = Opt::parse_from(["zk-minichain", "merkleroot"]);
        assert!(matches!(opt.command, Command::MerkleRoot { file: None }));

        let opt = Opt::parse_from(["zk-minichain", "merkleroot", "--file", "block.json"]);
        let file = match opt.command {
            Command::MerkleRoot { file } => file,
            other => panic!("unexpected command {other:?}"),
        };
        assert_eq!(file, Some(PathBuf::from("block.json")));
    }
}

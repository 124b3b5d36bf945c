use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sealedger",
    about = "Tamper-evident ledger of signed records in proof-of-work sealed containers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger data directory (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign and insert a record
    Add(AddArgs),
    /// Show the most recent records
    Show(ShowArgs),
    /// Check a record's hash, signature, and container seal
    Check(RecordArgs),
    /// Tamper with a record in memory, then check it
    Alter(RecordArgs),
    /// Check every container's seal and link
    Audit,
    /// Run the synthetic record feed for a while
    Feed(FeedArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub sender: String,
    #[arg(long)]
    pub receiver: String,
    #[arg(long)]
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Number of records
    #[arg(default_value_t = 10)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Record id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// How long to run
    #[arg(long, default_value_t = 10)]
    pub seconds: u64,
    /// Shortest pause between records, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub min_interval_ms: u64,
    /// Longest pause between records, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub max_interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from([
            "sealedger",
            "--data-dir",
            "/tmp/l",
            "add",
            "--sender",
            "Alice",
            "--receiver",
            "Bob",
            "--payload",
            "3 pizzas",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/l")));
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.sender, "Alice");
                assert_eq!(args.payload, "3 pizzas");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_show_default_count() {
        let cli = Cli::parse_from(["sealedger", "show"]);
        assert!(matches!(cli.command, Command::Show(ShowArgs { count: 10 })));
    }
}

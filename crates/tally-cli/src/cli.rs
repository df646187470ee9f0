use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_sdk::{Payer, TransactionId};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally: who owes whom, between you and the people you split costs with",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to $TALLY_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the file store's document directory
    #[arg(long, global = true)]
    pub store_root: Option<PathBuf>,

    /// Override the identity key whose ledger is opened
    #[arg(long, global = true)]
    pub identity: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List counterparties with their balances
    People,
    /// Register a new counterparty
    AddPerson(AddPersonArgs),
    /// Remove a settled counterparty and their history
    RemovePerson(RemovePersonArgs),
    /// Record money that changed hands
    Pay(PayArgs),
    /// Show transaction history
    History(HistoryArgs),
    /// Delete one transaction
    Delete(DeleteArgs),
    /// Show the balance with one counterparty, or overall
    Balance(BalanceArgs),
    /// Check the stored ledger for inconsistencies
    Verify(VerifyArgs),
    /// Print the effective configuration
    Config,
    /// Interactive session (supports undo)
    Shell,
}

#[derive(Args, Debug)]
pub struct AddPersonArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RemovePersonArgs {
    pub name: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    pub counterparty: String,
    /// Amount as typed, e.g. `12.50` or `$1,200`
    pub amount: String,
    /// Who paid: `me` or `them`
    #[arg(long, default_value = "me")]
    pub payer: Payer,
    #[arg(short, long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only transactions with this counterparty
    pub counterparty: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Transaction id as shown by `history`, e.g. `#4`
    pub id: TransactionId,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    pub counterparty: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Remove transactions that reference a missing counterparty
    #[arg(long)]
    pub prune: bool,
}

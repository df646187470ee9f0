//! Interactive session.
//!
//! The undo slot only lives as long as the loaded ledger, so `undo` is
//! offered here rather than as a one-shot command.

use std::io::Write;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tally_sdk::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::*;
use crate::commands::*;

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// List counterparties with their balances
    People,
    /// Register a new counterparty
    Add(AddPersonArgs),
    /// Remove a settled counterparty and their history
    Remove(RemovePersonArgs),
    /// Record money that changed hands
    Pay(PayArgs),
    /// Show transaction history
    History(HistoryArgs),
    /// Delete one transaction
    Delete(DeleteArgs),
    /// Restore the last deleted transaction
    Undo,
    /// Show the balance with one counterparty, or overall
    Balance(BalanceArgs),
    /// Check the ledger for inconsistencies
    Verify(VerifyArgs),
    /// Retry saving changes the store rejected
    Sync,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

pub async fn run<R>(session: &mut Session, printer: &Printer, input: &mut R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!(
        "{} ledger for {} ({} people). Type {} for commands.",
        "Tally".bold(),
        session.identity().display_name.bold(),
        session.ledger()?.counterparties().len(),
        "help".bold(),
    );

    loop {
        print!("{} ", "tally>".cyan());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                println!("{} {e}", "error:".red().bold());
                continue;
            }
        };
        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                print!("{e}");
                continue;
            }
        };
        if matches!(command, ShellCommand::Quit) {
            break;
        }

        if let Err(e) = execute(session, printer, command, input).await {
            println!("{} {e:#}", "error:".red().bold());
            if session.is_dirty() {
                println!("  Changes are kept in this shell. Run {} to retry saving.", "sync".bold());
            }
        }
    }

    if session.is_dirty() {
        println!("{} Leaving with unsaved changes.", "!".yellow().bold());
    }
    Ok(())
}

async fn execute<R>(
    session: &mut Session,
    printer: &Printer,
    command: ShellCommand,
    input: &mut R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    match command {
        ShellCommand::People => cmd_people(session, printer),
        ShellCommand::Add(args) => cmd_add_person(session, printer, args).await,
        ShellCommand::Remove(args) => cmd_remove_person(session, printer, args, input).await,
        ShellCommand::Pay(args) => cmd_pay(session, printer, args).await,
        ShellCommand::History(args) => cmd_history(session, printer, args),
        ShellCommand::Delete(args) => cmd_delete(session, printer, args, input).await,
        ShellCommand::Undo => match session.undo_last_delete().await? {
            Some(id) => {
                println!("{} Restored {}", "✓".green().bold(), id.to_string().yellow());
                Ok(())
            }
            None => {
                println!("Nothing to undo.");
                Ok(())
            }
        },
        ShellCommand::Balance(args) => cmd_balance(session, printer, args),
        ShellCommand::Verify(args) => cmd_verify(session, printer, args).await,
        ShellCommand::Sync => {
            session.sync().await?;
            println!("{} Saved", "✓".green().bold());
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

/// Split a shell line on whitespace, keeping single- or double-quoted runs
/// together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

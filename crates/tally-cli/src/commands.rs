use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tally_sdk::{Decimal, Payer, Session, Standing, TallyConfig, Transaction};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::*;

/// Rendering settings shared by every command.
pub struct Printer {
    pub format: OutputFormat,
    pub symbol: String,
}

impl Printer {
    pub fn money(&self, amount: Decimal) -> String {
        format!("{}{}", self.symbol, amount)
    }

    fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn standing(&self, standing: Standing, name: &str) -> String {
        let text = standing.describe(name, &self.symbol);
        match standing {
            Standing::Settled => text.green().to_string(),
            Standing::TheyOwe(_) => text.cyan().to_string(),
            Standing::YouOwe(_) => text.yellow().to_string(),
        }
    }

    fn overall(&self, standing: Standing) -> String {
        standing.describe_overall(&self.symbol).bold().to_string()
    }

    fn transaction_line(&self, index: usize, t: &Transaction) -> String {
        let who = match t.payer() {
            Payer::Me => "you paid".cyan(),
            Payer::Counterparty => "they paid".yellow(),
        };
        let mut line = format!(
            "{:>5} {:>3}. {}  {:<12} {} {}",
            t.id().to_string().dimmed(),
            index,
            t.timestamp().format("%Y-%m-%d %H:%M"),
            t.counterparty(),
            who,
            self.money(t.amount()).bold(),
        );
        if let Some(note) = t.note() {
            line.push_str(&format!("  {}", note.italic()));
        }
        line
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli).await?;
    let printer = Printer {
        format: cli.format,
        symbol: config.currency_symbol.clone(),
    };
    let mut input = BufReader::new(tokio::io::stdin());

    match cli.command {
        Command::Config => cmd_config(&config, &printer),
        Command::People => cmd_people(&open(&config).await?, &printer),
        Command::AddPerson(args) => cmd_add_person(&mut open(&config).await?, &printer, args).await,
        Command::RemovePerson(args) => {
            cmd_remove_person(&mut open(&config).await?, &printer, args, &mut input).await
        }
        Command::Pay(args) => cmd_pay(&mut open(&config).await?, &printer, args).await,
        Command::History(args) => cmd_history(&open(&config).await?, &printer, args),
        Command::Delete(args) => {
            cmd_delete(&mut open(&config).await?, &printer, args, &mut input).await
        }
        Command::Balance(args) => cmd_balance(&open(&config).await?, &printer, args),
        Command::Verify(args) => cmd_verify(&mut open(&config).await?, &printer, args).await,
        Command::Shell => crate::shell::run(&mut open(&config).await?, &printer, &mut input).await,
    }
}

async fn resolve_config(cli: &Cli) -> anyhow::Result<TallyConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os("TALLY_CONFIG").map(PathBuf::from));
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            TallyConfig::load(&path).await?
        }
        None => TallyConfig::default(),
    };
    if let Some(root) = &cli.store_root {
        config.store.root = root.clone();
    }
    if let Some(identity) = &cli.identity {
        config.identity.key = identity.clone();
    }
    Ok(config)
}

async fn open(config: &TallyConfig) -> anyhow::Result<Session> {
    Session::from_config(config)
        .await
        .context("could not load your ledger")
}

/// Ask a yes/no question on stderr and read the answer from `input`.
/// Anything but `y`/`yes` (including end of input) counts as no.
///
/// Prompts stay off stdout so `--format json` output remains parseable.
pub async fn confirm<R>(input: &mut R, question: &str) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).await?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn cmd_config(config: &TallyConfig, printer: &Printer) -> anyhow::Result<()> {
    if printer.is_json() {
        return printer.json(config);
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn cmd_people(session: &Session, printer: &Printer) -> anyhow::Result<()> {
    let summaries = session.summaries()?;
    let overall = session.overall()?;
    if printer.is_json() {
        return printer.json(&json!({
            "counterparties": summaries,
            "aggregate_balance": session.aggregate_balance()?,
            "overall": overall,
        }));
    }

    if summaries.is_empty() {
        println!("No people yet. Add one with {}.", "add-person <name>".bold());
        return Ok(());
    }
    for row in &summaries {
        println!(
            "  {:<16} {}  {}",
            row.name.bold(),
            printer.standing(Standing::from_balance(row.balance), &row.name),
            format!("({} transactions)", row.transaction_count).dimmed(),
        );
    }
    println!("\n{}", printer.overall(overall));
    Ok(())
}

pub async fn cmd_add_person(
    session: &mut Session,
    printer: &Printer,
    args: AddPersonArgs,
) -> anyhow::Result<()> {
    session.add_counterparty(&args.name).await?;
    if printer.is_json() {
        return printer.json(&json!({ "added": args.name }));
    }
    println!("{} Added {}", "✓".green().bold(), args.name.bold());
    Ok(())
}

pub async fn cmd_remove_person<R>(
    session: &mut Session,
    printer: &Printer,
    args: RemovePersonArgs,
    input: &mut R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    // Only prompt when the removal can go through.
    let removable = session.ledger()?.has_counterparty(&args.name)
        && session.balance_of(&args.name)?.is_zero();
    let count = session.transactions_for(&args.name)?.len();
    if removable && !args.yes {
        let question = format!(
            "Remove {} and their {count} transaction(s)?",
            args.name.bold()
        );
        if !confirm(input, &question).await? {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let removed = session.delete_counterparty(&args.name).await?;
    if printer.is_json() {
        return printer.json(&json!({ "removed": args.name, "transactions_removed": removed }));
    }
    println!(
        "{} Removed {} ({removed} transaction(s) deleted)",
        "✓".green().bold(),
        args.name.bold()
    );
    Ok(())
}

pub async fn cmd_pay(session: &mut Session, printer: &Printer, args: PayArgs) -> anyhow::Result<()> {
    let id = session
        .add_transaction_text(&args.counterparty, Some(&args.amount), args.payer, args.note)
        .await?;
    let standing = session.standing_with(&args.counterparty)?;
    if printer.is_json() {
        let recorded = session.ledger()?.transaction(id);
        return printer.json(&json!({ "recorded": recorded, "standing": standing }));
    }
    println!("{} Recorded {}", "✓".green().bold(), id.to_string().yellow());
    println!("  {}", printer.standing(standing, &args.counterparty));
    Ok(())
}

pub fn cmd_history(session: &Session, printer: &Printer, args: HistoryArgs) -> anyhow::Result<()> {
    let ledger = session.ledger()?;
    let rows: Vec<(usize, &Transaction)> = match &args.counterparty {
        Some(name) => session
            .transactions_for(name)?
            .into_iter()
            .map(|row| (row.index, row.transaction))
            .collect(),
        None => ledger.transactions().iter().enumerate().collect(),
    };

    if printer.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|(index, t)| json!({ "index": index, "transaction": t }))
            .collect();
        return printer.json(&items);
    }

    if rows.is_empty() {
        println!("No transactions.");
        return Ok(());
    }
    for (index, t) in rows {
        println!("{}", printer.transaction_line(index, t));
    }
    Ok(())
}

pub async fn cmd_delete<R>(
    session: &mut Session,
    printer: &Printer,
    args: DeleteArgs,
    input: &mut R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let ledger = session.ledger()?;
    if let (Some(t), Some(index)) = (ledger.transaction(args.id), ledger.position_of(args.id)) {
        if !args.yes {
            eprintln!("{}", printer.transaction_line(index, t));
            if !confirm(input, "Delete this transaction?").await? {
                eprintln!("Cancelled.");
                return Ok(());
            }
        }
    }

    let removed = session.delete_transaction(args.id).await?;
    if printer.is_json() {
        return printer.json(&json!({ "deleted": removed }));
    }
    println!("{} Deleted {}", "✓".green().bold(), removed.id().to_string().yellow());
    println!(
        "  {}",
        printer.standing(session.standing_with(removed.counterparty())?, removed.counterparty())
    );
    Ok(())
}

pub fn cmd_balance(session: &Session, printer: &Printer, args: BalanceArgs) -> anyhow::Result<()> {
    match args.counterparty {
        Some(name) => {
            let standing = session.standing_with(&name)?;
            if printer.is_json() {
                return printer.json(&json!({
                    "counterparty": name,
                    "balance": session.balance_of(&name)?,
                    "standing": standing,
                }));
            }
            println!("{}", printer.standing(standing, &name));
        }
        None => {
            let standing = session.overall()?;
            if printer.is_json() {
                return printer.json(&json!({
                    "aggregate_balance": session.aggregate_balance()?,
                    "standing": standing,
                }));
            }
            println!("{}", printer.overall(standing));
        }
    }
    Ok(())
}

pub async fn cmd_verify(
    session: &mut Session,
    printer: &Printer,
    args: VerifyArgs,
) -> anyhow::Result<()> {
    let report = session.verify()?;
    let pruned = if args.prune && report.orphan_count() > 0 {
        session.prune_orphans().await?
    } else {
        0
    };

    if printer.is_json() {
        return printer.json(&json!({ "report": report, "pruned": pruned }));
    }
    if report.is_valid() {
        println!("{} Ledger is consistent", "✓".green().bold());
    } else {
        println!("{} {} problem(s) found", "✗".red().bold(), report.violations.len());
        for v in &report.violations {
            let at = v.transaction.map(|id| format!(" {id}")).unwrap_or_default();
            println!("  {}{}: {}", format!("{:?}", v.kind).red(), at, v.description);
        }
    }
    println!(
        "  People: {}, transactions: {}",
        report.counterparty_count, report.transaction_count
    );
    if pruned > 0 {
        println!("{} Pruned {pruned} orphaned transaction(s)", "✓".green().bold());
    }
    Ok(())
}

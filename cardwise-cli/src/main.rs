use anyhow::{Context, Result, bail};
use cardwise_catalog::{Catalog, WalletState, parse_purchases_csv, replay_statement};
use cardwise_core::{Valuator, time};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod report;
mod state;
mod telemetry;

use config::Config;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDWISE_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "cardwise",
    version,
    long_version = LONG_VERSION,
    about = "Pick the card in your wallet that earns the most on a purchase"
)]
struct Cli {
    /// Log engine decisions to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank wallet cards for one purchase
    Rank {
        /// Purchase amount in dollars (e.g. 42.50)
        #[arg(long)]
        amount: String,

        /// Category id (grocery, dining, gas, ...)
        #[arg(long)]
        category: String,

        /// Merchant id, enables merchant-bound offers
        #[arg(long)]
        merchant: Option<String>,

        /// When: RFC3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD" in the configured timezone (default: now)
        #[arg(long)]
        at: Option<String>,

        /// Rows to print (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Inspect or change the wallet (~/.cardwise/wallet.json)
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Replay a purchase CSV and report the best card per purchase
    Statement {
        /// CSV with date,description,amount,category[,merchant]
        #[arg(long)]
        csv: PathBuf,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Show owned cards, rotating state, enrollments and overrides
    List,
    /// Add a catalog card to the wallet
    Add { card: String },
    /// Remove a card (and its rotating state)
    Remove { card: String },
    /// Mark this period's rotating bonus as activated
    Activate { card: String },
    /// Mark this period's rotating bonus as not activated
    Deactivate { card: String },
    /// Set remaining rotating cap, in cents
    Cap { card: String, cents: i64 },
    /// Reset remaining rotating cap to the rule's full cap
    CapReset { card: String },
    /// Enroll in an offer
    Enroll { offer: String },
    /// Drop an offer enrollment
    Unenroll { offer: String },
    /// Override cents-per-point for a program
    Cpp { program: String, cents: f64 },
    /// Remove a cents-per-point override
    CppClear { program: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.cardwise/config.toml with defaults
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;

    let level = if cli.verbose { "debug" } else { cfg.logging.log_level.as_str() };
    telemetry::init(level)?;

    match cli.command {
        Command::Rank {
            amount,
            category,
            merchant,
            at,
            limit,
            json,
        } => {
            rank(&cfg, &amount, &category, merchant.as_deref(), at.as_deref(), limit, json)?;
        }

        Command::Wallet { command } => wallet(&cfg, command)?,

        Command::Statement { csv } => statement(&cfg, csv)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}\n", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn load_catalog(cfg: &Config) -> Result<Catalog> {
    let cards_path = &cfg.catalog.cards_path;
    if !cards_path.exists() {
        bail!(
            "Card catalog not found: {} (copy data/cards.json there or set [catalog] cards_path)",
            cards_path.display()
        );
    }
    Catalog::load(cards_path, &cfg.catalog.offers_path)
        .with_context(|| format!("loading catalog {}", cards_path.display()))
}

fn load_wallet_cards(catalog: &Catalog) -> Result<(WalletState, Vec<cardwise_core::Card>)> {
    let wallet = state::read_wallet()?;
    if wallet.cards.is_empty() {
        bail!("Wallet is empty. Run: cardwise wallet add <card-id>");
    }
    let cards = wallet.resolve(catalog).context("resolving wallet cards")?;
    Ok((wallet, cards))
}

fn rank(
    cfg: &Config,
    amount: &str,
    category: &str,
    merchant: Option<&str>,
    at: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let amount_cents = parse_dollars(amount)?;
    let now = match at {
        Some(s) => time::parse_instant(s, &cfg.valuation.timezone)?,
        None => Utc::now(),
    };

    let catalog = load_catalog(cfg)?;
    let (wallet, cards) = load_wallet_cards(&catalog)?;
    let offers = catalog.offers_by_card(&cards, merchant);
    let valuator = Valuator::new(cfg.program_table());

    let params = wallet.params(amount_cents, category, now);
    let ranked = valuator.rank_cards(&cards, &params, &offers);
    let limit = limit.unwrap_or(cfg.valuation.limit);

    if json {
        println!("{}", report::ranking_json(&ranked, limit)?);
    } else {
        println!(
            "${:.2} on {}{} at {}\n",
            amount_cents as f64 / 100.0,
            category,
            merchant.map(|m| format!(" ({m})")).unwrap_or_default(),
            time::to_rfc3339_utc(now)
        );
        print!("{}", report::render_ranking(&ranked, limit));
    }
    Ok(())
}

fn statement(cfg: &Config, csv: PathBuf) -> Result<()> {
    if !csv.exists() {
        bail!("CSV not found: {} (pass --csv <path>)", csv.display());
    }
    let catalog = load_catalog(cfg)?;
    let (wallet, cards) = load_wallet_cards(&catalog)?;
    let purchases = parse_purchases_csv(&csv).with_context(|| format!("parsing {}", csv.display()))?;

    let report = replay_statement(&purchases, &wallet, &cards, &catalog, &Valuator::new(cfg.program_table()));
    println!("Replayed {} purchases from {}\n", purchases.len(), csv.display());
    print!("{}", report::render_statement(&report, &cards));
    Ok(())
}

fn wallet(cfg: &Config, command: WalletCommand) -> Result<()> {
    let mut w = state::read_wallet()?;

    match command {
        WalletCommand::List => {
            print_wallet(&w);
            return Ok(());
        }
        WalletCommand::Add { card } => {
            let catalog = load_catalog(cfg)?;
            if catalog.card(&card).is_none() {
                bail!("Unknown card id: {card}");
            }
            if !w.add_card(&card) {
                println!("{card} is already in the wallet");
            }
        }
        WalletCommand::Remove { card } => {
            if !w.remove_card(&card) {
                bail!("{card} is not in the wallet");
            }
        }
        WalletCommand::Activate { card } => {
            require_owned(&w, &card)?;
            w.set_activated(&card, true);
        }
        WalletCommand::Deactivate { card } => {
            require_owned(&w, &card)?;
            w.set_activated(&card, false);
        }
        WalletCommand::Cap { card, cents } => {
            require_owned(&w, &card)?;
            w.set_remaining_cap(&card, Some(cents));
        }
        WalletCommand::CapReset { card } => {
            require_owned(&w, &card)?;
            w.set_remaining_cap(&card, None);
        }
        WalletCommand::Enroll { offer } => {
            let catalog = load_catalog(cfg)?;
            if catalog.offer(&offer).is_none() {
                bail!("Unknown offer id: {offer}");
            }
            w.enroll(&offer);
        }
        WalletCommand::Unenroll { offer } => {
            if !w.unenroll(&offer) {
                println!("Not enrolled in {offer}");
            }
        }
        WalletCommand::Cpp { program, cents } => {
            if !cents.is_finite() || cents < 0.0 {
                bail!("cents-per-point must be a non-negative number");
            }
            w.set_override(&program, cents);
        }
        WalletCommand::CppClear { program } => {
            w.clear_override(&program);
        }
    }

    state::write_wallet(&w)?;
    print_wallet(&w);
    Ok(())
}

fn require_owned(w: &WalletState, card: &str) -> Result<()> {
    if !w.owns(card) {
        bail!("{card} is not in the wallet (cardwise wallet add {card})");
    }
    Ok(())
}

fn print_wallet(w: &WalletState) {
    if w.cards.is_empty() {
        println!("Wallet is empty.");
        return;
    }
    println!("Cards:");
    for id in &w.cards {
        match w.rotating.get(id) {
            Some(r) => println!(
                "- {id} (rotating: {}{})",
                if r.activated { "activated" } else { "not activated" },
                r.remaining_cap_cents
                    .map(|c| format!(", ${:.2} cap left", c as f64 / 100.0))
                    .unwrap_or_default()
            ),
            None => println!("- {id}"),
        }
    }
    if !w.enrolled_offers.is_empty() {
        println!("\nEnrolled offers:");
        for o in &w.enrolled_offers {
            println!("- {o}");
        }
    }
    if !w.program_overrides.is_empty() {
        println!("\nCents-per-point overrides:");
        for (p, cpp) in &w.program_overrides {
            println!("- {p}: {cpp}");
        }
    }
}

/// "42.50" / "$42.50" -> 4250 cents.
fn parse_dollars(s: &str) -> Result<u64> {
    let cleaned = s.trim().trim_start_matches('$').replace(',', "");
    let dollars: f64 = cleaned
        .parse()
        .with_context(|| format!("invalid amount '{s}'"))?;
    if !dollars.is_finite() || dollars < 0.0 {
        bail!("amount must be a non-negative number, got '{s}'");
    }
    Ok((dollars * 100.0).round() as u64)
}

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paywallet::application::accounts::{AccountPatch, AccountService, RegisterAccount};
use paywallet::application::engine::LedgerEngine;
use paywallet::config::LedgerConfig;
use paywallet::domain::account::{Account, ApprovalState, Role};
use paywallet::domain::ports::{AccountStoreRef, LedgerStoreRef};
use paywallet::domain::wallet::WalletStatus;
use paywallet::error::WalletError;
use paywallet::infrastructure::in_memory::InMemoryStore;
use paywallet::interfaces::csv::command_reader::{Command, CommandKind, CommandReader};
use paywallet::interfaces::csv::snapshot_writer::{SnapshotWriter, WalletSnapshot};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Email of the admin account seeded before the replay
    #[arg(long, default_value = "admin@paywallet.dev")]
    admin_email: String,

    /// Password of the seeded admin account
    #[arg(long, default_value = "changeme")]
    admin_password: String,
}

#[cfg(feature = "storage-rocksdb")]
fn build_stores(cli: &Cli) -> Result<(AccountStoreRef, LedgerStoreRef)> {
    if let Some(db_path) = &cli.db_path {
        let store =
            paywallet::infrastructure::rocksdb::RocksDbStore::open(db_path).into_diagnostic()?;
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }

    let store = InMemoryStore::new();
    Ok((Arc::new(store.clone()), Arc::new(store)))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_stores(_cli: &Cli) -> Result<(AccountStoreRef, LedgerStoreRef)> {
    let store = InMemoryStore::new();
    Ok((Arc::new(store.clone()), Arc::new(store)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the snapshot CSV on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (accounts, ledger) = build_stores(&cli)?;
    let config = LedgerConfig::default();
    let account_service = AccountService::new(accounts.clone(), ledger.clone(), config.clone());
    let engine = LedgerEngine::new(accounts, ledger, config);

    let admin = account_service
        .seed_admin(
            "Admin",
            &cli.admin_email,
            "+8801000000000",
            "0000000000",
            &cli.admin_password,
        )
        .await
        .into_diagnostic()?;

    // Process commands
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = apply(&account_service, &engine, &admin, command).await {
                    eprintln!("Error processing command: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {e}");
            }
        }
    }

    // Output final wallet state
    let accounts_list = account_service.list(admin.id).await.into_diagnostic()?;
    let wallets = engine.list_wallets(admin.id).await.into_diagnostic()?;
    let mut rows: Vec<WalletSnapshot> = accounts_list
        .iter()
        .filter_map(|account| {
            wallets
                .iter()
                .find(|w| w.id == account.wallet)
                .map(|wallet| WalletSnapshot {
                    email: account.email.clone(),
                    role: account.role,
                    balance: wallet.balance,
                    status: wallet.status,
                })
        })
        .collect();
    rows.sort_by(|a, b| a.email.cmp(&b.email));

    let stdout = io::stdout();
    let writer = SnapshotWriter::new(stdout.lock());
    writer.write_snapshots(rows).into_diagnostic()?;

    Ok(())
}

async fn apply(
    accounts: &AccountService,
    engine: &LedgerEngine,
    admin: &Account,
    command: Command,
) -> paywallet::error::Result<()> {
    match command.op {
        CommandKind::Register => {
            let role: Role = command.role.as_deref().unwrap_or("user").parse()?;
            let phone = command.required_counterparty()?.to_string();
            let nid = command.nid.clone().ok_or_else(|| {
                WalletError::InvalidState("register requires a nid column".to_string())
            })?;
            let name = command
                .actor
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string();
            accounts
                .register(RegisterAccount {
                    name,
                    email: command.actor,
                    phone,
                    nid,
                    // Replay accounts get a placeholder credential; real
                    // credentials come through the auth service.
                    password: "changeme".to_string(),
                    role,
                })
                .await?;
        }
        CommandKind::Approve => {
            let target = resolve(accounts, &command.actor).await?;
            accounts
                .update(
                    admin.id,
                    target.id,
                    AccountPatch {
                        approval: Some(ApprovalState::Approved),
                        ..Default::default()
                    },
                )
                .await?;
        }
        CommandKind::Deposit => {
            let actor = resolve(accounts, &command.actor).await?;
            engine.deposit(actor.id, command.required_amount()?).await?;
        }
        CommandKind::Withdraw => {
            let actor = resolve(accounts, &command.actor).await?;
            engine
                .withdraw(actor.id, command.required_amount()?)
                .await?;
        }
        CommandKind::Send => {
            let actor = resolve(accounts, &command.actor).await?;
            engine
                .send(
                    actor.id,
                    command.required_counterparty()?,
                    command.required_amount()?,
                )
                .await?;
        }
        CommandKind::CashIn => {
            let actor = resolve(accounts, &command.actor).await?;
            engine
                .cash_in(
                    actor.id,
                    command.required_counterparty()?,
                    command.required_amount()?,
                )
                .await?;
        }
        CommandKind::CashOut => {
            let actor = resolve(accounts, &command.actor).await?;
            engine
                .cash_out(
                    actor.id,
                    command.required_counterparty()?,
                    command.required_amount()?,
                )
                .await?;
        }
        CommandKind::Block => {
            let target = resolve(accounts, &command.actor).await?;
            engine
                .set_wallet_status(admin.id, target.wallet, WalletStatus::Blocked)
                .await?;
        }
        CommandKind::Unblock => {
            let target = resolve(accounts, &command.actor).await?;
            engine
                .set_wallet_status(admin.id, target.wallet, WalletStatus::Unblocked)
                .await?;
        }
    }
    Ok(())
}

async fn resolve(accounts: &AccountService, identity: &str) -> paywallet::error::Result<Account> {
    accounts
        .find_by_identity(identity)
        .await?
        .ok_or_else(|| WalletError::NotFound("account".to_string()))
}

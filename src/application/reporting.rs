use crate::domain::account::{AccountId, Role};
use crate::domain::authz;
use crate::domain::ports::{AccountStoreRef, LedgerStoreRef};
use crate::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::domain::wallet::WalletId;
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Amount,
    Commission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Typed history filter: every allowed field and sort key is enumerated.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// Matches rows where the wallet is either party.
    pub wallet: Option<WalletId>,
    pub initiated_by: Option<AccountId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub sort_by: SortField,
    pub order: SortOrder,
    /// 1-based; 0 is treated as the first page.
    pub page: usize,
    /// 0 falls back to the default page size.
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Per-agent cash totals, scoped to the agent's wallet as either party.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    pub cash_in_count: usize,
    pub cash_in_total: Decimal,
    pub cash_out_count: usize,
    pub cash_out_total: Decimal,
    pub commission_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBreakdown {
    pub kind: TransactionType,
    pub count: usize,
    pub total: Decimal,
}

/// System-wide totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminOverview {
    pub users: usize,
    pub blocked_users: usize,
    pub agents: usize,
    pub suspended_agents: usize,
    pub transactions: usize,
    pub by_type: Vec<TypeBreakdown>,
    pub total_wallet_balance: Decimal,
    pub fees_collected: Decimal,
    pub commissions_collected: Decimal,
}

/// Read-only aggregations over wallets and the transaction trail.
///
/// Reads committed state only and never takes the engine's wallet locks, so
/// it cannot block ledger writers.
pub struct ReportingService {
    accounts: AccountStoreRef,
    ledger: LedgerStoreRef,
}

impl ReportingService {
    pub fn new(accounts: AccountStoreRef, ledger: LedgerStoreRef) -> Self {
        Self { accounts, ledger }
    }

    /// Filtered, sorted, paginated history view.
    pub async fn history(&self, query: TransactionQuery) -> Result<Page<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .ledger
            .transactions()
            .await?
            .into_iter()
            .filter(|tx| query.kind.is_none_or(|k| tx.kind == k))
            .filter(|tx| query.status.is_none_or(|s| tx.status == s))
            .filter(|tx| query.wallet.is_none_or(|w| tx.involves(w)))
            .filter(|tx| query.initiated_by.is_none_or(|a| tx.initiated_by == a))
            .filter(|tx| query.from.is_none_or(|f| tx.created_at >= f))
            .filter(|tx| query.to.is_none_or(|t| tx.created_at <= t))
            .collect();

        // Stable sort keeps trail order among equal keys, so pages do not
        // shuffle between calls.
        match query.sort_by {
            SortField::CreatedAt => rows.sort_by_key(|tx| tx.created_at),
            SortField::Amount => rows.sort_by_key(|tx| tx.amount),
            SortField::Commission => rows.sort_by_key(|tx| tx.commission),
        }
        if query.order == SortOrder::Desc {
            rows.reverse();
        }

        Ok(paginate(rows, query.page, query.limit))
    }

    /// History scoped to an account's own wallet.
    pub async fn account_history(
        &self,
        account: AccountId,
        page: usize,
        limit: usize,
    ) -> Result<Page<Transaction>> {
        let wallet = self
            .ledger
            .wallet_of(account)
            .await?
            .ok_or_else(|| WalletError::NotFound("wallet".to_string()))?;
        self.history(TransactionQuery {
            wallet: Some(wallet.id),
            page,
            limit,
            ..Default::default()
        })
        .await
    }

    pub async fn agent_summary(&self, agent: AccountId) -> Result<AgentSummary> {
        let account = self
            .accounts
            .get(agent)
            .await?
            .ok_or_else(|| WalletError::NotFound("agent".to_string()))?;
        if account.role != Role::Agent {
            return Err(WalletError::InvalidState(
                "account is not an agent".to_string(),
            ));
        }

        let mut summary = AgentSummary {
            cash_in_count: 0,
            cash_in_total: Decimal::ZERO,
            cash_out_count: 0,
            cash_out_total: Decimal::ZERO,
            commission_total: Decimal::ZERO,
        };
        for tx in self.ledger.transactions().await? {
            if !tx.involves(account.wallet) {
                continue;
            }
            match tx.kind {
                TransactionType::CashIn => {
                    summary.cash_in_count += 1;
                    summary.cash_in_total += tx.amount;
                }
                TransactionType::CashOut => {
                    summary.cash_out_count += 1;
                    summary.cash_out_total += tx.amount;
                    summary.commission_total += tx.commission;
                }
                _ => {}
            }
        }
        Ok(summary)
    }

    /// System-wide totals; ADMIN only.
    pub async fn admin_overview(&self, actor: AccountId) -> Result<AdminOverview> {
        let actor = self
            .accounts
            .get(actor)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))?;
        authz::ensure_admin(&actor)?;

        let accounts = self.accounts.all().await?;
        let users = accounts.iter().filter(|a| a.role == Role::User).count();
        let blocked_users = accounts
            .iter()
            .filter(|a| a.role == Role::User && a.is_blocked())
            .count();
        let agents = accounts.iter().filter(|a| a.role == Role::Agent).count();
        let suspended_agents = accounts
            .iter()
            .filter(|a| a.role == Role::Agent && a.is_suspended())
            .count();

        let transactions = self.ledger.transactions().await?;
        let mut by_type: Vec<TypeBreakdown> = Vec::new();
        let mut fees_collected = Decimal::ZERO;
        let mut commissions_collected = Decimal::ZERO;
        for tx in &transactions {
            fees_collected += tx.fee;
            commissions_collected += tx.commission;
            match by_type.iter_mut().find(|b| b.kind == tx.kind) {
                Some(entry) => {
                    entry.count += 1;
                    entry.total += tx.amount;
                }
                None => by_type.push(TypeBreakdown {
                    kind: tx.kind,
                    count: 1,
                    total: tx.amount,
                }),
            }
        }

        let total_wallet_balance = self
            .ledger
            .all_wallets()
            .await?
            .iter()
            .map(|w| w.balance)
            .sum();

        Ok(AdminOverview {
            users,
            blocked_users,
            agents,
            suspended_agents,
            transactions: transactions.len(),
            by_type,
            total_wallet_balance,
            fees_collected,
            commissions_collected,
        })
    }
}

fn paginate<T>(rows: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    let page = page.max(1);
    let total = rows.len();
    let total_pages = total.div_ceil(limit);
    let items = rows
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();
    Page {
        items,
        meta: PageMeta {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total > 0,
        },
    }
}

//! Service trait and the records it exchanges.

use std::fmt;
use std::str::FromStr;

use budgetsh_types::error::{Result, ShellError};

/// Identifier assigned by the service.
pub type Id = u64;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub username: String,
}

/// Role a user holds within a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    Contributor,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Contributor => "CONTRIBUTOR",
            Self::Viewer => "VIEWER",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "CONTRIBUTOR" => Ok(Self::Contributor),
            "VIEWER" => Ok(Self::Viewer),
            _ => Err(ShellError::Command(format!(
                "unknown role '{s}'; use ADMIN, MANAGER, CONTRIBUTOR, or VIEWER"
            ))),
        }
    }
}

/// A budget the user is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    pub id: Id,
    pub name: String,
    pub notes: String,
    /// The requesting user's role in this budget.
    pub role: Role,
}

/// An account under a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Id,
    pub name: String,
    pub account_type: String,
    pub notes: String,
    /// Soft-deleted accounts are hidden unless asked for.
    pub deleted: bool,
}

/// A spending category under a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Id,
    pub name: String,
    pub notes: String,
    /// Name of the group the category belongs to, if any.
    pub group: Option<String>,
}

/// A named group of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: Id,
    pub name: String,
    pub notes: String,
}

/// Someone money is paid to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub id: Id,
    pub name: String,
    pub notes: String,
}

/// A transaction as it is sent to the service.
///
/// Amounts are kept as the user typed them; the service owns currency
/// arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTransaction {
    pub account: String,
    /// Receiving account when the transaction is a transfer.
    pub transfer_account: Option<String>,
    pub payee: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub notes: String,
    pub cleared: bool,
    /// Category name and amount pairs, in entry order.
    pub amounts: Vec<(String, String)>,
}

/// A transaction recorded under a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Id,
    pub account: String,
    pub transfer_account: Option<String>,
    pub payee: String,
    pub date: String,
    pub notes: String,
    pub cleared: bool,
    pub amounts: Vec<(String, String)>,
}

impl Transaction {
    /// Whether the transaction moves money between two accounts.
    pub fn is_transfer(&self) -> bool {
        self.transfer_account.is_some()
    }
}

/// Narrows a transaction listing. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub account: Option<String>,
    pub category: Option<String>,
    pub payee: Option<String>,
}

impl TransactionFilter {
    /// Whether `txn` passes every set field.
    pub fn matches(&self, txn: &Transaction) -> bool {
        let account = self.account.as_deref().is_none_or(|a| {
            txn.account == a || txn.transfer_account.as_deref() == Some(a)
        });
        let category = self
            .category
            .as_deref()
            .is_none_or(|c| txn.amounts.iter().any(|(name, _)| name == c));
        let payee = self.payee.as_deref().is_none_or(|p| txn.payee == p);
        account && category && payee
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The remote budgeting service as seen by command handlers.
///
/// Budget-scoped calls (accounts, categories, groups, payees,
/// transactions) act on the budget last passed to
/// [`BudgetService::view_budget`].
pub trait BudgetService {
    /// Whether the server reports itself ready.
    fn server_ready(&self) -> Result<bool>;

    // -- Users --

    fn create_user(&mut self, username: &str, password: &str) -> Result<()>;
    fn login(&mut self, username: &str, password: &str) -> Result<User>;
    fn logout(&mut self) -> Result<()>;
    /// Token that resumes the current session, if a user is logged in.
    fn refresh_token(&self) -> Option<String>;
    /// Log back in with a token from an earlier session.
    fn resume_session(&mut self, token: &str) -> Result<User>;
    /// Change the logged-in user's credentials after checking the current ones.
    fn update_user(
        &mut self,
        username: &str,
        password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<()>;
    fn delete_user(&mut self, username: &str, password: &str) -> Result<()>;

    // -- Budgets --

    fn create_budget(&mut self, name: &str, notes: &str) -> Result<Budget>;
    /// Budgets of the logged-in user, filtered to `roles` unless empty.
    fn budgets(&self, roles: &[Role]) -> Result<Vec<Budget>>;
    fn update_budget(&mut self, id: Id, name: &str, notes: &str) -> Result<()>;
    fn delete_budget(&mut self, id: Id) -> Result<()>;
    fn view_budget(&mut self, id: Id) -> Result<()>;

    // -- Accounts --

    fn create_account(&mut self, name: &str, account_type: &str, notes: &str) -> Result<Account>;
    fn accounts(&self, include_deleted: bool) -> Result<Vec<Account>>;
    fn update_account(
        &mut self,
        id: Id,
        name: &str,
        account_type: &str,
        notes: &str,
    ) -> Result<()>;
    fn restore_account(&mut self, id: Id) -> Result<()>;
    /// Soft-delete an account, or remove it entirely when `hard` is set.
    fn delete_account(&mut self, id: Id, hard: bool) -> Result<()>;

    // -- Categories --

    fn create_category(
        &mut self,
        name: &str,
        notes: &str,
        group: Option<&str>,
    ) -> Result<Category>;
    fn categories(&self, group: Option<&str>) -> Result<Vec<Category>>;
    fn update_category(
        &mut self,
        id: Id,
        name: &str,
        notes: &str,
        group: Option<&str>,
    ) -> Result<()>;
    fn delete_category(&mut self, id: Id) -> Result<()>;

    // -- Groups --

    fn create_group(&mut self, name: &str, notes: &str) -> Result<Group>;
    fn groups(&self) -> Result<Vec<Group>>;
    fn update_group(&mut self, id: Id, name: &str, notes: &str) -> Result<()>;
    fn delete_group(&mut self, id: Id) -> Result<()>;

    // -- Payees --

    fn create_payee(&mut self, name: &str, notes: &str) -> Result<Payee>;
    fn payees(&self) -> Result<Vec<Payee>>;
    fn update_payee(&mut self, id: Id, name: &str, notes: &str) -> Result<()>;
    fn delete_payee(&mut self, id: Id) -> Result<()>;

    // -- Transactions --

    fn log_transaction(&mut self, txn: NewTransaction) -> Result<Transaction>;
    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
}

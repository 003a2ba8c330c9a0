//! In-memory budgeting service.
//!
//! Useful for unit tests and for running the shell without a server. Users,
//! budgets and everything under them live in plain vectors; ids are handed
//! out from a single counter.

use budgetsh_types::error::{Result, ShellError};

use crate::services::{
    Account, Budget, BudgetService, Category, Group, Id, NewTransaction, Payee, Role, Transaction,
    TransactionFilter, User,
};

#[derive(Debug, Clone)]
struct UserRecord {
    id: Id,
    username: String,
    password: String,
}

#[derive(Debug, Clone, Default)]
struct BudgetRecord {
    id: Id,
    name: String,
    notes: String,
    members: Vec<(Id, Role)>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    groups: Vec<Group>,
    payees: Vec<Payee>,
    transactions: Vec<Transaction>,
}

impl BudgetRecord {
    fn role_of(&self, user: Id) -> Option<Role> {
        self.members
            .iter()
            .find(|(id, _)| *id == user)
            .map(|(_, role)| *role)
    }
}

/// A budgeting service that keeps all state in process.
#[derive(Debug)]
pub struct MemoryService {
    users: Vec<UserRecord>,
    budgets: Vec<BudgetRecord>,
    current_user: Option<Id>,
    viewed: Option<Id>,
    /// Issued session tokens and the user each one resumes.
    sessions: Vec<(String, Id)>,
    next_id: Id,
    ready: bool,
}

impl MemoryService {
    /// Create an empty service that reports itself ready.
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            budgets: Vec::new(),
            current_user: None,
            viewed: None,
            sessions: Vec::new(),
            next_id: 1,
            ready: true,
        }
    }

    /// Change what [`BudgetService::server_ready`] reports.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    fn alloc_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn user_id(&self) -> Result<Id> {
        self.current_user
            .ok_or_else(|| ShellError::Service("no user logged in".to_string()))
    }

    fn check_credentials(&self, username: &str, password: &str) -> Result<Id> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| u.id)
            .ok_or_else(|| ShellError::Service("invalid username or password".to_string()))
    }

    fn member_budget_mut(&mut self, id: Id, allowed: &[Role]) -> Result<&mut BudgetRecord> {
        let user = self.user_id()?;
        let budget = self
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ShellError::Service(format!("no budget with id {id}")))?;
        match budget.role_of(user) {
            Some(role) if allowed.contains(&role) => Ok(budget),
            Some(role) => Err(ShellError::Service(format!(
                "role {role} may not modify budget '{}'",
                budget.name
            ))),
            None => Err(ShellError::Service(format!("no budget with id {id}"))),
        }
    }

    fn viewed(&self) -> Result<&BudgetRecord> {
        let id = self
            .viewed
            .ok_or_else(|| ShellError::Service("no budget in view".to_string()))?;
        self.budgets
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ShellError::Service("budget in view no longer exists".to_string()))
    }

    fn viewed_mut(&mut self) -> Result<&mut BudgetRecord> {
        let id = self
            .viewed
            .ok_or_else(|| ShellError::Service("no budget in view".to_string()))?;
        self.budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ShellError::Service("budget in view no longer exists".to_string()))
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_unique<'a>(
    mut names: impl Iterator<Item = &'a str>,
    name: &str,
    kind: &str,
) -> Result<()> {
    if name.is_empty() {
        return Err(ShellError::Service(format!("{kind} name must not be empty")));
    }
    if names.any(|n| n == name) {
        return Err(ShellError::Service(format!("{kind} '{name}' already exists")));
    }
    Ok(())
}

fn not_found(kind: &str, id: Id) -> ShellError {
    ShellError::Service(format!("no {kind} with id {id}"))
}

const EDITORS: &[Role] = &[Role::Admin, Role::Manager];

impl BudgetService for MemoryService {
    fn server_ready(&self) -> Result<bool> {
        Ok(self.ready)
    }

    fn create_user(&mut self, username: &str, password: &str) -> Result<()> {
        ensure_unique(
            self.users.iter().map(|u| u.username.as_str()),
            username,
            "user",
        )?;
        let id = self.alloc_id();
        self.users.push(UserRecord {
            id,
            username: username.to_string(),
            password: password.to_string(),
        });
        log::debug!("created user {username} ({id})");
        Ok(())
    }

    fn login(&mut self, username: &str, password: &str) -> Result<User> {
        let id = self.check_credentials(username, password)?;
        let serial = self.alloc_id();
        self.sessions.push((format!("session-{id}-{serial}"), id));
        self.current_user = Some(id);
        self.viewed = None;
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    fn logout(&mut self) -> Result<()> {
        let id = self.user_id()?;
        self.sessions.retain(|(_, user)| *user != id);
        self.current_user = None;
        self.viewed = None;
        Ok(())
    }

    fn refresh_token(&self) -> Option<String> {
        let id = self.current_user?;
        self.sessions
            .iter()
            .rev()
            .find(|(_, user)| *user == id)
            .map(|(token, _)| token.clone())
    }

    fn resume_session(&mut self, token: &str) -> Result<User> {
        let id = self
            .sessions
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, user)| *user)
            .ok_or_else(|| ShellError::Service("session expired; log in again".to_string()))?;
        let username = self
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .ok_or_else(|| ShellError::Service("session user no longer exists".to_string()))?;
        self.current_user = Some(id);
        self.viewed = None;
        Ok(User { id, username })
    }

    fn update_user(
        &mut self,
        username: &str,
        password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<()> {
        let current = self.user_id()?;
        let id = self.check_credentials(username, password)?;
        if id != current {
            return Err(ShellError::Service(
                "credentials do not belong to the logged-in user".to_string(),
            ));
        }
        if new_username != username {
            ensure_unique(
                self.users.iter().map(|u| u.username.as_str()),
                new_username,
                "user",
            )?;
        }
        if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
            user.username = new_username.to_string();
            user.password = new_password.to_string();
        }
        Ok(())
    }

    fn delete_user(&mut self, username: &str, password: &str) -> Result<()> {
        let id = self.check_credentials(username, password)?;
        self.users.retain(|u| u.id != id);
        self.sessions.retain(|(_, user)| *user != id);
        for budget in &mut self.budgets {
            budget.members.retain(|(member, _)| *member != id);
        }
        self.budgets.retain(|b| !b.members.is_empty());
        if self.current_user == Some(id) {
            self.current_user = None;
            self.viewed = None;
        }
        Ok(())
    }

    fn create_budget(&mut self, name: &str, notes: &str) -> Result<Budget> {
        let user = self.user_id()?;
        ensure_unique(
            self.budgets
                .iter()
                .filter(|b| b.role_of(user).is_some())
                .map(|b| b.name.as_str()),
            name,
            "budget",
        )?;
        let id = self.alloc_id();
        self.budgets.push(BudgetRecord {
            id,
            name: name.to_string(),
            notes: notes.to_string(),
            members: vec![(user, Role::Admin)],
            ..BudgetRecord::default()
        });
        Ok(Budget {
            id,
            name: name.to_string(),
            notes: notes.to_string(),
            role: Role::Admin,
        })
    }

    fn budgets(&self, roles: &[Role]) -> Result<Vec<Budget>> {
        let user = self.user_id()?;
        Ok(self
            .budgets
            .iter()
            .filter_map(|b| {
                let role = b.role_of(user)?;
                (roles.is_empty() || roles.contains(&role)).then(|| Budget {
                    id: b.id,
                    name: b.name.clone(),
                    notes: b.notes.clone(),
                    role,
                })
            })
            .collect())
    }

    fn update_budget(&mut self, id: Id, name: &str, notes: &str) -> Result<()> {
        let budget = self.member_budget_mut(id, EDITORS)?;
        budget.name = name.to_string();
        budget.notes = notes.to_string();
        Ok(())
    }

    fn delete_budget(&mut self, id: Id) -> Result<()> {
        self.member_budget_mut(id, &[Role::Admin])?;
        self.budgets.retain(|b| b.id != id);
        if self.viewed == Some(id) {
            self.viewed = None;
        }
        Ok(())
    }

    fn view_budget(&mut self, id: Id) -> Result<()> {
        let user = self.user_id()?;
        if !self
            .budgets
            .iter()
            .any(|b| b.id == id && b.role_of(user).is_some())
        {
            return Err(not_found("budget", id));
        }
        self.viewed = Some(id);
        Ok(())
    }

    fn create_account(&mut self, name: &str, account_type: &str, notes: &str) -> Result<Account> {
        let id = self.alloc_id();
        let budget = self.viewed_mut()?;
        ensure_unique(
            budget.accounts.iter().map(|a| a.name.as_str()),
            name,
            "account",
        )?;
        let account = Account {
            id,
            name: name.to_string(),
            account_type: account_type.to_string(),
            notes: notes.to_string(),
            deleted: false,
        };
        budget.accounts.push(account.clone());
        Ok(account)
    }

    fn accounts(&self, include_deleted: bool) -> Result<Vec<Account>> {
        Ok(self
            .viewed()?
            .accounts
            .iter()
            .filter(|a| include_deleted || !a.deleted)
            .cloned()
            .collect())
    }

    fn update_account(
        &mut self,
        id: Id,
        name: &str,
        account_type: &str,
        notes: &str,
    ) -> Result<()> {
        let budget = self.viewed_mut()?;
        let account = budget
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("account", id))?;
        account.name = name.to_string();
        account.account_type = account_type.to_string();
        account.notes = notes.to_string();
        Ok(())
    }

    fn restore_account(&mut self, id: Id) -> Result<()> {
        let budget = self.viewed_mut()?;
        let account = budget
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("account", id))?;
        if !account.deleted {
            return Err(ShellError::Service(format!(
                "account '{}' is not deleted",
                account.name
            )));
        }
        account.deleted = false;
        Ok(())
    }

    fn delete_account(&mut self, id: Id, hard: bool) -> Result<()> {
        let budget = self.viewed_mut()?;
        let index = budget
            .accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found("account", id))?;
        if hard {
            budget.accounts.remove(index);
        } else {
            budget.accounts[index].deleted = true;
        }
        Ok(())
    }

    fn create_category(
        &mut self,
        name: &str,
        notes: &str,
        group: Option<&str>,
    ) -> Result<Category> {
        let id = self.alloc_id();
        let budget = self.viewed_mut()?;
        ensure_unique(
            budget.categories.iter().map(|c| c.name.as_str()),
            name,
            "category",
        )?;
        if let Some(group) = group
            && !budget.groups.iter().any(|g| g.name == group)
        {
            return Err(ShellError::Service(format!("no group named '{group}'")));
        }
        let category = Category {
            id,
            name: name.to_string(),
            notes: notes.to_string(),
            group: group.map(str::to_string),
        };
        budget.categories.push(category.clone());
        Ok(category)
    }

    fn categories(&self, group: Option<&str>) -> Result<Vec<Category>> {
        Ok(self
            .viewed()?
            .categories
            .iter()
            .filter(|c| group.is_none() || c.group.as_deref() == group)
            .cloned()
            .collect())
    }

    fn update_category(
        &mut self,
        id: Id,
        name: &str,
        notes: &str,
        group: Option<&str>,
    ) -> Result<()> {
        let budget = self.viewed_mut()?;
        if let Some(group) = group
            && !budget.groups.iter().any(|g| g.name == group)
        {
            return Err(ShellError::Service(format!("no group named '{group}'")));
        }
        let category = budget
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("category", id))?;
        category.name = name.to_string();
        category.notes = notes.to_string();
        if group.is_some() {
            category.group = group.map(str::to_string);
        }
        Ok(())
    }

    fn delete_category(&mut self, id: Id) -> Result<()> {
        let budget = self.viewed_mut()?;
        let before = budget.categories.len();
        budget.categories.retain(|c| c.id != id);
        if budget.categories.len() == before {
            return Err(not_found("category", id));
        }
        Ok(())
    }

    fn create_group(&mut self, name: &str, notes: &str) -> Result<Group> {
        let id = self.alloc_id();
        let budget = self.viewed_mut()?;
        ensure_unique(budget.groups.iter().map(|g| g.name.as_str()), name, "group")?;
        let group = Group {
            id,
            name: name.to_string(),
            notes: notes.to_string(),
        };
        budget.groups.push(group.clone());
        Ok(group)
    }

    fn groups(&self) -> Result<Vec<Group>> {
        Ok(self.viewed()?.groups.clone())
    }

    fn update_group(&mut self, id: Id, name: &str, notes: &str) -> Result<()> {
        let budget = self.viewed_mut()?;
        let group = budget
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("group", id))?;
        let old_name = std::mem::replace(&mut group.name, name.to_string());
        group.notes = notes.to_string();
        for category in &mut budget.categories {
            if category.group.as_deref() == Some(old_name.as_str()) {
                category.group = Some(name.to_string());
            }
        }
        Ok(())
    }

    fn delete_group(&mut self, id: Id) -> Result<()> {
        let budget = self.viewed_mut()?;
        let index = budget
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found("group", id))?;
        let removed = budget.groups.remove(index);
        for category in &mut budget.categories {
            if category.group.as_deref() == Some(removed.name.as_str()) {
                category.group = None;
            }
        }
        Ok(())
    }

    fn create_payee(&mut self, name: &str, notes: &str) -> Result<Payee> {
        let id = self.alloc_id();
        let budget = self.viewed_mut()?;
        ensure_unique(budget.payees.iter().map(|p| p.name.as_str()), name, "payee")?;
        let payee = Payee {
            id,
            name: name.to_string(),
            notes: notes.to_string(),
        };
        budget.payees.push(payee.clone());
        Ok(payee)
    }

    fn payees(&self) -> Result<Vec<Payee>> {
        Ok(self.viewed()?.payees.clone())
    }

    fn update_payee(&mut self, id: Id, name: &str, notes: &str) -> Result<()> {
        let budget = self.viewed_mut()?;
        let payee = budget
            .payees
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("payee", id))?;
        payee.name = name.to_string();
        payee.notes = notes.to_string();
        Ok(())
    }

    fn delete_payee(&mut self, id: Id) -> Result<()> {
        let budget = self.viewed_mut()?;
        let before = budget.payees.len();
        budget.payees.retain(|p| p.id != id);
        if budget.payees.len() == before {
            return Err(not_found("payee", id));
        }
        Ok(())
    }

    fn log_transaction(&mut self, txn: NewTransaction) -> Result<Transaction> {
        let id = self.alloc_id();
        let budget = self.viewed_mut()?;
        let open_account = |name: &str| {
            budget.accounts.iter().any(|a| a.name == name && !a.deleted)
        };
        if !open_account(&txn.account) {
            return Err(ShellError::Service(format!("no account named '{}'", txn.account)));
        }
        if let Some(to) = &txn.transfer_account {
            if !open_account(to) {
                return Err(ShellError::Service(format!("no account named '{to}'")));
            }
            if *to == txn.account {
                return Err(ShellError::Service(
                    "cannot transfer from an account to itself".to_string(),
                ));
            }
        } else {
            if !txn.payee.is_empty() && !budget.payees.iter().any(|p| p.name == txn.payee) {
                return Err(ShellError::Service(format!("no payee named '{}'", txn.payee)));
            }
            if let Some((category, _)) = txn
                .amounts
                .iter()
                .find(|(category, _)| !budget.categories.iter().any(|c| c.name == *category))
            {
                return Err(ShellError::Service(format!("no category named '{category}'")));
            }
        }
        if txn.amounts.is_empty() {
            return Err(ShellError::Service("transaction has no amounts".to_string()));
        }

        let recorded = Transaction {
            id,
            account: txn.account,
            transfer_account: txn.transfer_account,
            payee: txn.payee,
            date: txn.date,
            notes: txn.notes,
            cleared: txn.cleared,
            amounts: txn.amounts,
        };
        log::debug!("logged transaction {id} to {}", recorded.account);
        budget.transactions.push(recorded.clone());
        Ok(recorded)
    }

    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        Ok(self
            .viewed()?
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}

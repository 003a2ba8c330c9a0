//! Session object, handler context, and dispatch.
//!
//! [`Shell`] owns everything a command can touch: the registry, the
//! budgeting service, the local config, the logged-in user and viewed
//! budget, and the queue of synthetic follow-up lines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use budgetsh_platform::{Budget, BudgetService, User};
use budgetsh_types::config::ShellConfig;
use budgetsh_types::error::{Result, ShellError};

use crate::args::ArgTracker;
use crate::parser::{self, Command};
use crate::registry::{CommandRegistry, RegistrationStatus};

/// Capacity of the synthetic command queue.
pub const QUEUE_CAPACITY: usize = 32;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal.
    Clear,
}

/// What the read loop does after a line has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Show the output and keep reading.
    Continue(CommandOutput),
    /// Stop the read loop.
    Exit,
}

impl Default for Flow {
    fn default() -> Self {
        Self::Continue(CommandOutput::None)
    }
}

impl From<CommandOutput> for Flow {
    fn from(output: CommandOutput) -> Self {
        Self::Continue(output)
    }
}

/// Everything a handler receives about the line being run.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub cmd: Command,
    pub args: ArgTracker,
    /// Side channel between dispatch wrappers and handlers.
    pub values: HashMap<String, String>,
}

impl HandlerContext {
    /// Context for `cmd`, with the tracker at its first positional.
    pub fn new(cmd: Command) -> Self {
        let args = ArgTracker::new(&cmd);
        Self {
            cmd,
            args,
            values: HashMap::new(),
        }
    }

    /// Point the tracker at `option`'s arguments.
    pub fn track_opt(&mut self, option: &str) {
        self.args.track_opt_args(&self.cmd, option);
    }

    /// Whether `option` was given on the line.
    pub fn has_opt(&self, option: &str) -> bool {
        self.cmd.has_opt(option)
    }

    /// The action recorded by [`dispatch_action`], if any.
    pub fn action(&self) -> Option<&str> {
        self.values.get("action").map(String::as_str)
    }
}

/// Callback of every command built with actions.
///
/// Pulls the action name off the tracker, checks it against the handler's
/// actions, records it under `"action"`, and runs the action.
pub fn dispatch_action(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = ctx.cmd.name.clone();
    let Some((handler, _)) = shell.registry.exists(&name) else {
        return Err(ShellError::UnknownCommand(name));
    };
    let Some(action_name) = ctx.args.pfx() else {
        return Err(ShellError::NoAction(name));
    };
    let Some(action) = handler.action(&action_name) else {
        return Err(ShellError::InvalidAction {
            command: name,
            action: action_name,
        });
    };
    log::debug!("{name}: running action '{action_name}'");
    ctx.values.insert("action".to_string(), action_name);
    (action.run)(shell, ctx)
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// The interactive session.
pub struct Shell {
    registry: CommandRegistry,
    service: Box<dyn BudgetService>,
    config: ShellConfig,
    config_path: Option<PathBuf>,
    user: Option<User>,
    viewed_budget: Option<Budget>,
    queue_tx: SyncSender<String>,
    queue_rx: Receiver<String>,
}

impl Shell {
    /// Create a session with every command preregistered and the base set
    /// registered.
    pub fn new(service: Box<dyn BudgetService>, config: ShellConfig) -> Self {
        let mut registry = CommandRegistry::new();
        registry.preregister_base(crate::commands::base_handlers());
        registry.preregister(crate::budget_commands::budget_handler());
        registry.batch_registration(
            crate::resource_handlers(),
            RegistrationStatus::Preregistered,
        );
        let (queue_tx, queue_rx) = mpsc::sync_channel(QUEUE_CAPACITY);
        Self {
            registry,
            service,
            config,
            config_path: None,
            user: None,
            viewed_budget: None,
            queue_tx,
            queue_rx,
        }
    }

    /// Remember where the config was loaded from, for `config load|edit`
    /// and for saving the session on exit.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn service(&self) -> &dyn BudgetService {
        self.service.as_ref()
    }

    pub fn service_mut(&mut self) -> &mut dyn BudgetService {
        self.service.as_mut()
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Replace the settings in use. Nothing is written to disk.
    pub fn set_config(&mut self, config: ShellConfig) {
        self.config = config;
    }

    /// Path given to [`Shell::with_config_path`], if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// File the config is read from and written to: the remembered path,
    /// else the default lookup.
    pub fn config_file(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(ShellConfig::config_path)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn viewed_budget(&self) -> Option<&Budget> {
        self.viewed_budget.as_ref()
    }

    /// Prompt reflecting the session state.
    pub fn prompt(&self) -> String {
        match (&self.user, &self.viewed_budget) {
            (Some(user), Some(budget)) => format!("b/{}[{}] > ", user.username, budget.name),
            (Some(user), None) => format!("b/{} > ", user.username),
            _ => "budgetsh > ".to_string(),
        }
    }

    // -- Session events --

    /// A user logged in: budget commands become available.
    pub fn on_login(&mut self, user: User) {
        if self.user.is_some() {
            self.on_logout();
        }
        log::info!("logged in as {}", user.username);
        self.user = Some(user);
        self.viewed_budget = None;
        self.registry.register(crate::budget_commands::BUDGET_COMMAND);
    }

    /// A budget was selected: its resource commands become available.
    pub fn on_view_budget(&mut self, budget: Budget) {
        self.on_leave_budget();
        log::info!("viewing budget {} ({})", budget.name, budget.id);
        self.viewed_budget = Some(budget);
        self.registry
            .batch_registration(crate::resource_handlers(), RegistrationStatus::Registered);
    }

    /// The viewed budget went away: its resource commands are withdrawn.
    pub fn on_leave_budget(&mut self) {
        if self.viewed_budget.take().is_none() {
            return;
        }
        for handler in crate::resource_handlers() {
            self.registry.deregister(handler.name());
        }
    }

    /// The logged-in user changed their username.
    pub fn rename_user(&mut self, username: &str) {
        if let Some(user) = self.user.as_mut() {
            user.username = username.to_string();
        }
    }

    /// The user logged out: only the base commands remain.
    pub fn on_logout(&mut self) {
        if let Some(user) = self.user.take() {
            log::info!("logged out {}", user.username);
        }
        self.viewed_budget = None;
        self.registry.deregister_non_base_commands();
    }

    // -- Saved sessions --

    /// Log back in with the token an earlier run saved.
    ///
    /// Only when `stay_logged_in` is set. A token the service no longer
    /// accepts leaves the session logged out; [`Shell::persist_session`]
    /// then removes it from the file.
    pub fn resume_session(&mut self) {
        if !self.config.stay_logged_in || self.config.refresh_token.is_empty() {
            return;
        }
        match self.service.resume_session(&self.config.refresh_token) {
            Ok(user) => self.on_login(user),
            Err(e) => log::warn!("could not resume saved session: {e}"),
        }
    }

    /// Write the session token to the config file before exiting.
    ///
    /// With `stay_logged_in` unset a saved token is removed instead. The
    /// file is only rewritten when the token changed.
    pub fn persist_session(&mut self) -> Result<()> {
        let token = if self.config.stay_logged_in {
            self.service.refresh_token().unwrap_or_default()
        } else {
            String::new()
        };
        if token == self.config.refresh_token {
            return Ok(());
        }
        self.config.refresh_token = token;
        let path = self.config_file();
        self.config.save_to(&path)?;
        log::debug!("saved session state to {}", path.display());
        Ok(())
    }

    // -- Queue --

    /// Queue a line to run before the next user input.
    pub fn enqueue(&mut self, line: impl Into<String>) -> Result<()> {
        match self.queue_tx.try_send(line.into()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(line)) => {
                log::warn!("dropping queued command '{line}'");
                Err(ShellError::QueueFull(QUEUE_CAPACITY))
            },
            Err(TrySendError::Disconnected(_)) => {
                Err(ShellError::Command("command queue is closed".to_string()))
            },
        }
    }

    /// Oldest queued line, if any.
    pub fn next_queued(&mut self) -> Option<String> {
        self.queue_rx.try_recv().ok()
    }

    // -- Dispatch --

    /// Resolve and run one line.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let Some(name) = parser::tokenize(line).into_iter().next() else {
            return Ok(Flow::default());
        };
        let handler = match self.registry.exists(&name) {
            Some((handler, RegistrationStatus::Registered)) => handler,
            Some((handler, RegistrationStatus::Preregistered)) => {
                return Err(ShellError::NotYetAvailable {
                    command: name,
                    reason: handler.unavailable.to_string(),
                });
            },
            Some((_, RegistrationStatus::NotRegistered)) | None => {
                return Err(ShellError::UnknownCommand(name));
            },
        };
        let cmd = parser::parse(&handler, line)?;
        let mut ctx = HandlerContext::new(cmd);
        (handler.callback)(self, &mut ctx)
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("user", &self.user)
            .field("viewed_budget", &self.viewed_budget)
            .finish_non_exhaustive()
    }
}

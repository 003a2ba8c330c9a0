//! Command grammar, registry, and dispatch for budgetsh.
//!
//! A static catalog describes every command, its actions, and their
//! options. Input lines are tokenized, resolved against the catalog by the
//! parser, and dispatched through a registry whose entries are enabled and
//! disabled by session events (login, logout, budget selection).

mod account_commands;
mod args;
mod budget_commands;
mod catalog;
mod category_commands;
mod commands;
mod interpreter;
mod parser;
mod payee_commands;
mod registry;
mod repl;
mod txn_commands;

/// Cursor pair handlers use to pull positional and option arguments.
pub use args::ArgTracker;
/// Handler for the login-scoped `budget` command.
pub use budget_commands::budget_handler;
/// Catalog building blocks.
pub use catalog::{Action, CommandSpec, FLAG_SET, Handler, HandlerFn, OptionSpec};
/// Handlers registered for the whole session.
pub use commands::base_handlers;
/// Session object, handler context, and dispatch outcomes.
pub use interpreter::{
    CommandOutput, Flow, HandlerContext, QUEUE_CAPACITY, Shell, dispatch_action,
};
/// Tokenizer and parser.
pub use parser::{Command, is_option_marker, parse, tokenize};
/// Registry of handlers and their registration status.
pub use registry::{CommandRegistry, RegistrationStatus};
/// Read loop over any line source.
pub use repl::{render, run_repl};

/// Handlers scoped to the budget in view.
pub fn resource_handlers() -> Vec<Handler> {
    vec![
        account_commands::account_handler(),
        category_commands::category_handler(),
        category_commands::group_handler(),
        payee_commands::payee_handler(),
        txn_commands::txn_handler(),
    ]
}

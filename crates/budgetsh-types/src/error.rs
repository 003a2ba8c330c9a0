//! Error types for budgetsh.

use std::fmt;
use std::io;

/// Which option list a marker token was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionScope {
    /// The top-level command's own options.
    Command,
    /// The options of the action matched earlier on the line.
    Action,
}

impl fmt::Display for OptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Action => f.write_str("action"),
        }
    }
}

/// Errors raised while resolving a line against a command's catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("input command includes unexpected {scope} option '{option}'")]
    UnexpectedOption { option: String, scope: OptionScope },

    #[error("command could not be parsed; missing argument(s) for option [{option}]: <{parameter}>")]
    MissingOptionArgument { option: String, parameter: String },

    #[error("input command includes unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("command could not be parsed; missing positional argument: <{0}>")]
    MissingPositionalArgument(String),
}

/// Errors produced by the budgetsh shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("cannot execute command '{command}': {reason}")]
    NotYetAvailable { command: String, reason: String },

    #[error("no action specified; see 'help {0}'")]
    NoAction(String),

    #[error("invalid action for command '{command}': {action}; see 'help {command}'")]
    InvalidAction { command: String, action: String },

    #[error("command error: {0}")]
    Command(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("command queue is full ({0} pending)")]
    QueueFull(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;

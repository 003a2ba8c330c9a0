//! Sequential consumption of a parsed command's arguments.

use crate::parser::Command;

/// Yields a command's positional arguments, or one option's arguments when
/// switched over with [`ArgTracker::track_opt_args`].
#[derive(Debug, Clone, Default)]
pub struct ArgTracker {
    cmd_args: Vec<String>,
    cmd_index: usize,
    opt_args: Option<Vec<String>>,
    opt_index: usize,
}

impl ArgTracker {
    /// A tracker positioned at `cmd`'s first positional argument.
    pub fn new(cmd: &Command) -> Self {
        let mut tracker = Self::default();
        tracker.init(cmd);
        tracker
    }

    /// Reset to the start of `cmd`'s positional arguments.
    pub fn init(&mut self, cmd: &Command) {
        self.cmd_args = cmd.args.clone();
        self.cmd_index = 0;
        self.opt_args = None;
        self.opt_index = 0;
    }

    /// Switch to the arguments of `option`.
    ///
    /// If the option was not supplied, [`ArgTracker::pfx`] yields nothing
    /// until the tracker is re-initialized.
    pub fn track_opt_args(&mut self, cmd: &Command, option: &str) {
        self.opt_args = Some(cmd.opts.get(option).cloned().unwrap_or_default());
        self.opt_index = 0;
    }

    /// Next argument in the active sequence, advancing past it.
    pub fn pfx(&mut self) -> Option<String> {
        let (list, index) = match &self.opt_args {
            Some(opt_args) => (opt_args, &mut self.opt_index),
            None => (&self.cmd_args, &mut self.cmd_index),
        };
        let next = list.get(*index)?.clone();
        *index += 1;
        Some(next)
    }

    /// Next argument, or `default` when the sequence is exhausted.
    pub fn pfx_or(&mut self, default: &str) -> String {
        self.pfx().unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn login_command() -> Command {
        Command {
            name: "user".into(),
            args: vec!["login".into(), "alice".into(), "secret".into()],
            opts: HashMap::from([("view-budget".to_string(), vec!["My Budget".to_string()])]),
        }
    }

    #[test]
    fn yields_positionals_in_order() {
        let mut args = ArgTracker::new(&login_command());
        assert_eq!(args.pfx().as_deref(), Some("login"));
        assert_eq!(args.pfx().as_deref(), Some("alice"));
        assert_eq!(args.pfx().as_deref(), Some("secret"));
        assert_eq!(args.pfx(), None);
        assert_eq!(args.pfx(), None);
    }

    #[test]
    fn switches_to_option_arguments() {
        let cmd = login_command();
        let mut args = ArgTracker::new(&cmd);
        args.pfx();
        args.track_opt_args(&cmd, "view-budget");
        assert_eq!(args.pfx().as_deref(), Some("My Budget"));
        assert_eq!(args.pfx(), None);
    }

    #[test]
    fn absent_option_yields_nothing() {
        let cmd = login_command();
        let mut args = ArgTracker::new(&cmd);
        args.track_opt_args(&cmd, "notes");
        assert_eq!(args.pfx(), None);
        assert_eq!(args.pfx_or("none"), "none");
    }

    #[test]
    fn init_returns_to_positionals() {
        let cmd = login_command();
        let mut args = ArgTracker::new(&cmd);
        args.pfx();
        args.track_opt_args(&cmd, "view-budget");
        args.init(&cmd);
        assert_eq!(args.pfx().as_deref(), Some("login"));
        assert_eq!(args.pfx().as_deref(), Some("alice"));
    }
}

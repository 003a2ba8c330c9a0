//! Static command catalog: commands, their actions, and options.
//!
//! A catalog entry is pure data built once at startup. Options and actions
//! are separate shapes, so an option can never own options of its own.

use std::fmt;

use budgetsh_types::error::Result;

use crate::interpreter::{Flow, HandlerContext, Shell, dispatch_action};

/// Argument recorded for an option that takes no arguments.
pub const FLAG_SET: &str = "SET";

/// Function executed for a command or one of its actions.
pub type HandlerFn = fn(&mut Shell, &mut HandlerContext) -> Result<Flow>;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// A dash-prefixed modifier accepted by a command or an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Values the option absorbs after its marker, in order.
    pub parameters: Vec<&'static str>,
    /// Whether `-<first letter>` also selects this option.
    pub shorthand: bool,
}

impl OptionSpec {
    /// A flag named `name`, with no arguments and no shorthand.
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            parameters: Vec::new(),
            shorthand: false,
        }
    }

    /// Declare the values the option absorbs.
    pub fn parameters(mut self, parameters: &[&'static str]) -> Self {
        self.parameters = parameters.to_vec();
        self
    }

    /// Also accept `-<first letter>`.
    pub fn shorthand(mut self) -> Self {
        self.shorthand = true;
        self
    }

    /// Number of arguments the option requires. Zero means it is a flag.
    pub fn arg_count(&self) -> usize {
        self.parameters.len()
    }

    /// First character of the name, used for shorthand matching.
    pub fn letter(&self) -> Option<char> {
        self.name.chars().next()
    }

    /// Whether marker text (dashes already stripped) selects this option.
    pub fn matches(&self, text: &str) -> bool {
        if self.name == text {
            return true;
        }
        let mut chars = text.chars();
        self.shorthand && chars.next() == self.letter() && chars.next().is_none()
    }

    fn label(&self) -> String {
        let mut label = if self.shorthand {
            format!("-{}, --{}", self.name.chars().next().unwrap_or('-'), self.name)
        } else {
            format!("--{}", self.name)
        };
        for p in &self.parameters {
            label.push_str(&format!(" <{p}>"));
        }
        label
    }
}

// ---------------------------------------------------------------------------
// Commands and actions
// ---------------------------------------------------------------------------

/// The top-level element of a command: what the user types first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Listing order; lower sorts first.
    pub priority: i32,
    pub parameters: Vec<&'static str>,
    pub options: Vec<OptionSpec>,
}

impl CommandSpec {
    /// A command with priority 0, no parameters and no options.
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            ..Self::default()
        }
    }

    /// Set the listing order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Declare the command's own positional parameters.
    pub fn parameters(mut self, parameters: &[&'static str]) -> Self {
        self.parameters = parameters.to_vec();
        self
    }

    /// Add a command-scope option.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Usage line, e.g. `help <command> [options]`, optionally with the
    /// option table.
    pub fn usage(&self, with_options: bool) -> String {
        render_usage(self.name, &self.parameters, &self.options, with_options)
    }
}

/// A named sub-operation of a command, bound to its own handler function.
#[derive(Clone)]
pub struct Action {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<&'static str>,
    pub options: Vec<OptionSpec>,
    pub run: HandlerFn,
}

impl Action {
    /// An action run by `run`, with no parameters or options yet.
    pub fn new(name: &'static str, description: &'static str, run: HandlerFn) -> Self {
        Self {
            name,
            description,
            parameters: Vec::new(),
            options: Vec::new(),
            run,
        }
    }

    /// Declare the positionals that follow the action name.
    pub fn parameters(mut self, parameters: &[&'static str]) -> Self {
        self.parameters = parameters.to_vec();
        self
    }

    /// Add an action-scope option.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Usage line prefixed with the owning command's name.
    pub fn usage(&self, command: &str, with_options: bool) -> String {
        let name = format!("{command} {}", self.name);
        render_usage(&name, &self.parameters, &self.options, with_options)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The executable unit bound to a top-level command name.
#[derive(Clone)]
pub struct Handler {
    pub spec: CommandSpec,
    pub actions: Vec<Action>,
    pub callback: HandlerFn,
    /// Shown when the command exists but cannot run yet.
    pub unavailable: &'static str,
}

impl Handler {
    /// A command without actions, run by `callback`.
    pub fn new(spec: CommandSpec, callback: HandlerFn) -> Self {
        Self {
            spec,
            actions: Vec::new(),
            callback,
            unavailable: "",
        }
    }

    /// A command whose first positional names one of `actions`.
    ///
    /// The callback validates the action, records it in the context under
    /// `"action"`, and runs the action's own function.
    pub fn with_actions(spec: CommandSpec, actions: Vec<Action>) -> Self {
        Self {
            spec,
            actions,
            callback: dispatch_action,
            unavailable: "",
        }
    }

    /// Reason shown while the command is preregistered but not runnable.
    pub fn unavailable(mut self, message: &'static str) -> Self {
        self.unavailable = message;
        self
    }

    /// Command name the handler is registered under.
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        self.spec.description
    }

    /// Listing order of the command.
    pub fn priority(&self) -> i32 {
        self.spec.priority
    }

    /// The action called `name`, if the command has one.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Full help: description, usage with options, and the action list.
    pub fn help_text(&self) -> String {
        let mut out = format!(
            "COMMAND: {}\n{}\nUSAGE: {}",
            self.spec.name,
            self.spec.description,
            self.spec.usage(true)
        );
        if !self.actions.is_empty() {
            out.push_str("\nACTIONS:\n");
            out.push_str(&format!(
                "(for further help, specify \"help {} <action>\")\n",
                self.spec.name
            ));
            out.push_str(&aligned(
                self.actions.iter().map(|a| (a.name.to_string(), a.description)),
            ));
        }
        out
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("spec", &self.spec)
            .field("actions", &self.actions)
            .field("unavailable", &self.unavailable)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_usage(
    name: &str,
    parameters: &[&'static str],
    options: &[OptionSpec],
    with_options: bool,
) -> String {
    let mut usage = name.to_string();
    for p in parameters {
        usage.push_str(&format!(" <{p}>"));
    }
    if options.is_empty() {
        return usage;
    }
    usage.push_str(" [options]");
    if with_options {
        usage.push_str("\nOPTIONS:\n");
        usage.push_str(&aligned(
            options.iter().map(|o| (o.label(), o.description)),
        ));
    }
    usage
}

/// Two-column listing with the first column padded to its widest entry.
pub(crate) fn aligned<'a>(rows: impl Iterator<Item = (String, &'a str)>) -> String {
    let rows: Vec<(String, &str)> = rows.collect();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, desc)| format!("  {name:<width$}  {desc}").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Shell, _: &mut HandlerContext) -> Result<Flow> {
        Ok(Flow::default())
    }

    #[test]
    fn shorthand_matches_first_letter_only_when_enabled() {
        let group = OptionSpec::new("group", "").parameters(&["group_name"]).shorthand();
        assert!(group.matches("group"));
        assert!(group.matches("g"));
        assert!(!group.matches("gr"));

        let notes = OptionSpec::new("notes", "").parameters(&["notes_value"]);
        assert!(notes.matches("notes"));
        assert!(!notes.matches("n"));
    }

    #[test]
    fn flag_has_no_arguments() {
        assert_eq!(OptionSpec::new("hard", "").arg_count(), 0);
    }

    #[test]
    fn usage_lists_parameters() {
        let spec = CommandSpec::new("transfer", "").parameters(&["from", "to"]);
        assert_eq!(spec.usage(false), "transfer <from> <to>");
    }

    #[test]
    fn usage_marks_options() {
        let spec = CommandSpec::new("help", "")
            .parameters(&["command"])
            .option(OptionSpec::new("verbose", "show everything").shorthand());
        assert_eq!(spec.usage(false), "help <command> [options]");
        let full = spec.usage(true);
        assert!(full.contains("OPTIONS:"));
        assert!(full.contains("-v, --verbose  show everything"));
    }

    #[test]
    fn option_table_is_aligned() {
        let spec = CommandSpec::new("x", "")
            .option(OptionSpec::new("name", "rename").parameters(&["new_name"]))
            .option(OptionSpec::new("notes", "renote").parameters(&["n"]));
        let full = spec.usage(true);
        let lines: Vec<&str> = full.lines().skip(2).collect();
        assert_eq!(lines[0], "  --name <new_name>  rename");
        assert_eq!(lines[1], "  --notes <n>        renote");
    }

    #[test]
    fn action_usage_is_prefixed_with_command() {
        let action = Action::new("login", "", noop).parameters(&["username", "password"]);
        assert_eq!(action.usage("user", false), "user login <username> <password>");
    }

    #[test]
    fn help_text_lists_actions() {
        let handler = Handler::with_actions(
            CommandSpec::new("group", "Manage groups").parameters(&["action"]),
            vec![
                Action::new("add", "Add a new group", noop),
                Action::new("list", "List groups", noop),
            ],
        );
        let help = handler.help_text();
        assert!(help.starts_with("COMMAND: group\nManage groups\nUSAGE: group <action>"));
        assert!(help.contains("help group <action>"));
        assert!(help.contains("  add   Add a new group"));
        assert!(handler.action("list").is_some());
        assert!(handler.action("remove").is_none());
    }
}

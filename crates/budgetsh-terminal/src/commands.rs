//! Base commands: exit, help, clear, config, ready, user.
//!
//! These are registered at startup and stay available for the whole
//! session. Shared helpers for the resource command modules live here too.

use budgetsh_types::config::ShellConfig;
use budgetsh_types::error::{Result, ShellError};

use crate::catalog::{Action, CommandSpec, FLAG_SET, Handler, OptionSpec, aligned};
use crate::interpreter::{CommandOutput, Flow, HandlerContext, Shell};
use crate::registry::RegistrationStatus;

/// Handlers that are always registered.
pub fn base_handlers() -> Vec<Handler> {
    vec![
        Handler::new(CommandSpec::new("exit", "exit the program"), handle_exit),
        Handler::new(
            CommandSpec::new("help", "See usage of another command.")
                .priority(1)
                .parameters(&["command"])
                .option(
                    OptionSpec::new(
                        "verbose",
                        "show unregistered commands (those not available in the current context)",
                    )
                    .shorthand(),
                ),
            handle_help,
        ),
        Handler::new(
            CommandSpec::new("clear", "clear the terminal").priority(2),
            handle_clear,
        ),
        Handler::with_actions(
            CommandSpec::new("config", "Show, edit or reload the local configuration")
                .priority(10)
                .parameters(&["action"]),
            vec![
                Action::new("show", "print the current configuration", config_show),
                Action::new(
                    "edit",
                    "change one setting and save it to the config file",
                    config_edit,
                )
                .parameters(&["key", "value"]),
                Action::new("load", "reload the configuration from disk", config_load),
            ],
        ),
        Handler::new(
            CommandSpec::new("ready", "Get server readiness").priority(20),
            handle_ready,
        ),
        Handler::with_actions(
            CommandSpec::new("user", "Create a new user, or log in")
                .priority(50)
                .parameters(&["action"]),
            vec![
                Action::new("add", "create a new user", user_add).parameters(&[
                    "new_username",
                    "new_password",
                    "retype_password",
                ]),
                Action::new("login", "log in as an existing user", user_login)
                    .parameters(&["username", "password"])
                    .option(
                        OptionSpec::new("view-budget", "view a budget right after logging in")
                            .parameters(&["budget_name"])
                            .shorthand(),
                    ),
                Action::new("update", "update credentials of the logged-in user", user_update)
                    .parameters(&["username", "password"])
                    .option(
                        OptionSpec::new("username", "set a new username for the user")
                            .parameters(&["new_value"]),
                    )
                    .option(
                        OptionSpec::new("password", "set a new password for the user")
                            .parameters(&["new_value", "retyped_value"]),
                    ),
                Action::new("logout", "log out existing user", user_logout),
                Action::new(
                    "delete",
                    "delete a user by first entering its credentials",
                    user_delete,
                )
                .parameters(&["username", "password", "retype_password"]),
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Helpers shared by the command modules
// ---------------------------------------------------------------------------

pub(crate) fn say(message: impl Into<String>) -> Result<Flow> {
    Ok(CommandOutput::Text(message.into()).into())
}

/// First argument of `option`, if it was given.
pub(crate) fn opt_value(ctx: &mut HandlerContext, option: &str) -> Option<String> {
    ctx.track_opt(option);
    ctx.args.pfx()
}

/// Next positional argument; empty when omitted.
pub(crate) fn next_arg(ctx: &mut HandlerContext) -> String {
    ctx.args.pfx_or("")
}

/// Table output with the given headers.
pub(crate) fn table(headers: &[&str], rows: Vec<Vec<String>>) -> Result<Flow> {
    Ok(CommandOutput::Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
    .into())
}

/// Look an item up by exact name.
pub(crate) fn find_named<'a, T>(
    items: &'a [T],
    name: &str,
    kind: &str,
    name_of: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    items
        .iter()
        .find(|item| name_of(item) == name)
        .ok_or_else(|| ShellError::Command(format!("no {kind} named '{name}'")))
}

/// Name of the budget in view, for messages.
pub(crate) fn viewed_name(shell: &Shell) -> String {
    shell
        .viewed_budget()
        .map(|b| b.name.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// exit / clear
// ---------------------------------------------------------------------------

fn handle_exit(_shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    Ok(Flow::Exit)
}

fn handle_clear(_shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    Ok(CommandOutput::Clear.into())
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// `help` lists commands, `help <command>` shows its usage and actions,
/// `help <command> <action>` shows the action's usage. An unknown inquiry
/// falls back to the listing.
fn handle_help(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let inquiry = ctx.args.pfx();
    if let Some(inquiry) = inquiry
        && let Some((handler, status)) = shell.registry().exists(&inquiry)
    {
        if let Some(action_name) = ctx.args.pfx()
            && let Some(action) = handler.action(&action_name)
        {
            let mut out = format!("USAGE: {}", action.usage(handler.name(), true));
            if !action.description.is_empty() {
                out = format!("ACTION: {} {}\n{}\n{out}", handler.name(), action.name, action.description);
            }
            return say(out);
        }
        let mut out = handler.help_text();
        if status != RegistrationStatus::Registered && !handler.unavailable.is_empty() {
            out.push_str(&format!("\n(not available: {})", handler.unavailable));
        }
        return say(out);
    }

    let verbose = opt_value(ctx, "verbose").is_some_and(|v| v == FLAG_SET);
    let handlers = shell.registry().registered_handlers(verbose);
    let mut out = String::new();
    if let Some((help, _)) = shell.registry().exists("help") {
        out.push_str(&format!("USAGE: {}\n", help.spec.usage(true)));
    }
    out.push_str("AVAILABLE COMMANDS:\n");
    out.push_str(&aligned(
        handlers.iter().map(|h| (h.name().to_string(), h.description())),
    ));
    say(out)
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn config_show(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    let mut shown = shell.config().clone();
    shown.refresh_token.clear();
    let body = shown.to_toml_string()?;
    let source = shell
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());
    say(format!("# {source}\n{}", body.trim_end()))
}

/// `config edit <key> <value>`: validate, save, then apply.
fn config_edit(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let key = next_arg(ctx);
    let value = next_arg(ctx);
    let mut edited = shell.config().clone();
    edited.set(&key, &value)?;
    let path = shell.config_file();
    edited.save_to(&path)?;
    log::info!("saved config to {}", path.display());
    shell.set_config(edited);
    say(format!("Saved configuration changes to {}", path.display()))
}

fn config_load(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    let path = shell.config_file();
    let loaded = ShellConfig::load_from(&path)?;
    let mut message = format!("Loaded configuration from {}", path.display());
    if loaded.base_url != shell.config().base_url {
        message.push_str(&format!(
            "\nServer URL changed: {} -> {}",
            shell.config().base_url,
            loaded.base_url
        ));
    }
    log::info!("reloaded config from {}", path.display());
    shell.set_config(loaded);
    say(message)
}

// ---------------------------------------------------------------------------
// ready
// ---------------------------------------------------------------------------

fn handle_ready(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    let ready = shell
        .service()
        .server_ready()
        .map_err(|e| ShellError::Service(format!("server could not be reached; {e}")))?;
    if ready {
        say("Server is ready!")
    } else {
        say("Server not ready.")
    }
}

// ---------------------------------------------------------------------------
// user
// ---------------------------------------------------------------------------

fn user_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let username = next_arg(ctx);
    let password = next_arg(ctx);
    let retyped = next_arg(ctx);
    if password != retyped {
        return Err(ShellError::Command("password fields did not match".to_string()));
    }
    shell.service_mut().create_user(&username, &password)?;
    say(format!(
        "User {username} successfully created.\nFor help logging in, see: `help user login`"
    ))
}

fn user_login(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let username = next_arg(ctx);
    let password = next_arg(ctx);
    let user = shell.service_mut().login(&username, &password)?;
    shell.on_login(user);

    if let Some(budget) = opt_value(ctx, "view-budget") {
        shell.enqueue(format!("budget view \"{budget}\""))?;
    }
    say(format!("Logged in as {username}."))
}

fn user_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let username = next_arg(ctx);
    let password = next_arg(ctx);

    let new_username = opt_value(ctx, "username").unwrap_or_else(|| username.clone());
    ctx.track_opt("password");
    let new_password = match ctx.args.pfx() {
        Some(first) => {
            if ctx.args.pfx().as_deref() != Some(first.as_str()) {
                return Err(ShellError::Command(
                    "fields for new password did not match".to_string(),
                ));
            }
            first
        },
        None => password.clone(),
    };

    shell
        .service_mut()
        .update_user(&username, &password, &new_username, &new_password)?;
    shell.rename_user(&new_username);
    say("User updated with new information")
}

fn user_logout(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    if shell.user().is_none() {
        return say("No user logged in.");
    }
    shell.service_mut().logout()?;
    shell.on_logout();
    say("User logged out.")
}

fn user_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let username = next_arg(ctx);
    let password = next_arg(ctx);
    let retyped = next_arg(ctx);
    if password != retyped {
        return Err(ShellError::Command("password fields did not match".to_string()));
    }
    shell.service_mut().delete_user(&username, &password)?;
    if shell.user().is_some_and(|u| u.username == username) {
        shell.on_logout();
    }
    say(format!("User {username} successfully deleted."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetsh_platform::MemoryService;

    fn shell() -> Shell {
        Shell::new(Box::new(MemoryService::new()), ShellConfig::default())
    }

    fn text(flow: Flow) -> String {
        match flow {
            Flow::Continue(CommandOutput::Text(t)) => t,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn help_lists_registered_commands_in_priority_order() {
        let out = text(shell().execute("help").unwrap());
        assert!(out.contains("AVAILABLE COMMANDS:"));
        let exit = out.find("  exit").unwrap();
        let user = out.find("  user").unwrap();
        assert!(exit < user);
        assert!(!out.contains("  budget"));
    }

    #[test]
    fn verbose_help_includes_unavailable_commands() {
        let out = text(shell().execute("help -v").unwrap());
        assert!(out.contains("  budget"));
        assert!(out.contains("  payee"));
    }

    #[test]
    fn help_for_command_shows_actions() {
        let out = text(shell().execute("help user").unwrap());
        assert!(out.starts_with("COMMAND: user"));
        assert!(out.contains("ACTIONS:"));
        assert!(out.contains("  login"));
    }

    #[test]
    fn help_for_action_shows_options() {
        let out = text(shell().execute("help user login").unwrap());
        assert!(out.contains("USAGE: user login <username> <password> [options]"));
        assert!(out.contains("-v, --view-budget <budget_name>"));
    }

    #[test]
    fn help_explains_unavailable_command() {
        let out = text(shell().execute("help budget").unwrap());
        assert!(out.contains("(not available: login required)"));
    }

    #[test]
    fn help_for_unknown_command_falls_back_to_listing() {
        let out = text(shell().execute("help nonsense").unwrap());
        assert!(out.contains("AVAILABLE COMMANDS:"));
    }

    #[test]
    fn clear_signals_clear() {
        assert_eq!(
            shell().execute("clear").unwrap(),
            Flow::Continue(CommandOutput::Clear)
        );
    }

    #[test]
    fn ready_reports_service_state() {
        let mut service = MemoryService::new();
        service.set_ready(false);
        let mut sh = Shell::new(Box::new(service), ShellConfig::default());
        assert_eq!(text(sh.execute("ready").unwrap()), "Server not ready.");
    }

    #[test]
    fn config_show_renders_toml() {
        let out = text(shell().execute("config show").unwrap());
        assert!(out.contains("currency_iso_code = \"USD\""));
    }

    #[test]
    fn config_load_reads_the_remembered_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetsh.toml");
        std::fs::write(&path, "base_url = \"https://budget.example\"\n").unwrap();
        let mut sh = shell().with_config_path(&path);
        let out = text(sh.execute("config load").unwrap());
        assert!(out.contains("Server URL changed"));
        assert_eq!(sh.config().base_url, "https://budget.example");
    }

    #[test]
    fn config_show_hides_session_token() {
        let config = ShellConfig {
            refresh_token: "session-1-2".to_string(),
            ..ShellConfig::default()
        };
        let mut sh = Shell::new(Box::new(MemoryService::new()), config);
        let out = text(sh.execute("config show").unwrap());
        assert!(!out.contains("session-1-2"));
    }

    #[test]
    fn config_edit_saves_to_the_remembered_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetsh.toml");
        let mut sh = shell().with_config_path(&path);
        let out = text(sh.execute("config edit currency_iso_code eur").unwrap());
        assert!(out.starts_with("Saved configuration changes"));
        assert_eq!(sh.config().currency_iso_code, "EUR");
        assert_eq!(ShellConfig::load_from(&path).unwrap().currency_iso_code, "EUR");

        sh.execute(r#"config edit base_url "https://budget.example""#).unwrap();
        let saved = ShellConfig::load_from(&path).unwrap();
        assert_eq!(saved.base_url, "https://budget.example");
        assert_eq!(saved.currency_iso_code, "EUR");
    }

    #[test]
    fn config_edit_rejects_bad_input_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgetsh.toml");
        let mut sh = shell().with_config_path(&path);
        let err = sh.execute("config edit colour blue").unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
        let err = sh.execute("config edit stay_logged_in sometimes").unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
        assert!(matches!(
            sh.execute("config edit base_url").unwrap_err(),
            ShellError::Parse(_)
        ));
        assert!(!path.exists());
        assert_eq!(sh.config(), &ShellConfig::default());
    }

    #[test]
    fn user_add_rejects_mismatched_passwords() {
        let err = shell().execute("user add bob pw1 pw2").unwrap_err();
        assert_eq!(err.to_string(), "command error: password fields did not match");
    }

    #[test]
    fn logout_without_user() {
        let out = text(shell().execute("user logout").unwrap());
        assert_eq!(out, "No user logged in.");
    }

    #[test]
    fn update_changes_username_and_prompt() {
        let mut sh = shell();
        sh.execute("user add bob pw pw").unwrap();
        sh.execute("user login bob pw").unwrap();
        sh.execute("user update bob pw --username robert").unwrap();
        assert_eq!(sh.prompt(), "b/robert > ");
        sh.execute("user logout").unwrap();
        assert!(sh.execute("user login robert pw").is_ok());
    }

    #[test]
    fn update_rejects_mismatched_new_password() {
        let mut sh = shell();
        sh.execute("user add bob pw pw").unwrap();
        sh.execute("user login bob pw").unwrap();
        let err = sh
            .execute("user update bob pw --password fresh stale")
            .unwrap_err();
        assert!(matches!(err, ShellError::Command(_)));
    }

    #[test]
    fn deleting_logged_in_user_logs_out() {
        let mut sh = shell();
        sh.execute("user add bob pw pw").unwrap();
        sh.execute("user login bob pw").unwrap();
        sh.execute("user delete bob pw pw").unwrap();
        assert!(sh.user().is_none());
        assert_eq!(sh.registry().status("budget"), RegistrationStatus::Preregistered);
    }
}

//! Accounts under the budget in view.

use budgetsh_platform::Account;
use budgetsh_types::error::{Result, ShellError};

use crate::catalog::{Action, CommandSpec, Handler, OptionSpec};
use crate::commands::{find_named, next_arg, opt_value, say, table, viewed_name};
use crate::interpreter::{Flow, HandlerContext, Shell};

/// The account command, registered while a budget is in view.
pub fn account_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new("account", "Manage accounts under budget in view")
            .priority(210)
            .parameters(&["action"]),
        vec![
            Action::new("add", "Add a new account to budget", account_add)
                .parameters(&["name", "account_type"])
                .option(
                    OptionSpec::new("notes", "give the new account some notes")
                        .parameters(&["notes_value"]),
                ),
            Action::new("update", "update information on account by name", account_update)
                .parameters(&["name"])
                .option(OptionSpec::new("name", "rewrite account name").parameters(&["new_name"]))
                .option(
                    OptionSpec::new("notes", "rewrite account notes").parameters(&["new_notes"]),
                )
                .option(
                    OptionSpec::new("type", "choose different account type")
                        .parameters(&["new_type"]),
                ),
            Action::new("restore", "restore a soft-deleted account", account_restore)
                .parameters(&["account_name"]),
            Action::new(
                "list",
                "see a list of all accounts belonging to budget",
                account_list,
            )
            .option(
                OptionSpec::new(
                    "include",
                    "include accounts usually excluded with qualities like: 'deleted'",
                )
                .parameters(&["quality"])
                .shorthand(),
            ),
            Action::new("delete", "Delete an account", account_delete)
                .parameters(&["account_name"])
                .option(
                    OptionSpec::new("hard", "as opposed to a reversible soft deletion (default)")
                        .shorthand(),
                ),
        ],
    )
    .unavailable("first view a budget to see its accounts")
}

fn find_account(shell: &Shell, name: &str, include_deleted: bool) -> Result<Account> {
    let accounts = shell.service().accounts(include_deleted)?;
    find_named(&accounts, name, "account", |a| a.name.as_str()).cloned()
}

fn account_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let account_type = next_arg(ctx);
    let notes = opt_value(ctx, "notes").unwrap_or_default();
    shell
        .service_mut()
        .create_account(&name, &account_type, &notes)?;
    say(format!(
        "Account {name} successfully created.\nSee it with: `account list`"
    ))
}

fn account_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let account = find_account(shell, &name, false)?;
    let new_name = opt_value(ctx, "name").unwrap_or(account.name);
    let new_type = opt_value(ctx, "type").unwrap_or(account.account_type);
    let new_notes = opt_value(ctx, "notes").unwrap_or(account.notes);
    shell
        .service_mut()
        .update_account(account.id, &new_name, &new_type, &new_notes)?;
    say("Account updated with new information")
}

fn account_restore(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let account = find_account(shell, &name, true)?;
    shell.service_mut().restore_account(account.id)?;
    say(format!("Account {name} restored."))
}

fn account_list(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let mut include_deleted = false;
    if let Some(query) = opt_value(ctx, "include") {
        for quality in query.split(|c: char| c == ',' || c.is_whitespace()) {
            match quality.to_ascii_lowercase().as_str() {
                "" => {},
                "deleted" => include_deleted = true,
                other => {
                    return Err(ShellError::Command(format!(
                        "unknown quality '{other}'; try 'deleted'"
                    )));
                },
            }
        }
    }

    let mut accounts = shell.service().accounts(include_deleted)?;
    if accounts.is_empty() {
        return say(format!(
            "No accounts found belonging to budget {}.",
            viewed_name(shell)
        ));
    }
    accounts.sort_by(|a, b| a.name.cmp(&b.name));
    let mut headers = vec!["NAME", "ID", "TYPE", "NOTES"];
    if include_deleted {
        headers.push("DELETED");
    }
    let rows = accounts
        .into_iter()
        .map(|a| {
            let mut row = vec![a.name, a.id.to_string(), a.account_type, a.notes];
            if include_deleted {
                row.push(if a.deleted { "yes" } else { "no" }.to_string());
            }
            row
        })
        .collect();
    table(&headers, rows)
}

fn account_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let hard = ctx.has_opt("hard");
    let account = find_account(shell, &name, hard)?;
    shell.service_mut().delete_account(account.id, hard)?;
    if hard {
        say(format!("Account {name} permanently deleted."))
    } else {
        say(format!(
            "Account {name} deleted. Undo with: `account restore \"{name}\"`"
        ))
    }
}

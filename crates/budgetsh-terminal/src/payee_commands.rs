//! Payees under the budget in view.

use budgetsh_platform::Payee;
use budgetsh_types::error::Result;

use crate::catalog::{Action, CommandSpec, Handler, OptionSpec};
use crate::commands::{find_named, next_arg, opt_value, say, table, viewed_name};
use crate::interpreter::{Flow, HandlerContext, Shell};

/// The payee command, registered while a budget is in view.
pub fn payee_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new("payee", "Manage payees under budget in view")
            .priority(240)
            .parameters(&["action"]),
        vec![
            Action::new("add", "Add a new payee to budget", payee_add)
                .parameters(&["name"])
                .option(
                    OptionSpec::new("notes", "give the new payee some notes")
                        .parameters(&["notes_value"]),
                ),
            Action::new("update", "update information on a payee by name", payee_update)
                .parameters(&["name"])
                .option(OptionSpec::new("name", "rewrite payee name").parameters(&["new_name"]))
                .option(OptionSpec::new("notes", "rewrite payee notes").parameters(&["new_notes"])),
            Action::new("list", "see a list of all payees belonging to budget", payee_list),
            Action::new("delete", "Delete a payee", payee_delete).parameters(&["payee_name"]),
        ],
    )
    .unavailable("first view a budget to see its payees")
}

fn find_payee(shell: &Shell, name: &str) -> Result<Payee> {
    let payees = shell.service().payees()?;
    find_named(&payees, name, "payee", |p| p.name.as_str()).cloned()
}

fn payee_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let notes = opt_value(ctx, "notes").unwrap_or_default();
    shell.service_mut().create_payee(&name, &notes)?;
    say(format!(
        "Payee {name} successfully created.\nSee it with: `payee list`"
    ))
}

fn payee_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let payee = find_payee(shell, &name)?;
    let new_name = opt_value(ctx, "name").unwrap_or(payee.name);
    let new_notes = opt_value(ctx, "notes").unwrap_or(payee.notes);
    shell
        .service_mut()
        .update_payee(payee.id, &new_name, &new_notes)?;
    say("Payee updated with new information")
}

fn payee_list(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    let mut payees = shell.service().payees()?;
    if payees.is_empty() {
        return say(format!(
            "No payees found belonging to budget {}.",
            viewed_name(shell)
        ));
    }
    payees.sort_by(|a, b| a.name.cmp(&b.name));
    table(
        &["NAME", "ID", "NOTES"],
        payees
            .into_iter()
            .map(|p| vec![p.name, p.id.to_string(), p.notes])
            .collect(),
    )
}

fn payee_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let payee = find_payee(shell, &name)?;
    shell.service_mut().delete_payee(payee.id)?;
    say(format!("Payee {name} deleted."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::CommandOutput;
    use budgetsh_platform::MemoryService;
    use budgetsh_types::config::ShellConfig;
    use budgetsh_types::error::ShellError;

    fn viewing() -> Shell {
        let mut sh = Shell::new(Box::new(MemoryService::new()), ShellConfig::default());
        sh.execute("user add alice pw pw").unwrap();
        sh.execute("user login alice pw").unwrap();
        sh.execute("budget add Home").unwrap();
        sh.execute("budget view Home").unwrap();
        sh
    }

    #[test]
    fn payee_lifecycle() {
        let mut sh = viewing();
        sh.execute(r#"payee add "Corner Store""#).unwrap();
        sh.execute(r#"payee update "Corner Store" --notes "groceries""#).unwrap();
        let Flow::Continue(CommandOutput::Table { rows, .. }) = sh.execute("payee list").unwrap()
        else {
            panic!("expected a table");
        };
        assert_eq!(rows[0][0], "Corner Store");
        assert_eq!(rows[0][2], "groceries");

        sh.execute(r#"payee delete "Corner Store""#).unwrap();
        let err = sh.execute(r#"payee delete "Corner Store""#).unwrap_err();
        assert!(matches!(err, ShellError::Command(_)));
    }

    #[test]
    fn action_scope_rejects_foreign_option() {
        let mut sh = viewing();
        let err = sh.execute("payee list --group Bills").unwrap_err();
        assert_eq!(
            err.to_string(),
            "input command includes unexpected action option '--group'"
        );
    }
}

//! Budget management: add, list, view, update, delete.

use budgetsh_platform::{Budget, Role};
use budgetsh_types::error::Result;

use crate::catalog::{Action, CommandSpec, Handler, OptionSpec};
use crate::commands::{find_named, next_arg, opt_value, say, table};
use crate::interpreter::{Flow, HandlerContext, Shell};

/// Name the budget command is registered under.
pub const BUDGET_COMMAND: &str = "budget";

/// The budget command, available once a user is logged in.
pub fn budget_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new(BUDGET_COMMAND, "Manage budgets associated with logged-in user")
            .priority(100)
            .parameters(&["action"]),
        vec![
            Action::new("add", "create a new budget", budget_add)
                .parameters(&["name"])
                .option(
                    OptionSpec::new("notes", "give your budget some notes")
                        .parameters(&["notes_value"]),
                ),
            Action::new("list", "list budgets you are a member of", budget_list).option(
                OptionSpec::new(
                    "roles",
                    "filter results by user role. Can be ADMIN, MANAGER, CONTRIBUTOR, or VIEWER.",
                )
                .parameters(&["role_title"]),
            ),
            Action::new(
                "view",
                "specify a budget to interact with using other commands",
                budget_view,
            )
            .parameters(&["budget_name"]),
            Action::new("update", "update budget name or notes", budget_update)
                .parameters(&["name"])
                .option(OptionSpec::new("name", "rename the budget").parameters(&["name_value"]))
                .option(
                    OptionSpec::new("notes", "rewrite budget notes").parameters(&["notes_value"]),
                ),
            Action::new("delete", "delete an existing budget by name", budget_delete)
                .parameters(&["budget_name"]),
        ],
    )
    .unavailable("login required")
}

fn find_budget(shell: &Shell, name: &str) -> Result<Budget> {
    let budgets = shell.service().budgets(&[])?;
    find_named(&budgets, name, "budget", |b| b.name.as_str()).cloned()
}

fn budget_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let notes = opt_value(ctx, "notes").unwrap_or_default();
    let budget = shell.service_mut().create_budget(&name, &notes)?;
    say(format!(
        "Budget {} successfully created.\nSee it with: `budget view \"{}\"`",
        budget.name, budget.name
    ))
}

/// Role filter: one or more titles separated by spaces or commas.
fn parse_roles(query: &str) -> Result<Vec<Role>> {
    query
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn budget_list(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let roles = match opt_value(ctx, "roles") {
        Some(query) => parse_roles(&query)?,
        None => Vec::new(),
    };
    let mut budgets = shell.service().budgets(&roles)?;
    if budgets.is_empty() {
        let username = shell.user().map(|u| u.username.as_str()).unwrap_or_default();
        return say(format!("No memberships found for user {username}."));
    }
    budgets.sort_by(|a, b| a.name.cmp(&b.name));
    table(
        &["NAME", "ID", "ROLE", "NOTES"],
        budgets
            .into_iter()
            .map(|b| vec![b.name, b.id.to_string(), b.role.to_string(), b.notes])
            .collect(),
    )
}

fn budget_view(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let budget = find_budget(shell, &name)?;
    shell.service_mut().view_budget(budget.id)?;
    let message = format!("Now viewing budget: {}", budget.name);
    shell.on_view_budget(budget);
    say(message)
}

fn budget_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let budget = find_budget(shell, &name)?;
    let new_name = opt_value(ctx, "name").unwrap_or_else(|| budget.name.clone());
    let new_notes = opt_value(ctx, "notes").unwrap_or_else(|| budget.notes.clone());
    shell
        .service_mut()
        .update_budget(budget.id, &new_name, &new_notes)?;

    if shell.viewed_budget().is_some_and(|b| b.id == budget.id) {
        shell.on_view_budget(Budget {
            name: new_name,
            notes: new_notes,
            ..budget
        });
    }
    say("Budget info updated with new information")
}

fn budget_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let budget = find_budget(shell, &name)?;
    shell.service_mut().delete_budget(budget.id)?;
    if shell.viewed_budget().is_some_and(|b| b.id == budget.id) {
        shell.on_leave_budget();
    }
    say(format!("Budget {} deleted.", budget.name))
}

//! Spending categories and the groups that organize them.

use budgetsh_platform::{Category, Group};
use budgetsh_types::error::Result;

use crate::catalog::{Action, CommandSpec, Handler, OptionSpec};
use crate::commands::{find_named, next_arg, opt_value, say, table, viewed_name};
use crate::interpreter::{Flow, HandlerContext, Shell};

fn group_option(description: &'static str) -> OptionSpec {
    OptionSpec::new("group", description)
        .parameters(&["group_name"])
        .shorthand()
}

/// The category command, registered while a budget is in view.
pub fn category_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new("category", "Manage spending categories under budget in view")
            .priority(220)
            .parameters(&["action"]),
        vec![
            Action::new("add", "Add a new category to budget", category_add)
                .parameters(&["name"])
                .option(
                    OptionSpec::new("notes", "give the new category some notes")
                        .parameters(&["notes_value"]),
                )
                .option(group_option("assign the category to a group")),
            Action::new(
                "update",
                "update information on a category by name",
                category_update,
            )
            .parameters(&["name"])
            .option(OptionSpec::new("name", "rewrite category name").parameters(&["new_name"]))
            .option(OptionSpec::new("notes", "rewrite category notes").parameters(&["new_notes"]))
            .option(group_option("assign the category to a group")),
            Action::new(
                "list",
                "list all categories belonging to budget",
                category_list,
            )
            .option(group_option("list only categories grouped by given name")),
            Action::new("delete", "Delete a category", category_delete)
                .parameters(&["category_name"]),
        ],
    )
    .unavailable("first view a budget to see its categories")
}

/// The group command, registered while a budget is in view.
pub fn group_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new("group", "Manage category groups under budget in view")
            .priority(230)
            .parameters(&["action"]),
        vec![
            Action::new("add", "Add a new group to budget", group_add)
                .parameters(&["name"])
                .option(
                    OptionSpec::new("notes", "give the new group some notes")
                        .parameters(&["notes_value"]),
                ),
            Action::new("update", "update information on a group by name", group_update)
                .parameters(&["name"])
                .option(OptionSpec::new("name", "rewrite group name").parameters(&["new_name"]))
                .option(OptionSpec::new("notes", "rewrite group notes").parameters(&["new_notes"])),
            Action::new("list", "see a list of all groups belonging to budget", group_list),
            Action::new("delete", "Delete a group", group_delete).parameters(&["group_name"]),
        ],
    )
    .unavailable("first view a budget to see its groups")
}

// ---------------------------------------------------------------------------
// category
// ---------------------------------------------------------------------------

fn find_category(shell: &Shell, name: &str) -> Result<Category> {
    let categories = shell.service().categories(None)?;
    find_named(&categories, name, "category", |c| c.name.as_str()).cloned()
}

fn category_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let notes = opt_value(ctx, "notes").unwrap_or_default();
    let group = opt_value(ctx, "group");
    let category = shell
        .service_mut()
        .create_category(&name, &notes, group.as_deref())?;
    let mut message = format!("Category {} successfully created", category.name);
    if let Some(group) = &category.group {
        message.push_str(&format!(" in group {group}"));
    }
    message.push_str(".\nSee it with: `category list`");
    say(message)
}

fn category_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let category = find_category(shell, &name)?;
    let new_name = opt_value(ctx, "name").unwrap_or(category.name);
    let new_notes = opt_value(ctx, "notes").unwrap_or(category.notes);
    let group = opt_value(ctx, "group");
    shell
        .service_mut()
        .update_category(category.id, &new_name, &new_notes, group.as_deref())?;
    say("Category updated with new information")
}

fn category_list(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let group = opt_value(ctx, "group");
    let mut categories = shell.service().categories(group.as_deref())?;
    if categories.is_empty() {
        let scope = match &group {
            Some(group) => format!("in group {group}"),
            None => format!("belonging to budget {}", viewed_name(shell)),
        };
        return say(format!("No categories found {scope}."));
    }
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    table(
        &["NAME", "ID", "GROUP", "NOTES"],
        categories
            .into_iter()
            .map(|c| vec![c.name, c.id.to_string(), c.group.unwrap_or_default(), c.notes])
            .collect(),
    )
}

fn category_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let category = find_category(shell, &name)?;
    shell.service_mut().delete_category(category.id)?;
    say(format!("Category {name} deleted."))
}

// ---------------------------------------------------------------------------
// group
// ---------------------------------------------------------------------------

fn find_group(shell: &Shell, name: &str) -> Result<Group> {
    let groups = shell.service().groups()?;
    find_named(&groups, name, "group", |g| g.name.as_str()).cloned()
}

fn group_add(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let notes = opt_value(ctx, "notes").unwrap_or_default();
    shell.service_mut().create_group(&name, &notes)?;
    say(format!(
        "Group {name} successfully created.\nAssign categories with: `category update <name> --group \"{name}\"`"
    ))
}

fn group_update(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let group = find_group(shell, &name)?;
    let new_name = opt_value(ctx, "name").unwrap_or(group.name);
    let new_notes = opt_value(ctx, "notes").unwrap_or(group.notes);
    shell
        .service_mut()
        .update_group(group.id, &new_name, &new_notes)?;
    say("Group updated with new information")
}

fn group_list(shell: &mut Shell, _ctx: &mut HandlerContext) -> Result<Flow> {
    let mut groups = shell.service().groups()?;
    if groups.is_empty() {
        return say(format!(
            "No groups found belonging to budget {}.",
            viewed_name(shell)
        ));
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    table(
        &["NAME", "ID", "NOTES"],
        groups
            .into_iter()
            .map(|g| vec![g.name, g.id.to_string(), g.notes])
            .collect(),
    )
}

fn group_delete(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let name = next_arg(ctx);
    let group = find_group(shell, &name)?;
    shell.service_mut().delete_group(group.id)?;
    say(format!("Group {name} deleted. Its categories are now ungrouped."))
}

//! Transactions under the budget in view: log, transfer, list.

use budgetsh_platform::{NewTransaction, TransactionFilter};
use budgetsh_types::error::{Result, ShellError};
use time::format_description::well_known::Iso8601;
use time::{Date, OffsetDateTime};

use crate::catalog::{Action, CommandSpec, FLAG_SET, Handler, OptionSpec};
use crate::commands::{next_arg, opt_value, say, table, viewed_name};
use crate::interpreter::{Flow, HandlerContext, Shell};

/// Category argument that hands the amounts over to `--split`.
const SPLIT_CATEGORY: &str = "split";

/// Category the service books both legs of a transfer under.
const TRANSFER_CATEGORY: &str = "TRANSFER";

const NOTES_PREVIEW: usize = 25;

fn date_option() -> OptionSpec {
    OptionSpec::new("date", "date of the transaction as YYYY-MM-DD (defaults to today)")
        .parameters(&["date"])
        .shorthand()
}

fn notes_option() -> OptionSpec {
    OptionSpec::new("notes", "give the transaction some notes")
        .parameters(&["notes_value"])
        .shorthand()
}

fn cleared_option() -> OptionSpec {
    OptionSpec::new("cleared", "mark the transaction as cleared").shorthand()
}

/// The txn command, registered while a budget is in view.
pub fn txn_handler() -> Handler {
    Handler::with_actions(
        CommandSpec::new("txn", "Log and list transactions under budget in view")
            .priority(250)
            .parameters(&["action"]),
        vec![
            Action::new("log", "log a new transaction to an account", txn_record)
                .parameters(&["account_name", "payee_name", "amount", "category_name"])
                .option(date_option())
                .option(notes_option())
                .option(cleared_option())
                .option(
                    OptionSpec::new(
                        "split",
                        "spread the amount over categories; use 'split' as the category",
                    )
                    .parameters(&["category=amount,..."])
                    .shorthand(),
                ),
            Action::new("transfer", "move money from one account to another", txn_record)
                .parameters(&["from_account", "to_account", "amount"])
                .option(date_option())
                .option(notes_option())
                .option(cleared_option()),
            Action::new("list", "list transactions under the budget", txn_list)
                .option(
                    OptionSpec::new("account", "only transactions touching an account")
                        .parameters(&["account_name"])
                        .shorthand(),
                )
                .option(
                    OptionSpec::new("category", "only transactions in a category")
                        .parameters(&["category_name"])
                        .shorthand(),
                )
                .option(
                    OptionSpec::new("payee", "only transactions with a payee")
                        .parameters(&["payee_name"])
                        .shorthand(),
                ),
        ],
    )
    .unavailable("first view a budget to see its transactions")
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Accepts `[+-]digits[.digits]`. The value itself is the service's concern.
fn check_amount(amount: &str) -> Result<()> {
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let digits = amount.strip_prefix(['-', '+']).unwrap_or(amount);
    let valid = match digits.split_once('.') {
        Some((whole, frac)) => !frac.is_empty() && all_digits(whole) && all_digits(frac),
        None => !digits.is_empty() && all_digits(digits),
    };
    if valid {
        Ok(())
    } else {
        Err(ShellError::Command(format!("'{amount}' is not an amount")))
    }
}

fn parse_date(text: &str) -> Result<String> {
    let date = Date::parse(text, &Iso8601::DEFAULT)
        .map_err(|_| ShellError::Command(format!("'{text}' is not a date; use YYYY-MM-DD")))?;
    format_date(date)
}

fn format_date(date: Date) -> Result<String> {
    date.format(&Iso8601::DATE)
        .map_err(|e| ShellError::Command(format!("could not format date: {e}")))
}

/// Local date, or the UTC date when the local offset is unknown.
fn today() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_date(now.date())
}

/// `Food=12.00,Household=8` into category and amount pairs.
fn parse_splits(splits: &str) -> Result<Vec<(String, String)>> {
    let pairs = splits
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (category, amount) = pair
                .split_once('=')
                .map(|(c, a)| (c.trim(), a.trim()))
                .filter(|(c, _)| !c.is_empty())
                .ok_or_else(|| ShellError::Command(format!("could not parse split '{pair}'")))?;
            check_amount(amount)?;
            Ok((category.to_string(), amount.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    if pairs.is_empty() {
        return Err(ShellError::Command(
            "split option used, but no splits provided".to_string(),
        ));
    }
    Ok(pairs)
}

fn preview(notes: &str) -> String {
    if notes.chars().count() <= NOTES_PREVIEW {
        return notes.to_string();
    }
    let head: String = notes.chars().take(NOTES_PREVIEW).collect();
    format!("{head}...")
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn purchase(ctx: &mut HandlerContext) -> Result<NewTransaction> {
    let account = next_arg(ctx);
    let payee = next_arg(ctx);
    let total = next_arg(ctx);
    let category = next_arg(ctx);
    check_amount(&total)?;

    let is_split = category.eq_ignore_ascii_case(SPLIT_CATEGORY);
    let amounts = match opt_value(ctx, "split") {
        Some(splits) if is_split => parse_splits(&splits)?,
        Some(_) => {
            return Err(ShellError::Command(
                "substitute 'split' for the category argument to use the --split option"
                    .to_string(),
            ));
        },
        None if is_split => {
            return Err(ShellError::Command(
                "category 'split' needs the --split option".to_string(),
            ));
        },
        None => vec![(category, total)],
    };
    Ok(NewTransaction {
        account,
        payee,
        amounts,
        ..NewTransaction::default()
    })
}

fn transfer(ctx: &mut HandlerContext) -> Result<NewTransaction> {
    let from = next_arg(ctx);
    let to = next_arg(ctx);
    let amount = next_arg(ctx);
    check_amount(&amount)?;
    if amount.starts_with('-') {
        return Err(ShellError::Command(
            "amount to transfer must be positive".to_string(),
        ));
    }
    let amount = amount.trim_start_matches('+');
    Ok(NewTransaction {
        account: from,
        transfer_account: Some(to),
        amounts: vec![(TRANSFER_CATEGORY.to_string(), format!("-{amount}"))],
        ..NewTransaction::default()
    })
}

/// Body of both `log` and `transfer`; the recorded action picks which
/// positionals are read.
fn txn_record(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let is_transfer = ctx.action() == Some("transfer");
    let mut draft = if is_transfer {
        transfer(ctx)?
    } else {
        purchase(ctx)?
    };
    draft.date = match opt_value(ctx, "date") {
        Some(date) => parse_date(&date)?,
        None => today()?,
    };
    draft.notes = opt_value(ctx, "notes").unwrap_or_default();
    draft.cleared = opt_value(ctx, "cleared").is_some_and(|v| v == FLAG_SET);

    let txn = shell.service_mut().log_transaction(draft)?;
    if txn.is_transfer() {
        say(format!("New transfer logged to account: {}", txn.account))
    } else {
        say(format!("New transaction logged to account: {}", txn.account))
    }
}

fn txn_list(shell: &mut Shell, ctx: &mut HandlerContext) -> Result<Flow> {
    let filter = TransactionFilter {
        account: opt_value(ctx, "account"),
        category: opt_value(ctx, "category"),
        payee: opt_value(ctx, "payee"),
    };
    let mut txns = shell.service().transactions(&filter)?;
    if txns.is_empty() {
        return say(format!(
            "No transactions found under budget {}.",
            viewed_name(shell)
        ));
    }
    txns.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    table(
        &["DATE", "ACCOUNT", "PAYEE", "CATEGORY", "AMOUNT", "NOTES"],
        txns.into_iter()
            .map(|t| {
                let payee = match &t.transfer_account {
                    Some(to) => format!("transfer to {to}"),
                    None => t.payee.clone(),
                };
                let (categories, amounts): (Vec<&str>, Vec<&str>) = t
                    .amounts
                    .iter()
                    .map(|(c, a)| (c.as_str(), a.as_str()))
                    .unzip();
                vec![
                    t.date.clone(),
                    t.account.clone(),
                    payee,
                    categories.join(", "),
                    amounts.join(", "),
                    preview(&t.notes),
                ]
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::CommandOutput;
    use budgetsh_platform::MemoryService;
    use budgetsh_types::config::ShellConfig;

    fn ledger() -> Shell {
        let mut sh = Shell::new(Box::new(MemoryService::new()), ShellConfig::default());
        for line in [
            "user add alice pw pw",
            "user login alice pw",
            "budget add Home",
            "budget view Home",
            "account add Checking on-budget",
            "account add Savings on-budget",
            "category add Food",
            "category add Household",
            r#"payee add "Corner Store""#,
        ] {
            sh.execute(line).unwrap();
        }
        sh
    }

    fn rows(sh: &mut Shell, line: &str) -> Vec<Vec<String>> {
        match sh.execute(line).unwrap() {
            Flow::Continue(CommandOutput::Table { rows, .. }) => rows,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn date_defaults_to_today() {
        let mut sh = ledger();
        sh.execute(r#"txn log Checking "Corner Store" -12.50 Food"#).unwrap();
        let rows = rows(&mut sh, "txn list");
        assert_eq!(rows[0][0], today().unwrap());
        assert_eq!(rows[0][3], "Food");
        assert_eq!(rows[0][4], "-12.50");
    }

    #[test]
    fn options_fill_date_notes_and_cleared() {
        let mut sh = ledger();
        let flow = sh
            .execute(r#"txn log Checking "Corner Store" -4 Food -d 2026-01-05 --cleared -n "milk and bread""#)
            .unwrap();
        assert_eq!(
            flow,
            Flow::Continue(CommandOutput::Text(
                "New transaction logged to account: Checking".to_string()
            ))
        );
        let rows = rows(&mut sh, "txn list");
        assert_eq!(rows[0][0], "2026-01-05");
        assert_eq!(rows[0][5], "milk and bread");
    }

    #[test]
    fn listing_is_sorted_by_date_and_filtered() {
        let mut sh = ledger();
        sh.execute(r#"txn log Checking "Corner Store" -3 Food --date 2026-03-01"#).unwrap();
        sh.execute(r#"txn log Checking "Corner Store" -9 Household --date 2026-02-01"#).unwrap();
        let all = rows(&mut sh, "txn list");
        assert_eq!(all[0][0], "2026-02-01");
        assert_eq!(all[1][0], "2026-03-01");
        let food = rows(&mut sh, "txn list --category Food");
        assert_eq!(food.len(), 1);
        assert_eq!(food[0][4], "-3");
    }

    #[test]
    fn transfer_moves_between_accounts() {
        let mut sh = ledger();
        let flow = sh.execute("txn transfer Checking Savings 100").unwrap();
        assert_eq!(
            flow,
            Flow::Continue(CommandOutput::Text(
                "New transfer logged to account: Checking".to_string()
            ))
        );
        let rows = rows(&mut sh, "txn list -a Savings");
        assert_eq!(rows[0][2], "transfer to Savings");
        assert_eq!(rows[0][3], "TRANSFER");
        assert_eq!(rows[0][4], "-100");
    }

    #[test]
    fn transfer_amount_must_be_positive() {
        let mut sh = ledger();
        let err = sh.execute("txn transfer Checking Savings -100").unwrap_err();
        assert_eq!(
            err.to_string(),
            "command error: amount to transfer must be positive"
        );
    }

    #[test]
    fn split_spreads_amount_over_categories() {
        let mut sh = ledger();
        sh.execute(r#"txn log Checking "Corner Store" -20 split --split "Food=-12, Household=-8""#)
            .unwrap();
        let rows = rows(&mut sh, "txn list");
        assert_eq!(rows[0][3], "Food, Household");
        assert_eq!(rows[0][4], "-12, -8");
    }

    #[test]
    fn split_option_needs_split_category() {
        let mut sh = ledger();
        assert!(
            sh.execute(r#"txn log Checking "Corner Store" -20 Food --split "Food=-20""#)
                .is_err()
        );
        assert!(sh.execute(r#"txn log Checking "Corner Store" -20 split"#).is_err());
    }

    #[test]
    fn malformed_fields_are_rejected() {
        let mut sh = ledger();
        let err = sh
            .execute(r#"txn log Checking "Corner Store" twelve Food"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "command error: 'twelve' is not an amount");
        let err = sh
            .execute(r#"txn log Checking "Corner Store" -1 Food --date 05/01/2026"#)
            .unwrap_err();
        assert!(err.to_string().contains("is not a date"));
    }

    #[test]
    fn empty_budget_has_no_transactions() {
        let mut sh = ledger();
        assert_eq!(
            sh.execute("txn list").unwrap(),
            Flow::Continue(CommandOutput::Text(
                "No transactions found under budget Home.".to_string()
            ))
        );
    }

    #[test]
    fn amount_shapes() {
        for ok in ["12", "-12.50", "+3", ".5", "0.00"] {
            assert!(check_amount(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-", "12.", "1.2.3", "1,000", "abc"] {
            assert!(check_amount(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn long_notes_are_shortened() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(30)), format!("{}...", "x".repeat(25)));
    }
}

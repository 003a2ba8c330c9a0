//! Line tokenizer and the command/action/option parser.

use std::collections::HashMap;

use budgetsh_types::error::{OptionScope, ParseError};

use crate::catalog::{Action, FLAG_SET, Handler, OptionSpec};

// ---------------------------------------------------------------------------
// Tokenizer: double-quoted spans become single tokens.
// ---------------------------------------------------------------------------

/// Split a line into fields.
///
/// Text outside double quotes splits on runs of whitespace; each quoted
/// span is one token, kept verbatim. An unterminated quote runs to the end
/// of the line.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut fields = Vec::new();
    for (i, segment) in input.trim().split('"').enumerate() {
        if i % 2 == 0 {
            fields.extend(segment.split_whitespace().map(str::to_string));
        } else {
            fields.push(segment.to_string());
        }
    }
    fields
}

/// Whether a token introduces an option.
///
/// `--anything` always does; a single dash does only when followed by
/// exactly one non-digit, so `-5` stays a negative number.
pub fn is_option_marker(token: &str) -> bool {
    if token.starts_with("--") {
        return true;
    }
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('-'), Some(c), None) if !c.is_ascii_digit()
    )
}

// ---------------------------------------------------------------------------
// Parsed command
// ---------------------------------------------------------------------------

/// A line resolved against its handler's catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// First token of the line.
    pub name: String,
    /// Positional tokens in encounter order, including a matched action name.
    pub args: Vec<String>,
    /// Option name to the arguments it absorbed (`[FLAG_SET]` for flags).
    pub opts: HashMap<String, Vec<String>>,
}

impl Command {
    /// Whether `option` appeared on the line.
    pub fn has_opt(&self, option: &str) -> bool {
        self.opts.contains_key(option)
    }
}

/// Resolve `line` against `handler`.
///
/// Positional tokens fill the command's parameters, then those of the
/// first action named on the line. Option markers are only taken as
/// options once no positional slot is outstanding; before that they are
/// positional values.
pub fn parse(handler: &Handler, line: &str) -> Result<Command, ParseError> {
    let mut tokens = tokenize(line).into_iter();
    let mut cmd = Command {
        name: tokens.next().unwrap_or_default(),
        ..Command::default()
    };

    let mut scope: &[OptionSpec] = &handler.spec.options;
    let mut action: Option<&Action> = None;
    // Option currently absorbing arguments, with how many it still needs.
    let mut absorbing: Option<(&OptionSpec, usize)> = None;

    for token in tokens {
        if let Some((opt, needed)) = absorbing.take() {
            cmd.opts.entry(opt.name.to_string()).or_default().push(token);
            if needed > 1 {
                absorbing = Some((opt, needed - 1));
            }
            continue;
        }

        let outstanding = outstanding_slots(handler, action, cmd.args.len());

        if outstanding == 0 && is_option_marker(&token) {
            let wanted = token.trim_start_matches('-');
            let Some(opt) = scope.iter().find(|o| o.matches(wanted)) else {
                return Err(ParseError::UnexpectedOption {
                    option: token,
                    scope: if action.is_some() {
                        OptionScope::Action
                    } else {
                        OptionScope::Command
                    },
                });
            };
            let collected = cmd.opts.entry(opt.name.to_string()).or_default();
            collected.clear();
            if opt.arg_count() == 0 {
                collected.push(FLAG_SET.to_string());
            } else {
                absorbing = Some((opt, opt.arg_count()));
            }
            continue;
        }

        if action.is_some() && outstanding == 0 {
            return Err(ParseError::UnexpectedArgument(token));
        }

        if action.is_none()
            && let Some(matched) = handler.action(&token)
        {
            log::debug!("{}: matched action '{}'", cmd.name, matched.name);
            action = Some(matched);
            scope = &matched.options;
        }
        cmd.args.push(token);
    }

    if let Some((opt, _)) = absorbing {
        let have = cmd.opts.get(opt.name).map_or(0, Vec::len);
        return Err(ParseError::MissingOptionArgument {
            option: opt.name.to_string(),
            parameter: opt.parameters[have].to_string(),
        });
    }

    if let Some(action) = action {
        let expected: Vec<&str> = handler
            .spec
            .parameters
            .iter()
            .chain(&action.parameters)
            .copied()
            .collect();
        if let Some(missing) = expected.get(cmd.args.len()) {
            return Err(ParseError::MissingPositionalArgument(missing.to_string()));
        }
    }

    Ok(cmd)
}

/// Positional slots still to fill before an option may appear.
///
/// Parameters of a command without actions are optional, so such a command
/// never has outstanding slots.
fn outstanding_slots(handler: &Handler, action: Option<&Action>, have: usize) -> usize {
    let needed = match action {
        Some(action) => handler.spec.parameters.len() + action.parameters.len(),
        None if !handler.actions.is_empty() => handler.spec.parameters.len(),
        None => 0,
    };
    needed.saturating_sub(have)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandSpec;
    use crate::interpreter::{Flow, HandlerContext, Shell};
    use budgetsh_types::error::Result;

    fn noop(_: &mut Shell, _: &mut HandlerContext) -> Result<Flow> {
        Ok(Flow::default())
    }

    fn user_handler() -> Handler {
        Handler::with_actions(
            CommandSpec::new("user", "").parameters(&["action"]),
            vec![
                Action::new("login", "", noop)
                    .parameters(&["username", "password"])
                    .option(
                        OptionSpec::new("view-budget", "")
                            .parameters(&["budget_name"])
                            .shorthand(),
                    ),
                Action::new("logout", "", noop),
                Action::new("update", "", noop)
                    .parameters(&["username", "password"])
                    .option(OptionSpec::new("password", "").parameters(&["new_value", "retyped_value"])),
            ],
        )
    }

    fn category_handler() -> Handler {
        Handler::with_actions(
            CommandSpec::new("category", "").parameters(&["action"]),
            vec![
                Action::new("add", "", noop)
                    .parameters(&["name"])
                    .option(OptionSpec::new("notes", "").parameters(&["notes_value"]))
                    .option(
                        OptionSpec::new("group", "")
                            .parameters(&["group_name"])
                            .shorthand(),
                    ),
                Action::new("list", "", noop),
            ],
        )
    }

    fn add_handler() -> Handler {
        Handler::new(
            CommandSpec::new("add", "")
                .parameters(&["name"])
                .option(OptionSpec::new("notes", "").parameters(&["notes_value"])),
            noop,
        )
    }

    // -- tokenize --

    #[test]
    fn tokenize_quoted_span_is_one_token() {
        assert_eq!(tokenize(r#"cmd "a b" c"#), vec!["cmd", "a b", "c"]);
    }

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  hello \t  world  "), vec!["hello", "world"]);
    }

    #[test]
    fn tokenize_keeps_case() {
        assert_eq!(tokenize("Hello, World!"), vec!["Hello,", "World!"]);
    }

    #[test]
    fn tokenize_full_line() {
        assert_eq!(
            tokenize(r#"account add "My Checking Account" "on-budget" --notes "The checking account I use.""#),
            vec![
                "account",
                "add",
                "My Checking Account",
                "on-budget",
                "--notes",
                "The checking account I use."
            ]
        );
    }

    #[test]
    fn tokenize_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#"budget view "My Budget"#), vec!["budget", "view", "My Budget"]);
    }

    #[test]
    fn tokenize_empty_quotes_yield_empty_token() {
        assert_eq!(tokenize(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("   ").is_empty());
    }

    // -- markers --

    #[test]
    fn marker_forms() {
        assert!(is_option_marker("--group"));
        assert!(is_option_marker("-g"));
        assert!(!is_option_marker("-5"));
        assert!(!is_option_marker("-12.50"));
        assert!(!is_option_marker("-"));
        assert!(!is_option_marker("-gx"));
        assert!(!is_option_marker("group"));
    }

    // -- parse --

    #[test]
    fn option_with_quoted_argument() {
        let cmd = parse(&add_handler(), r#"add X --notes "hello world""#).unwrap();
        assert_eq!(cmd.name, "add");
        assert_eq!(cmd.args, vec!["X"]);
        assert_eq!(cmd.opts.len(), 1);
        assert_eq!(cmd.opts["notes"], vec!["hello world"]);
    }

    #[test]
    fn login_with_view_budget_shorthand() {
        let cmd = parse(&user_handler(), r#"user login alice secret -v "My Budget""#).unwrap();
        assert_eq!(cmd.args, vec!["login", "alice", "secret"]);
        assert_eq!(cmd.opts["view-budget"], vec!["My Budget"]);
    }

    #[test]
    fn shorthand_and_long_form_both_match() {
        let long = parse(&category_handler(), "category add Rent --group Bills").unwrap();
        let short = parse(&category_handler(), "category add Rent -g Bills").unwrap();
        assert_eq!(long.opts, short.opts);
        assert_eq!(long.opts["group"], vec!["Bills"]);
    }

    #[test]
    fn non_shorthand_option_rejects_letter() {
        let err = parse(&category_handler(), "category add Rent -n hi").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedOption {
                option: "-n".into(),
                scope: OptionScope::Action,
            }
        );
    }

    #[test]
    fn negative_number_is_positional() {
        let handler = Handler::new(CommandSpec::new("adjust", "").parameters(&["amount"]), noop);
        let cmd = parse(&handler, "adjust -5").unwrap();
        assert_eq!(cmd.args, vec!["-5"]);
        assert!(cmd.opts.is_empty());
    }

    #[test]
    fn missing_positional_names_first_unmet_parameter() {
        let err = parse(&user_handler(), "user login alice").unwrap_err();
        assert_eq!(err, ParseError::MissingPositionalArgument("password".into()));
    }

    #[test]
    fn missing_option_argument_names_next_parameter() {
        let err = parse(&user_handler(), "user update bob pw --password fresh").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingOptionArgument {
                option: "password".into(),
                parameter: "retyped_value".into(),
            }
        );
    }

    #[test]
    fn extra_argument_after_action_is_rejected() {
        let err = parse(&user_handler(), "user logout now").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedArgument("now".into()));
    }

    #[test]
    fn unknown_option_at_command_scope() {
        let err = parse(&category_handler(), "category bogus --fast").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedOption {
                option: "--fast".into(),
                scope: OptionScope::Command,
            }
        );
    }

    #[test]
    fn marker_fills_outstanding_positional() {
        let cmd = parse(&user_handler(), "user login alice -x").unwrap();
        assert_eq!(cmd.args, vec!["login", "alice", "-x"]);
        assert!(cmd.opts.is_empty());
    }

    #[test]
    fn action_matched_only_once() {
        let cmd = parse(&category_handler(), "category add list").unwrap();
        assert_eq!(cmd.args, vec!["add", "list"]);
    }

    #[test]
    fn flag_records_presence() {
        let handler = Handler::new(
            CommandSpec::new("help", "")
                .parameters(&["command"])
                .option(OptionSpec::new("verbose", "").shorthand()),
            noop,
        );
        let cmd = parse(&handler, "help -v").unwrap();
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.opts["verbose"], vec![FLAG_SET]);
    }

    #[test]
    fn repeated_option_keeps_last() {
        let cmd = parse(&add_handler(), "add X --notes one --notes two").unwrap();
        assert_eq!(cmd.opts["notes"], vec!["two"]);
    }

    #[test]
    fn command_without_action_needs_no_positionals() {
        let cmd = parse(&add_handler(), "add").unwrap();
        assert!(cmd.args.is_empty());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn unquoted_tokens_never_contain_whitespace(line in "[a-z \t-]{0,40}") {
                for token in tokenize(&line) {
                    prop_assert!(!token.is_empty());
                    prop_assert!(!token.chars().any(char::is_whitespace));
                }
            }

            #[test]
            fn quoted_span_survives_verbatim(word in "[a-z]{1,8}", span in "[a-z ]{0,20}") {
                let line = format!("{word} \"{span}\"");
                prop_assert_eq!(tokenize(&line), vec![word, span]);
            }

            #[test]
            fn dash_digit_is_never_a_marker(n in 0u32..10_000) {
                let token = format!("-{n}");
                prop_assert!(!is_option_marker(&token));
            }
        }
    }
}

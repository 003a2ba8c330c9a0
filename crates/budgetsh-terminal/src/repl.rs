//! Line-oriented read loop.

use std::io::{BufRead, Write};

use budgetsh_types::error::Result;

use crate::interpreter::{CommandOutput, Flow, Shell};

const WELCOME: &str = "Welcome to budgetsh. Type `help` to see available commands.";

/// Read lines from `input` until `exit` or end of input.
///
/// Every user line goes through the shell's queue, and the queue is drained
/// before the next prompt, so follow-up lines queued by a handler run in
/// order right after it.
pub fn run_repl<R: BufRead, W: Write>(shell: &mut Shell, mut input: R, mut output: W) -> Result<()> {
    writeln!(output, "{WELCOME}")?;
    let mut line = String::new();
    loop {
        write!(output, "{}", shell.prompt())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        if let Err(e) = shell.enqueue(line.trim()) {
            writeln!(output, "error: {e}")?;
            continue;
        }
        while let Some(queued) = shell.next_queued() {
            match shell.execute(&queued) {
                Ok(Flow::Exit) => {
                    writeln!(output, "Closing budgetsh...")?;
                    return Ok(());
                },
                Ok(Flow::Continue(out)) => render(&mut output, &out)?,
                Err(e) => {
                    log::debug!("'{queued}' failed: {e}");
                    writeln!(output, "error: {e}")?;
                },
            }
        }
    }
    Ok(())
}

/// Write one command's output.
pub fn render<W: Write>(output: &mut W, out: &CommandOutput) -> Result<()> {
    match out {
        CommandOutput::Text(text) => {
            if !text.is_empty() {
                writeln!(output, "{text}")?;
            }
        },
        CommandOutput::Table { headers, rows } => {
            write!(output, "{}", format_table(headers, rows))?;
        },
        CommandOutput::Clear => {
            write!(output, "\x1b[2J\x1b[H")?;
        },
        CommandOutput::None => {},
    }
    Ok(())
}

/// Columns padded to their widest cell, with a rule under the header.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let fmt_row = |cells: &[String]| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("  {}\n", line.trim_end())
    };

    let mut out = fmt_row(headers);
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    out.push_str(&format!("  {rule}\n"));
    for row in rows {
        out.push_str(&fmt_row(row.as_slice()));
    }
    out
}

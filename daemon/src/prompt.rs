//! Interactive fallback for choices not given on the command line.

use std::io::{BufRead, Write};

use anyhow::{bail, Context};
use retrovote_types::WorkflowKind;

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> anyhow::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read answer")? == 0 {
        bail!("no answer on stdin");
    }
    Ok(line.trim().to_string())
}

/// Show the workflow menu and read a choice (number or name).
pub fn prompt_workflow<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> anyhow::Result<WorkflowKind> {
    for (i, kind) in WorkflowKind::ALL.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, kind.label())?;
    }
    let answer = ask(input, output, "Your choice: ")?;
    WorkflowKind::from_menu_choice(&answer).with_context(|| format!("invalid choice {answer:?}"))
}

/// Read a worker count of at least 1.
pub fn prompt_threads<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> anyhow::Result<usize> {
    let answer = ask(input, output, "Threads: ")?;
    match answer.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("threads must be a positive integer, got {answer:?}"),
    }
}

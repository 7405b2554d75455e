// prompt.rs

use std::collections::VecDeque;
use std::io::{self, BufRead, Stderr, StdinLock, Write};

use crossterm::style::Stylize;

use crate::error::{MapError, MapResult};

/// Interactive operator channel used whenever configuration is missing or wrong.
pub trait Prompt {
    /// Shows a warning line to the operator.
    fn warn(&mut self, message: &str);

    /// Asks a question and blocks until an answer is given.
    fn ask(&mut self, question: &str) -> MapResult<String>;

    /// Shows a list of names the operator can pick from.
    fn list(&mut self, heading: &str, names: &[String]) {
        self.warn(&format!("{heading}: {names:?}"));
    }
}

/// Prompt backed by a terminal: warnings and questions in magenta, answers read line by line.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<StdinLock<'static>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn warn(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", format!("WARNING: {message}").magenta());
    }

    fn ask(&mut self, question: &str) -> MapResult<String> {
        write!(self.output, "{}", format!("WARNING: {question}").magenta())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MapError::PromptClosed);
        }
        Ok(line.trim().to_string())
    }
}

/// Prompt that replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub warnings: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn ask(&mut self, question: &str) -> MapResult<String> {
        self.questions.push(question.to_string());
        self.answers.pop_front().ok_or(MapError::PromptClosed)
    }
}

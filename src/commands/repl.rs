use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::config::Config;
use crate::core::dispatcher::{Dispatcher, Response};
use crate::core::traits::AlgebraEngine;
use crate::utils::interactive::read_line;
use crate::utils::output::OutputStyle;

pub const BANNER_TITLE: &str = "📘 Welcome to Math Helper!";
pub const BANNER_HINT: &str =
    "Type 'exit' to quit. You can ask about calculus, algebra, trig, or custom expressions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated,
}

/// Read-eval-print loop over any line source and sink
pub struct Session<E, R, W> {
    dispatcher: Dispatcher<E>,
    input: R,
    output: W,
    prompt: String,
    color: bool,
    state: SessionState,
}

impl<E: AlgebraEngine, R: BufRead, W: Write> Session<E, R, W> {
    pub fn new(dispatcher: Dispatcher<E>, input: R, output: W) -> Self {
        Self {
            dispatcher,
            input,
            output,
            prompt: crate::config::DEFAULT_PROMPT.to_string(),
            color: false,
            state: SessionState::Running,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn print_banner(&mut self) -> Result<()> {
        let title = OutputStyle::paint(BANNER_TITLE, self.color, OutputStyle::title);
        writeln!(self.output, "{}", title)?;
        writeln!(self.output, "{}", BANNER_HINT)?;
        Ok(())
    }

    /// One prompt/read/dispatch/print cycle. End of input terminates the
    /// session the same way `exit` does.
    pub fn step(&mut self) -> Result<SessionState> {
        if self.state == SessionState::Terminated {
            return Ok(self.state);
        }

        let prompt = OutputStyle::paint(&self.prompt, self.color, OutputStyle::prompt);
        let response = match read_line(&mut self.input, &mut self.output, &prompt)? {
            Some(line) => self.dispatcher.dispatch(&line),
            None => {
                tracing::debug!("end of input");
                // Keep the farewell on its own line after an unanswered prompt.
                writeln!(self.output)?;
                Response::Farewell
            }
        };

        writeln!(self.output, "{}", OutputStyle::response(&response, self.color))?;
        self.output.flush()?;

        if response.is_farewell() {
            self.state = SessionState::Terminated;
        }
        Ok(self.state)
    }

    pub fn run(&mut self) -> Result<()> {
        self.print_banner()?;
        while self.step()? == SessionState::Running {}
        Ok(())
    }
}

pub fn handle_repl_command(config: Config) -> Result<()> {
    let dispatcher = crate::dispatcher_from_config(&config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(dispatcher, stdin.lock(), stdout.lock())
        .with_prompt(config.general.prompt.clone())
        .with_color(config.general.color);
    session.run()
}

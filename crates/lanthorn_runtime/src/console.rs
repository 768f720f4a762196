//! The interactive console.
//!
//! Lines starting with `:` are console commands; everything else goes to the
//! world as the avatar's input.
//!
//! | Command              | Effect                                   |
//! |----------------------|------------------------------------------|
//! | `:tick [n]`          | advance the clock `n` ticks (default 1)  |
//! | `:tasks`             | list live tasks                          |
//! | `:eval <expr>`       | evaluate an expression in the world      |
//! | `:answer <n> <expr>` | answer the request of `task#n`           |
//! | `:save <path>`       | write a snapshot file                    |
//! | `:help`              | list these commands                      |
//! | `:quit`              | leave                                    |

use std::io::Write;

use lanthorn_engine::TaskId;
use lanthorn_foundation::{Error, ErrorKind, Result};

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::serialize::save_to_file;
use crate::session::Session;

const HELP: &str = "\
:tick [n]           advance the clock
:tasks              list live tasks
:eval <expr>        evaluate an expression
:answer <n> <expr>  answer a pending request
:save <path>        write a snapshot file
:quit               leave";

const CONSOLE_COMMANDS: [&str; 7] = [":tick", ":tasks", ":eval", ":answer", ":save", ":help", ":quit"];

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read another line.
    Continue,
    /// Stop.
    Quit,
}

/// Reads lines, feeds them to a [`Session`], and writes what comes back.
pub struct Console<E: LineEditor, W: Write> {
    editor: E,
    out: W,
    session: Session,
    prompt: String,
}

impl<W: Write> Console<RustylineEditor, W> {
    /// A console on the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be opened.
    pub fn interactive(session: Session, out: W) -> Result<Self> {
        Ok(Self::with_editor(RustylineEditor::new()?, session, out))
    }
}

impl<E: LineEditor, W: Write> Console<E, W> {
    /// A console reading from `editor`.
    pub fn with_editor(mut editor: E, session: Session, out: W) -> Self {
        let mut words = session.world().verbs();
        words.extend(CONSOLE_COMMANDS.iter().map(|c| (*c).to_string()));
        editor.set_words(words);
        Self {
            editor,
            out,
            session,
            prompt: "> ".to_string(),
        }
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Consumes the console, returning the session.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs until end of input or `:quit`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub fn run(&mut self) -> Result<()> {
        let scripted = self.editor.is_scripted();
        if !scripted {
            let opening = self.session.submit("look")?;
            self.write_lines(&opening)?;
        }
        loop {
            let line = match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => continue,
                ReadResult::Eof => break,
            };
            if scripted {
                let echo = format!("{}{line}", self.prompt);
                self.write_lines(&[echo])?;
            }
            if self.handle_line(&line)? == Flow::Quit {
                break;
            }
        }
        self.out.flush().map_err(write_error)
    }

    /// Handles one line of input.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing output fails; world and console
    /// errors are written as text.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        self.editor.add_history(line);

        let result = match line.strip_prefix(':') {
            Some(rest) => self.console_command(rest),
            None => self.session.submit(line).map(|lines| (lines, Flow::Continue)),
        };
        match result {
            Ok((lines, flow)) => {
                self.write_lines(&lines)?;
                Ok(flow)
            }
            Err(error) => {
                self.write_lines(&[format!("[error] {}", describe_error(&error))])?;
                Ok(Flow::Continue)
            }
        }
    }

    fn console_command(&mut self, input: &str) -> Result<(Vec<String>, Flow)> {
        let (name, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();
        let lines = match name {
            "q" | "quit" => return Ok((Vec::new(), Flow::Quit)),
            "help" | "h" => HELP.lines().map(str::to_string).collect(),
            "tick" | "t" => {
                let ticks = if rest.is_empty() { 1 } else { parse_number(rest)? };
                let mut lines = self.session.advance(ticks);
                lines.push(format!("[tick {}]", self.session.world().tick()));
                lines
            }
            "tasks" => self.task_lines(),
            "eval" | "e" => {
                let value = self.session.world_mut().evaluate(rest)?;
                vec![self.session.world().format_value(&value)]
            }
            "answer" => {
                let (number, expression) = rest.split_once(char::is_whitespace).unwrap_or((rest, "nil"));
                let task = self.find_task(parse_number(number)?)?;
                if self.session.answer(task, expression.trim())? {
                    vec![format!("[{task} will resume next tick]")]
                } else {
                    vec![format!("[{task} is not waiting for an answer]")]
                }
            }
            "save" => {
                if rest.is_empty() {
                    return Err(Error::new(ErrorKind::IoError("usage: :save <path>".to_string())));
                }
                let snapshot = self.session.world().snapshot();
                save_to_file(&snapshot, rest)?;
                vec![format!("[saved tick {} to {rest}]", snapshot.tick)]
            }
            other => vec![format!("Unknown console command :{other}. Try :help.")],
        };
        Ok((lines, Flow::Continue))
    }

    fn task_lines(&self) -> Vec<String> {
        let world = self.session.world();
        let ids = world.task_ids();
        if ids.is_empty() {
            return vec!["[no tasks]".to_string()];
        }
        ids.into_iter()
            .map(|id| {
                let label = world.task_label(id).unwrap_or("?");
                let state = world.task_state(id).map_or_else(|| "gone".to_string(), |s| format!("{s:?}"));
                format!("{id} {label} {state}")
            })
            .collect()
    }

    fn find_task(&self, number: u64) -> Result<TaskId> {
        self.session
            .world()
            .task_ids()
            .into_iter()
            .find(|id| id.get() == number)
            .ok_or_else(|| Error::internal(format!("no task#{number}")))
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.out, "{line}").map_err(write_error)?;
        }
        Ok(())
    }
}

fn parse_number(text: &str) -> Result<u64> {
    text.parse()
        .map_err(|_| Error::internal(format!("expected a number, got '{text}'")))
}

fn write_error(err: std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!("failed to write output: {err}")))
}

/// An error with its position, if it has one.
fn describe_error(error: &Error) -> String {
    match &error.context {
        Some(ctx) if ctx.line.is_some() => {
            format!("{error} at {}:{}", ctx.line.unwrap_or(0), ctx.column.unwrap_or(0))
        }
        _ => error.to_string(),
    }
}

//! Line input for the console.
//!
//! [`LineEditor`] hides where lines come from: [`RustylineEditor`] reads a
//! terminal with history and verb completion, [`ScriptEditor`] reads any
//! [`BufRead`] for batch runs and tests.

use std::borrow::Cow;
use std::io::BufRead;

use lanthorn_foundation::{Error, ErrorKind, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator};

/// Result of reading one line.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadResult {
    /// A line of input, without its terminator.
    Line(String),
    /// Ctrl+C.
    Interrupted,
    /// End of input.
    Eof,
}

/// A source of console input.
pub trait LineEditor {
    /// Reads a line, showing `prompt` if the source is interactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Records a line in history.
    fn add_history(&mut self, _line: &str) {}

    /// Replaces the words offered for completion.
    fn set_words(&mut self, _words: Vec<String>) {}

    /// True if input does not come from a person at a terminal.
    fn is_scripted(&self) -> bool {
        false
    }
}

// =============================================================================
// Terminal
// =============================================================================

#[derive(Helper, Completer, Hinter, Validator)]
struct ConsoleHelper {
    #[rustyline(Completer)]
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Highlighter for ConsoleHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, default: bool) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;33m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }
}

/// Completes verbs in first position and console commands after `:`.
#[derive(Default)]
struct WordCompleter {
    words: Vec<String>,
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(char::is_whitespace).map_or(0, |i| i + 1);
        if start > 0 {
            return Ok((pos, Vec::new()));
        }
        let word = &line[..pos];
        let candidates = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .map(|w| Pair {
                display: w.clone(),
                replacement: w.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

/// Terminal input through rustyline.
pub struct RustylineEditor {
    editor: Editor<ConsoleHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Opens the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be configured.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(500)
            .map_err(|e| Error::internal(e.to_string()))?
            .build();
        let mut editor = Editor::with_config(config).map_err(|e| Error::internal(e.to_string()))?;
        editor.set_helper(Some(ConsoleHelper {
            completer: WordCompleter::default(),
            hinter: HistoryHinter::new(),
        }));
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::internal(e.to_string())),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_words(&mut self, words: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.words = words;
        }
    }
}

// =============================================================================
// Scripts
// =============================================================================

/// Reads lines from a buffer, one command per line.
pub struct ScriptEditor<R> {
    reader: R,
}

impl<R: BufRead> ScriptEditor<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineEditor for ScriptEditor<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| Error::new(ErrorKind::IoError(e.to_string())))?;
        if read == 0 {
            return Ok(ReadResult::Eof);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(ReadResult::Line(trimmed.to_string()))
    }

    fn is_scripted(&self) -> bool {
        true
    }
}

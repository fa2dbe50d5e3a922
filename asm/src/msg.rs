use color_print::cprintln;

use crate::error::{self, Error};

/// A diagnostic tied to a source line (0-based), or to the whole file.
#[derive(Debug)]
pub enum Msg {
    Error(Error, Option<usize>),
    Warn(String, Option<usize>),
    Note(String, Option<usize>),
}

impl Msg {
    pub fn line(&self) -> Option<usize> {
        match self {
            Msg::Error(_, line) | Msg::Warn(_, line) | Msg::Note(_, line) => *line,
        }
    }

    pub fn print(&self, file: &str, lines: &[String]) {
        match self {
            Msg::Error(err, line) => err.print_diag(file, lines, *line),
            Msg::Warn(msg, line) => {
                cprintln!("<yellow,bold>warn</>: {}", msg);
                error::print_location(file, lines, *line);
            }
            Msg::Note(msg, line) => {
                cprintln!("<green,bold>note</>: {}", msg);
                error::print_location(file, lines, *line);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Msgs(Vec<Msg>);

impl Msgs {
    pub fn new() -> Self {
        Msgs(vec![])
    }

    pub fn error(&mut self, err: Error, line: Option<usize>) {
        self.0.push(Msg::Error(err, line));
    }

    pub fn warn(&mut self, msg: String, line: Option<usize>) {
        self.0.push(Msg::Warn(msg, line));
    }

    pub fn note(&mut self, msg: String, line: Option<usize>) {
        self.0.push(Msg::Note(msg, line));
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|msg| matches!(msg, Msg::Error(..)))
    }

    pub fn errors(&self) -> impl Iterator<Item = (&Error, Option<usize>)> {
        self.0.iter().filter_map(|msg| match msg {
            Msg::Error(err, line) => Some((err, *line)),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Msg> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prints in source order, file-level messages last.
    pub fn dump(&self, file: &str, lines: &[String]) {
        let mut sorted: Vec<&Msg> = self.0.iter().collect();
        sorted.sort_by_key(|msg| msg.line().unwrap_or(usize::MAX));
        for msg in sorted {
            msg.print(file, lines);
        }
    }
}

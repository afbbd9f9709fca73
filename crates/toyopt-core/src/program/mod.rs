//! Line-oriented program model
//!
//! A toy-language program is handled as an ordered list of source lines,
//! one statement, declaration or block delimiter per line. Each line keeps
//! its original text, so anything the passes do not rewrite is emitted
//! byte for byte.

mod blocks;
mod line;

pub use blocks::{Block, BlockKind, BlockStructure, Body};
pub use line::{
    is_identifier, is_keyword, Assignment, Declaration, IndexExpr, Line, LineKind, LoopHeader,
    LoopKind, Separator, Target, KEYWORDS,
};

use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    /// Split `source` on `\n`. A trailing newline yields a trailing empty
    /// line, so rendering reproduces the input exactly.
    pub fn parse(source: &str) -> Self {
        Self {
            lines: source.split('\n').map(Line::parse).collect(),
        }
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> &Line {
        &self.lines[index]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn replace_line(&mut self, index: usize, text: impl Into<String>) {
        self.lines[index] = Line::parse(text);
    }

    /// Every identifier-shaped word appearing anywhere in the program,
    /// keywords and type names included.
    pub fn words(&self) -> FxHashSet<&str> {
        self.lines
            .iter()
            .flat_map(|line| crate::expr::scan_identifiers(line.text()))
            .collect()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line.text())?;
        }
        Ok(())
    }
}

use crate::expr::{is_ident_continue, is_ident_start, scan_identifiers};
use std::ops::Range;

/// Reserved words of the toy language. They never name variables.
pub const KEYWORDS: &[&str] = &[
    "var", "fun", "endfun", "while", "do", "endwhile", "for", "endfor", "if", "then", "else",
    "endif", "print", "return", "true", "false",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue) && !is_keyword(word),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    For,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub ty: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Scalar(String),
    Element { array: String, index: String },
}

impl Target {
    /// The variable written by the assignment: the scalar itself, or the
    /// array whose element is stored.
    pub fn name(&self) -> &str {
        match self {
            Target::Scalar(name) => name,
            Target::Element { array, .. } => array,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: Target,
    /// `=` or `:=`, as written.
    pub operator: String,
    /// Right-hand side, trimmed, statement separator removed.
    pub rhs: String,
    /// Whether the statement carries its own `;` separator.
    pub terminated: bool,
}

impl Assignment {
    /// A scalar assignment whose right-hand side contains no indexing; the
    /// only kind that enters the substitution environment or gets folded.
    pub fn is_simple(&self) -> bool {
        matches!(self.target, Target::Scalar(_)) && !self.rhs.contains('[')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopHeader {
    pub kind: LoopKind,
    /// Induction variable of a `for` header.
    pub induction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    FunctionHeader,
    FunctionEnd,
    Declaration(Declaration),
    Assignment(Assignment),
    LoopHeader(LoopHeader),
    LoopEnd(LoopKind),
    ConditionalStart,
    ConditionalElse,
    ConditionalEnd,
    Other,
}

/// How a line takes part in the `;`-separated statement lists of the
/// downstream grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Not a statement (declaration, block opener, blank line).
    NotStatement,
    Terminated,
    Unterminated,
}

/// A bracketed index expression inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpr {
    /// Byte range of the text between the brackets.
    pub range: Range<usize>,
    /// The bracket contents, trimmed.
    pub text: String,
}

/// One source line together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    kind: LineKind,
}

impl Line {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = classify(&text);
        Self { text, kind }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    pub fn indent(&self) -> &str {
        let trimmed = self.text.trim_start();
        &self.text[..self.text.len() - trimmed.len()]
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match &self.kind {
            LineKind::Assignment(assignment) => Some(assignment),
            _ => None,
        }
    }

    /// The scalar name and assignment, if this is a simple assignment.
    pub fn simple_assignment(&self) -> Option<(&str, &Assignment)> {
        let assignment = self.assignment()?;
        match &assignment.target {
            Target::Scalar(name) if assignment.is_simple() => Some((name.as_str(), assignment)),
            _ => None,
        }
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        match &self.kind {
            LineKind::Declaration(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self.kind, LineKind::Declaration(_))
    }

    /// Names this line stores to: assignment targets and `for` induction
    /// variables.
    pub fn writes(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Assignment(assignment) => Some(assignment.target.name()),
            LineKind::LoopHeader(LoopHeader {
                induction: Some(name),
                ..
            }) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Names this line reads.
    pub fn reads(&self) -> Vec<&str> {
        let words = match &self.kind {
            LineKind::Blank
            | LineKind::FunctionHeader
            | LineKind::FunctionEnd
            | LineKind::Declaration(_)
            | LineKind::LoopEnd(_)
            | LineKind::ConditionalElse
            | LineKind::ConditionalEnd => Vec::new(),
            LineKind::Assignment(assignment) => match &assignment.target {
                Target::Scalar(_) => scan_identifiers(&assignment.rhs),
                Target::Element { array, index } => {
                    let mut words = vec![array.as_str()];
                    words.extend(scan_identifiers(index));
                    words.extend(scan_identifiers(&assignment.rhs));
                    words
                }
            },
            LineKind::LoopHeader(_) | LineKind::ConditionalStart | LineKind::Other => {
                scan_identifiers(&self.text)
            }
        };
        words.into_iter().filter(|w| !is_keyword(w)).collect()
    }

    pub fn separator(&self) -> Separator {
        match &self.kind {
            LineKind::Blank
            | LineKind::FunctionHeader
            | LineKind::FunctionEnd
            | LineKind::Declaration(_)
            | LineKind::LoopHeader(_)
            | LineKind::ConditionalStart
            | LineKind::ConditionalElse => Separator::NotStatement,
            LineKind::Assignment(_)
            | LineKind::LoopEnd(_)
            | LineKind::ConditionalEnd
            | LineKind::Other => {
                if self.text.trim_end().ends_with(';') {
                    Separator::Terminated
                } else {
                    Separator::Unterminated
                }
            }
        }
    }

    /// Innermost bracket pairs of the line, left to right. An unmatched `[`
    /// ends the scan, leaving the rest of the line untouched.
    pub fn index_expressions(&self) -> Vec<IndexExpr> {
        let mut found = Vec::new();
        let mut open = None;

        for (i, c) in self.text.char_indices() {
            match c {
                '[' => open = Some(i + 1),
                ']' => {
                    if let Some(start) = open.take() {
                        found.push(IndexExpr {
                            range: start..i,
                            text: self.text[start..i].trim().to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        found
    }
}

fn first_word(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(_, c)| !is_ident_continue(c))
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

fn classify(text: &str) -> LineKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    let terminated = trimmed.ends_with(';');
    let body = trimmed.trim_end_matches(';').trim_end();

    match first_word(body) {
        "fun" => LineKind::FunctionHeader,
        "endfun" => LineKind::FunctionEnd,
        "var" => LineKind::Declaration(parse_declaration(&body[3..])),
        "while" => LineKind::LoopHeader(LoopHeader {
            kind: LoopKind::While,
            induction: None,
        }),
        "for" => LineKind::LoopHeader(LoopHeader {
            kind: LoopKind::For,
            induction: scan_identifiers(&body[3..])
                .into_iter()
                .find(|w| !is_keyword(w))
                .map(str::to_string),
        }),
        "endwhile" => LineKind::LoopEnd(LoopKind::While),
        "endfor" => LineKind::LoopEnd(LoopKind::For),
        "if" => LineKind::ConditionalStart,
        "else" => LineKind::ConditionalElse,
        "endif" => LineKind::ConditionalEnd,
        _ => parse_assignment(body, terminated).map_or(LineKind::Other, LineKind::Assignment),
    }
}

fn parse_declaration(rest: &str) -> Declaration {
    let rest = rest.trim();
    let (ty, names) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Declaration {
        ty: ty.to_string(),
        names: names
            .split(',')
            .map(str::trim)
            .filter(|name| is_identifier(name))
            .map(str::to_string)
            .collect(),
    }
}

fn parse_assignment(body: &str, terminated: bool) -> Option<Assignment> {
    let eq = body.find('=')?;
    let rhs = body[eq + 1..].trim();
    if rhs.contains('=') {
        return None;
    }

    let (lhs, operator) = match body[..eq].strip_suffix(':') {
        Some(lhs) => (lhs.trim(), ":="),
        None => (body[..eq].trim(), "="),
    };

    let target = if is_identifier(lhs) {
        Target::Scalar(lhs.to_string())
    } else {
        let (array, index) = lhs.strip_suffix(']')?.split_once('[')?;
        let array = array.trim();
        if !is_identifier(array) || index.contains('[') {
            return None;
        }
        Target::Element {
            array: array.to_string(),
            index: index.trim().to_string(),
        }
    };

    Some(Assignment {
        target,
        operator: operator.to_string(),
        rhs: rhs.to_string(),
        terminated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_assignment() {
        let line = Line::parse("  temp = x * y + z;");
        let assignment = line.assignment().unwrap();
        assert_eq!(assignment.target, Target::Scalar("temp".to_string()));
        assert_eq!(assignment.rhs, "x * y + z");
        assert!(assignment.terminated);
        assert_eq!(line.indent(), "  ");
        assert_eq!(line.separator(), Separator::Terminated);
    }

    #[test]
    fn test_walrus_assignment() {
        let line = Line::parse("x := 4");
        let assignment = line.assignment().unwrap();
        assert_eq!(assignment.operator, ":=");
        assert_eq!(assignment.rhs, "4");
        assert!(!assignment.terminated);
    }

    #[test]
    fn test_element_assignment() {
        let line = Line::parse("  a[y*z]=1");
        let assignment = line.assignment().unwrap();
        assert_eq!(
            assignment.target,
            Target::Element {
                array: "a".to_string(),
                index: "y*z".to_string()
            }
        );
        assert!(!assignment.is_simple());
        assert_eq!(line.writes(), Some("a"));
        assert_eq!(line.reads(), vec!["a", "y", "z"]);
    }

    #[test]
    fn test_rhs_indexing_is_not_simple() {
        let line = Line::parse("x = a[2] + 1;");
        assert!(line.assignment().is_some());
        assert!(line.simple_assignment().is_none());
    }

    #[test]
    fn test_comparisons_are_not_assignments() {
        assert_eq!(*Line::parse(" while i <= 3 do").kind(), LineKind::LoopHeader(LoopHeader {
            kind: LoopKind::While,
            induction: None,
        }));
        assert_eq!(*Line::parse("print(x == 3);").kind(), LineKind::Other);
        assert_eq!(*Line::parse("x == 3").kind(), LineKind::Other);
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert!(Line::parse("variance = 3;").assignment().is_some());
        assert!(Line::parse("var int variance;").is_declaration());
    }

    #[test]
    fn test_declaration() {
        let line = Line::parse(" var int i, j, x;");
        assert_eq!(
            line.declaration(),
            Some(&Declaration {
                ty: "int".to_string(),
                names: vec!["i".to_string(), "j".to_string(), "x".to_string()],
            })
        );
        assert_eq!(line.separator(), Separator::NotStatement);
    }

    #[test]
    fn test_block_lines() {
        assert_eq!(*Line::parse(" endwhile;").kind(), LineKind::LoopEnd(LoopKind::While));
        assert_eq!(Line::parse(" endwhile").separator(), Separator::Unterminated);
        assert_eq!(*Line::parse("if x < 2 then").kind(), LineKind::ConditionalStart);
        assert_eq!(*Line::parse("fun int main()").kind(), LineKind::FunctionHeader);
        assert_eq!(*Line::parse("   ").kind(), LineKind::Blank);
    }

    #[test]
    fn test_for_induction_variable() {
        let line = Line::parse("for i = 1, n do");
        assert_eq!(line.writes(), Some("i"));
    }

    #[test]
    fn test_reads_skip_keywords() {
        assert_eq!(Line::parse(" print(sum);").reads(), vec!["sum"]);
        assert_eq!(Line::parse(" return(0)").reads(), Vec::<&str>::new());
        assert_eq!(Line::parse("while i < n do").reads(), vec!["i", "n"]);
    }

    #[test]
    fn test_index_expressions() {
        let line = Line::parse("b[i] = a[ y * z ] + a[b[2]]");
        let found: Vec<_> = line.index_expressions().into_iter().map(|e| e.text).collect();
        assert_eq!(found, vec!["i", "y * z", "2"]);
    }

    #[test]
    fn test_unmatched_bracket_stops_scan() {
        let line = Line::parse("a[y*z = 1");
        assert!(line.index_expressions().is_empty());
        assert_eq!(*line.kind(), LineKind::Other);
    }
}

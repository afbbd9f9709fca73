//! Substitution environment
//!
//! A flow-insensitive snapshot mapping each scalar variable to the
//! right-hand side of its *last* simple assignment anywhere in the program.
//! This is a deliberate approximation of reaching definitions: it is rebuilt
//! from the current program text before each pass and never mutated while a
//! pass runs.

use crate::expr::{self, Expr};
use crate::program::Program;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    text: String,
    expr: Option<Expr>,
}

impl Binding {
    fn new(text: String) -> Self {
        let expr = expr::parse(&text).ok();
        Self { text, expr }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    /// Scan program text and record every simple assignment.
    pub fn extract(source: &str) -> Self {
        Self::from_program(&Program::parse(source))
    }

    pub fn from_program(program: &Program) -> Self {
        let mut env = Self::default();
        for line in program.lines() {
            if let Some((name, assignment)) = line.simple_assignment() {
                env.bind(name, &assignment.rhs);
            }
        }
        env
    }

    /// Later bindings overwrite earlier ones but keep the first position.
    fn bind(&mut self, name: &str, rhs: &str) {
        self.bindings
            .insert(name.to_string(), Binding::new(rhs.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(|binding| binding.text.as_str())
    }

    /// The bound right-hand side as an expression tree, if it parses.
    pub fn resolve(&self, name: &str) -> Option<Expr> {
        self.bindings.get(name).and_then(|binding| binding.expr.clone())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.as_str(), binding.text.as_str()))
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut env = Self::default();
        for (name, rhs) in iter {
            env.bind(&name, &rhs);
        }
        env
    }
}

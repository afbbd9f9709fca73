// =============================================================================
// O2: Loop-Invariant Hoisting Pass
// =============================================================================

use crate::config::{OptimizationLevel, OptimizerConfig};
use crate::environment::Environment;
use crate::expr::{self, evaluate};
use crate::optimizer::OptimizationPass;
use crate::program::{BlockKind, BlockStructure, Line, Program, Separator};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::Range;
use tracing::debug;

/// Loop optimization pass
/// 1. Relocates constant scalar assignments in front of the outermost loop
///    in which they are invariant
/// 2. Replaces constant, loop-invariant array index expressions with a
///    temporary computed before the loop
pub struct LoopOptimizationPass {
    hoist_scalars: bool,
    hoist_array_indices: bool,
    temp_prefix: String,
    stats: HoistStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoistStats {
    pub scalars_hoisted: usize,
    pub index_expressions_hoisted: usize,
    pub temporaries_declared: usize,
}

impl LoopOptimizationPass {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            hoist_scalars: config.hoist_scalars,
            hoist_array_indices: config.hoist_array_indices,
            temp_prefix: config.temp_prefix.clone(),
            stats: HoistStats::default(),
        }
    }

    pub fn stats(&self) -> HoistStats {
        self.stats
    }
}

impl Default for LoopOptimizationPass {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl OptimizationPass for LoopOptimizationPass {
    fn name(&self) -> &'static str {
        "loop-optimization"
    }

    fn min_level(&self) -> OptimizationLevel {
        OptimizationLevel::O2
    }

    fn run(&mut self, program: &mut Program, env: &Environment) -> bool {
        let analysis = LoopAnalysis::new(program);
        if analysis.blocks.loops().next().is_none() {
            return false;
        }

        let mut plan = EditPlan::default();

        if self.hoist_scalars {
            self.plan_scalar_relocations(&analysis, env, &mut plan);
        }
        if self.hoist_array_indices {
            self.plan_index_temporaries(&analysis, env, &mut plan);
        }

        if plan.is_empty() {
            return false;
        }

        *program = plan.apply(program);
        true
    }
}

// -----------------------------------------------------------------------------
// Loop facts
// -----------------------------------------------------------------------------

/// What a loop region does to variables, header and terminator included.
#[derive(Debug, Default)]
struct LoopFacts {
    /// Number of lines storing to each name.
    assigned: FxHashMap<String, usize>,
    /// Names declared inside the body.
    declared: FxHashSet<String>,
}

impl LoopFacts {
    fn collect(program: &Program, start: usize, end: usize) -> Self {
        let mut facts = Self::default();
        for i in start..=end {
            let line = program.line(i);
            if let Some(name) = line.writes() {
                *facts.assigned.entry(name.to_string()).or_default() += 1;
            }
            if i > start && i < end {
                if let Some(decl) = line.declaration() {
                    facts.declared.extend(decl.names.iter().cloned());
                }
            }
        }
        facts
    }

    /// None of `deps` can change while the loop runs.
    fn is_invariant(&self, deps: &[&str]) -> bool {
        deps.iter()
            .all(|dep| !self.assigned.contains_key(*dep) && !self.declared.contains(*dep))
    }

    fn writes_to(&self, name: &str) -> usize {
        self.assigned.get(name).copied().unwrap_or(0)
    }
}

struct LoopAnalysis<'a> {
    program: &'a Program,
    blocks: BlockStructure,
    facts: FxHashMap<usize, LoopFacts>,
}

impl<'a> LoopAnalysis<'a> {
    fn new(program: &'a Program) -> Self {
        let blocks = BlockStructure::analyze(program);
        let facts = blocks
            .loops()
            .map(|(id, block)| (id, LoopFacts::collect(program, block.start, block.end)))
            .collect();
        Self {
            program,
            blocks,
            facts,
        }
    }

    /// Walk outward from the innermost loop around `line` and return the
    /// outermost loop in which `deps` are invariant and `accept` holds.
    fn invariant_region<F>(&self, line: usize, deps: &[&str], accept: F) -> Option<usize>
    where
        F: Fn(usize, &LoopFacts) -> bool,
    {
        let mut region = None;
        let mut current = self.blocks.innermost_loop(line);

        while let Some(id) = current {
            let facts = &self.facts[&id];
            if !facts.is_invariant(deps) || !accept(id, facts) {
                break;
            }
            region = Some(id);
            current = self.blocks.parent_loop(id);
        }

        region
    }

    /// Whether a conditional lies between `line` and loop `region`.
    fn is_conditional_within(&self, line: usize, region: usize) -> bool {
        self.blocks
            .enclosing(line)
            .take_while(|&id| id != region)
            .any(|id| self.blocks.block(id).kind == BlockKind::Conditional)
    }

    /// Whether `name` is stored to earlier in the statement list that holds
    /// loop `region`. That value is what follows the loop when the body
    /// never runs.
    fn is_written_before(&self, name: &str, region: usize) -> bool {
        let start = self.blocks.block(region).start;
        let lower = self.blocks.body_of(start).opening.map_or(0, |opening| opening + 1);
        (lower..start).any(|i| self.program.line(i).writes() == Some(name))
    }

    fn is_read_between(&self, name: &str, lines: Range<usize>) -> bool {
        lines
            .into_iter()
            .any(|i| self.program.line(i).reads().contains(&name))
    }

    /// Where a temporary declaration goes for a loop: after the last
    /// declaration of the enclosing function body, or of the top level.
    fn declaration_anchor(&self, region: usize) -> Anchor {
        let start = self.blocks.block(region).start;
        let function = self.blocks.function_of(start);
        let (range, fallback) = match function {
            Some(f) => {
                let block = self.blocks.block(f);
                (block.start + 1..block.end, Anchor::After(block.start))
            }
            None => (0..self.program.len(), Anchor::Start),
        };

        range
            .rev()
            .find(|&i| {
                self.program.line(i).is_declaration() && self.blocks.innermost_block(i) == function
            })
            .map_or(fallback, Anchor::After)
    }

    /// Where the temporary assignment for a loop goes: after the last store
    /// to one of `deps` that precedes the loop in its statement list, moved
    /// past any block that store sits in. Falls back to the first statement
    /// position of that list.
    fn assignment_anchor(&self, region: usize, deps: &[&str]) -> Anchor {
        let start = self.blocks.block(region).start;
        let body = self.blocks.body_of(start);
        let lower = body.opening.map_or(0, |opening| opening + 1);

        let last_write = (lower..start).rev().find(|&i| {
            self.program
                .line(i)
                .writes()
                .is_some_and(|name| deps.contains(&name))
        });
        if let Some(i) = last_write {
            return Anchor::After(self.blocks.lift_to(i, body.block));
        }

        let last_declaration = (lower..start).rev().find(|&i| {
            self.program.line(i).is_declaration() && self.blocks.innermost_block(i) == body.block
        });

        match (last_declaration, body.opening) {
            (Some(i), _) => Anchor::After(i),
            (None, Some(opening)) => Anchor::After(opening),
            (None, None) => Anchor::Start,
        }
    }
}

// -----------------------------------------------------------------------------
// Planning
// -----------------------------------------------------------------------------

impl LoopOptimizationPass {
    fn plan_scalar_relocations(&mut self, analysis: &LoopAnalysis<'_>, env: &Environment, plan: &mut EditPlan) {
        let program = analysis.program;

        for (i, line) in program.lines().iter().enumerate() {
            let Some((target, assignment)) = line.simple_assignment() else {
                continue;
            };
            if !assignment.terminated || analysis.blocks.innermost_loop(i).is_none() {
                continue;
            }
            let Ok(rhs) = expr::parse(&assignment.rhs) else {
                continue;
            };
            if evaluate(&assignment.rhs, env).is_none() {
                continue;
            }

            let deps = rhs.variables();
            let region = analysis.invariant_region(i, &deps, |id, facts| {
                let start = analysis.blocks.block(id).start;
                facts.writes_to(target) == 1
                    && !facts.declared.contains(target)
                    && !analysis.is_read_between(target, start..i)
                    && !analysis.is_written_before(target, id)
                    && !analysis.is_conditional_within(i, id)
            });
            let Some(region) = region else {
                continue;
            };

            let header = program.line(analysis.blocks.block(region).start);
            let relocated = format!("{}{}", header.indent(), line.text().trim_start());
            debug!(
                line = i + 1,
                before = analysis.blocks.block(region).start + 1,
                "relocating invariant assignment to {}",
                target
            );

            plan.removed.insert(i);
            plan.before
                .entry(analysis.blocks.block(region).start)
                .or_default()
                .push(relocated);
            self.stats.scalars_hoisted += 1;
        }
    }

    fn plan_index_temporaries(&mut self, analysis: &LoopAnalysis<'_>, env: &Environment, plan: &mut EditPlan) {
        let program = analysis.program;
        let mut taken: FxHashSet<String> = program.words().into_iter().map(str::to_string).collect();
        // (expression, assignment anchor) -> temporary
        let mut temporaries: IndexMap<(String, Anchor), String> = IndexMap::new();

        for (i, line) in program.lines().iter().enumerate() {
            if plan.removed.contains(&i) || analysis.blocks.innermost_loop(i).is_none() {
                continue;
            }

            for index in line.index_expressions() {
                let Ok(parsed) = expr::parse(&index.text) else {
                    continue;
                };
                if !parsed.is_compound() || evaluate(&index.text, env).is_none() {
                    continue;
                }

                let deps = parsed.variables();
                let region = analysis.invariant_region(i, &deps, |id, _| {
                    !analysis.is_conditional_within(i, id)
                });
                let Some(region) = region else {
                    continue;
                };

                let anchor = analysis.assignment_anchor(region, &deps);
                let key = (parsed.to_string(), anchor);
                let temp = match temporaries.get(&key) {
                    Some(temp) => temp.clone(),
                    None => {
                        let temp = fresh_name(&self.temp_prefix, &taken);
                        taken.insert(temp.clone());

                        let header = program.line(analysis.blocks.block(region).start);
                        let decl_anchor = analysis.declaration_anchor(region);
                        let decl_indent = match decl_anchor {
                            Anchor::After(j) if program.line(j).is_declaration() => program.line(j).indent(),
                            _ => header.indent(),
                        };
                        plan.declarations
                            .entry(decl_anchor)
                            .or_default()
                            .push(format!("{}var int {};", decl_indent, temp));
                        plan.statements
                            .entry(anchor)
                            .or_default()
                            .push(format!("{}{} = {};", header.indent(), temp, index.text));

                        debug!(
                            line = i + 1,
                            "hoisting index expression {:?} into temporary {}",
                            index.text,
                            temp
                        );
                        self.stats.temporaries_declared += 1;
                        temporaries.insert(key, temp.clone());
                        temp
                    }
                };

                plan.rewrites.entry(i).or_default().push((index.range, temp));
                self.stats.index_expressions_hoisted += 1;
            }
        }
    }
}

/// `prefix`, `prefix1`, `prefix2`, ... whichever is first not in `taken`.
fn fresh_name(prefix: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(prefix) {
        return prefix.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| prefix.to_string())
}

// -----------------------------------------------------------------------------
// Editing
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Anchor {
    /// Before the first line of the program.
    Start,
    After(usize),
}

/// Edits collected against the unmodified program, applied in one pass.
#[derive(Debug, Default)]
struct EditPlan {
    removed: FxHashSet<usize>,
    /// Lines inserted in front of a line, in order.
    before: FxHashMap<usize, Vec<String>>,
    /// Declarations inserted at an anchor, ahead of any statements there.
    declarations: FxHashMap<Anchor, Vec<String>>,
    statements: FxHashMap<Anchor, Vec<String>>,
    /// Bracket contents replaced by a name.
    rewrites: FxHashMap<usize, Vec<(Range<usize>, String)>>,
}

impl EditPlan {
    fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.before.is_empty()
            && self.declarations.is_empty()
            && self.statements.is_empty()
            && self.rewrites.is_empty()
    }

    fn apply(&self, program: &Program) -> Program {
        let mut out: Vec<String> = Vec::with_capacity(program.len());
        self.emit_inserted(Anchor::Start, false, &mut out);

        for (i, line) in program.lines().iter().enumerate() {
            if let Some(lines) = self.before.get(&i) {
                out.extend(lines.iter().cloned());
            }

            // Statements after the last statement of a list move the
            // separator onto the anchor and leave the last one bare.
            let mut unterminated = false;
            if !self.removed.contains(&i) {
                let mut text = self.rewrite(i, line);
                if self.statements.contains_key(&Anchor::After(i))
                    && line.separator() == Separator::Unterminated
                {
                    text.truncate(text.trim_end().len());
                    text.push(';');
                    unterminated = true;
                }
                out.push(text);
            }

            self.emit_inserted(Anchor::After(i), unterminated, &mut out);
        }

        Program::from_lines(out.into_iter().map(Line::parse).collect())
    }

    fn emit_inserted(&self, anchor: Anchor, unterminated: bool, out: &mut Vec<String>) {
        if let Some(lines) = self.declarations.get(&anchor) {
            out.extend(lines.iter().cloned());
        }
        if let Some(lines) = self.statements.get(&anchor) {
            out.extend(lines.iter().cloned());
            if unterminated {
                if let Some(last) = out.last_mut() {
                    if last.ends_with(';') {
                        last.pop();
                    }
                }
            }
        }
    }

    fn rewrite(&self, index: usize, line: &Line) -> String {
        let mut text = line.text().to_string();
        if let Some(rewrites) = self.rewrites.get(&index) {
            let mut rewrites = rewrites.clone();
            rewrites.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
            for (range, name) in rewrites {
                text.replace_range(range, &name);
            }
        }
        text
    }
}

//! Block nesting: functions, loops and conditionals.
//!
//! Blocks are discovered with a single stack walk over the lines. Each block
//! records its opening and closing line, its parent and its nesting depth,
//! so loop regions of any depth can be queried without re-scanning.

use super::{LineKind, LoopKind, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Loop(LoopKind),
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Line of the opening header.
    pub start: usize,
    /// Line of the terminator, or the program length for an unclosed block.
    pub end: usize,
    /// `else` line of a conditional.
    pub else_line: Option<usize>,
    pub parent: Option<usize>,
    pub depth: usize,
    pub closed: bool,
}

impl Block {
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, BlockKind::Loop(_))
    }
}

/// A statement list: the body of a block (one branch, for conditionals) or
/// the top level of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    pub block: Option<usize>,
    /// The header or `else` line that opens the statement list.
    pub opening: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockStructure {
    blocks: Vec<Block>,
    /// Innermost block strictly containing each line.
    innermost: Vec<Option<usize>>,
    /// Block opened by each line, if any.
    opened: Vec<Option<usize>>,
}

impl BlockStructure {
    pub fn analyze(program: &Program) -> Self {
        let len = program.len();
        let mut blocks: Vec<Block> = Vec::new();
        let mut innermost = vec![None; len];
        let mut opened = vec![None; len];
        let mut stack: Vec<usize> = Vec::new();

        let open = |blocks: &mut Vec<Block>, stack: &mut Vec<usize>, kind, line| {
            let id = blocks.len();
            blocks.push(Block {
                kind,
                start: line,
                end: len,
                else_line: None,
                parent: stack.last().copied(),
                depth: stack.len(),
                closed: false,
            });
            stack.push(id);
            id
        };

        for (i, line) in program.lines().iter().enumerate() {
            match line.kind() {
                LineKind::FunctionHeader => {
                    innermost[i] = stack.last().copied();
                    opened[i] = Some(open(&mut blocks, &mut stack, BlockKind::Function, i));
                }
                LineKind::LoopHeader(header) => {
                    innermost[i] = stack.last().copied();
                    opened[i] = Some(open(&mut blocks, &mut stack, BlockKind::Loop(header.kind), i));
                }
                LineKind::ConditionalStart => {
                    innermost[i] = stack.last().copied();
                    opened[i] = Some(open(&mut blocks, &mut stack, BlockKind::Conditional, i));
                }
                LineKind::ConditionalElse => {
                    if let Some(&top) = stack.last() {
                        if blocks[top].kind == BlockKind::Conditional && blocks[top].else_line.is_none() {
                            blocks[top].else_line = Some(i);
                        }
                    }
                    innermost[i] = stack.last().copied();
                }
                LineKind::LoopEnd(_) => {
                    close_until(&mut blocks, &mut stack, i, Block::is_loop);
                    innermost[i] = stack.last().copied();
                }
                LineKind::ConditionalEnd => {
                    if stack.last().is_some_and(|&top| blocks[top].kind == BlockKind::Conditional) {
                        close_until(&mut blocks, &mut stack, i, |b| b.kind == BlockKind::Conditional);
                    }
                    innermost[i] = stack.last().copied();
                }
                LineKind::FunctionEnd => {
                    close_until(&mut blocks, &mut stack, i, |b| b.kind == BlockKind::Function);
                    innermost[i] = stack.last().copied();
                }
                _ => innermost[i] = stack.last().copied(),
            }
        }

        Self {
            blocks,
            innermost,
            opened,
        }
    }

    pub fn block(&self, id: usize) -> &Block {
        &self.blocks[id]
    }

    /// Closed loop regions, outermost first.
    pub fn loops(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_loop() && block.closed)
    }

    pub fn innermost_block(&self, line: usize) -> Option<usize> {
        self.innermost.get(line).copied().flatten()
    }

    pub fn opened_by(&self, line: usize) -> Option<usize> {
        self.opened.get(line).copied().flatten()
    }

    /// Blocks strictly containing `line`, innermost first.
    pub fn enclosing(&self, line: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.innermost_block(line), move |&id| self.blocks[id].parent)
    }

    /// The closed loop nearest to `line`, or `None` when the line is not in
    /// a loop of its own function.
    pub fn innermost_loop(&self, line: usize) -> Option<usize> {
        self.enclosing(line)
            .take_while(|&id| self.blocks[id].kind != BlockKind::Function)
            .find(|&id| self.blocks[id].is_loop())
            .filter(|&id| self.blocks[id].closed)
    }

    /// The next closed loop outside loop `id` within the same function.
    pub fn parent_loop(&self, id: usize) -> Option<usize> {
        std::iter::successors(self.blocks[id].parent, |&p| self.blocks[p].parent)
            .take_while(|&p| self.blocks[p].kind != BlockKind::Function)
            .find(|&p| self.blocks[p].is_loop())
            .filter(|&p| self.blocks[p].closed)
    }

    /// The nearest enclosing function block.
    pub fn function_of(&self, line: usize) -> Option<usize> {
        self.enclosing(line)
            .find(|&id| self.blocks[id].kind == BlockKind::Function)
    }

    /// The statement list `line` belongs to.
    pub fn body_of(&self, line: usize) -> Body {
        match self.innermost_block(line) {
            None => Body {
                block: None,
                opening: None,
            },
            Some(id) => {
                let block = &self.blocks[id];
                let opening = match block.else_line {
                    Some(else_line) if line > else_line => else_line,
                    _ => block.start,
                };
                Body {
                    block: Some(id),
                    opening: Some(opening),
                }
            }
        }
    }

    /// Move `line` outward past the end of every block that lies inside
    /// `body`. A line that opens a block counts as inside it.
    pub fn lift_to(&self, line: usize, body: Option<usize>) -> usize {
        let mut anchor = line;
        let mut current = self.opened_by(line).or_else(|| self.innermost_block(line));
        while let Some(id) = current {
            if Some(id) == body {
                break;
            }
            anchor = self.blocks[id].end;
            current = self.blocks[id].parent;
        }
        anchor
    }
}

fn close_until<F>(blocks: &mut [Block], stack: &mut Vec<usize>, line: usize, is_target: F)
where
    F: Fn(&Block) -> bool,
{
    if !stack.iter().any(|&id| is_target(&blocks[id])) {
        return;
    }
    while let Some(id) = stack.pop() {
        blocks[id].end = line;
        let done = is_target(&blocks[id]);
        blocks[id].closed = done;
        if done {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(source: &str) -> BlockStructure {
        BlockStructure::analyze(&Program::parse(source))
    }

    const NESTED: &str = "fun int main()
 var int i, j, s;
 i = 0;
 while i < 3 do
  j = 0;
  while j < 3 do
   s = s + 1;
   j = j + 1
  endwhile;
  i = i + 1
 endwhile;
 return(0)
endfun";

    #[test]
    fn test_nested_loops() {
        let blocks = structure(NESTED);
        let loops: Vec<_> = blocks.loops().map(|(_, b)| (b.start, b.end, b.depth)).collect();
        assert_eq!(loops, vec![(3, 10, 1), (5, 8, 2)]);
        assert_eq!(blocks.innermost_loop(6), Some(2));
        assert_eq!(blocks.parent_loop(2), Some(1));
        assert_eq!(blocks.parent_loop(1), None);
        assert_eq!(blocks.innermost_loop(2), None);
        assert_eq!(blocks.function_of(6), Some(0));
    }

    #[test]
    fn test_header_and_terminator_are_outside_their_loop() {
        let blocks = structure(NESTED);
        assert_eq!(blocks.innermost_loop(5), Some(1));
        assert_eq!(blocks.innermost_loop(8), Some(1));
    }

    #[test]
    fn test_lift_to_body() {
        let blocks = structure(NESTED);
        // s = s + 1 lifted to the function body lands on the outer endwhile
        assert_eq!(blocks.lift_to(6, Some(0)), 10);
        // ...and to the outer loop body on the inner endwhile
        assert_eq!(blocks.lift_to(6, Some(1)), 8);
        // a header counts as inside the loop it opens
        assert_eq!(blocks.lift_to(5, Some(1)), 8);
        assert_eq!(blocks.lift_to(2, Some(0)), 2);
    }

    #[test]
    fn test_conditional_branches() {
        let source = "if x < 1 then\n a = 1\nelse\n a = 2\nendif";
        let blocks = structure(source);
        assert_eq!(blocks.block(0).else_line, Some(2));
        assert_eq!(blocks.body_of(1).opening, Some(0));
        assert_eq!(blocks.body_of(3).opening, Some(2));
    }

    #[test]
    fn test_unclosed_loop_is_not_a_region() {
        let blocks = structure("while x < 1 do\n x = 1");
        assert_eq!(blocks.loops().count(), 0);
        assert_eq!(blocks.innermost_loop(1), None);
    }

    #[test]
    fn test_stray_terminator_is_ignored() {
        let blocks = structure("x = 1;\nendwhile;\nwhile x < 2 do\n x = 2\nendwhile");
        let loops: Vec<_> = blocks.loops().map(|(_, b)| (b.start, b.end)).collect();
        assert_eq!(loops, vec![(2, 4)]);
    }
}

mod constant_folding;
pub use constant_folding::ConstantFoldingPass;

mod loop_optimization;
pub use loop_optimization::{HoistStats, LoopOptimizationPass};

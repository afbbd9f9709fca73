//! Property-based tests for the optimizer
//!
//! These tests use proptest to check folding and evaluation over randomly
//! generated programs and expressions.

use proptest::prelude::*;
use toyopt_core::environment::Environment;
use toyopt_core::{evaluate, fold, hoist};

// =============================================================================
// Strategies
// =============================================================================

const NAMES: &[&str] = &["a", "b", "c", "d", "x"];

fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES).prop_map(str::to_string)
}

fn operator_strategy() -> impl Strategy<Value = char> {
    prop_oneof![Just('+'), Just('-'), Just('*'), Just('/')]
}

/// Fully parenthesized literal expressions paired with their value
fn literal_expr_strategy() -> impl Strategy<Value = (String, Option<i64>)> {
    let leaf = (0i64..100).prop_map(|n| (n.to_string(), Some(n)));
    leaf.prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), operator_strategy(), inner).prop_map(|((l, lv), op, (r, rv))| {
            let value = match (lv, rv) {
                (Some(a), Some(b)) => match op {
                    '+' => a.checked_add(b),
                    '-' => a.checked_sub(b),
                    '*' => a.checked_mul(b),
                    _ => a.checked_div(b),
                },
                _ => None,
            };
            (format!("({} {} {})", l, op, r), value)
        })
    })
}

/// Right-hand sides over literals and a few variables
fn rhs_strategy() -> impl Strategy<Value = String> {
    let atom = prop_oneof![
        (0i64..50).prop_map(|n| n.to_string()),
        name_strategy(),
    ];
    prop::collection::vec((atom, operator_strategy()), 1..4).prop_map(|parts| {
        let mut rhs = String::new();
        for (i, (atom, op)) in parts.iter().enumerate() {
            if i > 0 {
                rhs.push_str(&format!(" {} ", op));
            }
            rhs.push_str(atom);
        }
        rhs
    })
}

fn straight_line_program() -> impl Strategy<Value = String> {
    prop::collection::vec((name_strategy(), rhs_strategy()), 0..12).prop_map(|lines| {
        lines
            .iter()
            .map(|(name, rhs)| format!("{} = {};", name, rhs))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// =============================================================================
// Evaluator Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn evaluate_agrees_with_reference((text, value) in literal_expr_strategy()) {
        prop_assert_eq!(evaluate(&text, &Environment::default()), value);
    }

    #[test]
    fn evaluate_never_panics(text in "[ -~]{0,40}") {
        let _ = evaluate(&text, &Environment::default());
    }
}

// =============================================================================
// Folding Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn fold_preserves_line_count(program in straight_line_program()) {
        let folded = fold(&program);
        prop_assert_eq!(folded.split('\n').count(), program.split('\n').count());
    }

    #[test]
    fn fold_is_idempotent(program in straight_line_program()) {
        let once = fold(&program);
        prop_assert_eq!(fold(&once), once);
    }

    #[test]
    fn folded_lines_are_literal_or_untouched(program in straight_line_program()) {
        let folded = fold(&program);
        for (before, after) in program.split('\n').zip(folded.split('\n')) {
            if before != after {
                let rhs = after.split('=').nth(1).unwrap().trim().trim_end_matches(';');
                prop_assert!(rhs.parse::<u64>().is_ok(), "{:?} -> {:?}", before, after);
            }
        }
    }

    #[test]
    fn hoist_leaves_loop_free_programs_alone(program in straight_line_program()) {
        prop_assert_eq!(hoist(&program), program);
    }
}

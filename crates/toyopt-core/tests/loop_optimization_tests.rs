use indoc::indoc;
use toyopt_core::config::OptimizerConfig;
use toyopt_core::hoist;
use toyopt_test_helpers::fixtures;
use toyopt_test_helpers::optimize::{optimize, optimize_with_config};

fn line_index(output: &str, needle: &str) -> usize {
    output
        .lines()
        .position(|line| line == needle)
        .unwrap_or_else(|| panic!("line {:?} not found in:\n{}", needle, output))
}

// ============================================================================
// Scalar Relocation Tests
// ============================================================================

#[test]
fn test_constant_assignment_moves_before_loop() {
    let output = optimize(fixtures::scalar_hoisting_program());
    let temp = line_index(&output, " temp = 53;");
    let header = line_index(&output, " while i < 3 do");
    assert_eq!(
        temp + 1,
        header,
        "temp = 53 should sit immediately before the loop. Got:\n{}",
        output
    );
    assert_eq!(output.matches("temp = 53").count(), 1);
}

#[test]
fn test_nested_constant_moves_to_outermost_loop() {
    let output = optimize(fixtures::nested_loop_program());
    assert_eq!(
        output,
        indoc! {"
            fun int main()
             var int i, j, k, s;
             s = 0;
             i = 0;
             k = 4;
             while i < 3 do
              j = 0;
              while j < 3 do
               s = s + k;
               j = j + 1
              endwhile;
              i = i + 1
             endwhile;
             print(s);
             return(0)
            endfun"}
    );
}

#[test]
fn test_conditional_assignment_stays() {
    let source = fixtures::conditional_program();
    assert_eq!(optimize(source), source);
}

#[test]
fn test_target_read_earlier_in_loop_stays() {
    let source = indoc! {"
        i = 0;
        while i < 3 do
         print(k);
         k = 4;
         i = i + 1
        endwhile"};
    assert_eq!(hoist(source), source);
}

#[test]
fn test_target_written_before_loop_stays() {
    // the loop may not run, so k must still be 1 at print(k)
    let source = indoc! {"
        fun int main()
         var int i, k;
         k = 1;
         i = 5;
         while i < 3 do
          k = 4;
          i = i + 1
         endwhile;
         print(k);
         return(0)
        endfun"};
    assert_eq!(optimize(source), source);
}

#[test]
fn test_target_read_in_header_stays() {
    let source = "while k < 3 do\n k = 4;\n print(k)\nendwhile";
    assert_eq!(hoist(source), source);
}

#[test]
fn test_target_declared_in_loop_stays() {
    let source = "while i < 3 do\n var int k;\n k = 4;\n i = i + 1\nendwhile";
    assert_eq!(hoist(source), source);
}

#[test]
fn test_reassigned_dependency_blocks_hoisting() {
    let source = indoc! {"
        n = 4;
        while i < 3 do
         k = n * 2;
         n = 4;
         i = i + 1
        endwhile"};
    assert_eq!(hoist(source), source);
}

#[test]
fn test_last_statement_of_body_stays() {
    let source = "while i < 3 do\n i = i + 1;\n k = 4\nendwhile";
    assert_eq!(hoist(source), source);
}

// ============================================================================
// Array Index Hoisting Tests
// ============================================================================

#[test]
fn test_index_scenario() {
    let output = optimize(fixtures::index_hoisting_program());
    assert_eq!(
        output,
        indoc! {"
            fun int main()
             var int x, y, z, a;
             var int t;
             x = 2;
             y = 3;
             z = 2;
             t = y*z;
             a = 17;
             while x < 7 do
              a[t] = 1;
              x = x + 1
             endwhile;
             return(0)
            endfun"}
    );
}

#[test]
fn test_declaration_follows_last_var_line() {
    let output = optimize(fixtures::index_hoisting_program());
    let last_var = line_index(&output, " var int x, y, z, a;");
    let decl = line_index(&output, " var int t;");
    assert_eq!(decl, last_var + 1);
}

#[test]
fn test_temporary_follows_last_dependency_assignment() {
    let output = optimize(fixtures::index_hoisting_program());
    let z = line_index(&output, " z = 2;");
    let y = line_index(&output, " y = 3;");
    let temp = line_index(&output, " t = y*z;");
    assert!(temp > y && temp > z, "Got:\n{}", output);
    assert_eq!(temp, z + 1);
}

#[test]
fn test_identical_index_shares_one_temporary() {
    let output = optimize(fixtures::repeated_index_program());
    assert_eq!(
        output,
        indoc! {"
            fun int main()
             var int i, y, z;
             var int t;
             var int t1;
             y = 3;
             z = 2;
             t = y*z;
             t1 = z*y;
             i = 0;
             while i < 4 do
              a[t] = a[t] + i;
              b[t1] = 0;
              i = i + 1
             endwhile;
             return(0)
            endfun"}
    );
    assert_eq!(output.matches("var int t;").count(), 1);
}

#[test]
fn test_temporary_name_avoids_existing_names() {
    let source = indoc! {"
        var int t, x;
        t = 1;
        y = 3;
        z = 2;
        while x < 7 do
         a[y*z] = t
        endwhile"};
    assert_eq!(
        hoist(source),
        indoc! {"
            var int t, x;
            var int t1;
            t = 1;
            y = 3;
            z = 2;
            t1 = y*z;
            while x < 7 do
             a[t1] = t
            endwhile"}
    );
}

#[test]
fn test_index_without_declarations_or_function() {
    assert_eq!(
        hoist(fixtures::bare_program()),
        indoc! {"
            var int t;
            y = 3;
            z = 2;
            t = y*z;
            while x < 7 do
             a[t] = 1
            endwhile"}
    );
}

#[test]
fn test_index_depending_on_outer_loop_stays_in_outer_body() {
    let source = indoc! {"
        fun int main()
         var int i, j, m;
         i = 0;
         while i < 3 do
          m = 4;
          print(m);
          j = 0;
          while j < 3 do
           a[m + 1] = j;
           j = j + 1
          endwhile;
          m = 5;
          i = i + 1
         endwhile;
         return(0)
        endfun"};
    assert_eq!(
        optimize(source),
        indoc! {"
            fun int main()
             var int i, j, m;
             var int t;
             i = 0;
             while i < 3 do
              m = 4;
              t = m + 1;
              print(m);
              j = 0;
              while j < 3 do
               a[t] = j;
               j = j + 1
              endwhile;
              m = 5;
              i = i + 1
             endwhile;
             return(0)
            endfun"}
    );
}

#[test]
fn test_index_under_conditional_stays() {
    let source = indoc! {"
        z = 0;
        i = 0;
        while i < 3 do
         if z < 1 then
          print(i)
         else
          a[10 / z] = 1
         endif;
         i = i + 1
        endwhile;
        z = 2"};
    let output = optimize(source);
    assert!(!output.contains("t = 10 / z;"), "Got:\n{}", output);
    assert_eq!(output, source);
}

#[test]
fn test_index_in_loop_inside_conditional_is_hoisted() {
    let source = indoc! {"
        y = 3;
        z = 2;
        if y < 5 then
         while x < 7 do
          a[y*z] = 1
         endwhile
        endif"};
    let output = hoist(source);
    assert!(output.contains("\n t = y*z;\n while x < 7 do"), "Got:\n{}", output);
    assert!(output.contains("  a[t] = 1"));
}

#[test]
fn test_induction_variable_index_stays() {
    let source = fixtures::for_loop_program();
    assert_eq!(optimize(source), source);
}

#[test]
fn test_non_constant_index_stays() {
    let source = "while x < 7 do\n a[y*w] = 1\nendwhile";
    assert_eq!(hoist(source), source);
}

#[test]
fn test_simple_index_stays() {
    let source = "y = 2;\nwhile x < 7 do\n a[y] = a[3]\nendwhile";
    assert_eq!(hoist(source), source);
}

#[test]
fn test_unmatched_bracket_is_untouched() {
    let source = "y = 3;\nz = 2;\nwhile x < 2 do\n a[y*z = 1;\n x = x + 1\nendwhile";
    assert_eq!(hoist(source), source);
}

#[test]
fn test_index_outside_loop_stays() {
    let source = "y = 3;\nz = 2;\na[y*z] = 1";
    assert_eq!(hoist(source), source);
}

// ============================================================================
// Configuration and Stability
// ============================================================================

#[test]
fn test_hoisting_is_idempotent() {
    for source in [
        fixtures::scalar_hoisting_program(),
        fixtures::index_hoisting_program(),
        fixtures::repeated_index_program(),
        fixtures::nested_loop_program(),
    ] {
        let once = hoist(source);
        assert_eq!(hoist(&once), once, "second run changed:\n{}", once);
    }
}

#[test]
fn test_rerun_folds_temporary_assignment() {
    let once = optimize(fixtures::index_hoisting_program());
    let twice = optimize(&once);
    assert!(twice.contains(" t = 6;"), "Got:\n{}", twice);
    assert!(twice.contains("  a[t] = 1;"));
    assert_eq!(optimize(&twice), twice);
}

#[test]
fn test_disable_index_hoisting() {
    let config = OptimizerConfig {
        hoist_array_indices: false,
        ..Default::default()
    };
    let outcome = optimize_with_config(fixtures::index_hoisting_program(), config);
    assert_eq!(outcome.hoisted, outcome.folded);
    assert_eq!(outcome.stats.temporaries_declared, 0);
}

#[test]
fn test_disable_scalar_hoisting() {
    let config = OptimizerConfig {
        hoist_scalars: false,
        ..Default::default()
    };
    let outcome = optimize_with_config(fixtures::scalar_hoisting_program(), config);
    assert_eq!(outcome.hoisted, outcome.folded);
    assert_eq!(outcome.stats.scalars_hoisted, 0);
}

#[test]
fn test_custom_temp_prefix() {
    let config = OptimizerConfig {
        temp_prefix: "idx".to_string(),
        ..Default::default()
    };
    let outcome = optimize_with_config(fixtures::index_hoisting_program(), config);
    assert!(
        outcome.hoisted.contains(" var int idx;") && outcome.hoisted.contains("  a[idx] = 1;"),
        "Got:\n{}",
        outcome.hoisted
    );
}

#[test]
fn test_hoist_stats() {
    let outcome = optimize_with_config(fixtures::repeated_index_program(), OptimizerConfig::default());
    assert_eq!(outcome.stats.temporaries_declared, 2);
    assert_eq!(outcome.stats.index_expressions_hoisted, 3);
    assert_eq!(outcome.stats.scalars_hoisted, 0);

    let outcome = optimize_with_config(fixtures::scalar_hoisting_program(), OptimizerConfig::default());
    assert_eq!(outcome.stats.scalars_hoisted, 1);
}

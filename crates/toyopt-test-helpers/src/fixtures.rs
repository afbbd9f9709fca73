//! Test fixtures - toy-language programs for testing

/// Constant assignment inside a loop body; folds to `temp = 53` and is
/// relocated in front of the loop.
pub fn scalar_hoisting_program() -> &'static str {
    "fun int main()
 var int x, y, z, sum, i, temp;
 x = 10;
 y = 5;
 z = 3;
 sum = 0;
 i = 0;
 while i < 3 do
  temp = x * y + z;
  sum = sum + temp;
  i = i + 1
 endwhile;
 print(sum);
 return(0)
endfun"
}

/// Constant array index inside a loop body.
pub fn index_hoisting_program() -> &'static str {
    "fun int main()
 var int x, y, z, a;
 x = 2;
 y = 3;
 z = 2;
 a = 5 * 3 + 2;
 while x < 7 do
  a[y*z] = 1;
  x = x + 1
 endwhile;
 return(0)
endfun"
}

/// The same index expression written twice, plus a different one.
pub fn repeated_index_program() -> &'static str {
    "fun int main()
 var int i, y, z;
 y = 3;
 z = 2;
 i = 0;
 while i < 4 do
  a[y*z] = a[y * z] + i;
  b[z*y] = 0;
  i = i + 1
 endwhile;
 return(0)
endfun"
}

/// A constant assignment two loops deep.
pub fn nested_loop_program() -> &'static str {
    "fun int main()
 var int i, j, k, s;
 s = 0;
 i = 0;
 while i < 3 do
  j = 0;
  while j < 3 do
   k = 4;
   s = s + k;
   j = j + 1
  endwhile;
  i = i + 1
 endwhile;
 print(s);
 return(0)
endfun"
}

/// A constant assignment guarded by a conditional inside a loop.
pub fn conditional_program() -> &'static str {
    "fun int main()
 var int i, k;
 i = 0;
 while i < 3 do
  if i < 1 then
   k = 7;
   print(k)
  endif;
  i = i + 1
 endwhile;
 return(0)
endfun"
}

/// An index depending on the induction variable of a `for` loop.
pub fn for_loop_program() -> &'static str {
    "fun int main()
 var int i, n;
 n = 5;
 for i = 1, n do
  a[i * 2] = n
 endfor;
 return(0)
endfun"
}

/// Dependent constants that need several folding rounds.
pub fn constant_chain_program() -> &'static str {
    "fun int main()
 var int a, b, c, d;
 a = 2;
 b = a * 3;
 c = b + a;
 d = c * c - b;
 print(d);
 return(0)
endfun"
}

/// A statement program without function or declarations.
pub fn bare_program() -> &'static str {
    "y = 3;
z = 2;
while x < 7 do
 a[y*z] = 1
endwhile"
}

/// Generated program with `loops` sequential loops, used by benchmarks.
pub fn generated_program(loops: usize) -> String {
    let mut source = String::from("fun int main()\n var int i, s, c, w;\n s = 0;\n c = 4 * 2;\n w = c + 1;\n");
    for n in 0..loops {
        source.push_str(" i = 0;\n");
        source.push_str(&format!(" while i < {} do\n", n + 2));
        source.push_str(&format!("  k{} = c * {} + w;\n", n, n));
        source.push_str(&format!("  a[c*w] = a[w + {}] + k{};\n", n, n));
        source.push_str("  s = s + i;\n");
        source.push_str("  i = i + 1\n");
        source.push_str(" endwhile;\n");
    }
    source.push_str(" print(s);\n return(0)\nendfun");
    source
}

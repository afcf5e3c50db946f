//! End-to-end scenario 3 from SPEC_FULL.md §8: primes via trial division.

mod common;

use common::{assemble_everywhere, assert_section_order, mangled};
use ncc::codegen::Arch;

const SOURCE: &str = r#"
int is_prime(int n) {
    if (n < 2) return 0;
    for (int i = 2; i * i <= n; i = i + 1) {
        if (n % i == 0) return 0;
    }
    return 1;
}

int main() {
    int count = 0;
    for (int n = 1; n < 50; n = n + 1) {
        if (is_prime(n)) {
            printf("%d ", n);
            count = count + 1;
        }
    }
    printf("\ncount = %d\n", count);
    return 0;
}
"#;

#[test]
fn modulo_uses_the_documented_instruction_pairing() {
    for ((arch, os), asm) in assemble_everywhere(SOURCE) {
        let marker = match arch {
            Arch::Aarch64 => "sdiv w2, w1, w0\n    msub w0, w2, w0, w1",
            Arch::X86_64 => "cltd\n    idivl %ecx\n    movl %edx, %eax",
        };
        assert!(asm.contains(marker), "expected modulo pairing for {:?}/{:?}, got:\n{}", arch, os, asm);
    }
}

#[test]
fn two_distinct_format_strings_are_interned_in_encounter_order() {
    for ((_arch, os), asm) in assemble_everywhere(SOURCE) {
        assert!(asm.contains("%d "), "missing the per-prime format string");
        assert!(asm.contains("\\ncount = %d\\n"), "missing the summary format string");
        assert!(asm.contains(&format!("{}:", mangled(os, "str0"))));
        assert!(asm.contains(&format!("{}:", mangled(os, "str1"))));
        assert!(!asm.contains(&format!("{}:", mangled(os, "str2"))));
        assert_section_order(&asm, os);
    }
}

#[test]
fn nested_for_and_if_share_one_monotonic_label_counter_per_function() {
    for ((_arch, _os), asm) in assemble_everywhere(SOURCE) {
        // is_prime alone has an `if`, a `for`, and a nested `if`: at least
        // three distinct forward-jump targets from its own counter.
        assert!(asm.contains("L0:"));
        assert!(asm.contains("L1:"));
        assert!(asm.contains("L2:"));
    }
}

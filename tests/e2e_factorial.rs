//! End-to-end scenario 1 from SPEC_FULL.md §8: factorial.

mod common;

use common::{assemble_everywhere, assert_section_order, epilogue_marker, mangled};
use ncc::codegen::Arch;

const SOURCE: &str = r#"
int factorial(int n) {
    if (n <= 1) return 1;
    return n * factorial(n - 1);
}

int main() {
    for (int i = 0; i < 11; i = i + 1) {
        printf("%d! = %d\n", i, factorial(i));
    }
    return 0;
}
"#;

#[test]
fn emits_both_functions_with_correct_section_order_and_epilogues() {
    for ((arch, os), asm) in assemble_everywhere(SOURCE) {
        assert_section_order(&asm, os);
        assert!(asm.contains(&format!("{}:", mangled(os, "factorial"))), "missing factorial label");
        assert!(asm.contains(&format!("{}:", mangled(os, "main"))), "missing main label");
        // main's loop body calls factorial and returns 0: both functions'
        // reachable paths hit at least one epilogue sequence.
        let marker = epilogue_marker(arch);
        assert!(asm.matches(marker).count() >= 2, "expected an epilogue per function, got:\n{}", asm);
    }
}

#[test]
fn embeds_the_printf_format_string_once() {
    for ((_arch, os), asm) in assemble_everywhere(SOURCE) {
        assert!(asm.contains("%d! = %d\\n"), "format string not found verbatim in:\n{}", asm);
        // A single string literal in the source means a single `str0` label.
        assert!(asm.contains(&format!("{}:", mangled(os, "str0"))));
        assert!(!asm.contains(&format!("{}:", mangled(os, "str1"))));
    }
}

#[test]
fn factorial_recurses_via_a_direct_call_to_itself() {
    for ((arch, os), asm) in assemble_everywhere(SOURCE) {
        let call_marker = match arch {
            Arch::Aarch64 => format!("bl {}", mangled(os, "factorial")),
            Arch::X86_64 => format!("callq {}", mangled(os, "factorial")),
        };
        assert!(asm.contains(&call_marker), "expected recursive call instruction, got:\n{}", asm);
    }
}

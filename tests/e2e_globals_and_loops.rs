//! End-to-end scenario 5 from SPEC_FULL.md §8: globals visible from any
//! function, plus a simple accumulation loop.

mod common;

use common::{assemble_everywhere, assert_section_order, mangled};
use ncc::codegen::{Arch, Os};

const SOURCE: &str = r#"
int global_var = 42;

int sum_to_n(int n) {
    int sum = 0;
    for (int i = 1; i <= n; i = i + 1) {
        sum = sum + i;
    }
    return sum;
}

int main() {
    printf("global_var = %d\n", global_var);
    printf("sum_to_n(10) = %d\n", sum_to_n(10));
    return 0;
}
"#;

#[test]
fn global_is_emitted_in_the_data_section_with_its_literal_initializer() {
    for ((_arch, os), asm) in assemble_everywhere(SOURCE) {
        let label = mangled(os, "global_var");
        let expected = format!("{}:\n    .long 42", label);
        assert!(asm.contains(&expected), "expected global_var initialized to 42, got:\n{}", asm);
        assert_section_order(&asm, os);
    }
}

#[test]
fn global_is_addressed_pc_relative_from_both_functions() {
    for ((arch, os), asm) in assemble_everywhere(SOURCE) {
        let label = mangled(os, "global_var");
        match (arch, os) {
            (Arch::Aarch64, Os::MacOs) => assert!(asm.contains(&format!("{}@PAGE", label))),
            (Arch::Aarch64, Os::Linux) => assert!(asm.contains(&format!(":lo12:{}", label))),
            (Arch::X86_64, _) => assert!(asm.contains(&format!("{}(%rip)", label))),
        }
    }
}

#[test]
fn sum_to_n_is_called_with_the_literal_argument_ten() {
    for ((arch, _os), asm) in assemble_everywhere(SOURCE) {
        let immediate = match arch {
            Arch::Aarch64 => "mov w0, #10",
            Arch::X86_64 => "movl $10, %eax",
        };
        assert!(asm.contains(immediate), "expected literal 10 materialized, got:\n{}", asm);
    }
}

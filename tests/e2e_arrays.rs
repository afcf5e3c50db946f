//! End-to-end scenario 6 from SPEC_FULL.md §8: arrays and element layout.

mod common;

use common::{assemble_everywhere, assert_section_order, mangled};
use ncc::codegen::Arch;

const SOURCE: &str = r#"
int a[5];

int main() {
    a[0] = 10;
    a[4] = a[0] + a[0];
    printf("a[4] = %d\n", a[4]);
    return 0;
}
"#;

#[test]
fn global_array_reserves_four_bytes_per_element_zero_initialized() {
    for ((_arch, os), asm) in assemble_everywhere(SOURCE) {
        let label = mangled(os, "a");
        let expected = format!("{}:\n    .zero 20", label);
        assert!(asm.contains(&expected), "expected a 20-byte zeroed span for int a[5], got:\n{}", asm);
        assert_section_order(&asm, os);
    }
}

#[test]
fn element_access_scales_the_index_by_four() {
    for ((arch, _os), asm) in assemble_everywhere(SOURCE) {
        let scale_marker = match arch {
            Arch::Aarch64 => "lsl x2, x2, #2",
            Arch::X86_64 => "(%rcx,%rax,4)",
        };
        assert!(asm.contains(scale_marker), "expected index scaled by element size 4, got:\n{}", asm);
    }
}

#[test]
fn embeds_the_array_format_string() {
    for ((_arch, _os), asm) in assemble_everywhere(SOURCE) {
        assert!(asm.contains("a[4] = %d\\n"));
    }
}

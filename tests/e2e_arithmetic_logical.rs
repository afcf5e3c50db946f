//! End-to-end scenario 4 from SPEC_FULL.md §8: arithmetic and logical
//! operators, including short-circuit-shaped `&&`/`||` and unary `!`.

mod common;

use common::assemble_everywhere;
use ncc::codegen::Arch;

const SOURCE: &str = r#"
int main() {
    int a = 10;
    int b = 3;
    printf("a/b = %d\n", a / b);
    printf("a%%b = %d\n", a % b);
    printf("a==b = %d\n", a == b);
    printf("a!=b = %d\n", a != b);
    printf("a<b = %d\n", a < b);
    printf("a>b = %d\n", a > b);
    printf("1 && 0 = %d\n", 1 && 0);
    printf("1 || 0 = %d\n", 1 || 0);
    printf("!1 = %d\n", !1);
    return 0;
}
"#;

#[test]
fn all_nine_format_strings_are_interned() {
    for ((_arch, _os), asm) in assemble_everywhere(SOURCE) {
        for needle in ["str0:", "str1:", "str2:", "str3:", "str4:", "str5:", "str6:", "str7:", "str8:"] {
            assert!(asm.contains(needle), "missing {} in:\n{}", needle, asm);
        }
        assert!(!asm.contains("str9:"));
    }
}

#[test]
fn logical_and_normalizes_to_zero_or_one() {
    for ((arch, _os), asm) in assemble_everywhere(SOURCE) {
        // `&&`'s short-circuit path always ends by `cset`/`setne`-normalizing
        // the accumulator, or taking the explicit zero branch.
        let normalize = match arch {
            Arch::Aarch64 => "cset w0, ne",
            Arch::X86_64 => "setne %al",
        };
        assert!(asm.contains(normalize), "missing 0/1 normalization for &&/||, got:\n{}", asm);
    }
}

#[test]
fn unary_not_produces_a_boolean_result() {
    for ((arch, _os), asm) in assemble_everywhere(SOURCE) {
        let marker = match arch {
            Arch::Aarch64 => "cset w0, eq",
            Arch::X86_64 => "sete %al",
        };
        assert!(asm.contains(marker), "missing unary-not comparison, got:\n{}", asm);
    }
}

#[test]
fn division_and_modulo_both_appear() {
    for ((arch, _os), asm) in assemble_everywhere(SOURCE) {
        let (div_marker, mod_marker) = match arch {
            Arch::Aarch64 => ("sdiv w0, w1, w0", "sdiv w2, w1, w0"),
            Arch::X86_64 => ("idivl %ecx", "idivl %ecx"),
        };
        assert!(asm.contains(div_marker));
        assert!(asm.contains(mod_marker));
    }
}

//! # AArch64 Code Generator
//!
//! Emits GNU-as-flavored AArch64 assembly directly from the AST: no
//! intermediate representation, no register allocator. Every expression
//! result lands in `w0`; anything that must survive evaluating a
//! sub-expression is spilled to the stack, 16 bytes at a time to keep `sp`
//! aligned per AAPCS64.
//!
//! The one semantic check this language has — a reference to an undefined
//! variable or array — is performed here, not in a separate pass, since a
//! symbol's existence is only resolved when codegen actually needs its
//! address.

use crate::ast::nodes::*;
use crate::compiler::error::CompileError;
use crate::compiler::symtab::SymbolKind;

use super::common::{collect_globals, render_data_section, render_string_section, section_directive, CodegenContext, Section};
use super::{Arch, Os};

pub fn generate(program: &Program, os: Os) -> Result<String, CompileError> {
    let mut ctx = CodegenContext::new(Arch::Aarch64, os);
    let globals = collect_globals(program);
    for g in &globals {
        ctx.symtab.add_global(&g.name, g.is_array, g.array_len);
    }

    let mut text = String::from(section_directive(os, Section::Text));
    for decl in &program.declarations {
        if let TopLevel::Function(f) = decl {
            text.push_str(&generate_function(&mut ctx, f)?);
        }
    }

    let mut out = text;
    out.push_str(&render_data_section(os, &globals));
    out.push_str(&render_string_section(os, &ctx.strings));
    Ok(out)
}

fn generate_function(ctx: &mut CodegenContext, f: &FunctionDecl) -> Result<String, CompileError> {
    let checkpoint = ctx.symtab.checkpoint();
    ctx.symtab.enter_function(&f.params);
    ctx.label_counter = 0;

    let mut body = String::new();
    for (i, _param) in f.params.iter().enumerate().take(8) {
        body.push_str(&format!("    str w{}, [x29, #-{}]\n", i, 8 * (i as i64 + 1)));
    }
    for stmt in &f.body {
        body.push_str(&generate_statement(ctx, stmt)?);
    }

    let frame = ctx.symtab.frame_size();
    ctx.symtab.restore(checkpoint);

    let label = ctx.mangled(&f.name);
    let mut out = String::new();
    out.push_str(&format!(".globl {}\n", label));
    out.push_str(&format!("{}:\n", label));
    out.push_str("    stp x29, x30, [sp, #-16]!\n");
    out.push_str("    mov x29, sp\n");
    out.push_str(&format!("    sub sp, sp, #{}\n", frame));
    out.push_str(&body);
    out.push_str(&epilogue());
    Ok(out)
}

fn epilogue() -> String {
    "    mov sp, x29\n    ldp x29, x30, [sp], #16\n    ret\n".to_string()
}

fn push_x0() -> String {
    "    str x0, [sp, #-16]!\n".to_string()
}

fn pop_into(reg: &str) -> String {
    format!("    ldr {}, [sp], #16\n", reg)
}

/// Materializes an integer literal into `w0`. Values up to `0xffff` take a
/// single `mov`; larger ones need a `movk` to fill in the high half-word.
fn load_immediate(n: i64) -> String {
    let value = n as u32;
    if value <= 0xffff {
        format!("    mov w0, #{}\n", value)
    } else {
        let low = value & 0xffff;
        let high = (value >> 16) & 0xffff;
        format!("    mov w0, #{}\n    movk w0, #{}, lsl #16\n", low, high)
    }
}

/// Emits the PIC two-instruction address computation for a `.data`/`.rodata`
/// symbol: page address plus page offset on macOS, `adrp` + `:lo12:` on Linux.
fn global_address(os: Os, label: &str, reg: &str) -> String {
    match os {
        Os::MacOs => format!("    adrp {reg}, {label}@PAGE\n    add {reg}, {reg}, {label}@PAGEOFF\n"),
        Os::Linux => format!("    adrp {reg}, {label}\n    add {reg}, {reg}, :lo12:{label}\n"),
    }
}

/// Computes the effective address of an l-value expression into `x1`.
fn lvalue_address(ctx: &mut CodegenContext, expr: &Expression) -> Result<String, CompileError> {
    match expr {
        Expression::Variable { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            match sym.kind {
                SymbolKind::Global => Ok(global_address(ctx.os, &ctx.mangled(name), "x1")),
                _ => Ok(format!("    sub x1, x29, #{}\n", sym.base_offset())),
            }
        }
        Expression::ArrayAccess { array, index, line, col } => {
            let sym = ctx.lookup(array, *line, *col)?;
            let mut asm = generate_expr(ctx, index)?;
            asm.push_str(&push_x0());
            match sym.kind {
                SymbolKind::Global => asm.push_str(&global_address(ctx.os, &ctx.mangled(array), "x1")),
                _ => asm.push_str(&format!("    sub x1, x29, #{}\n", sym.base_offset())),
            }
            asm.push_str(&pop_into("w2"));
            asm.push_str("    sxtw x2, w2\n    lsl x2, x2, #2\n    add x1, x1, x2\n");
            Ok(asm)
        }
        _ => unreachable!("lvalue_address called on a non-lvalue expression"),
    }
}

fn generate_statement(ctx: &mut CodegenContext, stmt: &Statement) -> Result<String, CompileError> {
    match stmt {
        Statement::VarDecl(v) => {
            if v.is_array {
                ctx.symtab.add_local(&v.name, true, v.array_size.max(1));
                Ok(String::new())
            } else {
                let offset = ctx.symtab.add_local(&v.name, false, 0);
                let mut asm = String::new();
                if let Some(init) = &v.initializer {
                    asm.push_str(&generate_expr(ctx, init)?);
                    asm.push_str(&format!("    str w0, [x29, #-{}]\n", offset));
                }
                Ok(asm)
            }
        }
        Statement::If { condition, then_branch, else_branch } => {
            let mut asm = generate_expr(ctx, condition)?;
            let else_label = ctx.next_label();
            asm.push_str("    cmp w0, #0\n");
            asm.push_str(&format!("    beq {}\n", else_label));
            asm.push_str(&generate_statement(ctx, then_branch)?);
            if let Some(else_stmt) = else_branch {
                let end_label = ctx.next_label();
                asm.push_str(&format!("    b {}\n", end_label));
                asm.push_str(&format!("{}:\n", else_label));
                asm.push_str(&generate_statement(ctx, else_stmt)?);
                asm.push_str(&format!("{}:\n", end_label));
            } else {
                asm.push_str(&format!("{}:\n", else_label));
            }
            Ok(asm)
        }
        Statement::While { condition, body } => {
            let start = ctx.next_label();
            let end = ctx.next_label();
            let mut asm = format!("{}:\n", start);
            asm.push_str(&generate_expr(ctx, condition)?);
            asm.push_str("    cmp w0, #0\n");
            asm.push_str(&format!("    beq {}\n", end));
            asm.push_str(&generate_statement(ctx, body)?);
            asm.push_str(&format!("    b {}\n", start));
            asm.push_str(&format!("{}:\n", end));
            Ok(asm)
        }
        Statement::For { init, condition, update, body } => {
            let mut asm = String::new();
            if let Some(init_stmt) = init {
                asm.push_str(&generate_statement(ctx, init_stmt)?);
            }
            let start = ctx.next_label();
            let end = ctx.next_label();
            asm.push_str(&format!("{}:\n", start));
            if let Some(cond) = condition {
                asm.push_str(&generate_expr(ctx, cond)?);
                asm.push_str("    cmp w0, #0\n");
                asm.push_str(&format!("    beq {}\n", end));
            }
            asm.push_str(&generate_statement(ctx, body)?);
            if let Some(update_expr) = update {
                asm.push_str(&generate_expr(ctx, update_expr)?);
            }
            asm.push_str(&format!("    b {}\n", start));
            asm.push_str(&format!("{}:\n", end));
            Ok(asm)
        }
        Statement::Return(value) => {
            let mut asm = String::new();
            if let Some(v) = value {
                asm.push_str(&generate_expr(ctx, v)?);
            }
            asm.push_str(&epilogue());
            Ok(asm)
        }
        Statement::Block(stmts) => {
            let mut asm = String::new();
            for s in stmts {
                asm.push_str(&generate_statement(ctx, s)?);
            }
            Ok(asm)
        }
        Statement::Expr(e) => generate_expr(ctx, e),
    }
}

fn generate_expr(ctx: &mut CodegenContext, expr: &Expression) -> Result<String, CompileError> {
    match expr {
        Expression::Number(n) => Ok(load_immediate(*n)),
        Expression::Str(s) => {
            let index = ctx.intern_string(s);
            let label = ctx.string_label(index);
            Ok(global_address(ctx.os, &label, "x0"))
        }
        Expression::Variable { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            if sym.is_array {
                let addr = lvalue_address(ctx, expr)?;
                Ok(format!("{}    mov x0, x1\n", addr))
            } else {
                match sym.kind {
                    SymbolKind::Global => {
                        let addr = global_address(ctx.os, &ctx.mangled(name), "x1");
                        Ok(format!("{}    ldr w0, [x1]\n", addr))
                    }
                    _ => Ok(format!("    ldr w0, [x29, #-{}]\n", sym.base_offset())),
                }
            }
        }
        Expression::ArrayAccess { .. } => {
            let addr = lvalue_address(ctx, expr)?;
            Ok(format!("{}    ldr w0, [x1]\n", addr))
        }
        Expression::AddressOf { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            match sym.kind {
                SymbolKind::Global => {
                    let addr = global_address(ctx.os, &ctx.mangled(name), "x1");
                    Ok(format!("{}    mov x0, x1\n", addr))
                }
                _ => Ok(format!("    sub x0, x29, #{}\n", sym.base_offset())),
            }
        }
        Expression::Unary { op, operand } => {
            let mut asm = generate_expr(ctx, operand)?;
            match op {
                UnaryOp::Neg => asm.push_str("    neg w0, w0\n"),
                UnaryOp::Not => asm.push_str("    cmp w0, #0\n    cset w0, eq\n"),
            }
            Ok(asm)
        }
        Expression::Binary { op: BinaryOp::And, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str("    cmp w0, #0\n");
            let false_label = ctx.next_label();
            let end_label = ctx.next_label();
            asm.push_str(&format!("    beq {}\n", false_label));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str("    cmp w0, #0\n    cset w0, ne\n");
            asm.push_str(&format!("    b {}\n", end_label));
            asm.push_str(&format!("{}:\n    mov w0, #0\n", false_label));
            asm.push_str(&format!("{}:\n", end_label));
            Ok(asm)
        }
        Expression::Binary { op: BinaryOp::Or, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str("    cmp w0, #0\n");
            let true_label = ctx.next_label();
            let end_label = ctx.next_label();
            asm.push_str(&format!("    bne {}\n", true_label));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str("    cmp w0, #0\n    cset w0, ne\n");
            asm.push_str(&format!("    b {}\n", end_label));
            asm.push_str(&format!("{}:\n    mov w0, #1\n", true_label));
            asm.push_str(&format!("{}:\n", end_label));
            Ok(asm)
        }
        Expression::Binary { op, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str(&push_x0());
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str(&pop_into("w1"));
            match op {
                BinaryOp::Add => asm.push_str("    add w0, w1, w0\n"),
                BinaryOp::Sub => asm.push_str("    sub w0, w1, w0\n"),
                BinaryOp::Mul => asm.push_str("    mul w0, w1, w0\n"),
                BinaryOp::Div => asm.push_str("    sdiv w0, w1, w0\n"),
                BinaryOp::Mod => asm.push_str("    sdiv w2, w1, w0\n    msub w0, w2, w0, w1\n"),
                BinaryOp::Eq => asm.push_str("    cmp w1, w0\n    cset w0, eq\n"),
                BinaryOp::Ne => asm.push_str("    cmp w1, w0\n    cset w0, ne\n"),
                BinaryOp::Lt => asm.push_str("    cmp w1, w0\n    cset w0, lt\n"),
                BinaryOp::Gt => asm.push_str("    cmp w1, w0\n    cset w0, gt\n"),
                BinaryOp::Le => asm.push_str("    cmp w1, w0\n    cset w0, le\n"),
                BinaryOp::Ge => asm.push_str("    cmp w1, w0\n    cset w0, ge\n"),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
            Ok(asm)
        }
        Expression::Assignment { target, op: AssignOp::Plain, value } => {
            let mut asm = lvalue_address(ctx, target)?;
            asm.push_str("    str x1, [sp, #-16]!\n");
            asm.push_str(&generate_expr(ctx, value)?);
            asm.push_str("    ldr x1, [sp], #16\n");
            asm.push_str("    str w0, [x1]\n");
            Ok(asm)
        }
        Expression::Assignment { target, op, value } => {
            // Compound assignment evaluates `target`'s address exactly once,
            // so a side-effecting index expression (an array subscript) is
            // never computed twice. Both the address and the old value are
            // spilled to the stack (not kept in a register) across evaluating
            // `value`, which may itself contain a call that clobbers any
            // caller-saved register.
            let mut asm = lvalue_address(ctx, target)?;
            asm.push_str("    str x1, [sp, #-16]!\n");
            asm.push_str("    ldr w2, [x1]\n");
            asm.push_str("    str x2, [sp, #-16]!\n");
            asm.push_str(&generate_expr(ctx, value)?);
            asm.push_str("    ldr x2, [sp], #16\n");
            asm.push_str("    ldr x1, [sp], #16\n");
            match op {
                AssignOp::Plus => asm.push_str("    add w0, w2, w0\n"),
                AssignOp::Minus => asm.push_str("    sub w0, w2, w0\n"),
                AssignOp::Plain => unreachable!("handled above"),
            }
            asm.push_str("    str w0, [x1]\n");
            Ok(asm)
        }
        Expression::Call { callee, args } => {
            let mut asm = String::new();
            for arg in args {
                asm.push_str(&generate_expr(ctx, arg)?);
                asm.push_str(&push_x0());
            }
            for i in (0..args.len()).rev() {
                asm.push_str(&pop_into(&format!("w{}", i)));
            }
            asm.push_str(&format!("    bl {}\n", ctx.mangled(callee)));
            Ok(asm)
        }
    }
}

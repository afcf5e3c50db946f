//! # x86-64 Code Generator
//!
//! Emits AT&T-syntax, SysV-ABI assembly text. Structurally this mirrors
//! [`super::aarch64`] (accumulator-plus-spill evaluation, the same
//! frame-pointer-relative local/parameter layout, the same undefined-symbol
//! check folded into address computation) but every instruction sequence is
//! x86-64's own: `%eax`/`%rax` as the accumulator, `cltd`+`idivl` for
//! division, and the explicit `%rbx`-saving stack-alignment dance required
//! before any `call` that might reach a variadic C-library function.

use crate::ast::nodes::*;
use crate::compiler::error::CompileError;
use crate::compiler::symtab::SymbolKind;

use super::common::{collect_globals, render_data_section, render_string_section, section_directive, CodegenContext, Section};
use super::{Arch, Os};

const ARG_REGS_32: [&str; 6] = ["edi", "esi", "edx", "ecx", "r8d", "r9d"];
const ARG_REGS_64: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

pub fn generate(program: &Program, os: Os) -> Result<String, CompileError> {
    let mut ctx = CodegenContext::new(Arch::X86_64, os);
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
    for (i, _param) in f.params.iter().enumerate().take(6) {
        let offset = 8 * (i as i64 + 1);
        body.push_str(&format!("    movl %{}, -{}(%rbp)\n", ARG_REGS_32[i], offset));
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
    out.push_str("    pushq %rbp\n");
    out.push_str("    movq %rsp, %rbp\n");
    out.push_str(&format!("    subq ${}, %rsp\n", frame));
    out.push_str(&body);
    out.push_str(&epilogue());
    Ok(out)
}

fn epilogue() -> String {
    "    movq %rbp, %rsp\n    popq %rbp\n    ret\n".to_string()
}

fn push_reg(reg: &str) -> String {
    format!("    pushq %{}\n", reg)
}

fn pop_reg(reg: &str) -> String {
    format!("    popq %{}\n", reg)
}

/// The full call-site alignment sequence: save `%rbx`, snapshot `%rsp` into
/// it, mask the live `%rsp` down to a 16-byte boundary, zero `%eax` (the
/// vararg-count register `printf` and friends read), call, then restore
/// `%rsp` from the saved snapshot and restore `%rbx` itself.
fn call_sequence(label: &str) -> String {
    format!(
        "    pushq %rbx\n    movq %rsp, %rbx\n    andq $-16, %rsp\n    xorl %eax, %eax\n    callq {}\n    movq %rbx, %rsp\n    popq %rbx\n",
        label
    )
}

fn global_ref(label: &str) -> String {
    format!("{}(%rip)", label)
}

/// Computes the effective address of an l-value expression into `%rcx`.
fn lvalue_address(ctx: &mut CodegenContext, expr: &Expression) -> Result<String, CompileError> {
    match expr {
        Expression::Variable { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            match sym.kind {
                SymbolKind::Global => Ok(format!("    leaq {}, %rcx\n", global_ref(&ctx.mangled(name)))),
                _ => Ok(format!("    leaq -{}(%rbp), %rcx\n", sym.base_offset())),
            }
        }
        Expression::ArrayAccess { array, index, line, col } => {
            let sym = ctx.lookup(array, *line, *col)?;
            let mut asm = generate_expr(ctx, index)?;
            asm.push_str(&push_reg("rax"));
            match sym.kind {
                SymbolKind::Global => asm.push_str(&format!("    leaq {}, %rcx\n", global_ref(&ctx.mangled(array)))),
                _ => asm.push_str(&format!("    leaq -{}(%rbp), %rcx\n", sym.base_offset())),
            }
            asm.push_str(&pop_reg("rax"));
            asm.push_str("    movslq %eax, %rax\n    leaq (%rcx,%rax,4), %rcx\n");
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
                    asm.push_str(&format!("    movl %eax, -{}(%rbp)\n", offset));
                }
                Ok(asm)
            }
        }
        Statement::If { condition, then_branch, else_branch } => {
            let mut asm = generate_expr(ctx, condition)?;
            let else_label = ctx.next_label();
            asm.push_str("    cmpl $0, %eax\n");
            asm.push_str(&format!("    je {}\n", else_label));
            asm.push_str(&generate_statement(ctx, then_branch)?);
            if let Some(else_stmt) = else_branch {
                let end_label = ctx.next_label();
                asm.push_str(&format!("    jmp {}\n", end_label));
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
            asm.push_str("    cmpl $0, %eax\n");
            asm.push_str(&format!("    je {}\n", end));
            asm.push_str(&generate_statement(ctx, body)?);
            asm.push_str(&format!("    jmp {}\n", start));
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
                asm.push_str("    cmpl $0, %eax\n");
                asm.push_str(&format!("    je {}\n", end));
            }
            asm.push_str(&generate_statement(ctx, body)?);
            if let Some(update_expr) = update {
                asm.push_str(&generate_expr(ctx, update_expr)?);
            }
            asm.push_str(&format!("    jmp {}\n", start));
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
        Expression::Number(n) => Ok(format!("    movl ${}, %eax\n", *n as u32)),
        Expression::Str(s) => {
            let index = ctx.intern_string(s);
            let label = ctx.string_label(index);
            Ok(format!("    leaq {}, %rax\n", global_ref(&label)))
        }
        Expression::Variable { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            if sym.is_array {
                let addr = lvalue_address(ctx, expr)?;
                Ok(format!("{}    movq %rcx, %rax\n", addr))
            } else {
                match sym.kind {
                    SymbolKind::Global => Ok(format!("    movl {}, %eax\n", global_ref(&ctx.mangled(name)))),
                    _ => Ok(format!("    movl -{}(%rbp), %eax\n", sym.base_offset())),
                }
            }
        }
        Expression::ArrayAccess { .. } => {
            let addr = lvalue_address(ctx, expr)?;
            Ok(format!("{}    movl (%rcx), %eax\n", addr))
        }
        Expression::AddressOf { name, line, col } => {
            let sym = ctx.lookup(name, *line, *col)?;
            match sym.kind {
                SymbolKind::Global => Ok(format!("    leaq {}, %rax\n", global_ref(&ctx.mangled(name)))),
                _ => Ok(format!("    leaq -{}(%rbp), %rax\n", sym.base_offset())),
            }
        }
        Expression::Unary { op, operand } => {
            let mut asm = generate_expr(ctx, operand)?;
            match op {
                UnaryOp::Neg => asm.push_str("    negl %eax\n"),
                UnaryOp::Not => asm.push_str("    cmpl $0, %eax\n    sete %al\n    movzbl %al, %eax\n"),
            }
            Ok(asm)
        }
        Expression::Binary { op: BinaryOp::And, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str("    cmpl $0, %eax\n");
            let false_label = ctx.next_label();
            let end_label = ctx.next_label();
            asm.push_str(&format!("    je {}\n", false_label));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str("    cmpl $0, %eax\n    setne %al\n    movzbl %al, %eax\n");
            asm.push_str(&format!("    jmp {}\n", end_label));
            asm.push_str(&format!("{}:\n    movl $0, %eax\n", false_label));
            asm.push_str(&format!("{}:\n", end_label));
            Ok(asm)
        }
        Expression::Binary { op: BinaryOp::Or, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str("    cmpl $0, %eax\n");
            let true_label = ctx.next_label();
            let end_label = ctx.next_label();
            asm.push_str(&format!("    jne {}\n", true_label));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str("    cmpl $0, %eax\n    setne %al\n    movzbl %al, %eax\n");
            asm.push_str(&format!("    jmp {}\n", end_label));
            asm.push_str(&format!("{}:\n    movl $1, %eax\n", true_label));
            asm.push_str(&format!("{}:\n", end_label));
            Ok(asm)
        }
        Expression::Binary { op: op @ (BinaryOp::Div | BinaryOp::Mod), left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str(&push_reg("rax"));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str("    movl %eax, %ecx\n");
            asm.push_str(&pop_reg("rax"));
            asm.push_str("    cltd\n    idivl %ecx\n");
            if matches!(op, BinaryOp::Mod) {
                asm.push_str("    movl %edx, %eax\n");
            }
            Ok(asm)
        }
        Expression::Binary { op, left, right } => {
            let mut asm = generate_expr(ctx, left)?;
            asm.push_str(&push_reg("rax"));
            asm.push_str(&generate_expr(ctx, right)?);
            asm.push_str(&pop_reg("rcx")); // %ecx = left, %eax = right
            match op {
                BinaryOp::Add => asm.push_str("    addl %ecx, %eax\n"),
                BinaryOp::Mul => asm.push_str("    imull %ecx, %eax\n"),
                BinaryOp::Sub => asm.push_str("    subl %eax, %ecx\n    movl %ecx, %eax\n"),
                BinaryOp::Eq => asm.push_str("    cmpl %eax, %ecx\n    sete %al\n    movzbl %al, %eax\n"),
                BinaryOp::Ne => asm.push_str("    cmpl %eax, %ecx\n    setne %al\n    movzbl %al, %eax\n"),
                BinaryOp::Lt => asm.push_str("    cmpl %eax, %ecx\n    setl %al\n    movzbl %al, %eax\n"),
                BinaryOp::Gt => asm.push_str("    cmpl %eax, %ecx\n    setg %al\n    movzbl %al, %eax\n"),
                BinaryOp::Le => asm.push_str("    cmpl %eax, %ecx\n    setle %al\n    movzbl %al, %eax\n"),
                BinaryOp::Ge => asm.push_str("    cmpl %eax, %ecx\n    setge %al\n    movzbl %al, %eax\n"),
                BinaryOp::Div | BinaryOp::Mod | BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
            Ok(asm)
        }
        Expression::Assignment { target, op: AssignOp::Plain, value } => {
            let mut asm = lvalue_address(ctx, target)?;
            asm.push_str(&push_reg("rcx"));
            asm.push_str(&generate_expr(ctx, value)?);
            asm.push_str(&pop_reg("rcx"));
            asm.push_str("    movl %eax, (%rcx)\n");
            Ok(asm)
        }
        Expression::Assignment { target, op, value } => {
            // Compound assignment computes `target`'s address exactly once,
            // so a side-effecting array index is never evaluated twice. Both
            // the address and the old value are spilled to the stack (not
            // kept in a bare scratch register) across evaluating `value`,
            // which may itself contain a nested compound assignment or a
            // call that would otherwise clobber it.
            let mut asm = lvalue_address(ctx, target)?;
            asm.push_str(&push_reg("rcx"));
            asm.push_str("    movl (%rcx), %edx\n");
            asm.push_str(&push_reg("rdx"));
            asm.push_str(&generate_expr(ctx, value)?);
            asm.push_str(&pop_reg("rdx"));
            asm.push_str(&pop_reg("rcx"));
            match op {
                AssignOp::Plus => asm.push_str("    addl %edx, %eax\n"),
                AssignOp::Minus => asm.push_str("    subl %eax, %edx\n    movl %edx, %eax\n"),
                AssignOp::Plain => unreachable!("handled above"),
            }
            asm.push_str("    movl %eax, (%rcx)\n");
            Ok(asm)
        }
        Expression::Call { callee, args } => {
            let mut asm = String::new();
            for arg in args {
                asm.push_str(&generate_expr(ctx, arg)?);
                asm.push_str(&push_reg("rax"));
            }
            for i in (0..args.len().min(6)).rev() {
                asm.push_str(&pop_reg(ARG_REGS_64[i]));
            }
            asm.push_str(&call_sequence(&ctx.mangled(callee)));
            Ok(asm)
        }
    }
}

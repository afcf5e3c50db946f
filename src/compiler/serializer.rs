//! # AST Serializer
//!
//! A pure function of the AST: emits the §4.8/§11 nested-object-per-node
//! JSON form, with the original's exact tag spellings (`NumLiteral`,
//! `FunctionCall`, `IfStatement`, `WhileLoop`, `ForLoop`, `ReturnStatement`,
//! …) and field names (`left`/`right` on `Assignment`, not `target`/`value`).
//! Built directly on `serde_json::Value` rather than `#[derive(Serialize)]`
//! on the AST types themselves, because the wire field names (`then`, `else`,
//! `isArray`, `arraySize`, operator spellings instead of variant names) differ
//! from the Rust field names enough that a derive would fight the schema more
//! than it would save.

use serde_json::{Value, json};

use crate::ast::nodes::*;

/// A `Program` node carries two separate child arrays, `globals` and
/// `functions`, rather than one interleaved `declarations` list — matching
/// both §3's "program (global-declaration list, function list)" and
/// `AST_PROGRAM` in the original.
pub fn program_to_json(program: &Program) -> Value {
    let mut globals = Vec::new();
    let mut functions = Vec::new();
    for decl in &program.declarations {
        match decl {
            TopLevel::Variable(v) => globals.push(var_decl_to_json(v)),
            TopLevel::Function(f) => functions.push(function_decl_to_json(f)),
        }
    }
    json!({
        "type": "Program",
        "globals": globals,
        "functions": functions,
    })
}

/// Renders a [`Program`] as a pretty-printed JSON string, two spaces per
/// indent level, matching §4.8 exactly (this is what `serde_json::to_string_pretty`
/// already does).
pub fn to_pretty_string(program: &Program) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&program_to_json(program))
}

fn function_decl_to_json(f: &FunctionDecl) -> Value {
    json!({
        "type": "FunctionDecl",
        "name": f.name,
        "returnType": if f.is_void { "void" } else { "int" },
        "parameters": f.params,
        "body": {
            "type": "Block",
            "statements": f.body.iter().map(statement_to_json).collect::<Vec<_>>(),
        },
    })
}

fn var_decl_to_json(v: &VarDecl) -> Value {
    json!({
        "type": "VarDecl",
        "name": v.name,
        "isArray": v.is_array,
        "arraySize": v.array_size,
        "initializer": v.initializer.as_ref().map(expression_to_json),
    })
}

fn statement_to_json(stmt: &Statement) -> Value {
    match stmt {
        Statement::VarDecl(v) => var_decl_to_json(v),
        Statement::If { condition, then_branch, else_branch } => json!({
            "type": "IfStatement",
            "condition": expression_to_json(condition),
            "then": statement_to_json(then_branch),
            "else": else_branch.as_ref().map(|b| statement_to_json(b)),
        }),
        Statement::While { condition, body } => json!({
            "type": "WhileLoop",
            "condition": expression_to_json(condition),
            "body": statement_to_json(body),
        }),
        Statement::For { init, condition, update, body } => json!({
            "type": "ForLoop",
            "init": init.as_ref().map(|b| statement_to_json(b)),
            "condition": condition.as_ref().map(expression_to_json),
            "update": update.as_ref().map(expression_to_json),
            "body": statement_to_json(body),
        }),
        Statement::Return(value) => json!({
            "type": "ReturnStatement",
            "value": value.as_ref().map(expression_to_json),
        }),
        Statement::Block(statements) => json!({
            "type": "Block",
            "statements": statements.iter().map(statement_to_json).collect::<Vec<_>>(),
        }),
        // An expression used as a statement has no wrapper node of its own:
        // it serializes as the bare expression, matching the original (which
        // has no `ExpressionStatement` variant).
        Statement::Expr(expr) => expression_to_json(expr),
    }
}

fn expression_to_json(expr: &Expression) -> Value {
    match expr {
        Expression::Number(n) => json!({"type": "NumLiteral", "value": n}),
        Expression::Str(s) => json!({"type": "StringLiteral", "value": s}),
        Expression::Variable { name, .. } => json!({"type": "Variable", "name": name}),
        Expression::ArrayAccess { array, index, .. } => json!({
            "type": "ArrayAccess",
            "name": array,
            "index": expression_to_json(index),
        }),
        Expression::AddressOf { name, .. } => json!({"type": "AddressOf", "name": name}),
        Expression::Unary { op, operand } => json!({
            "type": "UnaryOp",
            "operator": op.spelling(),
            "operand": expression_to_json(operand),
        }),
        Expression::Binary { op, left, right } => json!({
            "type": "BinaryOp",
            "operator": op.spelling(),
            "left": expression_to_json(left),
            "right": expression_to_json(right),
        }),
        Expression::Assignment { target, op, value } => json!({
            "type": "Assignment",
            "operator": op.spelling(),
            "left": expression_to_json(target),
            "right": expression_to_json(value),
        }),
        Expression::Call { callee, args } => json!({
            "type": "FunctionCall",
            "name": callee,
            "arguments": args.iter().map(expression_to_json).collect::<Vec<_>>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{lexer, parser};

    #[test]
    fn empty_child_arrays_serialize_as_empty_not_null() {
        let program = parser::parse(lexer::tokenize("int f() { return; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        let params = &json["functions"][0]["parameters"];
        assert!(params.is_array());
        assert_eq!(params.as_array().unwrap().len(), 0);
    }

    #[test]
    fn missing_optional_children_serialize_as_null() {
        let program = parser::parse(lexer::tokenize("int f() { return; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        let value = &json["functions"][0]["body"]["statements"][0]["value"];
        assert!(value.is_null());
    }

    #[test]
    fn operator_spellings_are_source_level() {
        let program = parser::parse(lexer::tokenize("int f() { return 1 + 2; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        let op = &json["functions"][0]["body"]["statements"][0]["value"]["operator"];
        assert_eq!(op.as_str().unwrap(), "+");
    }

    #[test]
    fn globals_and_functions_serialize_as_separate_arrays() {
        let program = parser::parse(lexer::tokenize("int g = 1; int f() { return g; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        assert_eq!(json["globals"].as_array().unwrap().len(), 1);
        assert_eq!(json["functions"].as_array().unwrap().len(), 1);
        assert_eq!(json["globals"][0]["type"], "VarDecl");
        assert_eq!(json["functions"][0]["type"], "FunctionDecl");
    }

    #[test]
    fn assignment_uses_left_and_right_keys() {
        let program = parser::parse(lexer::tokenize("int f() { int x; x = 1; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        let assign = &json["functions"][0]["body"]["statements"][1];
        assert_eq!(assign["type"], "Assignment");
        assert_eq!(assign["left"]["type"], "Variable");
        assert_eq!(assign["right"]["type"], "NumLiteral");
    }

    #[test]
    fn an_expression_statement_has_no_wrapper_node() {
        let program = parser::parse(lexer::tokenize("int f() { int x; x = 1; }").unwrap()).unwrap();
        let json = program_to_json(&program);
        let stmt = &json["functions"][0]["body"]["statements"][1];
        // Bare `Assignment`, not wrapped in an `ExpressionStatement`.
        assert_eq!(stmt["type"], "Assignment");
    }

    #[test]
    fn original_tag_spellings_are_used_for_calls_and_control_flow() {
        let program = parser::parse(
            lexer::tokenize("int f() { if (1) { while (1) { for (;;) { return g(); } } } }").unwrap(),
        )
        .unwrap();
        let json = program_to_json(&program);
        let if_stmt = &json["functions"][0]["body"]["statements"][0];
        assert_eq!(if_stmt["type"], "IfStatement");
        let while_stmt = &if_stmt["then"]["statements"][0];
        assert_eq!(while_stmt["type"], "WhileLoop");
        let for_stmt = &while_stmt["body"]["statements"][0];
        assert_eq!(for_stmt["type"], "ForLoop");
        let return_stmt = &for_stmt["body"]["statements"][0];
        assert_eq!(return_stmt["type"], "ReturnStatement");
        assert_eq!(return_stmt["value"]["type"], "FunctionCall");
    }
}

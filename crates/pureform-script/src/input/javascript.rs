//! Tree-sitter based JavaScript reader.
//!
//! Uses the TypeScript grammar, which accepts plain JavaScript. Only the
//! subset the interpreter can execute is lowered; everything else is reported
//! as [`ReadError::Unsupported`].

use crate::error::ReadError;
use crate::ir::*;
use crate::traits::Reader;
use serde::Serialize;
use tree_sitter::{Node, Parser, Tree};

/// Static instance of the JavaScript reader for registry.
pub static JAVASCRIPT_READER: JavascriptReader = JavascriptReader;

/// JavaScript reader backed by the tree-sitter TypeScript grammar.
pub struct JavascriptReader;

impl Reader for JavascriptReader {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs"]
    }

    fn read(&self, source: &str) -> Result<Program, ReadError> {
        read_javascript(source)
    }
}

/// Parse a script into IR.
pub fn read_javascript(source: &str) -> Result<Program, ReadError> {
    let tree = parse(source)?;
    let ctx = ReadContext::new(source);
    ctx.read_program(&tree)
}

/// Parse a source consisting of exactly one function (declaration,
/// expression or arrow) into an IR function.
///
/// The returned function's `text` is the whole source, verbatim.
pub fn read_function(source: &str) -> Result<Function, ReadError> {
    with_function_node(source, |ctx, node| {
        let function = ctx.read_function_node(node)?;
        Ok(function.with_text(source))
    })
}

/// Lexical shape of a single-function source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionShape {
    pub name: String,
    pub params: Vec<String>,
    /// Text between the body's braces, verbatim. For expression-bodied
    /// arrows this is the expression text.
    pub body: String,
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
}

/// Recover the lexical shape of a single-function source without lowering
/// its body.
pub fn function_shape(source: &str) -> Result<FunctionShape, ReadError> {
    with_function_node(source, |ctx, node| ctx.read_shape(node))
}

fn parse(source: &str) -> Result<Tree, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_typescript::language().into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    if tree.root_node().has_error() {
        return Err(ReadError::Parse("syntax error in source".into()));
    }
    Ok(tree)
}

fn with_function_node<T>(
    source: &str,
    f: impl FnOnce(&ReadContext<'_>, Node<'_>) -> Result<T, ReadError>,
) -> Result<T, ReadError> {
    // Anonymous `function (...) {}` is not a valid statement; retry it as a
    // parenthesized expression.
    let (text, tree) = match parse(source) {
        Ok(tree) => (source.to_string(), tree),
        Err(err) => {
            let wrapped = format!("({})", source);
            match parse(&wrapped) {
                Ok(tree) => (wrapped, tree),
                Err(_) => return Err(err),
            }
        }
    };

    let ctx = ReadContext::new(&text);
    let node = locate_function(tree.root_node())?;
    f(&ctx, node)
}

fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function"
    )
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| child.kind() != "comment")
}

fn locate_function(root: Node<'_>) -> Result<Node<'_>, ReadError> {
    let mut cursor = root.walk();
    let statements: Vec<Node> = root
        .named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "comment" | "empty_statement"))
        .collect();

    let [statement] = statements.as_slice() else {
        return Err(ReadError::Parse(format!(
            "expected a single function, found {} statements",
            statements.len()
        )));
    };

    let mut node = *statement;
    if node.kind() == "expression_statement" {
        node = first_named(node)
            .ok_or_else(|| ReadError::Parse("empty expression statement".into()))?;
    }
    while node.kind() == "parenthesized_expression" {
        node = first_named(node)
            .ok_or_else(|| ReadError::Parse("empty parenthesized expression".into()))?;
    }

    if is_function_kind(node.kind()) {
        Ok(node)
    } else {
        Err(ReadError::UnexpectedNode {
            expected: "function".into(),
            got: node.kind().into(),
        })
    }
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ReadError> {
        node.child_by_field_name(name)
            .ok_or_else(|| ReadError::Parse(format!("{} missing {}", node.kind(), name)))
    }

    fn has_token(&self, node: Node, token: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|child| !child.is_named() && child.kind() == token);
        found
    }

    fn read_program(&self, tree: &Tree) -> Result<Program, ReadError> {
        let root = tree.root_node();
        let mut statements = Vec::new();
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            self.read_stmt_into(child, &mut statements)?;
        }

        Ok(Program::new(statements))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Read a statement in a statement-list position. Declarations with
    /// several declarators expand into several statements.
    fn read_stmt_into(&self, node: Node, out: &mut Vec<Stmt>) -> Result<(), ReadError> {
        match node.kind() {
            "comment" | "empty_statement" => Ok(()),
            "lexical_declaration" | "variable_declaration" => {
                out.extend(self.read_declaration(node)?);
                Ok(())
            }
            _ => {
                out.push(self.read_stmt(node)?);
                Ok(())
            }
        }
    }

    /// Read a statement in a single-statement position (if/loop bodies).
    fn read_stmt(&self, node: Node) -> Result<Stmt, ReadError> {
        match node.kind() {
            "comment" | "empty_statement" => Ok(Stmt::block(vec![])),

            "expression_statement" => {
                let inner = first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty expression statement".into()))?;
                Ok(Stmt::expr(self.read_expr(inner)?))
            }

            "lexical_declaration" | "variable_declaration" => {
                let mut decls = self.read_declaration(node)?;
                if decls.len() == 1 {
                    Ok(decls.remove(0))
                } else {
                    Ok(Stmt::block(decls))
                }
            }

            "statement_block" => Ok(Stmt::block(self.read_block_stmts(node)?)),

            "if_statement" => self.read_if_statement(node),
            "while_statement" => self.read_while_statement(node),
            "for_statement" => self.read_for_statement(node),
            "for_in_statement" => self.read_for_in_statement(node),

            "return_statement" => {
                let value = first_named(node).map(|n| self.read_expr(n)).transpose()?;
                Ok(Stmt::return_stmt(value))
            }
            "break_statement" => Ok(Stmt::break_stmt()),
            "continue_statement" => Ok(Stmt::continue_stmt()),
            "throw_statement" => {
                let value = first_named(node)
                    .ok_or_else(|| ReadError::Parse("throw_statement missing value".into()))?;
                Ok(Stmt::throw(self.read_expr(value)?))
            }
            "try_statement" => self.read_try_statement(node),

            "function_declaration" | "generator_function_declaration" => {
                Ok(Stmt::function(self.read_function_node(node)?))
            }

            kind => Err(ReadError::Unsupported(format!(
                "statement type '{}': {}",
                kind,
                self.node_text(node)
            ))),
        }
    }

    fn read_block_stmts(&self, node: Node) -> Result<Vec<Stmt>, ReadError> {
        let mut stmts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.read_stmt_into(child, &mut stmts)?;
        }
        Ok(stmts)
    }

    fn read_declaration(&self, node: Node) -> Result<Vec<Stmt>, ReadError> {
        // `const` is the only immutable form; `var` is treated like `let`.
        let mutable = !self.has_token(node, "const");
        let mut decls = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let name = self.field(child, "name")?;
            if name.kind() != "identifier" {
                return Err(ReadError::Unsupported(format!(
                    "destructuring declaration: {}",
                    self.node_text(name)
                )));
            }
            let init = child
                .child_by_field_name("value")
                .map(|value| self.read_expr(value))
                .transpose()?;
            decls.push(Stmt::Let {
                name: self.node_text(name).to_string(),
                init,
                mutable,
            });
        }

        Ok(decls)
    }

    fn read_if_statement(&self, node: Node) -> Result<Stmt, ReadError> {
        let test = self.read_expr(self.field(node, "condition")?)?;
        let consequent = self.read_stmt(self.field(node, "consequence")?)?;

        let alternate = match node.child_by_field_name("alternative") {
            Some(alt) if alt.kind() == "else_clause" => {
                let inner = first_named(alt)
                    .ok_or_else(|| ReadError::Parse("else_clause missing body".into()))?;
                Some(self.read_stmt(inner)?)
            }
            Some(alt) => Some(self.read_stmt(alt)?),
            None => None,
        };

        Ok(Stmt::if_stmt(test, consequent, alternate))
    }

    fn read_while_statement(&self, node: Node) -> Result<Stmt, ReadError> {
        let test = self.read_expr(self.field(node, "condition")?)?;
        let body = self.read_stmt(self.field(node, "body")?)?;
        Ok(Stmt::while_loop(test, body))
    }

    fn read_for_statement(&self, node: Node) -> Result<Stmt, ReadError> {
        let init = match node.child_by_field_name("initializer") {
            Some(n) if matches!(n.kind(), "lexical_declaration" | "variable_declaration") => {
                let mut decls = self.read_declaration(n)?;
                if decls.len() != 1 {
                    return Err(ReadError::Unsupported(
                        "for-loop initializer with several declarators".into(),
                    ));
                }
                Some(decls.remove(0))
            }
            other => self.read_optional_expr(other)?.map(Stmt::expr),
        };
        let test = self.read_optional_expr(node.child_by_field_name("condition"))?;
        let update = self.read_optional_expr(node.child_by_field_name("increment"))?;
        let body = self.read_stmt(self.field(node, "body")?)?;

        Ok(Stmt::for_loop(init, test, update, body))
    }

    /// Loop header slots may be empty, a bare `;`, or wrapped in an
    /// expression statement depending on grammar version.
    fn read_optional_expr(&self, node: Option<Node>) -> Result<Option<Expr>, ReadError> {
        let Some(node) = node else {
            return Ok(None);
        };
        match node.kind() {
            "empty_statement" => Ok(None),
            "expression_statement" => first_named(node).map(|n| self.read_expr(n)).transpose(),
            _ if !node.is_named() => Ok(None),
            _ => self.read_expr(node).map(Some),
        }
    }

    fn read_for_in_statement(&self, node: Node) -> Result<Stmt, ReadError> {
        if !self.has_token(node, "of") {
            return Err(ReadError::Unsupported(format!(
                "for-in loop: {}",
                self.node_text(node)
            )));
        }
        let left = self.field(node, "left")?;
        if left.kind() != "identifier" {
            return Err(ReadError::Unsupported(format!(
                "destructuring loop variable: {}",
                self.node_text(left)
            )));
        }
        let iterable = self.read_expr(self.field(node, "right")?)?;
        let body = self.read_stmt(self.field(node, "body")?)?;

        Ok(Stmt::for_of(self.node_text(left), iterable, body))
    }

    fn read_try_statement(&self, node: Node) -> Result<Stmt, ReadError> {
        let body = self.read_stmt(self.field(node, "body")?)?;

        let (catch_param, catch_body) = match node.child_by_field_name("handler") {
            Some(handler) => {
                let param = handler
                    .child_by_field_name("parameter")
                    .map(|p| self.node_text(p).to_string());
                let body = self.read_stmt(self.field(handler, "body")?)?;
                (param, Some(body))
            }
            None => (None, None),
        };

        let finally_body = node
            .child_by_field_name("finalizer")
            .map(|finalizer| -> Result<Stmt, ReadError> {
                self.read_stmt(self.field(finalizer, "body")?)
            })
            .transpose()?;

        Ok(Stmt::try_catch(body, catch_param, catch_body, finally_body))
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn read_function_node(&self, node: Node) -> Result<Function, ReadError> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string())
            .unwrap_or_default();
        let params = self.read_function_params(node)?;

        let body_node = self.field(node, "body")?;
        let body = if body_node.kind() == "statement_block" {
            self.read_block_stmts(body_node)?
        } else {
            vec![Stmt::return_stmt(Some(self.read_expr(body_node)?))]
        };

        let kind = node.kind();
        Ok(Function {
            name,
            params,
            body,
            is_async: self.has_token(node, "async"),
            is_generator: matches!(
                kind,
                "generator_function_declaration" | "generator_function"
            ),
            is_arrow: kind == "arrow_function",
            text: self.node_text(node).to_string(),
        })
    }

    fn read_shape(&self, node: Node) -> Result<FunctionShape, ReadError> {
        let body_node = self.field(node, "body")?;
        let body = if body_node.kind() == "statement_block" {
            let start = body_node.start_byte() + 1;
            let end = body_node.end_byte().saturating_sub(1).max(start);
            self.source[start..end].to_string()
        } else {
            self.node_text(body_node).to_string()
        };

        let kind = node.kind();
        Ok(FunctionShape {
            name: node
                .child_by_field_name("name")
                .map(|n| self.node_text(n).to_string())
                .unwrap_or_default(),
            params: self.read_function_params(node)?,
            body,
            is_async: self.has_token(node, "async"),
            is_generator: matches!(
                kind,
                "generator_function_declaration" | "generator_function"
            ),
            is_arrow: kind == "arrow_function",
        })
    }

    fn read_function_params(&self, node: Node) -> Result<Vec<String>, ReadError> {
        if let Some(params) = node.child_by_field_name("parameters") {
            self.read_parameters(params)
        } else if let Some(param) = node.child_by_field_name("parameter") {
            Ok(vec![self.node_text(param).to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    fn read_parameters(&self, node: Node) -> Result<Vec<String>, ReadError> {
        let mut params = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            let pattern = match child.kind() {
                "comment" => continue,
                "identifier" => child,
                "required_parameter" | "optional_parameter" => {
                    if child.child_by_field_name("value").is_some() {
                        return Err(ReadError::Unsupported(format!(
                            "default parameter value: {}",
                            self.node_text(child)
                        )));
                    }
                    self.field(child, "pattern")?
                }
                _ => {
                    return Err(ReadError::Unsupported(format!(
                        "parameter form '{}': {}",
                        child.kind(),
                        self.node_text(child)
                    )));
                }
            };

            if pattern.kind() != "identifier" {
                return Err(ReadError::Unsupported(format!(
                    "parameter pattern '{}': {}",
                    pattern.kind(),
                    self.node_text(pattern)
                )));
            }
            params.push(self.node_text(pattern).to_string());
        }

        Ok(params)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn read_expr(&self, node: Node) -> Result<Expr, ReadError> {
        match node.kind() {
            // Literals
            "number" => self.read_number(node),
            "string" => Ok(Expr::string(unescape(strip_quotes(self.node_text(node))))),
            "template_string" => self.read_template(node),
            "true" => Ok(Expr::bool(true)),
            "false" => Ok(Expr::bool(false)),
            "null" => Ok(Expr::null()),
            "undefined" => Ok(Expr::ident("undefined")),

            "identifier" => Ok(Expr::ident(self.node_text(node))),
            "this" => Ok(Expr::This),

            // Operators
            "binary_expression" => self.read_binary_expr(node),
            "unary_expression" => self.read_unary_expr(node),
            "update_expression" => self.read_update_expr(node),
            "assignment_expression" => {
                let target = self.read_assign_target(self.field(node, "left")?)?;
                let value = self.read_expr(self.field(node, "right")?)?;
                Ok(Expr::assign(target, value))
            }
            "augmented_assignment_expression" => self.read_augmented_assignment(node),
            "ternary_expression" => Ok(Expr::conditional(
                self.read_expr(self.field(node, "condition")?)?,
                self.read_expr(self.field(node, "consequence")?)?,
                self.read_expr(self.field(node, "alternative")?)?,
            )),

            // Grouping and type-only wrappers
            "parenthesized_expression"
            | "as_expression"
            | "non_null_expression"
            | "satisfies_expression" => {
                let inner = first_named(node)
                    .ok_or_else(|| ReadError::Parse(format!("empty {}", node.kind())))?;
                self.read_expr(inner)
            }

            // Access and calls
            "call_expression" => self.read_call(node),
            "member_expression" => {
                let object = self.read_expr(self.field(node, "object")?)?;
                let property = self.field(node, "property")?;
                if property.kind() == "private_property_identifier" {
                    return Err(ReadError::Unsupported(format!(
                        "private member: {}",
                        self.node_text(property)
                    )));
                }
                Ok(Expr::member(object, self.node_text(property)))
            }
            "subscript_expression" => Ok(Expr::index(
                self.read_expr(self.field(node, "object")?)?,
                self.read_expr(self.field(node, "index")?)?,
            )),

            // Composite literals
            "array" => {
                let mut items = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() != "comment" {
                        items.push(self.read_expr(child)?);
                    }
                }
                Ok(Expr::array(items))
            }
            "object" => self.read_object(node),

            // Functions
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                Ok(Expr::Function(Box::new(self.read_function_node(node)?)))
            }

            "await_expression" => {
                let inner = first_named(node)
                    .ok_or_else(|| ReadError::Parse("await_expression missing operand".into()))?;
                Ok(Expr::await_expr(self.read_expr(inner)?))
            }
            "yield_expression" => {
                let inner = first_named(node).map(|n| self.read_expr(n)).transpose()?;
                Ok(Expr::Yield(inner.map(Box::new)))
            }

            kind => Err(ReadError::Unsupported(format!(
                "expression type '{}': {}",
                kind,
                self.node_text(node)
            ))),
        }
    }

    fn read_number(&self, node: Node) -> Result<Expr, ReadError> {
        let text = self.node_text(node).replace('_', "");
        let radix = match text.get(..2) {
            Some("0x") | Some("0X") => Some(16),
            Some("0o") | Some("0O") => Some(8),
            Some("0b") | Some("0B") => Some(2),
            _ => None,
        };

        let value = match radix {
            Some(radix) => i64::from_str_radix(&text[2..], radix).map(|n| n as f64).ok(),
            None => text.parse::<f64>().ok(),
        };

        value
            .map(Expr::number)
            .ok_or_else(|| ReadError::Parse(format!("invalid number: {}", text)))
    }

    fn read_template(&self, node: Node) -> Result<Expr, ReadError> {
        let start = node.start_byte() + 1;
        let end = node.end_byte().saturating_sub(1).max(start);

        // Start from a string so `${a}${b}` concatenates instead of adding.
        let mut pos = start;
        let mut pieces = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "template_substitution" {
                continue;
            }
            pieces.push(Expr::string(unescape(&self.source[pos..child.start_byte()])));
            let inner = first_named(child)
                .ok_or_else(|| ReadError::Parse("empty template substitution".into()))?;
            pieces.push(self.read_expr(inner)?);
            pos = child.end_byte();
        }
        pieces.push(Expr::string(unescape(&self.source[pos..end])));

        let mut iter = pieces.into_iter();
        let first = iter.next().unwrap_or_else(|| Expr::string(""));
        Ok(iter.fold(first, |acc, piece| {
            Expr::binary(acc, BinaryOp::Add, piece)
        }))
    }

    fn operator_text(&self, node: Node) -> Result<&str, ReadError> {
        if let Some(op) = node.child_by_field_name("operator") {
            return Ok(self.node_text(op));
        }
        // Older grammars leave the operator as an unnamed child.
        let mut cursor = node.walk();
        let op = node
            .children(&mut cursor)
            .find(|child| !child.is_named())
            .map(|child| self.node_text(child));
        op.ok_or_else(|| ReadError::Parse(format!("{} missing operator", node.kind())))
    }

    fn read_binary_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let left = self.read_expr(self.field(node, "left")?)?;
        let right = self.read_expr(self.field(node, "right")?)?;
        let op_text = self.operator_text(node)?;

        let op = binary_op(op_text)
            .ok_or_else(|| ReadError::Unsupported(format!("operator '{}'", op_text)))?;
        Ok(Expr::binary(left, op, right))
    }

    fn read_unary_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let argument = self.read_expr(self.field(node, "argument")?)?;
        let op = match self.operator_text(node)? {
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "!" => UnaryOp::Not,
            "typeof" => UnaryOp::TypeOf,
            other => {
                return Err(ReadError::Unsupported(format!("unary operator '{}'", other)));
            }
        };
        Ok(Expr::unary(op, argument))
    }

    fn read_update_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let argument = self.field(node, "argument")?;
        let target = self.read_assign_target(argument)?;
        let op = match self.operator_text(node)? {
            "++" => BinaryOp::Add,
            "--" => BinaryOp::Sub,
            other => {
                return Err(ReadError::Unsupported(format!("update operator '{}'", other)));
            }
        };
        let prefix = node.start_byte() < argument.start_byte();
        Ok(Expr::update(target, op, prefix))
    }

    fn read_augmented_assignment(&self, node: Node) -> Result<Expr, ReadError> {
        let target = self.read_assign_target(self.field(node, "left")?)?;
        let value = self.read_expr(self.field(node, "right")?)?;
        let op_text = self.operator_text(node)?;

        let op = op_text
            .strip_suffix('=')
            .and_then(binary_op)
            .filter(|op| !matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish))
            .ok_or_else(|| ReadError::Unsupported(format!("assignment operator '{}'", op_text)))?;

        Ok(Expr::assign(
            target.clone(),
            Expr::binary(target, op, value),
        ))
    }

    fn read_assign_target(&self, node: Node) -> Result<Expr, ReadError> {
        match node.kind() {
            "identifier" | "member_expression" | "subscript_expression" => self.read_expr(node),
            "parenthesized_expression" => {
                let inner = first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty parenthesized expression".into()))?;
                self.read_assign_target(inner)
            }
            kind => Err(ReadError::Unsupported(format!(
                "assignment target '{}': {}",
                kind,
                self.node_text(node)
            ))),
        }
    }

    fn read_call(&self, node: Node) -> Result<Expr, ReadError> {
        let callee = self.field(node, "function")?;
        let arguments = self.field(node, "arguments")?;
        if arguments.kind() != "arguments" {
            return Err(ReadError::Unsupported(format!(
                "tagged template: {}",
                self.node_text(node)
            )));
        }

        let mut args = Vec::new();
        let mut cursor = arguments.walk();
        for child in arguments.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {}
                "spread_element" => {
                    return Err(ReadError::Unsupported(format!(
                        "spread argument: {}",
                        self.node_text(child)
                    )));
                }
                _ => args.push(self.read_expr(child)?),
            }
        }

        Ok(Expr::call(self.read_expr(callee)?, args))
    }

    fn read_object(&self, node: Node) -> Result<Expr, ReadError> {
        let mut pairs = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {}
                "pair" => {
                    let key = self.field(child, "key")?;
                    let key = match key.kind() {
                        "property_identifier" | "number" => self.node_text(key).to_string(),
                        "string" => unescape(strip_quotes(self.node_text(key))),
                        other => {
                            return Err(ReadError::Unsupported(format!(
                                "object key '{}': {}",
                                other,
                                self.node_text(key)
                            )));
                        }
                    };
                    let value = self.read_expr(self.field(child, "value")?)?;
                    pairs.push((key, value));
                }
                "shorthand_property_identifier" => {
                    let name = self.node_text(child);
                    pairs.push((name.to_string(), Expr::ident(name)));
                }
                other => {
                    return Err(ReadError::Unsupported(format!(
                        "object member '{}': {}",
                        other,
                        self.node_text(child)
                    )));
                }
            }
        }

        Ok(Expr::object(pairs))
    }
}

fn binary_op(text: &str) -> Option<BinaryOp> {
    let op = match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        "**" => BinaryOp::Pow,
        "===" => BinaryOp::Eq,
        "!==" => BinaryOp::Ne,
        "==" => BinaryOp::LooseEq,
        "!=" => BinaryOp::LooseNe,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "&&" => BinaryOp::And,
        "||" => BinaryOp::Or,
        "??" => BinaryOp::Nullish,
        _ => return None,
    };
    Some(op)
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Resolve JavaScript string escapes. Unknown escapes keep the escaped
/// character, as the language does.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            // Line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

fn push_code_point(out: &mut String, hex: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push(char::REPLACEMENT_CHARACTER),
    }
}

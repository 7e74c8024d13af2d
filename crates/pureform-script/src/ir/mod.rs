//! Intermediate representation for script source.
//!
//! The reader lowers tree-sitter nodes into these types and the interpreter
//! walks them directly. The IR only covers the subset of the language the
//! interpreter can execute; anything else is rejected at read time.

use serde::{Deserialize, Serialize};

/// A sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// A function literal: declaration, expression or arrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Empty for anonymous functions.
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_generator: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_arrow: bool,
    /// Verbatim source text of the whole function.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            is_async: false,
            is_generator: false,
            is_arrow: false,
            text: String::new(),
        }
    }

    pub fn anonymous(params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self::new(String::new(), params, body)
    }

    pub fn arrow(params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self {
            is_arrow: true,
            ..Self::anonymous(params, body)
        }
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn with_generator(mut self, is_generator: bool) -> Self {
        self.is_generator = is_generator;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Let {
        name: String,
        init: Option<Expr>,
        mutable: bool,
    },
    Block(Vec<Stmt>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    /// `for (const x of xs)`.
    ForOf {
        variable: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
    TryCatch {
        body: Box<Stmt>,
        catch_param: Option<String>,
        catch_body: Option<Box<Stmt>>,
        finally_body: Option<Box<Stmt>>,
    },
    Function(Function),
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn let_decl(name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::Let {
            name: name.into(),
            init,
            mutable: true,
        }
    }

    pub fn const_decl(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            init: Some(init),
            mutable: false,
        }
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(stmts)
    }

    pub fn if_stmt(test: Expr, consequent: Stmt, alternate: Option<Stmt>) -> Self {
        Stmt::If {
            test,
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
        }
    }

    pub fn while_loop(test: Expr, body: Stmt) -> Self {
        Stmt::While {
            test,
            body: Box::new(body),
        }
    }

    pub fn for_loop(
        init: Option<Stmt>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Stmt,
    ) -> Self {
        Stmt::For {
            init: init.map(Box::new),
            test,
            update,
            body: Box::new(body),
        }
    }

    pub fn for_of(variable: impl Into<String>, iterable: Expr, body: Stmt) -> Self {
        Stmt::ForOf {
            variable: variable.into(),
            iterable,
            body: Box::new(body),
        }
    }

    pub fn return_stmt(expr: Option<Expr>) -> Self {
        Stmt::Return(expr)
    }

    pub fn break_stmt() -> Self {
        Stmt::Break
    }

    pub fn continue_stmt() -> Self {
        Stmt::Continue
    }

    pub fn throw(expr: Expr) -> Self {
        Stmt::Throw(expr)
    }

    pub fn try_catch(
        body: Stmt,
        catch_param: Option<String>,
        catch_body: Option<Stmt>,
        finally_body: Option<Stmt>,
    ) -> Self {
        Stmt::TryCatch {
            body: Box::new(body),
            catch_param,
            catch_body: catch_body.map(Box::new),
            finally_body: finally_body.map(Box::new),
        }
    }

    pub fn function(f: Function) -> Self {
        Stmt::Function(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    This,
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// `x++`, `--x`. `op` is `Add` or `Sub`.
    Update {
        target: Box<Expr>,
        op: BinaryOp,
        prefix: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
    },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Function(Box<Function>),
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
}

impl Expr {
    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn number(n: impl Into<f64>) -> Self {
        Expr::Literal(Literal::Number(n.into()))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn update(target: Expr, op: BinaryOp, prefix: bool) -> Self {
        Expr::Update {
            target: Box::new(target),
            op,
            prefix,
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: Box::new(Expr::string(property)),
            computed: false,
        }
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: Box::new(index),
            computed: true,
        }
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Expr::Array(items)
    }

    pub fn object(pairs: Vec<(String, Expr)>) -> Self {
        Expr::Object(pairs)
    }

    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn await_expr(expr: Expr) -> Self {
        Expr::Await(Box::new(expr))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    Ne,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical (short-circuit)
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    TypeOf,
}

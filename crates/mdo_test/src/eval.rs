//! A tiny interpreter for desugared do-notation.
//!
//! Covers the fragment of TypeScript the expander produces plus what the law
//! tests write by hand: numbers, booleans, `null`, strings, arrays, objects,
//! arrows, calls, member access, arithmetic and comparison, `const`/`let`
//! with destructuring, `if` and `return`. Anything else is an
//! [`EvalError::Unsupported`].
//!
//! [`Interpreter::with_prelude`] installs three monads as plain objects with
//! `bind`/`return` members:
//!
//! - `List`: arrays, `bind` is flat-map
//! - `Maybe`: `null` is nothing, `{ just: v }` is something; `Maybe.nothing`
//! - `Id`: values themselves, `bind(m, f)` is `f(m)`
//!
//! and `trace(v)`, which records `v` in [`Interpreter::trace`] and returns it.

use std::{cell::RefCell, collections::BTreeMap, collections::HashMap, fmt, rc::Rc};

use swc_ecma_ast as ast;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("`{0}` is not defined")]
    Unbound(String),

    #[error("unsupported {0}")]
    Unsupported(&'static str),

    #[error("type error: {0}")]
    Type(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

pub type NativeFn = Rc<dyn Fn(&Interpreter, Vec<Value>) -> EvalResult<Value>>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
    Closure(Rc<Closure>),
    Native(NativeFn),
}

pub struct Closure {
    params: Vec<ast::Pat>,
    body: ast::BlockStmtOrExpr,
    env: Env,
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn native(f: impl Fn(&Interpreter, Vec<Value>) -> EvalResult<Value> + 'static) -> Self {
        Value::Native(Rc::new(f))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Closure(_) | Value::Native(_) => "function",
        }
    }
}

/// Structural equality on data; functions never compare equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                write!(f, "}}")
            }
            Value::Closure(_) | Value::Native(_) => write!(f, "<function>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A lexical scope chain.
#[derive(Clone, Default)]
pub struct Env(Rc<Scope>);

#[derive(Default)]
struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

impl Env {
    fn child(&self) -> Env {
        Env(Rc::new(Scope {
            vars: RefCell::default(),
            parent: Some(self.clone()),
        }))
    }

    fn define(&self, name: impl Into<String>, value: Value) {
        self.0.vars.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.0.vars.borrow().get(name) {
                return Some(value.clone());
            }
            scope = env.0.parent.as_ref();
        }
        None
    }
}

enum Flow {
    Normal,
    Return(Value),
}

#[derive(Default)]
pub struct Interpreter {
    globals: Env,
    trace: Rc<RefCell<Vec<Value>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter with `List`, `Maybe`, `Id` and `trace` defined.
    pub fn with_prelude() -> Self {
        let interp = Self::new();

        interp.define(
            "List",
            Value::object([
                ("return", Value::native(|_, args| Ok(Value::array(vec![arg(&args, 0)])))),
                (
                    "bind",
                    Value::native(|interp, args| {
                        let items = expect_array(&arg(&args, 0))?;
                        let f = arg(&args, 1);
                        let mut out = Vec::new();
                        for item in items.iter() {
                            let produced = interp.call(&f, vec![item.clone()])?;
                            out.extend(expect_array(&produced)?.iter().cloned());
                        }
                        Ok(Value::array(out))
                    }),
                ),
            ]),
        );

        interp.define(
            "Maybe",
            Value::object([
                ("nothing", Value::Null),
                (
                    "return",
                    Value::native(|_, args| Ok(Value::object([("just", arg(&args, 0))]))),
                ),
                (
                    "bind",
                    Value::native(|interp, args| match arg(&args, 0) {
                        Value::Null | Value::Undefined => Ok(Value::Null),
                        Value::Object(entries) => {
                            let value = entries.get("just").cloned().unwrap_or(Value::Undefined);
                            interp.call(&arg(&args, 1), vec![value])
                        }
                        other => Err(EvalError::Type(format!(
                            "Maybe.bind on {}",
                            other.type_name()
                        ))),
                    }),
                ),
            ]),
        );

        interp.define(
            "Id",
            Value::object([
                ("return", Value::native(|_, args| Ok(arg(&args, 0)))),
                (
                    "bind",
                    Value::native(|interp, args| interp.call(&arg(&args, 1), vec![arg(&args, 0)])),
                ),
            ]),
        );

        let log = interp.trace.clone();
        interp.define(
            "trace",
            Value::native(move |_, args| {
                let value = arg(&args, 0);
                log.borrow_mut().push(value.clone());
                Ok(value)
            }),
        );

        interp
    }

    pub fn define(&self, name: &str, value: Value) {
        self.globals.define(name, value);
    }

    /// Values passed to `trace`, in call order.
    pub fn trace(&self) -> Vec<Value> {
        self.trace.borrow().clone()
    }

    /// Run every top-level statement; declarations land in the global scope.
    pub fn run_module(&self, module: &ast::Module) -> EvalResult<()> {
        for item in &module.body {
            match item {
                ast::ModuleItem::Stmt(stmt) => {
                    if let Flow::Return(_) = self.exec(stmt, &self.globals)? {
                        return Err(EvalError::Unsupported("top-level return"));
                    }
                }
                ast::ModuleItem::ModuleDecl(_) => {
                    return Err(EvalError::Unsupported("module declaration"))
                }
            }
        }
        Ok(())
    }

    pub fn global(&self, name: &str) -> EvalResult<Value> {
        self.globals
            .lookup(name)
            .ok_or_else(|| EvalError::Unbound(name.to_string()))
    }

    pub fn call(&self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Native(f) => f(self, args),
            Value::Closure(closure) => {
                let env = closure.env.child();
                for (i, param) in closure.params.iter().enumerate() {
                    let value = match param {
                        ast::Pat::Rest(_) => Value::array(args.iter().skip(i).cloned().collect()),
                        _ => arg(&args, i),
                    };
                    self.bind_pat(param, value, &env)?;
                }
                match &closure.body {
                    ast::BlockStmtOrExpr::Expr(expr) => self.eval(expr, &env),
                    ast::BlockStmtOrExpr::BlockStmt(block) => {
                        match self.exec_stmts(&block.stmts, &env)? {
                            Flow::Return(value) => Ok(value),
                            Flow::Normal => Ok(Value::Undefined),
                        }
                    }
                }
            }
            other => Err(EvalError::Type(format!("{} is not a function", other.type_name()))),
        }
    }

    fn exec_stmts(&self, stmts: &[ast::Stmt], env: &Env) -> EvalResult<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(stmt, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&self, stmt: &ast::Stmt, env: &Env) -> EvalResult<Flow> {
        match stmt {
            ast::Stmt::Expr(stmt) => {
                self.eval(&stmt.expr, env)?;
                Ok(Flow::Normal)
            }
            ast::Stmt::Return(ret) => {
                let value = match &ret.arg {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            ast::Stmt::Decl(ast::Decl::Var(var)) => {
                for decl in &var.decls {
                    let value = match &decl.init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    self.bind_pat(&decl.name, value, env)?;
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::Block(block) => self.exec_stmts(&block.stmts, &env.child()),
            ast::Stmt::If(stmt) => {
                if self.eval(&stmt.test, env)?.is_truthy() {
                    self.exec(&stmt.cons, env)
                } else if let Some(alt) = &stmt.alt {
                    self.exec(alt, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            ast::Stmt::Empty(_) => Ok(Flow::Normal),
            _ => Err(EvalError::Unsupported("statement")),
        }
    }

    fn bind_pat(&self, pat: &ast::Pat, value: Value, env: &Env) -> EvalResult<()> {
        match pat {
            ast::Pat::Ident(ident) => {
                env.define(ident.id.sym.to_string(), value);
                Ok(())
            }
            ast::Pat::Array(array) => {
                let items = expect_array(&value)?;
                for (i, elem) in array.elems.iter().enumerate() {
                    match elem {
                        Some(ast::Pat::Rest(rest)) => {
                            let tail = items.iter().skip(i).cloned().collect();
                            self.bind_pat(&rest.arg, Value::array(tail), env)?;
                        }
                        Some(elem) => {
                            self.bind_pat(elem, items.get(i).cloned().unwrap_or(Value::Undefined), env)?
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            ast::Pat::Object(object) => {
                let Value::Object(entries) = &value else {
                    return Err(EvalError::Type(format!(
                        "cannot destructure {}",
                        value.type_name()
                    )));
                };
                let mut taken = Vec::new();
                for prop in &object.props {
                    match prop {
                        ast::ObjectPatProp::KeyValue(kv) => {
                            let key = prop_key(&kv.key)?;
                            let field = entries.get(&key).cloned().unwrap_or(Value::Undefined);
                            self.bind_pat(&kv.value, field, env)?;
                            taken.push(key);
                        }
                        ast::ObjectPatProp::Assign(assign) => {
                            let key = assign.key.sym.to_string();
                            let mut field = entries.get(&key).cloned().unwrap_or(Value::Undefined);
                            if let (Value::Undefined, Some(default)) = (&field, &assign.value) {
                                field = self.eval(default, env)?;
                            }
                            env.define(key.clone(), field);
                            taken.push(key);
                        }
                        ast::ObjectPatProp::Rest(rest) => {
                            let remaining = entries
                                .iter()
                                .filter(|(k, _)| !taken.contains(k))
                                .map(|(k, v)| (k.clone(), v.clone()));
                            self.bind_pat(&rest.arg, Value::object(remaining), env)?;
                        }
                    }
                }
                Ok(())
            }
            ast::Pat::Assign(assign) => {
                let value = match value {
                    Value::Undefined => self.eval(&assign.right, env)?,
                    value => value,
                };
                self.bind_pat(&assign.left, value, env)
            }
            _ => Err(EvalError::Unsupported("binding pattern")),
        }
    }

    fn eval(&self, expr: &ast::Expr, env: &Env) -> EvalResult<Value> {
        match expr {
            ast::Expr::Lit(lit) => match lit {
                ast::Lit::Num(n) => Ok(Value::Num(n.value)),
                ast::Lit::Bool(b) => Ok(Value::Bool(b.value)),
                ast::Lit::Null(_) => Ok(Value::Null),
                ast::Lit::Str(s) => match s.raw.as_deref() {
                    Some(raw) if raw.len() >= 2 => Ok(Value::Str(raw[1..raw.len() - 1].to_string())),
                    _ => Err(EvalError::Unsupported("string literal")),
                },
                _ => Err(EvalError::Unsupported("literal")),
            },
            ast::Expr::Ident(ident) if &*ident.sym == "undefined" => Ok(Value::Undefined),
            ast::Expr::Ident(ident) => env
                .lookup(&ident.sym)
                .ok_or_else(|| EvalError::Unbound(ident.sym.to_string())),
            ast::Expr::Paren(paren) => self.eval(&paren.expr, env),
            ast::Expr::Array(array) => {
                let mut items = Vec::new();
                for elem in &array.elems {
                    match elem {
                        None => items.push(Value::Undefined),
                        Some(elem) if elem.spread.is_some() => {
                            items.extend(expect_array(&self.eval(&elem.expr, env)?)?.iter().cloned())
                        }
                        Some(elem) => items.push(self.eval(&elem.expr, env)?),
                    }
                }
                Ok(Value::array(items))
            }
            ast::Expr::Object(object) => {
                let mut entries = BTreeMap::new();
                for prop in &object.props {
                    match prop {
                        ast::PropOrSpread::Prop(prop) => match &**prop {
                            ast::Prop::KeyValue(kv) => {
                                entries.insert(prop_key(&kv.key)?, self.eval(&kv.value, env)?);
                            }
                            ast::Prop::Shorthand(ident) => {
                                let value = env
                                    .lookup(&ident.sym)
                                    .ok_or_else(|| EvalError::Unbound(ident.sym.to_string()))?;
                                entries.insert(ident.sym.to_string(), value);
                            }
                            _ => return Err(EvalError::Unsupported("object property")),
                        },
                        ast::PropOrSpread::Spread(_) => {
                            return Err(EvalError::Unsupported("object spread"))
                        }
                    }
                }
                Ok(Value::Object(Rc::new(entries)))
            }
            ast::Expr::Arrow(arrow) => Ok(Value::Closure(Rc::new(Closure {
                params: arrow.params.clone(),
                body: (*arrow.body).clone(),
                env: env.clone(),
            }))),
            ast::Expr::Call(call) => {
                let ast::Callee::Expr(callee) = &call.callee else {
                    return Err(EvalError::Unsupported("callee"));
                };
                let f = self.eval(callee, env)?;
                let mut args = Vec::with_capacity(call.args.len());
                for a in &call.args {
                    let value = self.eval(&a.expr, env)?;
                    if a.spread.is_some() {
                        args.extend(expect_array(&value)?.iter().cloned());
                    } else {
                        args.push(value);
                    }
                }
                self.call(&f, args)
            }
            ast::Expr::Member(member) => {
                let object = self.eval(&member.obj, env)?;
                match &member.prop {
                    ast::MemberProp::Ident(name) => get_prop(&object, &name.sym),
                    ast::MemberProp::Computed(computed) => match self.eval(&computed.expr, env)? {
                        Value::Num(n) => match &object {
                            Value::Array(items) => {
                                Ok(items.get(n as usize).cloned().unwrap_or(Value::Undefined))
                            }
                            _ => get_prop(&object, &Value::Num(n).to_string()),
                        },
                        Value::Str(key) => get_prop(&object, &key),
                        other => Err(EvalError::Type(format!(
                            "cannot index with {}",
                            other.type_name()
                        ))),
                    },
                    ast::MemberProp::PrivateName(_) => Err(EvalError::Unsupported("private name")),
                }
            }
            ast::Expr::Unary(unary) => {
                let value = self.eval(&unary.arg, env)?;
                match unary.op {
                    ast::UnaryOp::Minus => Ok(Value::Num(-expect_num(&value)?)),
                    ast::UnaryOp::Plus => Ok(Value::Num(expect_num(&value)?)),
                    ast::UnaryOp::Bang => Ok(Value::Bool(!value.is_truthy())),
                    _ => Err(EvalError::Unsupported("unary operator")),
                }
            }
            ast::Expr::Bin(bin) => self.eval_bin(bin, env),
            ast::Expr::Cond(cond) => {
                if self.eval(&cond.test, env)?.is_truthy() {
                    self.eval(&cond.cons, env)
                } else {
                    self.eval(&cond.alt, env)
                }
            }
            ast::Expr::Seq(seq) => {
                let mut last = Value::Undefined;
                for expr in &seq.exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
            _ => Err(EvalError::Unsupported("expression")),
        }
    }

    fn eval_bin(&self, bin: &ast::BinExpr, env: &Env) -> EvalResult<Value> {
        use ast::BinaryOp::*;

        let left = self.eval(&bin.left, env)?;
        match bin.op {
            LogicalAnd if !left.is_truthy() => return Ok(left),
            LogicalOr if left.is_truthy() => return Ok(left),
            NullishCoalescing if !matches!(left, Value::Null | Value::Undefined) => return Ok(left),
            LogicalAnd | LogicalOr | NullishCoalescing => return self.eval(&bin.right, env),
            _ => {}
        }

        let right = self.eval(&bin.right, env)?;
        let value = match bin.op {
            Add => match (&left, &right) {
                (Value::Str(a), b) => Value::Str(format!("{a}{}", display_plain(b))),
                (a, Value::Str(b)) => Value::Str(format!("{}{b}", display_plain(a))),
                _ => Value::Num(expect_num(&left)? + expect_num(&right)?),
            },
            Sub => Value::Num(expect_num(&left)? - expect_num(&right)?),
            Mul => Value::Num(expect_num(&left)? * expect_num(&right)?),
            Div => Value::Num(expect_num(&left)? / expect_num(&right)?),
            Mod => Value::Num(expect_num(&left)? % expect_num(&right)?),
            Exp => Value::Num(expect_num(&left)?.powf(expect_num(&right)?)),
            Lt => Value::Bool(expect_num(&left)? < expect_num(&right)?),
            LtEq => Value::Bool(expect_num(&left)? <= expect_num(&right)?),
            Gt => Value::Bool(expect_num(&left)? > expect_num(&right)?),
            GtEq => Value::Bool(expect_num(&left)? >= expect_num(&right)?),
            EqEq | EqEqEq => Value::Bool(left == right),
            NotEq | NotEqEq => Value::Bool(left != right),
            _ => return Err(EvalError::Unsupported("binary operator")),
        };
        Ok(value)
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

fn expect_array(value: &Value) -> EvalResult<Rc<Vec<Value>>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(EvalError::Type(format!("expected array, got {}", other.type_name()))),
    }
}

fn expect_num(value: &Value) -> EvalResult<f64> {
    match value {
        Value::Num(n) => Ok(*n),
        other => Err(EvalError::Type(format!("expected number, got {}", other.type_name()))),
    }
}

fn get_prop(object: &Value, name: &str) -> EvalResult<Value> {
    match object {
        Value::Object(entries) => Ok(entries.get(name).cloned().unwrap_or(Value::Undefined)),
        Value::Array(items) if name == "length" => Ok(Value::Num(items.len() as f64)),
        Value::Array(_) => Ok(Value::Undefined),
        other => Err(EvalError::Type(format!(
            "cannot read `{name}` of {}",
            other.type_name()
        ))),
    }
}

fn prop_key(key: &ast::PropName) -> EvalResult<String> {
    match key {
        ast::PropName::Ident(ident) => Ok(ident.sym.to_string()),
        ast::PropName::Num(n) => Ok(Value::Num(n.value).to_string()),
        ast::PropName::Str(s) => match s.raw.as_deref() {
            Some(raw) if raw.len() >= 2 => Ok(raw[1..raw.len() - 1].to_string()),
            _ => Err(EvalError::Unsupported("property key")),
        },
        _ => Err(EvalError::Unsupported("property key")),
    }
}

fn display_plain(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

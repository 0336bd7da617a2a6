//! Tree-walking evaluator for the restricted CodeAct evaluation language.
//!
//! There is no embedded scripting language here and no access to the host
//! process: the only things a generated program can call are the
//! functions explicitly registered in a [`Builtins`] table (the zero
//! builtins namespace the original tool achieved by executing with
//! `{"__builtins__": {}}`). Evaluation is bounded by a statement-step
//! counter so a runaway `for` loop can't hang the pipeline.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::ast::{BinOp, Expr, Stmt};

/// A value in the restricted language.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Value>),
    Dict(HashMap<String, Value>),
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
            Value::List(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(Error::sandbox(format!("expected a number, got {self:?}"))),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(Error::sandbox(format!("expected a string, got {self:?}"))),
        }
    }
}

/// A host function a generated program may call, e.g. a pre-fetched
/// search result lookup or a string helper. Functions are synchronous and
/// pure with respect to the sandbox: any I/O they need happened before
/// the sandbox ran.
pub type HostFn = Box<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// The registered host functions available to a sandboxed program.
#[derive(Default)]
pub struct Builtins {
    functions: HashMap<String, HostFn>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, f: HostFn) {
        self.functions.insert(name.into(), f);
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.functions
            .get(name)
            .ok_or_else(|| Error::sandbox(format!("call to undefined function: {name}")))
            .and_then(|f| f(args))
    }
}

const MAX_STEPS: u64 = 200_000;

/// Execute a parsed program against `builtins`, returning the final
/// variable namespace (mirroring reading `namespace` back out of a
/// zero-builtins `exec` call).
pub fn run(program: &[Stmt], builtins: &Builtins) -> Result<HashMap<String, Value>> {
    run_with_env(program, HashMap::new(), builtins)
}

/// As [`run`], but seeded with an initial variable namespace.
pub fn run_with_env(
    program: &[Stmt],
    mut env: HashMap<String, Value>,
    builtins: &Builtins,
) -> Result<HashMap<String, Value>> {
    let mut steps = 0u64;
    exec_block(program, &mut env, builtins, &mut steps)?;
    Ok(env)
}

fn exec_block(
    stmts: &[Stmt],
    env: &mut HashMap<String, Value>,
    builtins: &Builtins,
    steps: &mut u64,
) -> Result<()> {
    for stmt in stmts {
        exec_stmt(stmt, env, builtins, steps)?;
    }
    Ok(())
}

fn tick(steps: &mut u64) -> Result<()> {
    *steps += 1;
    if *steps > MAX_STEPS {
        return Err(Error::sandbox("execution step budget exceeded"));
    }
    Ok(())
}

fn exec_stmt(
    stmt: &Stmt,
    env: &mut HashMap<String, Value>,
    builtins: &Builtins,
    steps: &mut u64,
) -> Result<()> {
    tick(steps)?;
    match stmt {
        Stmt::Assign(name, expr) => {
            let value = eval(expr, env, builtins, steps)?;
            env.insert(name.clone(), value);
            Ok(())
        }
        Stmt::If(cond, then_branch, else_branch) => {
            if eval(cond, env, builtins, steps)?.truthy() {
                exec_block(then_branch, env, builtins, steps)
            } else {
                exec_block(else_branch, env, builtins, steps)
            }
        }
        Stmt::For(var, iterable, body) => {
            let items = match eval(iterable, env, builtins, steps)? {
                Value::List(items) => items,
                other => return Err(Error::sandbox(format!("cannot iterate over {other:?}"))),
            };
            for item in items {
                env.insert(var.clone(), item);
                exec_block(body, env, builtins, steps)?;
            }
            Ok(())
        }
        Stmt::Expr(expr) => {
            eval(expr, env, builtins, steps)?;
            Ok(())
        }
    }
}

fn eval(expr: &Expr, env: &HashMap<String, Value>, builtins: &Builtins, steps: &mut u64) -> Result<Value> {
    tick(steps)?;
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::NoneLit => Ok(Value::None),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|i| eval(i, env, builtins, steps))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(values))
        }
        Expr::Dict(pairs) => {
            let mut map = HashMap::new();
            for (k, v) in pairs {
                let key = eval(k, env, builtins, steps)?;
                let key = key.as_str()?.to_string();
                let value = eval(v, env, builtins, steps)?;
                map.insert(key, value);
            }
            Ok(Value::Dict(map))
        }
        Expr::Ident(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| Error::sandbox(format!("undefined variable: {name}"))),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, env, builtins, steps)?.truthy())),
        Expr::Neg(inner) => Ok(Value::Number(-eval(inner, env, builtins, steps)?.as_number()?)),
        Expr::Index(target, index) => {
            let target = eval(target, env, builtins, steps)?;
            let index = eval(index, env, builtins, steps)?;
            match (target, index) {
                (Value::List(items), Value::Number(n)) => {
                    let idx = n as usize;
                    items
                        .get(idx)
                        .cloned()
                        .ok_or_else(|| Error::sandbox(format!("list index out of range: {idx}")))
                }
                (Value::Dict(map), Value::Str(key)) => {
                    Ok(map.get(&key).cloned().unwrap_or(Value::None))
                }
                (Value::Str(s), Value::Number(n)) => s
                    .chars()
                    .nth(n as usize)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| Error::sandbox("string index out of range")),
                (other, _) => Err(Error::sandbox(format!("cannot index into {other:?}"))),
            }
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|a| eval(a, env, builtins, steps))
                .collect::<Result<Vec<_>>>()?;
            builtins.call(name, &values)
        }
        Expr::Binary(left, op, right) => eval_binary(left, op, right, env, builtins, steps),
    }
}

fn eval_binary(
    left: &Expr,
    op: &BinOp,
    right: &Expr,
    env: &HashMap<String, Value>,
    builtins: &Builtins,
    steps: &mut u64,
) -> Result<Value> {
    if matches!(op, BinOp::And) {
        let l = eval(left, env, builtins, steps)?;
        return if !l.truthy() {
            Ok(l)
        } else {
            eval(right, env, builtins, steps)
        };
    }
    if matches!(op, BinOp::Or) {
        let l = eval(left, env, builtins, steps)?;
        return if l.truthy() { Ok(l) } else { eval(right, env, builtins, steps) };
    }

    let l = eval(left, env, builtins, steps)?;
    let r = eval(right, env, builtins, steps)?;

    match op {
        BinOp::Add => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut combined = a.clone();
                combined.extend(b.clone());
                Ok(Value::List(combined))
            }
            _ => Err(Error::sandbox(format!("cannot add {l:?} and {r:?}"))),
        },
        BinOp::Sub => Ok(Value::Number(l.as_number()? - r.as_number()?)),
        BinOp::Mul => Ok(Value::Number(l.as_number()? * r.as_number()?)),
        BinOp::Div => {
            let divisor = r.as_number()?;
            if divisor == 0.0 {
                return Err(Error::sandbox("division by zero"));
            }
            Ok(Value::Number(l.as_number()? / divisor))
        }
        BinOp::Eq => Ok(Value::Bool(l == r)),
        BinOp::NotEq => Ok(Value::Bool(l != r)),
        BinOp::Lt => Ok(Value::Bool(compare(&l, &r)? == std::cmp::Ordering::Less)),
        BinOp::LtEq => Ok(Value::Bool(compare(&l, &r)? != std::cmp::Ordering::Greater)),
        BinOp::Gt => Ok(Value::Bool(compare(&l, &r)? == std::cmp::Ordering::Greater)),
        BinOp::GtEq => Ok(Value::Bool(compare(&l, &r)? != std::cmp::Ordering::Less)),
        BinOp::And | BinOp::Or => unreachable!("handled above with short-circuit evaluation"),
    }
}

fn compare(l: &Value, r: &Value) -> Result<std::cmp::Ordering> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => {
            a.partial_cmp(b).ok_or_else(|| Error::sandbox("cannot compare NaN"))
        }
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(Error::sandbox(format!("cannot compare {l:?} and {r:?}"))),
    }
}

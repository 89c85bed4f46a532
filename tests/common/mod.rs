//! Shared fixtures for the integration tests: a native function table and a
//! small reference interpreter for compiled executables.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use ride::ast::{Node, Tree};
use ride::{CompileError, Compiler, Constant, Executable, Instruction, SlotId, SlotKind};

/// Instructions executed before the interpreter gives up.
const STEP_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    Bytes(Vec<u8>),
    Str(String),
    Bool(bool),
    Object(BTreeMap<String, Value>),
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Long(value) => Value::Long(*value),
            Constant::Bytes(bytes) => Value::Bytes(bytes.clone()),
            Constant::String(s) => Value::Str(s.clone()),
            Constant::Boolean(value) => Value::Bool(*value),
        }
    }
}

pub fn object(fields: &[(&str, Value)]) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    )
}

type NativeFn = fn(&[Value]) -> Result<Value, String>;

pub struct Native {
    pub id: u16,
    pub apply: NativeFn,
}

fn longs(args: &[Value]) -> Result<(i64, i64), String> {
    match args {
        [Value::Long(a), Value::Long(b)] => Ok((*a, *b)),
        other => Err(format!("expected two longs, got {:?}", other)),
    }
}

pub static NATIVES: Lazy<HashMap<&'static str, Native>> = Lazy::new(|| {
    let table: [(&'static str, u16, NativeFn); 7] = [
        ("==", 0, |args| Ok(Value::Bool(args[0] == args[1]))),
        ("!=", 1, |args| Ok(Value::Bool(args[0] != args[1]))),
        ("throw", 2, |_| Err("throw".to_string())),
        ("+", 100, |args| match args {
            [Value::Str(a), Value::Str(b)] => Ok(Value::Str(format!("{}{}", a, b))),
            _ => longs(args).map(|(a, b)| Value::Long(a + b)),
        }),
        ("-", 101, |args| longs(args).map(|(a, b)| Value::Long(a - b))),
        (">", 102, |args| longs(args).map(|(a, b)| Value::Bool(a > b))),
        ("*", 104, |args| longs(args).map(|(a, b)| Value::Long(a * b))),
    ];
    table
        .into_iter()
        .map(|(name, id, apply)| (name, Native { id, apply }))
        .collect()
});

pub fn checker(name: &str) -> Option<u16> {
    NATIVES.get(name).map(|native| native.id)
}

fn native(id: u16) -> Option<(&'static str, &'static Native)> {
    NATIVES
        .iter()
        .find(|(_, native)| native.id == id)
        .map(|(name, native)| (*name, native))
}

/// Values of the predefined names used by the tests.
pub fn environment() -> HashMap<&'static str, Value> {
    HashMap::from([
        ("height", Value::Long(1000)),
        (
            "tx",
            object(&[
                ("sender", Value::Str("alice".into())),
                ("fee", Value::Long(500_000)),
            ]),
        ),
        ("this", object(&[("address", Value::Str("dapp".into()))])),
    ])
}

pub fn compile(tree: &Tree<'_>) -> Result<Executable, CompileError> {
    Compiler::new(&checker).compile_tree("test", tree)
}

/// Result of one run: the value and every native call made, in order.
#[derive(Debug)]
pub struct Outcome {
    pub value: Value,
    pub calls: Vec<&'static str>,
}

impl Outcome {
    pub fn count(&self, native: &str) -> usize {
        self.calls.iter().filter(|name| **name == native).count()
    }
}

/// Compile and run an expression script.
pub fn run_expression<'a>(body: &'a Node<'a>) -> Result<Outcome, String> {
    let exe = compile(&Tree::expression(5, body)).map_err(|err| err.to_string())?;
    Vm::new(&exe).run("", Vec::new())
}

#[derive(Debug, Clone)]
enum Binding {
    /// An argument chunk of the caller.
    Slot(SlotId),
    /// A value supplied by whoever started the run.
    Value(Value),
}

/// One active call of a function.
struct Frame {
    /// Chunk address of the function.
    function: usize,
    args: Vec<Binding>,
    /// Memoized values of the `Local` slots the function owns.
    memo: HashMap<SlotId, Value>,
}

impl Frame {
    fn new(function: usize, args: Vec<Binding>) -> Self {
        Frame {
            function,
            args,
            memo: HashMap::new(),
        }
    }
}

/// A stack interpreter for executables.
pub struct Vm<'e> {
    exe: &'e Executable,
    environment: HashMap<&'static str, Value>,
    stack: Vec<Value>,
    returns: Vec<usize>,
    frames: Vec<Frame>,
    pending: Vec<Binding>,
    params: HashMap<SlotId, Vec<Binding>>,
    cache: HashMap<SlotId, Value>,
    calls: Vec<&'static str>,
}

impl<'e> Vm<'e> {
    pub fn new(exe: &'e Executable) -> Self {
        Vm {
            exe,
            environment: environment(),
            stack: Vec::new(),
            returns: Vec::new(),
            frames: Vec::new(),
            pending: Vec::new(),
            params: HashMap::new(),
            cache: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Run from entry point `entry`. Arguments are only used by dApp
    /// entries, where the first one is the invocation.
    pub fn run(mut self, entry: &str, args: Vec<Value>) -> Result<Outcome, String> {
        let start = self
            .exe
            .entry_point(entry)
            .ok_or_else(|| format!("no entry point {:?}", entry))?;
        if self.exe.is_dapp {
            let args = args.into_iter().map(Binding::Value).collect();
            self.frames.push(Frame::new(start as usize, args));
        }

        let mut pc = start as usize;
        let mut steps = 0;
        loop {
            steps += 1;
            if steps > STEP_LIMIT {
                return Err("step limit exceeded".into());
            }
            let (instruction, next) =
                Instruction::decode(&self.exe.byte_code, pc).map_err(|err| err.to_string())?;
            pc = next;

            match instruction {
                Instruction::Return => match self.returns.pop() {
                    Some(address) => pc = address,
                    None => break,
                },
                Instruction::Ref(slot) => {
                    if let Some(address) = self.reference(slot, pc)? {
                        pc = address;
                    }
                }
                Instruction::JumpIfFalse {
                    on_true,
                    on_false,
                    merge,
                } => {
                    let condition = match self.pop()? {
                        Value::Bool(value) => value,
                        other => return Err(format!("condition is not a boolean: {:?}", other)),
                    };
                    self.returns.push(merge as usize);
                    pc = usize::from(if condition { on_true } else { on_false });
                }
                Instruction::Property(slot) => {
                    let field = match self.kind(slot)? {
                        SlotKind::Constant(Constant::String(name)) => name.clone(),
                        other => return Err(format!("field name is {:?}", other)),
                    };
                    let value = match self.pop()? {
                        Value::Object(fields) => fields
                            .get(&field)
                            .cloned()
                            .ok_or_else(|| format!("no field {}", field))?,
                        other => return Err(format!("{:?} has no fields", other)),
                    };
                    self.stack.push(value);
                }
                Instruction::Call { address, args } => {
                    let args = args.into_iter().map(Binding::Slot).collect();
                    self.frames.push(Frame::new(address as usize, args));
                    self.returns.push(pc);
                    pc = address as usize;
                }
                Instruction::ExternalCall { id, argc } => {
                    let (name, native) = native(id).ok_or_else(|| format!("native {}", id))?;
                    let split = self
                        .stack
                        .len()
                        .checked_sub(argc as usize)
                        .ok_or("stack underflow")?;
                    let args = self.stack.split_off(split);
                    self.calls.push(name);
                    let result = (native.apply)(&args)?;
                    self.stack.push(result);
                }
                Instruction::PushFromFrame(index) => {
                    let binding = self
                        .frames
                        .last()
                        .and_then(|frame| frame.args.get(index as usize))
                        .cloned()
                        .ok_or_else(|| format!("no frame argument {}", index))?;
                    self.pending.push(binding);
                }
                Instruction::UseArg(slot) => {
                    let binding = self.pending.pop().ok_or("no pending argument")?;
                    self.params.entry(slot).or_default().push(binding);
                }
                Instruction::PopCtx => {
                    self.frames.pop().ok_or("no frame to pop")?;
                }
                Instruction::Pop => {
                    self.pop()?;
                }
                Instruction::Cache(slot) => {
                    let top = self.stack.last().cloned().ok_or("nothing to cache")?;
                    self.memo(slot)?.insert(slot, top);
                }
                Instruction::ClearCache(slot) => {
                    if let SlotKind::Parameter = self.kind(slot)? {
                        self.params.get_mut(&slot).and_then(Vec::pop);
                    } else {
                        self.memo(slot)?.remove(&slot);
                    }
                }
            }
        }

        Ok(Outcome {
            value: self.pop()?,
            calls: self.calls,
        })
    }

    fn kind(&self, slot: SlotId) -> Result<&'e SlotKind, String> {
        self.exe
            .slot(slot)
            .map(|slot| &slot.kind)
            .ok_or_else(|| format!("unknown slot {}", slot))
    }

    /// Memo table of a code slot: the run-wide cache, or for a `Local` slot
    /// the innermost active frame of its owning function.
    fn memo(&mut self, slot: SlotId) -> Result<&mut HashMap<SlotId, Value>, String> {
        let function = match self.kind(slot)? {
            SlotKind::Local { function, .. } => *function,
            _ => return Ok(&mut self.cache),
        };
        let address = self
            .exe
            .slot(function)
            .and_then(|slot| slot.code_address())
            .ok_or_else(|| format!("owner {} of {} has no code", function, slot))?;
        self.frames
            .iter_mut()
            .rev()
            .find(|frame| frame.function == address as usize)
            .map(|frame| &mut frame.memo)
            .ok_or_else(|| format!("no active call owns {}", slot))
    }

    fn pop(&mut self) -> Result<Value, String> {
        self.stack.pop().ok_or_else(|| "stack underflow".into())
    }

    /// Push the value of `slot`, or return the chunk address to jump to.
    fn reference(&mut self, slot: SlotId, pc: usize) -> Result<Option<usize>, String> {
        match self.kind(slot)? {
            SlotKind::Constant(constant) => self.stack.push(constant.into()),
            SlotKind::Predefined => {
                let name = self.exe.slot(slot).map(|s| s.label.as_str()).unwrap_or("");
                let value = self
                    .environment
                    .get(name)
                    .cloned()
                    .ok_or_else(|| format!("no value for {}", name))?;
                self.stack.push(value);
            }
            SlotKind::Parameter => {
                let binding = self
                    .params
                    .get(&slot)
                    .and_then(|bindings| bindings.last())
                    .cloned()
                    .ok_or_else(|| format!("unbound parameter {}", slot))?;
                match binding {
                    Binding::Value(value) => self.stack.push(value),
                    Binding::Slot(argument) => return self.reference(argument, pc),
                }
            }
            SlotKind::Code(address) | SlotKind::Local { address, .. } => {
                let memoized = self.memo(slot)?.get(&slot).cloned();
                match memoized {
                    Some(value) => self.stack.push(value),
                    None => {
                        self.returns.push(pc);
                        return Ok(Some(*address as usize));
                    }
                }
            }
            SlotKind::Native(_) => return Err(format!("reference to native slot {}", slot)),
        }
        Ok(None)
    }
}

//! In-crate SSA instruction module.
//!
//! Every function owns its parameters and at most one `entry` block.
//! Values are numbered across the whole module and typed, so the verifier
//! can check that each operand is defined earlier in the same function
//! and has the type its instruction expects.

use std::{collections::HashSet, fmt::Write};

use log::debug;

use crate::config::Config;

use super::{eval, Backend, BackendError, Evaluation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    Double,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    pub id: u32,
    pub ty: IrType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Const { dest: Value, value: f64 },
    FAdd { dest: Value, lhs: Value, rhs: Value },
    FSub { dest: Value, lhs: Value, rhs: Value },
    FMul { dest: Value, lhs: Value, rhs: Value },
    /// Unordered less-than: true when either side is NaN.
    FCmpUlt { dest: Value, lhs: Value, rhs: Value },
    UiToFp { dest: Value, operand: Value },
    Call { dest: Value, callee: FunctionId, args: Vec<Value> },
    Ret { value: Value },
}

impl Instruction {
    pub fn dest(&self) -> Option<Value> {
        match self {
            Instruction::Const { dest, .. }
            | Instruction::FAdd { dest, .. }
            | Instruction::FSub { dest, .. }
            | Instruction::FMul { dest, .. }
            | Instruction::FCmpUlt { dest, .. }
            | Instruction::UiToFp { dest, .. }
            | Instruction::Call { dest, .. } => Some(*dest),
            Instruction::Ret { .. } => None,
        }
    }

    /// Operands paired with the type each must have.
    fn operands(&self) -> Vec<(Value, IrType)> {
        match self {
            Instruction::Const { .. } => vec![],
            Instruction::FAdd { lhs, rhs, .. }
            | Instruction::FSub { lhs, rhs, .. }
            | Instruction::FMul { lhs, rhs, .. }
            | Instruction::FCmpUlt { lhs, rhs, .. } => {
                vec![(*lhs, IrType::Double), (*rhs, IrType::Double)]
            }
            Instruction::UiToFp { operand, .. } => vec![(*operand, IrType::Bool)],
            Instruction::Call { args, .. } => args.iter().map(|arg| (*arg, IrType::Double)).collect(),
            Instruction::Ret { value } => vec![(*value, IrType::Double)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<String>,
    pub param_values: Vec<Value>,
    /// `None` for a declaration.
    pub body: Option<Block>,
}

pub struct IrBackend {
    module_name: String,
    /// One slot per `FunctionId`; abandoned functions leave `None`.
    functions: Vec<Option<IrFunction>>,
    insert_point: Option<FunctionId>,
    next_value: u32,
    max_call_depth: usize,
}

impl Default for IrBackend {
    fn default() -> Self {
        IrBackend::new(&Config::default())
    }
}

impl IrBackend {
    pub fn new(config: &Config) -> Self {
        IrBackend {
            module_name: config.module_name.clone(),
            functions: vec![],
            insert_point: None,
            next_value: 0,
            max_call_depth: config.max_call_depth,
        }
    }

    pub fn get_function(&self, function: FunctionId) -> Option<&IrFunction> {
        self.functions.get(function.0 as usize).and_then(|slot| slot.as_ref())
    }

    /// Live functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &IrFunction)> {
        self.functions
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|f| (FunctionId(i as u32), f)))
    }

    pub fn get_max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Renders every live function.
    pub fn print_module(&self) -> String {
        let mut out = format!("; ModuleID = '{}'\n", self.module_name);
        for (id, _) in self.functions() {
            out.push('\n');
            out.push_str(&self.print_function(id));
            out.push('\n');
        }
        out
    }

    fn new_value(&mut self, ty: IrType) -> Value {
        let value = Value {
            id: self.next_value,
            ty,
        };
        self.next_value += 1;
        value
    }

    fn current_block(&mut self) -> Result<&mut Block, BackendError> {
        let function = self.insert_point.ok_or(BackendError::NoInsertPoint)?;
        self.functions
            .get_mut(function.0 as usize)
            .and_then(|slot| slot.as_mut())
            .and_then(|f| f.body.as_mut())
            .ok_or(BackendError::NoInsertPoint)
    }

    fn push(&mut self, instruction: Instruction) -> Result<(), BackendError> {
        self.current_block()?.instructions.push(instruction);
        Ok(())
    }

    fn emit_binary(
        &mut self,
        make: fn(Value, Value, Value) -> Instruction,
        dest_ty: IrType,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, BackendError> {
        self.current_block()?;
        let dest = self.new_value(dest_ty);
        self.push(make(dest, lhs, rhs))?;
        Ok(dest)
    }

    fn check_function(&self, function: FunctionId) -> Result<(), String> {
        let f = self
            .get_function(function)
            .ok_or_else(|| String::from("function was abandoned"))?;

        let Some(body) = &f.body else {
            return Ok(());
        };

        let mut defined: HashSet<Value> = f.param_values.iter().copied().collect();
        let count = body.instructions.len();

        for (i, instruction) in body.instructions.iter().enumerate() {
            for (operand, expected) in instruction.operands() {
                if !defined.contains(&operand) {
                    return Err(format!("%{} used before definition", operand.id));
                }
                if operand.ty != expected {
                    return Err(format!("%{} has type {:?}, expected {:?}", operand.id, operand.ty, expected));
                }
            }

            if let Instruction::Call { callee, args, .. } = instruction {
                let target = self
                    .get_function(*callee)
                    .ok_or_else(|| String::from("call to an abandoned function"))?;
                if target.params.len() != args.len() {
                    return Err(format!("call to @{} with wrong argument count", target.name));
                }
            }

            let is_last = i + 1 == count;
            match instruction {
                Instruction::Ret { .. } if !is_last => {
                    return Err(String::from("return in the middle of a block"));
                }
                Instruction::Ret { .. } => {}
                _ if is_last => return Err(String::from("block does not end in a return")),
                _ => {}
            }

            if let Some(dest) = instruction.dest() {
                defined.insert(dest);
            }
        }

        if count == 0 {
            return Err(String::from("empty entry block"));
        }

        Ok(())
    }
}

fn function_label(id: FunctionId, f: &IrFunction) -> String {
    if f.name.is_empty() {
        format!("@{}", id.0)
    } else {
        format!("@{}", f.name)
    }
}

/// Names parameters after their source names, suffixing repeats.
fn param_names(f: &IrFunction) -> Vec<(Value, String)> {
    let mut seen = HashSet::new();
    f.param_values
        .iter()
        .zip(&f.params)
        .map(|(value, name)| {
            let name = if seen.insert(name.as_str()) {
                name.clone()
            } else {
                format!("{}{}", name, value.id)
            };
            (*value, name)
        })
        .collect()
}

impl Backend for IrBackend {
    type Value = Value;
    type Function = FunctionId;

    fn emit_literal(&mut self, value: f64) -> Result<Value, BackendError> {
        self.current_block()?;
        let dest = self.new_value(IrType::Double);
        self.push(Instruction::Const { dest, value })?;
        Ok(dest)
    }

    fn emit_add(&mut self, lhs: Value, rhs: Value) -> Result<Value, BackendError> {
        self.emit_binary(|dest, lhs, rhs| Instruction::FAdd { dest, lhs, rhs }, IrType::Double, lhs, rhs)
    }

    fn emit_sub(&mut self, lhs: Value, rhs: Value) -> Result<Value, BackendError> {
        self.emit_binary(|dest, lhs, rhs| Instruction::FSub { dest, lhs, rhs }, IrType::Double, lhs, rhs)
    }

    fn emit_mul(&mut self, lhs: Value, rhs: Value) -> Result<Value, BackendError> {
        self.emit_binary(|dest, lhs, rhs| Instruction::FMul { dest, lhs, rhs }, IrType::Double, lhs, rhs)
    }

    fn emit_less_than_as_float(&mut self, lhs: Value, rhs: Value) -> Result<Value, BackendError> {
        let cmp = self.emit_binary(
            |dest, lhs, rhs| Instruction::FCmpUlt { dest, lhs, rhs },
            IrType::Bool,
            lhs,
            rhs,
        )?;
        let dest = self.new_value(IrType::Double);
        self.push(Instruction::UiToFp { dest, operand: cmp })?;
        Ok(dest)
    }

    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<FunctionId, BackendError> {
        if !name.is_empty() && self.lookup_function(name).is_some() {
            return Err(BackendError::DuplicateFunction(String::from(name)));
        }

        let param_values = params.iter().map(|_| self.new_value(IrType::Double)).collect();
        let id = FunctionId(self.functions.len() as u32);

        self.functions.push(Some(IrFunction {
            name: String::from(name),
            params: params.to_vec(),
            param_values,
            body: None,
        }));

        debug!("declared {} in module '{}'", name, self.module_name);
        Ok(id)
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        if name.is_empty() {
            return None;
        }

        self.functions().find(|(_, f)| f.name == name).map(|(id, _)| id)
    }

    fn function_has_body(&self, function: FunctionId) -> bool {
        self.get_function(function)
            .map(|f| f.body.is_some())
            .unwrap_or(false)
    }

    fn function_arity(&self, function: FunctionId) -> usize {
        self.get_function(function).map(|f| f.params.len()).unwrap_or(0)
    }

    fn function_params(&self, function: FunctionId) -> Vec<Value> {
        self.get_function(function)
            .map(|f| f.param_values.clone())
            .unwrap_or_default()
    }

    fn begin_function_body(&mut self, function: FunctionId) -> Result<(), BackendError> {
        let f = self
            .functions
            .get_mut(function.0 as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or(BackendError::StaleFunction)?;

        if f.body.is_some() {
            return Err(BackendError::AlreadyHasBody(f.name.clone()));
        }

        f.body = Some(Block {
            label: String::from("entry"),
            instructions: vec![],
        });
        self.insert_point = Some(function);
        Ok(())
    }

    fn emit_call(&mut self, function: FunctionId, args: &[Value]) -> Result<Value, BackendError> {
        if self.get_function(function).is_none() {
            return Err(BackendError::StaleFunction);
        }

        self.current_block()?;
        let dest = self.new_value(IrType::Double);
        self.push(Instruction::Call {
            dest,
            callee: function,
            args: args.to_vec(),
        })?;
        Ok(dest)
    }

    fn emit_return(&mut self, value: Value) -> Result<(), BackendError> {
        self.push(Instruction::Ret { value })
    }

    fn abandon_function(&mut self, function: FunctionId) {
        if let Some(slot) = self.functions.get_mut(function.0 as usize) {
            if let Some(f) = slot.take() {
                debug!("abandoned {:?} in module '{}'", f.name, self.module_name);
            }
        }
        if self.insert_point == Some(function) {
            self.insert_point = None;
        }
    }

    fn discard_body(&mut self, function: FunctionId) {
        if let Some(f) = self
            .functions
            .get_mut(function.0 as usize)
            .and_then(|slot| slot.as_mut())
        {
            if f.body.take().is_some() {
                debug!("discarded body of {:?} in module '{}'", f.name, self.module_name);
            }
        }
        if self.insert_point == Some(function) {
            self.insert_point = None;
        }
    }

    fn verify_function(&self, function: FunctionId) -> bool {
        match self.check_function(function) {
            Ok(()) => true,
            Err(reason) => {
                debug!("verification of function {:?} failed: {}", function, reason);
                false
            }
        }
    }

    fn print_function(&self, function: FunctionId) -> String {
        let Some(f) = self.get_function(function) else {
            return String::new();
        };

        let names = param_names(f);
        let name_of = |value: &Value| -> String {
            names
                .iter()
                .find(|(param, _)| param == value)
                .map(|(_, name)| format!("%{}", name))
                .unwrap_or_else(|| format!("%{}", value.id))
        };

        let signature = names
            .iter()
            .map(|(_, name)| format!("double %{}", name))
            .collect::<Vec<String>>()
            .join(", ");

        let label = function_label(function, f);

        let Some(body) = &f.body else {
            return format!("declare double {}({})", label, signature);
        };

        let mut out = String::new();
        let _ = writeln!(out, "define double {}({}) {{", label, signature);
        let _ = writeln!(out, "{}:", body.label);

        for instruction in &body.instructions {
            let line = match instruction {
                Instruction::Const { dest, value } => {
                    format!("{} = const double {:?}", name_of(dest), value)
                }
                Instruction::FAdd { dest, lhs, rhs } => {
                    format!("{} = fadd double {}, {}", name_of(dest), name_of(lhs), name_of(rhs))
                }
                Instruction::FSub { dest, lhs, rhs } => {
                    format!("{} = fsub double {}, {}", name_of(dest), name_of(lhs), name_of(rhs))
                }
                Instruction::FMul { dest, lhs, rhs } => {
                    format!("{} = fmul double {}, {}", name_of(dest), name_of(lhs), name_of(rhs))
                }
                Instruction::FCmpUlt { dest, lhs, rhs } => {
                    format!("{} = fcmp ult double {}, {}", name_of(dest), name_of(lhs), name_of(rhs))
                }
                Instruction::UiToFp { dest, operand } => {
                    format!("{} = uitofp i1 {} to double", name_of(dest), name_of(operand))
                }
                Instruction::Call { dest, callee, args } => {
                    let callee = self
                        .get_function(*callee)
                        .map(|target| function_label(*callee, target))
                        .unwrap_or_else(|| String::from("@<abandoned>"));
                    let args = args
                        .iter()
                        .map(|arg| format!("double {}", name_of(arg)))
                        .collect::<Vec<String>>()
                        .join(", ");
                    format!("{} = call double {}({})", name_of(dest), callee, args)
                }
                Instruction::Ret { value } => format!("ret double {}", name_of(value)),
            };
            let _ = writeln!(out, "  {}", line);
        }

        out.push('}');
        out
    }

    fn evaluate(&mut self, function: FunctionId) -> Result<Option<Evaluation>, BackendError> {
        eval::evaluate(self, function).map(Some)
    }
}

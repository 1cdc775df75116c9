//! Interpreter for `IrBackend` functions.
//!
//! Bodiless declarations resolve to a small table of host functions so that
//! `extern sin(x)` and friends can be called from evaluated expressions.

use std::{collections::HashMap, fmt::Write};

use log::debug;

use super::{
    ir::{FunctionId, Instruction, IrBackend, Value},
    BackendError, Evaluation,
};

/// Runs a parameterless function to completion.
pub fn evaluate(backend: &IrBackend, function: FunctionId) -> Result<Evaluation, BackendError> {
    let f = backend
        .get_function(function)
        .ok_or(BackendError::StaleFunction)?;

    if !f.params.is_empty() {
        return Err(BackendError::Evaluation(format!(
            "cannot evaluate {:?}: it takes {} parameters",
            f.name,
            f.params.len()
        )));
    }

    let mut machine = Machine {
        backend,
        output: String::new(),
        max_depth: backend.get_max_call_depth(),
    };

    let value = machine.call(function, &[], 0)?;
    debug!("evaluated function {:?} to {}", function, value);

    Ok(Evaluation {
        value,
        output: machine.output,
    })
}

struct Machine<'b> {
    backend: &'b IrBackend,
    output: String,
    max_depth: usize,
}

fn read(registers: &HashMap<u32, f64>, value: &Value) -> Result<f64, BackendError> {
    registers
        .get(&value.id)
        .copied()
        .ok_or_else(|| BackendError::Evaluation(format!("%{} read before it was written", value.id)))
}

impl Machine<'_> {
    fn call(&mut self, function: FunctionId, args: &[f64], depth: usize) -> Result<f64, BackendError> {
        if depth >= self.max_depth {
            return Err(BackendError::Evaluation(format!(
                "maximum call depth of {} exceeded",
                self.max_depth
            )));
        }

        let backend = self.backend;
        let f = backend
            .get_function(function)
            .ok_or(BackendError::StaleFunction)?;

        let Some(body) = &f.body else {
            return self.call_host(&f.name, args);
        };

        let mut registers: HashMap<u32, f64> = f
            .param_values
            .iter()
            .zip(args)
            .map(|(param, arg)| (param.id, *arg))
            .collect();

        for instruction in &body.instructions {
            let (dest, result) = match instruction {
                Instruction::Const { dest, value } => (dest, *value),
                Instruction::FAdd { dest, lhs, rhs } => {
                    (dest, read(&registers, lhs)? + read(&registers, rhs)?)
                }
                Instruction::FSub { dest, lhs, rhs } => {
                    (dest, read(&registers, lhs)? - read(&registers, rhs)?)
                }
                Instruction::FMul { dest, lhs, rhs } => {
                    (dest, read(&registers, lhs)? * read(&registers, rhs)?)
                }
                Instruction::FCmpUlt { dest, lhs, rhs } => {
                    let lhs = read(&registers, lhs)?;
                    let rhs = read(&registers, rhs)?;
                    // Unordered: NaN on either side compares true.
                    let result = if lhs >= rhs { 0.0 } else { 1.0 };
                    (dest, result)
                }
                Instruction::UiToFp { dest, operand } => (dest, read(&registers, operand)?),
                Instruction::Call { dest, callee, args } => {
                    let args = args
                        .iter()
                        .map(|arg| read(&registers, arg))
                        .collect::<Result<Vec<f64>, BackendError>>()?;
                    (dest, self.call(*callee, &args, depth + 1)?)
                }
                Instruction::Ret { value } => return read(&registers, value),
            };

            registers.insert(dest.id, result);
        }

        Err(BackendError::Evaluation(format!(
            "{:?} ended without returning",
            f.name
        )))
    }

    fn call_host(&mut self, name: &str, args: &[f64]) -> Result<f64, BackendError> {
        let value = match (name, args) {
            ("sin", [x]) => x.sin(),
            ("cos", [x]) => x.cos(),
            ("tan", [x]) => x.tan(),
            ("atan", [x]) => x.atan(),
            ("sqrt", [x]) => x.sqrt(),
            ("exp", [x]) => x.exp(),
            ("log", [x]) => x.ln(),
            ("fabs", [x]) => x.abs(),
            ("floor", [x]) => x.floor(),
            ("ceil", [x]) => x.ceil(),
            ("pow", [x, y]) => x.powf(*y),
            ("putchard", [x]) => {
                self.output.push(*x as u8 as char);
                0.0
            }
            ("printd", [x]) => {
                let _ = writeln!(self.output, "{:.6}", x);
                0.0
            }
            _ => {
                return Err(BackendError::Evaluation(format!(
                    "cannot resolve external function {:?} taking {} arguments",
                    name,
                    args.len()
                )))
            }
        };

        Ok(value)
    }
}

//! `Backend` over an LLVM module, built with inkwell.
//!
//! Only compiled with the `llvm` feature. Evaluation is not supported; the
//! generated module can be handed to an execution engine by the caller.

use inkwell::{
    builder::{Builder, BuilderError},
    context::Context,
    module::Module,
    types::BasicMetadataTypeEnum,
    values::{BasicMetadataValueEnum, FloatValue, FunctionValue},
    FloatPredicate,
};

use super::{Backend, BackendError};

pub struct LlvmBackend<'a> {
    context: &'a Context,
    module: Module<'a>,
    builder: Builder<'a>,
}

fn builder_error(error: BuilderError) -> BackendError {
    BackendError::Builder(error.to_string())
}

impl<'a> LlvmBackend<'a> {
    pub fn new(context: &'a Context, module_name: &str) -> Self {
        LlvmBackend {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
        }
    }

    pub fn get_module(&self) -> &Module<'a> {
        &self.module
    }

    pub fn print_module(&self) -> String {
        self.module.print_to_string().to_string_lossy().into_owned()
    }
}

impl<'a> Backend for LlvmBackend<'a> {
    type Value = FloatValue<'a>;
    type Function = FunctionValue<'a>;

    fn emit_literal(&mut self, value: f64) -> Result<FloatValue<'a>, BackendError> {
        Ok(self.context.f64_type().const_float(value))
    }

    fn emit_add(&mut self, lhs: FloatValue<'a>, rhs: FloatValue<'a>) -> Result<FloatValue<'a>, BackendError> {
        self.builder
            .build_float_add(lhs, rhs, "addtmp")
            .map_err(builder_error)
    }

    fn emit_sub(&mut self, lhs: FloatValue<'a>, rhs: FloatValue<'a>) -> Result<FloatValue<'a>, BackendError> {
        self.builder
            .build_float_sub(lhs, rhs, "subtmp")
            .map_err(builder_error)
    }

    fn emit_mul(&mut self, lhs: FloatValue<'a>, rhs: FloatValue<'a>) -> Result<FloatValue<'a>, BackendError> {
        self.builder
            .build_float_mul(lhs, rhs, "multmp")
            .map_err(builder_error)
    }

    fn emit_less_than_as_float(
        &mut self,
        lhs: FloatValue<'a>,
        rhs: FloatValue<'a>,
    ) -> Result<FloatValue<'a>, BackendError> {
        let cmp = self
            .builder
            .build_float_compare(FloatPredicate::ULT, lhs, rhs, "cmptmp")
            .map_err(builder_error)?;

        self.builder
            .build_unsigned_int_to_float(cmp, self.context.f64_type(), "booltmp")
            .map_err(builder_error)
    }

    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<FunctionValue<'a>, BackendError> {
        let f64_type = self.context.f64_type();
        let param_types: Vec<BasicMetadataTypeEnum<'a>> = params.iter().map(|_| f64_type.into()).collect();

        let fn_type = f64_type.fn_type(&param_types, false);
        let function = self.module.add_function(name, fn_type, None);

        for (param, param_name) in function.get_param_iter().zip(params) {
            param.into_float_value().set_name(param_name);
        }

        Ok(function)
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionValue<'a>> {
        if name.is_empty() {
            return None;
        }

        self.module.get_function(name)
    }

    fn function_has_body(&self, function: FunctionValue<'a>) -> bool {
        function.count_basic_blocks() > 0
    }

    fn function_arity(&self, function: FunctionValue<'a>) -> usize {
        function.count_params() as usize
    }

    fn function_params(&self, function: FunctionValue<'a>) -> Vec<FloatValue<'a>> {
        function
            .get_param_iter()
            .map(|param| param.into_float_value())
            .collect()
    }

    fn begin_function_body(&mut self, function: FunctionValue<'a>) -> Result<(), BackendError> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        Ok(())
    }

    fn emit_call(
        &mut self,
        function: FunctionValue<'a>,
        args: &[FloatValue<'a>],
    ) -> Result<FloatValue<'a>, BackendError> {
        let args: Vec<BasicMetadataValueEnum<'a>> = args.iter().map(|arg| (*arg).into()).collect();

        self.builder
            .build_call(function, &args, "calltmp")
            .map_err(builder_error)?
            .try_as_basic_value()
            .left()
            .map(|value| value.into_float_value())
            .ok_or_else(|| BackendError::Builder(String::from("call produced no value")))
    }

    fn emit_return(&mut self, value: FloatValue<'a>) -> Result<(), BackendError> {
        self.builder
            .build_return(Some(&value))
            .map(|_| ())
            .map_err(builder_error)
    }

    fn abandon_function(&mut self, function: FunctionValue<'a>) {
        unsafe {
            function.delete();
        }
    }

    fn discard_body(&mut self, function: FunctionValue<'a>) {
        self.builder.clear_insertion_position();
        for block in function.get_basic_blocks() {
            // Only fails for a block without a parent.
            let _ = unsafe { block.delete() };
        }
    }

    fn verify_function(&self, function: FunctionValue<'a>) -> bool {
        function.verify(false)
    }

    fn print_function(&self, function: FunctionValue<'a>) -> String {
        function.print_to_string().to_string_lossy().into_owned()
    }
}

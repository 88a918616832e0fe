//! The functional core: step parsing, expression evaluation, execution and
//! assembly of a compact program.
pub mod assemble;
pub mod ast;
pub mod expr;
pub mod lexer;
pub mod script_parser;
pub mod vm;

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::BlueprintError;
use crate::model::{Block, Limits, Scope};
use ast::Program;
use vm::Vm;

/// Execute a parsed program from an empty scope with a fresh budget.
pub fn run(program: &Program, catalog: &Catalog, limits: Limits) -> Result<Vec<Block>, BlueprintError> {
    let mut vm = Vm::new(&program.defs, catalog, limits);
    vm.execute_steps(&program.steps, &Scope::new(), 0)?;

    let budget = vm.budget();
    debug!(
        defs = program.defs.len(),
        steps = budget.executed_steps,
        calls = budget.calls,
        "program executed"
    );
    Ok(vm.into_blocks())
}

//! Interpreter for a parsed `Program`.
//!
//! Work is bounded by three ceilings shared across the whole call tree:
//! nesting depth, total steps executed, and total calls made. Reaching the
//! block cap is not an error; execution just stops adding output.

use tracing::trace;

use super::ast::{Defs, Expr, Placement, Step};
use super::expr::{coerce_argument, eval_coord, eval_int};
use crate::catalog::{Catalog, normalize};
use crate::error::{BlueprintError, BudgetExceeded};
use crate::model::{Block, Limits, Scope, ScopeValue};

/// Counters for one expansion. Never reset while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecBudget {
    pub executed_steps: u32,
    pub calls: u32,
}

pub struct Vm<'a> {
    defs: &'a Defs,
    catalog: &'a Catalog,
    limits: Limits,
    budget: ExecBudget,
    out: Vec<Block>,
}

impl<'a> Vm<'a> {
    pub fn new(defs: &'a Defs, catalog: &'a Catalog, limits: Limits) -> Self {
        Self {
            defs,
            catalog,
            limits,
            budget: ExecBudget::default(),
            out: Vec::new(),
        }
    }

    pub fn budget(&self) -> ExecBudget {
        self.budget
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.out
    }

    fn is_full(&self) -> bool {
        self.out.len() >= self.limits.max_blocks
    }

    pub fn execute_steps(
        &mut self,
        steps: &[Step],
        scope: &Scope,
        depth: usize,
    ) -> Result<(), BlueprintError> {
        if depth > self.limits.max_call_depth {
            return Err(BudgetExceeded::CallDepth {
                depth,
                limit: self.limits.max_call_depth,
            }
            .into());
        }

        for step in steps {
            if self.is_full() {
                return Ok(());
            }

            self.budget.executed_steps += 1;
            if self.budget.executed_steps > self.limits.max_executed_steps {
                return Err(BudgetExceeded::Steps {
                    limit: self.limits.max_executed_steps,
                }
                .into());
            }

            match step {
                Step::Place(placement) => self.place(placement, scope)?,
                Step::For {
                    var,
                    from,
                    to,
                    stride,
                    body,
                } => self.run_for(var, from, to, stride, body, scope, depth)?,
                Step::Call { name, args } => self.call(name, args, scope, depth)?,
            }
        }
        Ok(())
    }

    fn place(&mut self, p: &Placement, scope: &Scope) -> Result<(), BlueprintError> {
        let block = Block {
            x: eval_coord(&p.x, scope, "place.x")?,
            y: eval_coord(&p.y, scope, "place.y")?,
            z: eval_coord(&p.z, scope, "place.z")?,
            block_type: normalize(&p.block_type.to_string(), scope, self.catalog),
        };
        self.out.push(block);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_for(
        &mut self,
        var: &str,
        from: &Expr,
        to: &Expr,
        stride: &Expr,
        body: &[Step],
        scope: &Scope,
        depth: usize,
    ) -> Result<(), BlueprintError> {
        let from = eval_int(from, scope, "for.from")?;
        let to = eval_int(to, scope, "for.to")?;
        let step = eval_int(stride, scope, "for.step")?;
        if step == 0 {
            return Err(BlueprintError::structure("for.step", "step must not be 0"));
        }
        let runs = (step > 0 && from <= to) || (step < 0 && from >= to);
        if runs && depth + 1 > self.limits.max_call_depth {
            return Err(BudgetExceeded::CallDepth {
                depth: depth + 1,
                limit: self.limits.max_call_depth,
            }
            .into());
        }
        // An empty body can never produce output or consume budget.
        if body.is_empty() {
            return Ok(());
        }

        trace!(var, from, to, step, depth, "for");
        let mut i = from;
        while (step > 0 && i <= to) || (step < 0 && i >= to) {
            let child = scope.child([(var.to_string(), ScopeValue::Int(i))]);
            self.execute_steps(body, &child, depth + 1)?;
            if self.is_full() {
                break;
            }
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(())
    }

    fn call(
        &mut self,
        name: &str,
        args: &[(String, Expr)],
        scope: &Scope,
        depth: usize,
    ) -> Result<(), BlueprintError> {
        self.budget.calls += 1;
        if self.budget.calls > self.limits.max_calls {
            return Err(BudgetExceeded::Calls {
                limit: self.limits.max_calls,
            }
            .into());
        }

        let defs = self.defs;
        let def = defs
            .get(name)
            .ok_or_else(|| BlueprintError::UnknownDef(name.to_string()))?;

        let bindings: Vec<(String, ScopeValue)> = if def.params.is_empty() {
            args.iter()
                .map(|(key, raw)| (key.clone(), coerce_argument(raw, scope)))
                .collect()
        } else {
            def.params
                .iter()
                .map(|param| {
                    let raw = args
                        .iter()
                        .find(|(key, _)| key == param)
                        .map(|(_, raw)| raw)
                        .ok_or_else(|| BlueprintError::MissingParam {
                            def: def.name.clone(),
                            param: param.clone(),
                        })?;
                    Ok((param.clone(), coerce_argument(raw, scope)))
                })
                .collect::<Result<_, BlueprintError>>()?
        };

        trace!(name, depth, args = bindings.len(), "call");
        let child = scope.child(bindings);
        self.execute_steps(&def.steps, &child, depth + 1)
    }
}

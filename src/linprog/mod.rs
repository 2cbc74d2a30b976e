/*! A small linear-programming façade

Analyses that phrase blocking as an optimization problem build their
model here: a [VarMapper] hands out dense variable ids for
structured keys, [LinearExpression]s accumulate (coefficient,
variable) terms by value, and a [LinearProgram] collects the
`<=`-inequalities plus one objective. Solving goes through the
[Solver] trait so the backing implementation stays swappable; the
default is the pure-Rust simplex implementation from `minilp`.

All variables are implicitly non-negative rationals. Integrality is
not enforced; callers that need an integer bound round the optimum
up, which is sound for maximization objectives.
*/

use std::collections::HashMap;

use auto_impl::auto_impl;
use thiserror::Error;

use crate::model::TaskId;

/// Dense id of one LP decision variable.
pub type VarId = usize;

/// How a blocking request is accounted for: by token acquisition
/// order, or by the underlying resource-sharing mechanism (RSM).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlockingKind {
    Token,
    Rsm,
}

/// Structured key of one decision variable: a specific request
/// instance of a specific task, in one accounting category.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VarKey {
    /// The task issuing the potentially blocking request.
    pub task: TaskId,
    /// Index of the outermost critical section within that task.
    pub section: usize,
    /// Which of the overlapping jobs issues it.
    pub job: u64,
    pub kind: BlockingKind,
}

/// Allocates a dense [VarId] per distinct [VarKey].
///
/// Ids are handed out lazily on first lookup. Once sealed, looking
/// up a key that was never allocated is a programming error and
/// asserts.
#[derive(Debug, Default)]
pub struct VarMapper {
    ids: HashMap<VarKey, VarId>,
    sealed: bool,
}

impl VarMapper {
    pub fn new() -> Self {
        Default::default()
    }

    /// The id for `key`, allocating a fresh one if necessary.
    pub fn var(&mut self, key: VarKey) -> VarId {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        assert!(!self.sealed, "variable allocation after sealing");
        let id = self.ids.len();
        self.ids.insert(key, id);
        id
    }

    /// The id for a key that must already have been allocated.
    pub fn lookup(&self, key: VarKey) -> VarId {
        match self.ids.get(&key) {
            Some(&id) => id,
            None => panic!("lookup of unallocated variable {:?}", key),
        }
    }

    /// Freeze the mapping; all constraint emission and solving must
    /// happen on a sealed mapper.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn num_vars(&self) -> usize {
        self.ids.len()
    }
}

/// A linear expression as owned (coefficient, variable) terms. The
/// same variable may appear in several terms; consumers sum the
/// coefficients.
#[derive(Debug, Default, Clone)]
pub struct LinearExpression {
    terms: Vec<(f64, VarId)>,
}

impl LinearExpression {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_term(&mut self, coefficient: f64, var: VarId) {
        self.terms.push((coefficient, var));
    }

    pub fn terms(&self) -> &[(f64, VarId)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One LP instance: `<=`-inequalities over non-negative variables
/// plus an objective expression.
#[derive(Debug, Default)]
pub struct LinearProgram {
    objective: LinearExpression,
    constraints: Vec<(LinearExpression, f64)>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_objective(&mut self, objective: LinearExpression) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinearExpression {
        &self.objective
    }

    /// Register the inequality `expression <= bound`.
    pub fn add_inequality(&mut self, expression: LinearExpression, bound: f64) {
        self.constraints.push((expression, bound));
    }

    pub fn constraints(&self) -> &[(LinearExpression, f64)] {
        &self.constraints
    }
}

/// An optimal solution: the objective value and one value per
/// allocated variable.
#[derive(Debug, Clone)]
pub struct Assignment {
    objective: f64,
    values: Vec<f64>,
}

impl Assignment {
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var]
    }
}

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum SolverError {
    #[error("the linear program is infeasible")]
    Infeasible,
    #[error("the linear program is unbounded")]
    Unbounded,
}

/// The solver boundary. Implementations maximize the objective over
/// non-negative variables subject to the registered inequalities.
#[auto_impl(&, Box)]
pub trait Solver {
    fn maximize(&self, lp: &LinearProgram, num_vars: usize) -> Result<Assignment, SolverError>;
}

/// [Solver] backed by the `minilp` simplex implementation.
#[derive(Debug, Default)]
pub struct SimplexSolver;

impl SimplexSolver {
    pub fn new() -> Self {
        SimplexSolver
    }

    // minilp expects each variable at most once per expression
    fn accumulate(expr: &LinearExpression, num_vars: usize) -> Vec<f64> {
        let mut coeffs = vec![0.0; num_vars];
        for &(c, v) in expr.terms() {
            coeffs[v] += c;
        }
        coeffs
    }
}

impl Solver for SimplexSolver {
    fn maximize(&self, lp: &LinearProgram, num_vars: usize) -> Result<Assignment, SolverError> {
        let mut problem = minilp::Problem::new(minilp::OptimizationDirection::Maximize);

        let objective = Self::accumulate(lp.objective(), num_vars);
        let vars: Vec<minilp::Variable> = objective
            .iter()
            .map(|&c| problem.add_var(c, (0.0, f64::INFINITY)))
            .collect();

        for (expr, bound) in lp.constraints() {
            if expr.is_empty() {
                // trivially satisfied; all bounds are non-negative
                continue;
            }
            let mut lhs = minilp::LinearExpr::empty();
            for (v, &c) in Self::accumulate(expr, num_vars).iter().enumerate() {
                if c != 0.0 {
                    lhs.add(vars[v], c);
                }
            }
            problem.add_constraint(lhs, minilp::ComparisonOp::Le, *bound);
        }

        match problem.solve() {
            Ok(solution) => Ok(Assignment {
                objective: solution.objective(),
                values: vars.iter().map(|&v| solution[v]).collect(),
            }),
            Err(minilp::Error::Infeasible) => Err(SolverError::Infeasible),
            Err(minilp::Error::Unbounded) => Err(SolverError::Unbounded),
        }
    }
}

#[cfg(test)]
mod tests;

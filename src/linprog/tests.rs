use assert_approx_eq::assert_approx_eq;

use super::*;

fn key(task: usize, section: usize, job: u64, kind: BlockingKind) -> VarKey {
    VarKey {
        task,
        section,
        job,
        kind,
    }
}

#[test]
fn mapper_hands_out_dense_ids_once() {
    let mut mapper = VarMapper::new();
    let a = mapper.var(key(0, 0, 0, BlockingKind::Token));
    let b = mapper.var(key(0, 0, 0, BlockingKind::Rsm));
    let c = mapper.var(key(1, 2, 1, BlockingKind::Token));

    assert_eq!((a, b, c), (0, 1, 2));
    assert_eq!(mapper.num_vars(), 3);

    // repeated lookups are idempotent
    assert_eq!(mapper.var(key(0, 0, 0, BlockingKind::Rsm)), b);

    mapper.seal();
    assert_eq!(mapper.lookup(key(1, 2, 1, BlockingKind::Token)), c);
    // sealed mappers still answer lookups of known keys via var()
    assert_eq!(mapper.var(key(0, 0, 0, BlockingKind::Token)), a);
}

#[test]
#[should_panic(expected = "after sealing")]
fn sealed_mapper_rejects_new_keys() {
    let mut mapper = VarMapper::new();
    mapper.var(key(0, 0, 0, BlockingKind::Token));
    mapper.seal();
    mapper.var(key(5, 0, 0, BlockingKind::Token));
}

#[test]
#[should_panic(expected = "unallocated")]
fn lookup_of_unknown_key_is_a_contract_violation() {
    let mapper = VarMapper::new();
    mapper.lookup(key(0, 0, 0, BlockingKind::Rsm));
}

#[test]
fn simplex_finds_the_optimum() {
    // maximize x + 2y subject to x + y <= 4, y <= 3
    let mut mapper = VarMapper::new();
    let x = mapper.var(key(0, 0, 0, BlockingKind::Token));
    let y = mapper.var(key(0, 0, 0, BlockingKind::Rsm));
    mapper.seal();

    let mut objective = LinearExpression::new();
    objective.add_term(1.0, x);
    objective.add_term(2.0, y);

    let mut lp = LinearProgram::new();
    lp.set_objective(objective);

    let mut c1 = LinearExpression::new();
    c1.add_term(1.0, x);
    c1.add_term(1.0, y);
    lp.add_inequality(c1, 4.0);

    let mut c2 = LinearExpression::new();
    c2.add_term(1.0, y);
    lp.add_inequality(c2, 3.0);

    let solution = SimplexSolver::new()
        .maximize(&lp, mapper.num_vars())
        .expect("bounded and feasible");

    assert_approx_eq!(solution.objective(), 7.0);
    assert_approx_eq!(solution.value(x), 1.0);
    assert_approx_eq!(solution.value(y), 3.0);
}

#[test]
fn repeated_terms_accumulate() {
    // maximize x + x subject to x <= 2 is the same as maximizing 2x
    let mut mapper = VarMapper::new();
    let x = mapper.var(key(0, 0, 0, BlockingKind::Token));
    mapper.seal();

    let mut objective = LinearExpression::new();
    objective.add_term(1.0, x);
    objective.add_term(1.0, x);

    let mut lp = LinearProgram::new();
    lp.set_objective(objective);

    let mut c = LinearExpression::new();
    c.add_term(1.0, x);
    lp.add_inequality(c, 2.0);

    let solution = SimplexSolver::new()
        .maximize(&lp, mapper.num_vars())
        .expect("bounded and feasible");
    assert_approx_eq!(solution.objective(), 4.0);
}

#[test]
fn infeasible_programs_are_reported() {
    let mut mapper = VarMapper::new();
    let x = mapper.var(key(0, 0, 0, BlockingKind::Token));
    mapper.seal();

    let mut lp = LinearProgram::new();
    let mut objective = LinearExpression::new();
    objective.add_term(1.0, x);
    lp.set_objective(objective);

    // x <= -1 contradicts x >= 0
    let mut c = LinearExpression::new();
    c.add_term(1.0, x);
    lp.add_inequality(c, -1.0);

    let result = SimplexSolver::new().maximize(&lp, mapper.num_vars());
    assert_eq!(result.unwrap_err(), SolverError::Infeasible);
}

#[test]
fn unconstrained_objective_is_unbounded() {
    let mut mapper = VarMapper::new();
    let x = mapper.var(key(0, 0, 0, BlockingKind::Token));
    mapper.seal();

    let mut lp = LinearProgram::new();
    let mut objective = LinearExpression::new();
    objective.add_term(1.0, x);
    lp.set_objective(objective);

    let result = SimplexSolver::new().maximize(&lp, mapper.num_vars());
    assert_eq!(result.unwrap_err(), SolverError::Unbounded);
}

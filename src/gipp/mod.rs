/*! Blocking bounds for the Group Independence-Preserving Protocol

The GIPP serializes access within each resource group through a
k-FIFO token lock and an underlying resource-sharing mechanism
(RSM). Its analysis is not closed-form: for each task, an LP is
built whose variables say, for every outermost critical section of
every other task and every job that can overlap, whether that
request blocks via token acquisition or via the RSM. The objective
maximizes total blocking length subject to the protocol's
constraint families, so the rounded-up optimum is a sound worst-case
bound; the LP relaxation of the underlying integer program can only
increase it.

Every task's LP is independent: variables, constraints, and solver
state are created per task and dropped when its bound is recorded.
*/

use std::cmp::min;

use itertools::Itertools;

use crate::bounds::{BlockingBounds, Interference};
use crate::linprog::{
    BlockingKind, LinearExpression, LinearProgram, SimplexSolver, Solver, VarKey, VarMapper,
};
use crate::model::{Task, TaskSet};
use crate::nested::{group_of, possibly_conflicting, resource_groups, CriticalSections, LockSet};
use crate::time::divide_with_ceil;

/// How many jobs of `tx` can overlap a single job of `ti`.
fn max_overlapping_jobs(ti: &Task, tx: &Task) -> u64 {
    divide_with_ceil(ti.response() + tx.response(), ti.period())
}

/// Number of outermost sections of each task that lock into each
/// group, indexed `[group][task]`.
fn count_outermost_per_group(
    sections: &[CriticalSections],
    groups: &[LockSet],
) -> Vec<Vec<u64>> {
    let mut phi = vec![vec![0; sections.len()]; groups.len()];

    for (x, css) in sections.iter().enumerate() {
        for y in css.outermost() {
            let g = group_of(groups, css.sections()[y].resource())
                .expect("every referenced resource belongs to a group");
            phi[g][x] += 1;
        }
    }

    phi
}

/// Number of tasks of each cluster competing for each group,
/// indexed `[cluster][group]`.
fn count_competing_tasks(ts: &TaskSet, phi: &[Vec<u64>]) -> Vec<Vec<u64>> {
    let mut beta = vec![vec![0; phi.len()]; ts.num_clusters()];

    for (x, tsk) in ts.tasks().iter().enumerate() {
        for (g, per_task) in phi.iter().enumerate() {
            if per_task[x] > 0 {
                beta[tsk.cluster()][g] += 1;
            }
        }
    }

    beta
}

struct TaskAnalysis<'a> {
    ts: &'a TaskSet,
    sections: &'a [CriticalSections],
    groups: &'a [LockSet],
    phi: &'a [Vec<u64>],
    beta: &'a [Vec<u64>],
    cluster_size: u64,
    tsk: &'a Task,
    mapper: VarMapper,
}

impl<'a> TaskAnalysis<'a> {
    /// Allocate both decision variables for every request instance
    /// that can overlap a job of the task under analysis, then seal.
    fn configure(&mut self) {
        for (x, tx) in self.ts.tasks().iter().enumerate() {
            if x == self.tsk.id() {
                continue;
            }
            let jobs = max_overlapping_jobs(self.tsk, tx);
            for y in self.sections[x].outermost() {
                for v in 0..jobs {
                    for kind in [BlockingKind::Token, BlockingKind::Rsm] {
                        self.mapper.var(VarKey {
                            task: x,
                            section: y,
                            job: v,
                            kind,
                        });
                    }
                }
            }
        }
        self.mapper.seal();
    }

    /// Visit every allocated (task, section, job) request instance.
    fn for_each_instance(&self, mut f: impl FnMut(usize, usize, u64)) {
        for (x, tx) in self.ts.tasks().iter().enumerate() {
            if x == self.tsk.id() {
                continue;
            }
            let jobs = max_overlapping_jobs(self.tsk, tx);
            for y in self.sections[x].outermost() {
                for v in 0..jobs {
                    f(x, y, v);
                }
            }
        }
    }

    fn var(&self, task: usize, section: usize, job: u64, kind: BlockingKind) -> usize {
        self.mapper.lookup(VarKey {
            task,
            section,
            job,
            kind,
        })
    }

    fn group_of_section(&self, task: usize, section: usize) -> usize {
        group_of(self.groups, self.sections[task].sections()[section].resource())
            .expect("every referenced resource belongs to a group")
    }

    /// Total blocking length across both accounting categories.
    fn objective(&self) -> LinearExpression {
        let mut expr = LinearExpression::new();
        self.for_each_instance(|x, y, v| {
            let length = self.sections[x].sections()[y].length() as f64;
            expr.add_term(length, self.var(x, y, v, BlockingKind::Token));
            expr.add_term(length, self.var(x, y, v, BlockingKind::Rsm));
        });
        expr
    }

    /// Each request instance blocks at most once, in one category.
    fn constrain_no_double_counting(&self, lp: &mut LinearProgram) {
        self.for_each_instance(|x, y, v| {
            let mut expr = LinearExpression::new();
            expr.add_term(1.0, self.var(x, y, v, BlockingKind::Token));
            expr.add_term(1.0, self.var(x, y, v, BlockingKind::Rsm));
            lp.add_inequality(expr, 1.0);
        });
    }

    /// Per other task and group: token blocking is limited by how
    /// often the task under analysis waits for that group's token.
    fn constrain_token_per_task(&self, lp: &mut LinearProgram) {
        let i = self.tsk.id();

        for x in 0..self.ts.len() {
            if x == i {
                continue;
            }
            for g in 0..self.groups.len() {
                let mut expr = LinearExpression::new();
                self.for_each_instance(|xx, y, v| {
                    if xx == x && self.group_of_section(x, y) == g {
                        expr.add_term(1.0, self.var(x, y, v, BlockingKind::Token));
                    }
                });
                if !expr.is_empty() {
                    lp.add_inequality(expr, self.phi[g][i] as f64);
                }
            }
        }
    }

    /// The per-cluster scaling factor for aggregate token and RSM
    /// blocking: within the task's own cluster one competitor slot
    /// is taken by the task itself.
    fn cluster_factor(&self, cluster: usize, g: usize) -> u64 {
        let competing = self.beta[cluster][g];
        if cluster == self.tsk.cluster() {
            min(self.cluster_size - 1, competing.saturating_sub(1))
        } else {
            min(self.cluster_size, competing)
        }
    }

    /// Per cluster and group: aggregate blocking in one accounting
    /// category is limited by the competitor slots of that cluster.
    fn constrain_per_cluster(&self, lp: &mut LinearProgram, kind: BlockingKind) {
        let i = self.tsk.id();

        for cluster in 0..self.ts.num_clusters() {
            for g in 0..self.groups.len() {
                let mut expr = LinearExpression::new();
                self.for_each_instance(|x, y, v| {
                    if self.ts.tasks()[x].cluster() == cluster
                        && self.group_of_section(x, y) == g
                    {
                        expr.add_term(1.0, self.var(x, y, v, kind));
                    }
                });
                if !expr.is_empty() {
                    let bound = self.cluster_factor(cluster, g) * self.phi[g][i];
                    lp.add_inequality(expr, bound as f64);
                }
            }
        }
    }

    /// Detailed RSM bound: for every distinct lock-set closure `s`
    /// acquired by other tasks, the requests staying within `s` can
    /// RSM-block at most once per possibly-conflicting outermost
    /// section of the task under analysis.
    fn constrain_rsm_conflicts(&self, lp: &mut LinearProgram) {
        let i = self.tsk.id();

        let closures: Vec<LockSet> = self
            .sections
            .iter()
            .enumerate()
            .filter(|&(x, _)| x != i)
            .flat_map(|(_, css)| css.outermost().map(|y| css.nested_closure(y)))
            .unique()
            .collect();

        for s in &closures {
            let conflicting = self.sections[i]
                .outermost()
                .filter(|&y| possibly_conflicting(&self.sections[i].nested_closure(y), s, self.sections))
                .count();

            let mut expr = LinearExpression::new();
            self.for_each_instance(|x, y, v| {
                if self.sections[x].is_within(y, s) {
                    expr.add_term(1.0, self.var(x, y, v, BlockingKind::Rsm));
                }
            });
            if !expr.is_empty() {
                lp.add_inequality(expr, conflicting as f64);
            }
        }
    }

    fn build_program(&self) -> LinearProgram {
        let mut lp = LinearProgram::new();
        lp.set_objective(self.objective());
        self.constrain_no_double_counting(&mut lp);
        self.constrain_token_per_task(&mut lp);
        self.constrain_per_cluster(&mut lp, BlockingKind::Token);
        self.constrain_per_cluster(&mut lp, BlockingKind::Rsm);
        self.constrain_rsm_conflicts(&mut lp);
        lp
    }

    fn solve(&self, solver: &impl Solver) -> Interference {
        if self.mapper.num_vars() == 0 {
            return Interference::default();
        }

        let lp = self.build_program();

        // the all-zero assignment satisfies every constraint, so a
        // failed solve indicates a modeling bug
        let solution = solver
            .maximize(&lp, self.mapper.num_vars())
            .expect("blocking LP must be feasible and bounded");

        let total_length = solution.objective().max(0.0).ceil() as u64;
        let events: f64 = (0..self.mapper.num_vars())
            .map(|v| solution.value(v))
            .sum();

        Interference::new(total_length, events.max(0.0).ceil() as u64)
    }
}

/// Blocking bounds under the GIPP, using the default simplex solver.
///
/// `sections` holds the nesting-aware critical sections of each
/// task, aligned with the task set; `cluster_size` is the number of
/// processors per cluster.
pub fn gipp_bounds(
    ts: &TaskSet,
    sections: &[CriticalSections],
    cluster_size: u64,
) -> BlockingBounds {
    gipp_bounds_with_solver(ts, sections, cluster_size, &SimplexSolver::new())
}

/// [gipp_bounds] with a caller-provided LP solver.
pub fn gipp_bounds_with_solver(
    ts: &TaskSet,
    sections: &[CriticalSections],
    cluster_size: u64,
    solver: &impl Solver,
) -> BlockingBounds {
    assert_eq!(ts.len(), sections.len());
    assert!(cluster_size > 0);

    let groups = resource_groups(sections);
    let phi = count_outermost_per_group(sections, &groups);
    let beta = count_competing_tasks(ts, &phi);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut analysis = TaskAnalysis {
            ts,
            sections,
            groups: &groups,
            phi: &phi,
            beta: &beta,
            cluster_size,
            tsk,
            mapper: VarMapper::new(),
        };
        analysis.configure();
        results[i] = analysis.solve(solver);
    }

    results
}

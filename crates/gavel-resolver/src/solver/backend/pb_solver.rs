use std::time::{Duration, Instant};

use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::Signed;

use super::constraint::{Comparison, Literal, Normalized, PbConstraint};
use super::decisions::Decisions;
use super::{BackendError, Objective, PseudoBooleanBackend};

/// How many search steps pass between two clock reads
const DEADLINE_CHECK_INTERVAL: u64 = 64;

#[inline]
fn literal_index(literal: Literal) -> usize {
    2 * literal.unsigned_abs() as usize + usize::from(literal < 0)
}

/// A decision on the search stack
struct Frame {
    trail_len: usize,
    literal: Literal,
    flipped: bool,
}

/// Built-in pseudo-boolean solver.
///
/// Constraints are kept in normal form (`sum(c * l) >= d`, positive `c`).
/// Each constraint tracks its slack: the coefficient sum of literals that
/// are not false, minus the degree. Negative slack is a conflict; an
/// unassigned literal whose coefficient exceeds the slack is implied.
///
/// Search is chronological backtracking over decisions. Objective literals
/// are branched on first, heaviest first and true first; every other
/// variable is tried false first. Optimization is a linear search: after
/// each model the constraint `objective >= value + 1` is added and search
/// restarts, until no better model exists.
pub struct PbSolver {
    num_vars: usize,
    constraints: Vec<PbConstraint>,
    /// Indexed by [`literal_index`]: (constraint, term) pairs containing the literal
    occurrences: Vec<Vec<(usize, usize)>>,
    objective: Objective,
    timeout: Option<Duration>,
    outcome: Option<bool>,
    model: Option<Vec<Literal>>,
    decisions: Decisions,
    slack: Vec<BigInt>,
}

impl PbSolver {
    pub fn new() -> Self {
        Self {
            num_vars: 0,
            constraints: Vec::new(),
            occurrences: vec![Vec::new(); 2],
            objective: Objective::new(),
            timeout: None,
            outcome: None,
            model: None,
            decisions: Decisions::default(),
            slack: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn constraints(&self) -> &[PbConstraint] {
        &self.constraints
    }

    fn check_literals<'a, I>(&self, literals: I) -> Result<(), BackendError>
    where
        I: IntoIterator<Item = &'a Literal>,
    {
        for &literal in literals {
            if literal == 0 || literal.unsigned_abs() as usize > self.num_vars {
                return Err(BackendError::UnknownVariable(literal));
            }
        }
        Ok(())
    }

    fn push_constraint(&mut self, constraint: PbConstraint) {
        let index = self.constraints.len();
        for (term, (_, literal)) in constraint.terms().iter().enumerate() {
            self.occurrences[literal_index(*literal)].push((index, term));
        }
        self.constraints.push(constraint);
    }

    fn truncate_constraints(&mut self, len: usize) {
        if self.constraints.len() <= len {
            return;
        }
        self.constraints.truncate(len);
        for occurrences in self.occurrences.iter_mut() {
            occurrences.retain(|&(c, _)| c < len);
        }
    }

    fn reset(&mut self) {
        self.decisions = Decisions::with_capacity(self.num_vars);
        self.slack = self.constraints.iter().map(PbConstraint::initial_slack).collect();
    }

    /// Make an undecided literal true and charge the constraints its negation appears in
    fn assign(&mut self, literal: Literal) {
        if !self.decisions.undecided(literal) {
            return;
        }
        self.decisions.decide(literal);
        for &(c, term) in &self.occurrences[literal_index(-literal)] {
            self.slack[c] -= &self.constraints[c].terms()[term].0;
        }
    }

    fn undo(&mut self, trail_len: usize) {
        for literal in self.decisions.revert_to(trail_len) {
            for &(c, term) in &self.occurrences[literal_index(-literal)] {
                self.slack[c] += &self.constraints[c].terms()[term].0;
            }
        }
    }

    /// Literals of constraint `c` that must become true
    fn implied(&self, c: usize) -> Vec<Literal> {
        let slack = &self.slack[c];
        self.constraints[c]
            .terms()
            .iter()
            .filter(|(coefficient, literal)| coefficient > slack && self.decisions.undecided(*literal))
            .map(|&(_, literal)| literal)
            .collect()
    }

    /// Unit-propagate every trail entry from `start` on. Returns false on conflict.
    fn propagate(&mut self, start: usize) -> bool {
        let mut index = start;
        while let Some(literal) = self.decisions.trail_at(index) {
            index += 1;
            let touched: Vec<usize> = self.occurrences[literal_index(-literal)]
                .iter()
                .map(|&(c, _)| c)
                .collect();
            for c in touched {
                if self.slack[c].is_negative() {
                    return false;
                }
                for implied in self.implied(c) {
                    self.assign(implied);
                }
            }
        }
        true
    }

    fn propagate_initial(&mut self) -> bool {
        for c in 0..self.constraints.len() {
            if self.slack[c].is_negative() {
                return false;
            }
            for implied in self.implied(c) {
                self.assign(implied);
            }
        }
        self.propagate(0)
    }

    /// Objective literals by descending weight, then every other variable negated
    fn branch_order(&self) -> Vec<Literal> {
        let mut weighted: Vec<_> = self
            .objective
            .terms()
            .iter()
            .filter(|(_, l)| *l != 0 && l.unsigned_abs() as usize <= self.num_vars)
            .collect();
        weighted.sort_by(|a, b| b.0.cmp(&a.0));

        let mut seen = vec![false; self.num_vars + 1];
        let mut order = Vec::with_capacity(self.num_vars);
        for (_, literal) in weighted {
            let var = literal.unsigned_abs() as usize;
            if !seen[var] {
                seen[var] = true;
                order.push(*literal);
            }
        }
        for var in 1..=self.num_vars {
            if !seen[var] {
                order.push(-(var as Literal));
            }
        }
        order
    }

    fn check_deadline(&self, deadline: Option<Instant>, steps: &mut u64) -> Result<(), BackendError> {
        if *steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let (Some(deadline), Some(timeout)) = (deadline, self.timeout) {
                if Instant::now() >= deadline {
                    return Err(BackendError::Timeout(timeout));
                }
            }
        }
        *steps += 1;
        Ok(())
    }

    /// One complete search over the current constraint set
    fn search(
        &mut self,
        order: &[Literal],
        deadline: Option<Instant>,
        steps: &mut u64,
    ) -> Result<Option<Vec<Literal>>, BackendError> {
        self.reset();
        let mut frames: Vec<Frame> = Vec::new();
        let mut conflict = !self.propagate_initial();

        loop {
            self.check_deadline(deadline, steps)?;

            if conflict {
                let mut resumed = false;
                while let Some(frame) = frames.pop() {
                    self.undo(frame.trail_len);
                    if frame.flipped {
                        continue;
                    }
                    let literal = -frame.literal;
                    frames.push(Frame {
                        trail_len: frame.trail_len,
                        literal,
                        flipped: true,
                    });
                    self.assign(literal);
                    conflict = !self.propagate(frame.trail_len);
                    resumed = true;
                    break;
                }
                if !resumed {
                    return Ok(None);
                }
                continue;
            }

            let Some(&literal) = order.iter().find(|&&l| self.decisions.undecided(l)) else {
                return Ok(Some(self.decisions.model(self.num_vars)));
            };
            let trail_len = self.decisions.trail_len();
            frames.push(Frame {
                trail_len,
                literal,
                flipped: false,
            });
            self.assign(literal);
            conflict = !self.propagate(trail_len);
        }
    }

    fn add(&mut self, terms: &[(BigInt, Literal)], comparison: Comparison, degree: &BigInt) -> Result<(), BackendError> {
        self.check_literals(terms.iter().map(|(_, l)| l))?;
        match PbConstraint::normalize(terms, comparison, degree)? {
            Normalized::Trivial => trace!("Dropping trivially satisfied constraint"),
            Normalized::Constraint(constraint) => {
                trace!("Constraint {}: {}", self.constraints.len(), constraint);
                self.push_constraint(constraint);
            }
        }
        self.outcome = None;
        self.model = None;
        Ok(())
    }
}

impl Default for PbSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PseudoBooleanBackend for PbSolver {
    fn new_vars(&mut self, count: usize) {
        self.num_vars += count;
        self.occurrences.resize(2 * (self.num_vars + 1), Vec::new());
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn add_at_most(&mut self, literals: &[Literal], degree: u32) -> Result<(), BackendError> {
        let terms: Vec<(BigInt, Literal)> = literals.iter().map(|&l| (BigInt::from(1), l)).collect();
        self.add(&terms, Comparison::Le, &BigInt::from(degree))
    }

    fn add_at_least(&mut self, literals: &[Literal], degree: u32) -> Result<(), BackendError> {
        let terms: Vec<(BigInt, Literal)> = literals.iter().map(|&l| (BigInt::from(1), l)).collect();
        self.add(&terms, Comparison::Ge, &BigInt::from(degree))
    }

    fn add_pseudo_boolean(
        &mut self,
        terms: &[(BigInt, Literal)],
        comparison: Comparison,
        degree: &BigInt,
    ) -> Result<(), BackendError> {
        self.add(terms, comparison, degree)
    }

    fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
        self.outcome = None;
        self.model = None;
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn is_satisfiable(&mut self) -> Result<bool, BackendError> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }

        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let order = self.branch_order();
        let base = self.constraints.len();
        let objective_terms: Vec<(BigInt, Literal)> = self
            .objective
            .terms()
            .iter()
            .map(|(w, l)| (BigInt::from(w.clone()), *l))
            .collect();

        let mut steps = 0u64;
        let mut rounds = 0usize;
        let mut best: Option<Vec<Literal>> = None;

        let result = loop {
            let model = match self.search(&order, deadline, &mut steps) {
                Ok(Some(model)) => model,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            rounds += 1;
            let value = self.objective.value(&model);
            trace!("Model {} with objective value {}", rounds, value);
            best = Some(model);

            if objective_terms.is_empty() {
                break Ok(());
            }
            let bound = BigInt::from(value) + 1;
            match PbConstraint::normalize(&objective_terms, Comparison::Ge, &bound) {
                Ok(Normalized::Constraint(better)) => self.push_constraint(better),
                // already optimal
                Ok(Normalized::Trivial) | Err(_) => break Ok(()),
            }
        };
        self.truncate_constraints(base);
        result?;

        debug!(
            "Solved {} variables / {} constraints in {:?} ({} improving rounds, {} steps)",
            self.num_vars,
            self.constraints.len(),
            started.elapsed(),
            rounds,
            steps
        );

        let satisfiable = best.is_some();
        self.model = best;
        self.outcome = Some(satisfiable);
        Ok(satisfiable)
    }

    fn model(&self) -> Option<&[Literal]> {
        self.model.as_deref()
    }
}

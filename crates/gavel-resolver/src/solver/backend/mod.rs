//! Pseudo-boolean backend abstraction
//!
//! The encoder talks to any [`PseudoBooleanBackend`]. Variables are numbered
//! from 1; a [`Literal`] is a variable (selected) or its negation.
//! [`PbSolver`] is the built-in implementation.

mod constraint;
mod decisions;
mod pb_solver;

use std::time::Duration;

use num_bigint::{BigInt, BigUint};
use thiserror::Error;

pub use constraint::{Comparison, Literal, Normalized, PbConstraint};
pub use decisions::Decisions;
pub use pb_solver::PbSolver;

/// Error type for backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    Contradiction(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("unknown variable in literal {0}")]
    UnknownVariable(Literal),
}

/// Weighted sum of literals to maximize
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Objective {
    terms: Vec<(BigUint, Literal)>,
}

impl Objective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, weight: BigUint, literal: Literal) {
        self.terms.push((weight, literal));
    }

    pub fn terms(&self) -> &[(BigUint, Literal)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Objective value under a model of signed literals
    pub fn value(&self, model: &[Literal]) -> BigUint {
        self.terms
            .iter()
            .filter(|(_, literal)| {
                let index = literal.unsigned_abs() as usize;
                index >= 1 && model.get(index - 1).map_or(false, |&m| m == *literal)
            })
            .map(|(weight, _)| weight)
            .sum()
    }
}

/// Capabilities the constraint encoder needs from a pseudo-boolean solver.
pub trait PseudoBooleanBackend {
    /// Reserve `count` more variables
    fn new_vars(&mut self, count: usize);

    fn num_vars(&self) -> usize;

    fn num_constraints(&self) -> usize;

    /// `sum(literals) <= degree`
    fn add_at_most(&mut self, literals: &[Literal], degree: u32) -> Result<(), BackendError>;

    /// `sum(literals) >= degree`
    fn add_at_least(&mut self, literals: &[Literal], degree: u32) -> Result<(), BackendError>;

    /// `sum(coefficient * literal) <comparison> degree`
    fn add_pseudo_boolean(
        &mut self,
        terms: &[(BigInt, Literal)],
        comparison: Comparison,
        degree: &BigInt,
    ) -> Result<(), BackendError>;

    /// `conclusion - premise >= 0`: selecting `premise` forces `conclusion`
    fn add_implication(&mut self, premise: Literal, conclusion: Literal) -> Result<(), BackendError> {
        self.add_pseudo_boolean(
            &[(BigInt::from(1), conclusion), (BigInt::from(-1), premise)],
            Comparison::Ge,
            &BigInt::from(0),
        )
    }

    /// Replace the maximization objective
    fn set_objective(&mut self, objective: Objective);

    /// Wall-clock budget for [`is_satisfiable`](Self::is_satisfiable); `None` is unlimited
    fn set_timeout(&mut self, _timeout: Option<Duration>) {}

    /// Search for a model. Repeated calls without new constraints return the same answer.
    fn is_satisfiable(&mut self) -> Result<bool, BackendError>;

    /// The model of the last successful search, one signed literal per variable
    fn model(&self) -> Option<&[Literal]>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_value() {
        let mut objective = Objective::new();
        objective.push(BigUint::from(4u32), 1);
        objective.push(BigUint::from(2u32), 2);
        objective.push(BigUint::from(1u32), -3);

        assert_eq!(objective.value(&[1, -2, -3]), BigUint::from(5u32));
        assert_eq!(objective.value(&[-1, 2, 3]), BigUint::from(2u32));
        assert_eq!(objective.len(), 3);
    }
}

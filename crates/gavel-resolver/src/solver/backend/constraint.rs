use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use super::BackendError;

/// A literal in SAT terms - positive means "selected", negative means "not selected"
pub type Literal = i32;

/// Direction of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `sum >= degree`
    Ge,
    /// `sum <= degree`
    Le,
}

/// A linear pseudo-boolean constraint in normal form:
/// `sum(coefficient * literal) >= degree`, every coefficient positive,
/// at most one term per variable, no coefficient above the degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbConstraint {
    terms: Vec<(BigInt, Literal)>,
    degree: BigInt,
}

/// Result of normalizing a raw constraint
#[derive(Debug)]
pub enum Normalized {
    /// Satisfied by every assignment
    Trivial,
    Constraint(PbConstraint),
}

impl PbConstraint {
    /// Bring `sum(terms) <cmp> degree` into normal form.
    ///
    /// Fails with [`BackendError::Contradiction`] when no assignment can
    /// satisfy it.
    pub fn normalize(
        terms: &[(BigInt, Literal)],
        comparison: Comparison,
        degree: &BigInt,
    ) -> Result<Normalized, BackendError> {
        let sign = match comparison {
            Comparison::Ge => BigInt::from(1),
            Comparison::Le => BigInt::from(-1),
        };
        let mut degree = degree * &sign;

        // coefficient on the positive literal of each variable
        let mut by_var: BTreeMap<u32, BigInt> = BTreeMap::new();
        for (coefficient, literal) in terms {
            let coefficient = coefficient * &sign;
            let entry = by_var.entry(literal.unsigned_abs()).or_insert_with(BigInt::zero);
            if *literal > 0 {
                *entry += coefficient;
            } else {
                // c * ~x = c - c * x
                degree -= &coefficient;
                *entry -= coefficient;
            }
        }

        let mut normalized = Vec::with_capacity(by_var.len());
        for (var, coefficient) in by_var {
            if coefficient.is_zero() {
                continue;
            }
            let var = var as Literal;
            if coefficient.is_positive() {
                normalized.push((coefficient, var));
            } else {
                // a * x = a - a * ~x with a < 0
                let magnitude = -coefficient;
                degree += &magnitude;
                normalized.push((magnitude, -var));
            }
        }

        if !degree.is_positive() {
            return Ok(Normalized::Trivial);
        }

        for (coefficient, _) in normalized.iter_mut() {
            if *coefficient > degree {
                *coefficient = degree.clone();
            }
        }

        let total: BigInt = normalized.iter().map(|(c, _)| c).sum();
        if total < degree {
            let constraint = PbConstraint { terms: normalized, degree };
            return Err(BackendError::Contradiction(format!("{} can never hold", constraint)));
        }

        Ok(Normalized::Constraint(PbConstraint { terms: normalized, degree }))
    }

    pub fn terms(&self) -> &[(BigInt, Literal)] {
        &self.terms
    }

    pub fn degree(&self) -> &BigInt {
        &self.degree
    }

    /// Sum of coefficients minus degree, with nothing assigned yet
    pub fn initial_slack(&self) -> BigInt {
        self.terms.iter().map(|(c, _)| c).sum::<BigInt>() - &self.degree
    }
}

impl fmt::Display for PbConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            write!(f, "0")?;
        }
        for (i, (coefficient, literal)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            let var = if *literal < 0 { format!("~x{}", -literal) } else { format!("x{}", literal) };
            if coefficient == &BigInt::from(1) {
                write!(f, "{}", var)?;
            } else {
                write!(f, "{}{}", coefficient, var)?;
            }
        }
        write!(f, " >= {}", self.degree)
    }
}

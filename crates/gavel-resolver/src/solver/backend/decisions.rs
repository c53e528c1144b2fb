use super::constraint::Literal;

/// Tracks the current partial assignment during search.
///
/// `assignment` is indexed by variable: `None` = undecided. The trail records
/// literals in assignment order so search can undo back to any earlier point.
#[derive(Debug, Default)]
pub struct Decisions {
    assignment: Vec<Option<bool>>,
    trail: Vec<Literal>,
}

impl Decisions {
    pub fn with_capacity(num_vars: usize) -> Self {
        Self {
            assignment: vec![None; num_vars + 1],
            trail: Vec::with_capacity(num_vars),
        }
    }

    /// Assign a literal.
    ///
    /// Returns false if the variable is already assigned the other way.
    pub fn decide(&mut self, literal: Literal) -> bool {
        let id = literal.unsigned_abs() as usize;
        if id >= self.assignment.len() {
            self.assignment.resize(id + 1, None);
        }

        if let Some(value) = self.assignment[id] {
            return value == (literal > 0);
        }

        self.assignment[id] = Some(literal > 0);
        self.trail.push(literal);
        true
    }

    #[inline]
    fn value(&self, literal: Literal) -> Option<bool> {
        self.assignment.get(literal.unsigned_abs() as usize).copied().flatten()
    }

    #[inline]
    pub fn satisfied(&self, literal: Literal) -> bool {
        self.value(literal) == Some(literal > 0)
    }

    #[inline]
    pub fn undecided(&self, literal: Literal) -> bool {
        self.value(literal).is_none()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn trail_at(&self, index: usize) -> Option<Literal> {
        self.trail.get(index).copied()
    }

    /// Undo every assignment made after the trail had `len` entries,
    /// returning the undone literals, most recent first.
    pub fn revert_to(&mut self, len: usize) -> Vec<Literal> {
        let mut undone = Vec::with_capacity(self.trail.len().saturating_sub(len));
        while self.trail.len() > len {
            if let Some(literal) = self.trail.pop() {
                self.assignment[literal.unsigned_abs() as usize] = None;
                undone.push(literal);
            }
        }
        undone
    }

    /// Signed literal per variable `1..=num_vars`; undecided variables read as false
    pub fn model(&self, num_vars: usize) -> Vec<Literal> {
        (1..=num_vars as Literal)
            .map(|var| if self.satisfied(var) { var } else { -var })
            .collect()
    }
}

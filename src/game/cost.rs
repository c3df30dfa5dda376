// src/game/cost.rs
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Movement expenditure as a chain of increments ending in `Zero`, or
/// `Impossible`. The outermost wrapper is the first step taken.
///
/// The constructors never wrap `Impossible`, so there is exactly one
/// impossible value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cost {
    Impossible,
    Zero,
    Half(Box<Cost>),
    One(Box<Cost>),
    Two(Box<Cost>),
}

/// A single increment of a cost chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Half,
    One,
    Two,
}

impl Step {
    /// Weight counted in half movement points.
    pub fn half_points(self) -> u64 {
        match self {
            Step::Half => 1,
            Step::One => 2,
            Step::Two => 4,
        }
    }

    fn wrap(self, inner: Cost) -> Cost {
        if inner.is_impossible() {
            return Cost::Impossible;
        }
        match self {
            Step::Half => Cost::Half(Box::new(inner)),
            Step::One => Cost::One(Box::new(inner)),
            Step::Two => Cost::Two(Box::new(inner)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Weight {
    Finite(u64),
    Infinite,
}

impl Cost {
    pub fn half(inner: Cost) -> Self {
        Step::Half.wrap(inner)
    }

    pub fn one(inner: Cost) -> Self {
        Step::One.wrap(inner)
    }

    pub fn two(inner: Cost) -> Self {
        Step::Two.wrap(inner)
    }

    /// Unwinds the chain into its steps (outermost first) and whether it
    /// terminates in `Impossible`.
    pub fn steps(&self) -> (Vec<Step>, bool) {
        let mut steps = Vec::new();
        let mut current = self;
        loop {
            current = match current {
                Cost::Impossible => return (steps, true),
                Cost::Zero => return (steps, false),
                Cost::Half(inner) => {
                    steps.push(Step::Half);
                    inner
                }
                Cost::One(inner) => {
                    steps.push(Step::One);
                    inner
                }
                Cost::Two(inner) => {
                    steps.push(Step::Two);
                    inner
                }
            };
        }
    }

    pub fn from_steps(steps: &[Step], terminus: Cost) -> Self {
        steps
            .iter()
            .rev()
            .fold(terminus, |inner, step| step.wrap(inner))
    }

    pub fn is_impossible(&self) -> bool {
        self.steps().1
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Cost::Zero)
    }

    /// Total in half movement points, `None` when impossible.
    pub fn half_points(&self) -> Option<u64> {
        match self.weight() {
            Weight::Finite(points) => Some(points),
            Weight::Infinite => None,
        }
    }

    fn weight(&self) -> Weight {
        let (steps, impossible) = self.steps();
        if impossible {
            Weight::Infinite
        } else {
            Weight::Finite(steps.iter().map(|s| s.half_points()).sum())
        }
    }
}

/// Sequential accumulation: `self` is spent first, then `next`.
///
/// `Zero` is the identity on both sides and any impossible operand makes the
/// whole result `Impossible`; otherwise the chains are concatenated so the
/// provenance of each step survives.
pub fn combine(first: Cost, next: Cost) -> Cost {
    if first.is_impossible() || next.is_impossible() {
        return Cost::Impossible;
    }
    if first.is_zero() {
        return next;
    }
    if next.is_zero() {
        return first;
    }
    let (steps, _) = first.steps();
    Cost::from_steps(&steps, next)
}

/// Costs spent one after another, in order.
pub fn total<I>(costs: I) -> Cost
where
    I: IntoIterator<Item = Cost>,
{
    costs.into_iter().fold(Cost::Zero, combine)
}

impl Ord for Cost {
    // Weight first; equal weights fall back to the step sequence so the order
    // stays consistent with structural equality.
    fn cmp(&self, other: &Self) -> Ordering {
        let (own_steps, own_impossible) = self.steps();
        let (other_steps, other_impossible) = other.steps();
        self.weight()
            .cmp(&other.weight())
            .then_with(|| own_steps.cmp(&other_steps))
            .then_with(|| own_impossible.cmp(&other_impossible))
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.half_points() {
            None => write!(f, "impossible"),
            Some(points) if points % 2 == 0 => write!(f, "{} MP", points / 2),
            Some(points) => write!(f, "{}.5 MP", points / 2),
        }
    }
}

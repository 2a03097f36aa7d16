/// Declarative scope filters for set enumeration
///
/// [`build_filter`] turns an admin scope into a conjunction of
/// `level = value` constraints, one per concrete level. Wildcard levels
/// contribute nothing. The filter can be evaluated in memory with
/// [`ScopeFilter::matches`] or rendered into SQL by a store adapter via
/// [`ScopeFilter::constraints`].
///
/// For every admin scope `A` and candidate `C`,
/// `build_filter(&A).matches(&C) == contains(&A, &C)`.

use super::scope::{Level, Scope, WILDCARD};

/// Conjunctive predicate over user scopes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeFilter {
    constraints: Vec<(Level, i32)>,
}

impl ScopeFilter {
    /// `(level, required value)` pairs, outermost level first
    pub fn constraints(&self) -> &[(Level, i32)] {
        &self.constraints
    }

    /// True if the filter accepts every candidate
    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Evaluates the filter against a candidate scope
    pub fn matches(&self, candidate: &Scope) -> bool {
        self.constraints
            .iter()
            .all(|&(level, value)| candidate.get(level) == value)
    }
}

/// Builds the accessible-set filter for an admin scope
pub fn build_filter(admin: &Scope) -> ScopeFilter {
    let constraints = Level::ALL
        .iter()
        .map(|&level| (level, admin.get(level)))
        .filter(|&(_, value)| value != WILDCARD)
        .collect();

    ScopeFilter { constraints }
}

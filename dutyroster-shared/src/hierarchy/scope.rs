/// Scope descriptors and the containment predicate
///
/// A [`Scope`] is a fixed four-field tuple. For `normal` users every field is
/// concrete; admins may carry the [`WILDCARD`] sentinel at any level.
///
/// # Containment
///
/// `contains(admin, target)` holds when, at every level, the admin's value is
/// the wildcard or equals the target's value. The check is one-directional:
/// only the admin side is inspected for wildcards.
///
/// ```text
/// admin  { unit: 1, depot: -1, platoon: -1, section: -1 }
/// target { unit: 1, depot:  4, platoon:  2, section:  7 }  → contained
/// target { unit: 2, depot:  4, platoon:  2, section:  7 }  → not contained
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel meaning "all values at this level"
pub const WILDCARD: i32 = -1;

/// A level of the organizational hierarchy, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Top level
    Unit,

    /// Depot within a unit
    Depot,

    /// Platoon within a depot
    Platoon,

    /// Section within a platoon
    Section,
}

impl Level {
    /// All levels in evaluation order
    pub const ALL: [Level; 4] = [Level::Unit, Level::Depot, Level::Platoon, Level::Section];

    /// Level name, also the column name in the `users` table
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Unit => "unit",
            Level::Depot => "depot",
            Level::Platoon => "platoon",
            Level::Section => "section",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a user in the hierarchy
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Scope {
    /// Unit number, or [`WILDCARD`]
    pub unit: i32,

    /// Depot number, or [`WILDCARD`]
    pub depot: i32,

    /// Platoon number, or [`WILDCARD`]
    pub platoon: i32,

    /// Section number, or [`WILDCARD`]
    pub section: i32,
}

impl Scope {
    /// Creates a scope from its four levels
    pub const fn new(unit: i32, depot: i32, platoon: i32, section: i32) -> Self {
        Self {
            unit,
            depot,
            platoon,
            section,
        }
    }

    /// Value at the given level
    pub fn get(&self, level: Level) -> i32 {
        match level {
            Level::Unit => self.unit,
            Level::Depot => self.depot,
            Level::Platoon => self.platoon,
            Level::Section => self.section,
        }
    }

    /// Whether the given level is the wildcard
    pub fn is_wildcard(&self, level: Level) -> bool {
        self.get(level) == WILDCARD
    }

    /// True when no level is a wildcard (required for `normal` users)
    pub fn is_concrete(&self) -> bool {
        Level::ALL.iter().all(|&level| !self.is_wildcard(level))
    }

    /// Whether this scope, taken as an admin scope, covers `target`
    pub fn contains(&self, target: &Scope) -> bool {
        contains(self, target)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{unit: {}, depot: {}, platoon: {}, section: {}}}",
            self.unit, self.depot, self.platoon, self.section
        )
    }
}

/// Decides whether an admin scope covers a target scope
///
/// Every level must pass; evaluation stops at the first mismatch. The
/// target's own wildcards are never treated as matches: a wildcard target
/// field is only covered by a wildcard admin field.
pub fn contains(admin: &Scope, target: &Scope) -> bool {
    Level::ALL.iter().all(|&level| {
        let granted = admin.get(level);
        granted == WILDCARD || granted == target.get(level)
    })
}

/// Organizational hierarchy and scope handling
///
/// Every user sits at a position in a four-level hierarchy
/// (unit → depot → platoon → section). An admin's position doubles as the
/// scope of their authority: a wildcard at a level means "every value at
/// this level".
///
/// # Modules
///
/// - [`scope`]: The [`Scope`] descriptor and the containment predicate
/// - [`filter`]: Declarative filters for enumerating everything within a scope
/// - [`resolver`]: Loads a user's scope from the user store
///
/// # Example
///
/// ```
/// use dutyroster_shared::hierarchy::{build_filter, contains, Scope, WILDCARD};
///
/// let admin = Scope::new(1, 2, WILDCARD, WILDCARD);
/// let soldier = Scope::new(1, 2, 5, 9);
///
/// assert!(contains(&admin, &soldier));
/// assert!(build_filter(&admin).matches(&soldier));
/// ```

pub mod filter;
pub mod resolver;
pub mod scope;

pub use filter::{build_filter, ScopeFilter};
pub use resolver::resolve_scope;
pub use scope::{contains, Level, Scope, WILDCARD};

/// Database models for DutyRoster
///
/// Records, creation inputs and query descriptors, together with their
/// PostgreSQL operations.
///
/// # Models
///
/// - `user`: accounts, roles and hierarchy placement
/// - `task`: assigned work items and their lifecycle flags

pub mod task;
pub mod user;

pub use task::{CreateTask, Task, TaskQuery, TaskView};
pub use user::{CreateUser, Role, User, UserQuery};

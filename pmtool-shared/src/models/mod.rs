/// Domain models for pmtool
///
/// Each entity module holds the stored record, the raw operation arguments
/// (`*Input`) as they arrive from a caller, and the validated shapes handed to
/// the entity store (`New*` for inserts, `*Changes` for partial updates).
///
/// # Models
///
/// - `organization`: tenancy root
/// - `project`: projects owned by an organization, with derived task tallies
/// - `task`: tasks owned by a project
/// - `comment`: comments owned by a task
/// - `patch`: tri-state field used by update arguments
///
/// # Example
///
/// ```
/// use pmtool_shared::models::project::TaskCounts;
///
/// let counts = TaskCounts { total: 4, done: 1 };
/// assert_eq!(counts.completion_rate(), 0.25);
/// ```

pub mod comment;
pub mod organization;
pub mod patch;
pub mod project;
pub mod task;

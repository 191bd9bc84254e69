pub mod plan;
pub mod user;
pub mod validate;

pub use plan::{Priority, Status, StudyPlan};
pub use user::{Session, User};
pub use validate::ValidationErrors;

pub mod password_reset;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};

pub use password_reset::PasswordReset;
pub use task::{Task, TaskInput};
pub use user::{NewUser, User, UserInput, UserProfile};

/// One page of a list endpoint together with the unpaginated row count.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
}

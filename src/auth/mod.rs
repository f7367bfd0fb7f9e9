mod middleware;
mod token;

pub use middleware::{AuthState, auth_guard};
pub use token::{Token, create_token_table, get_user_id_by_token, issue_token};

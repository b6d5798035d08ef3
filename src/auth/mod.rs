//! User accounts, password handling and cookie based sessions.

mod cookie;
mod middleware;
mod password;
mod session;
mod sign_in;
mod sign_out;
mod sign_up;
mod token;
mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use session::get_session;
pub use sign_in::sign_in;
pub use sign_out::sign_out;
pub use sign_up::sign_up;
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id, parse_email,
    update_password, validate_user_name,
};

#[cfg(test)]
pub use cookie::{COOKIE_TOKEN, set_auth_cookie};

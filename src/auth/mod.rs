pub mod accounts;
pub mod cleanup;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod session;

pub use accounts::{current_user, login, logout, register, Credentials, Registration, SignedIn};
pub use cleanup::{cleanup_once, run_cleanup_worker};
pub use gate::{AuthGate, Viewer};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use session::{
    clear_session_cookie, generate_session_token, session_cookie, token_from_cookie_header,
    SESSION_COOKIE,
};

mod middleware;
mod password;
mod session;

pub use middleware::RequireAuth;
pub use password::PasswordHasher;
pub use session::{SESSION_TTL_HOURS, SessionClaims, SessionKey};

//! Authentication: password hashing, access tokens and the request gate

pub mod gate;
pub mod password;
pub mod tokens;

pub use gate::{extract_token, AuthUser};
pub use password::PasswordHasher;
pub use tokens::{Claims, TokenIssuer};

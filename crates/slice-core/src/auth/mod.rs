pub mod api_key;
pub mod jwt;
pub mod password;
pub mod token;

pub use api_key::{api_key_gate, keys_match};
pub use jwt::{create_token, validate_token, Claims};
pub use password::{hash_password, verify_password};
pub use token::{generate_secure_token, hash_token, IssuedToken};

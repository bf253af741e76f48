//! Authentication building blocks shared by every exercise.

pub mod credentials;
pub mod password;
pub mod policy;
pub mod token;

pub use credentials::{CredentialError, Credentials};
pub use password::{Argon2Hasher, HashError, PasswordHasher};
pub use policy::{Actor, Policy, PolicyError};
pub use token::{TokenError, TokenIssuer};

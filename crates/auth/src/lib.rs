//! `gatehouse-auth` — session/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models the
//! roles an account can hold, the claims carried by a bearer session, and the
//! validation of those claims.

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::Role;

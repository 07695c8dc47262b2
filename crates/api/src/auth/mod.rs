//! Authentication primitives.
//!
//! Tokens are issued by the external identity provider; this service only
//! validates them. [`jwt::generate_access_token`] exists for tooling and
//! tests that need a token signed with the shared secret.

pub mod jwt;

//! Request authentication for upload routes.
//!
//! Uploads accept only bearer access tokens. The token is decoded into the id of the
//! calling user, which the upload pipeline then compares against the video's owner.

pub mod credential;
pub mod jwt;

pub use credential::{AuthError, Credential};
pub use jwt::{AccessClaims, Authenticator, JwtAuthenticator, ACCESS_TOKEN_ISSUER};

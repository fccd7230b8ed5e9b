mod client;

pub use client::ClientError;

/// Whether an error means the session cookie is no longer accepted.
pub trait IsAuthExpired {
    fn is_auth_expired(&self) -> bool;
}

//! Authentication for incoming requests.

mod middleware;

pub use middleware::FmCredentials;

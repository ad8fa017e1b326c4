pub mod claims;
pub mod errors;
pub mod service;

pub use claims::Identity;
pub use claims::TokenClaims;
pub use errors::TokenError;
pub use service::IssueOptions;
pub use service::TokenService;
pub use service::TokenSettings;

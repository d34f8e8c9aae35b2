pub mod access_jwt;
pub mod allow_list;
pub mod denied;
pub mod factory;
pub mod gate;
pub mod key_provider;
pub mod key_uri;
pub mod policy;
pub mod principal;
pub mod resource;

pub use access_jwt::{TokenError, TokenVerifier, VerifierSettings};
pub use allow_list::AllowList;
pub use denied::{AccessDeniedHandler, JsonAccessDeniedHandler};
pub use gate::{Access, AccessDecision, AccessGate, DenyReason};
pub use key_provider::{KeyProvider, KeyUnavailableError, VerificationKey};
pub use policy::{AuthenticatedEvaluator, PermissionEvaluator, PolicyEvaluationError};
pub use principal::Principal;

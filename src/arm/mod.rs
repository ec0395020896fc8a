//! Azure Resource Manager access: token exchange, generic resource
//! read/update, and typed views over the documents it returns.

pub mod document;
pub mod resource;
pub mod token;

pub use document::{direct_line_secret, BotServiceView, ResourceDocument};
pub use resource::ResourceClient;
pub use token::{AccessToken, CredentialProvider};

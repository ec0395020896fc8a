pub mod provisioner;
pub mod request;

pub use provisioner::{BotProvisioner, ProvisionerSettings, Stage};
pub use request::{BotIdentity, ProvisioningParams, ProvisioningRequest};

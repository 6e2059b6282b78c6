//! Port trait definitions (Hexagonal Architecture)
//!
//! - `ControlPlaneClient`: the remote provisioning API
//! - `ResourceLister`: the id/state view a refresh probe polls
//! - `CredentialProvider`: short-lived access tokens

pub mod control_plane;
pub mod credentials;

pub use control_plane::{ControlPlaneClient, ResourceLister};
pub use credentials::{AccessToken, CredentialProvider};

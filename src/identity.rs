use std::fmt;
use tonic::metadata::MetadataMap;

/// Caller identity as resolved by the auth layer in front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Anonymous,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => f.write_str(id),
            Identity::Anonymous => f.write_str("anonymous"),
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn identify(&self, metadata: &MetadataMap) -> Identity;
}

/// Reads the user id forwarded by the upstream auth layer (`x-user-id`),
/// falling back to the caller-supplied `client-id`.
#[derive(Debug, Default)]
pub struct MetadataIdentity;

impl IdentityProvider for MetadataIdentity {
    fn identify(&self, metadata: &MetadataMap) -> Identity {
        ["x-user-id", "client-id"]
            .iter()
            .find_map(|key| {
                metadata
                    .get(*key)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            })
            .map(|id| Identity::User(id.to_string()))
            .unwrap_or(Identity::Anonymous)
    }
}

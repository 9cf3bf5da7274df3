//! The unit of deferred work carried across the hand-off queue.

use crate::domain::error::RequestError;

/// A queued refresh for one identity token.
///
/// The token is opaque: only non-emptiness is checked. Unknown identities are
/// forwarded and resolved (or discarded) on the host tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    identity: String,
}

impl PendingRequest {
    /// Create a request, rejecting an empty token.
    pub fn new(identity: impl Into<String>) -> Result<Self, RequestError> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(RequestError::MissingIdentity);
        }
        Ok(Self { identity })
    }

    /// Build from every value given for the identity parameter.
    ///
    /// Repeated values are joined with `,` in order. No values, or a single
    /// empty one, is the missing-identity case.
    pub fn from_values<I>(values: I) -> Result<Self, RequestError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut identity = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                identity.push(',');
            }
            identity.push_str(value.as_ref());
        }
        Self::new(identity)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn into_identity(self) -> String {
        self.identity
    }
}

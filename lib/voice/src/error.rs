//! Error types for voice providers.

use std::fmt;

/// Errors from telephony and speech providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// Provider is unavailable.
    ProviderUnavailable { provider: String, reason: String },
    /// The provider rejected the request.
    Rejected { provider: String, reason: String },
    /// The referenced call does not exist.
    CallNotFound { call_sid: String },
    /// The request is missing data the provider needs.
    InvalidRequest { reason: String },
}

impl VoiceError {
    /// Returns the provider name, if the error came from one.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderUnavailable { provider, .. } | Self::Rejected { provider, .. } => {
                Some(provider)
            }
            Self::CallNotFound { .. } | Self::InvalidRequest { .. } => None,
        }
    }
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "voice provider '{provider}' unavailable: {reason}")
            }
            Self::Rejected { provider, reason } => {
                write!(f, "voice provider '{provider}' rejected request: {reason}")
            }
            Self::CallNotFound { call_sid } => write!(f, "call not found: {call_sid}"),
            Self::InvalidRequest { reason } => write!(f, "invalid voice request: {reason}"),
        }
    }
}

impl std::error::Error for VoiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_unavailable_display() {
        let err = VoiceError::ProviderUnavailable {
            provider: "twilio".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(err.to_string().contains("twilio"));
        assert_eq!(err.provider(), Some("twilio"));
    }

    #[test]
    fn call_not_found_has_no_provider() {
        let err = VoiceError::CallNotFound {
            call_sid: "CA123".to_string(),
        };
        assert!(err.to_string().contains("CA123"));
        assert_eq!(err.provider(), None);
    }
}

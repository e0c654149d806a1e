#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid routing address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: &'static str },
}

impl Error {
    #[must_use]
    pub fn invalid_address(address: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

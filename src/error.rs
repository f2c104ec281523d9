use crate::validation::ValidationFailure;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("no entity found for id {0}")]
    NotFound(String),
    #[error("submission rejected by server-side validation")]
    Rejected(ValidationFailure),
    #[error("storage backend failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("stored record could not be decoded: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("record could not be encoded: {0}")]
    Encode(String),
    #[error("identifier minting failed: {0}")]
    Ident(String),
}

impl From<minicbor::encode::Error<std::convert::Infallible>> for GatewayError {
    fn from(err: minicbor::encode::Error<std::convert::Infallible>) -> Self {
        GatewayError::Encode(err.to_string())
    }
}

use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("signature bytes do not encode a valid point")]
    InvalidSignature,
    #[error("expected {expected} bytes, got {got}")]
    InvalidByteLength { got: usize, expected: usize },
}

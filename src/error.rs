use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LzssError {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The compressed data ended in the middle of a unit.
    ///
    /// Only reported by strict decoders, others stop silently.
    #[error("Compressed stream is truncated after {decoded} decoded bytes")]
    Truncated {
        decoded: usize,
    },
}

impl From<LzssError> for io::Error {
    fn from(err: LzssError) -> Self {
        match err {
            LzssError::Io(err) => err,
            truncated @ LzssError::Truncated { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, truncated.to_string())
            }
        }
    }
}

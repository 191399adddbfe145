use std::error::Error;
use std::fmt;

pub type FoldResult<T> = Result<T, FoldError>;

/// Error type of the model boundary.
///
/// `ResourceExhausted` is the one condition callers are expected to recover
/// from: the device could not hold the requested batch. Everything else is an
/// unclassified backend failure and should propagate.
#[derive(Debug)]
pub enum FoldError {
    ResourceExhausted(String),
    Backend(anyhow::Error),
}

impl fmt::Display for FoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldError::ResourceExhausted(message) => {
                write!(f, "device out of memory: {}", message)
            }
            FoldError::Backend(err) => err.fmt(f),
        }
    }
}

impl Error for FoldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FoldError::ResourceExhausted(_) => None,
            FoldError::Backend(err) => err.source(),
        }
    }
}

impl From<ort::Error> for FoldError {
    fn from(err: ort::Error) -> Self {
        let message = err.to_string();
        if is_resource_exhausted(&message) {
            FoldError::ResourceExhausted(message)
        } else {
            FoldError::Backend(err.into())
        }
    }
}

impl From<anyhow::Error> for FoldError {
    fn from(err: anyhow::Error) -> Self {
        FoldError::Backend(err)
    }
}

// The runtime reports allocation failures as strings; this is the single
// place where they are recognized.
pub(crate) fn is_resource_exhausted(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["out of memory", "failed to allocate", "bad_alloc", "cudamalloc"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_messages_classified() {
        assert!(is_resource_exhausted("CUDA out of memory"));
        assert!(is_resource_exhausted(
            "Failed to allocate memory for requested buffer of size 8589934592"
        ));
        assert!(is_resource_exhausted("std::bad_alloc"));
        assert!(is_resource_exhausted("CUDAMalloc failed"));
    }

    #[test]
    fn test_other_messages_not_classified() {
        assert!(!is_resource_exhausted("invalid graph: node 12"));
        assert!(!is_resource_exhausted("unexpected input rank"));
    }

    #[test]
    fn test_display() {
        let err = FoldError::ResourceExhausted("CUDA out of memory".into());
        assert!(err.to_string().contains("out of memory"));
    }
}

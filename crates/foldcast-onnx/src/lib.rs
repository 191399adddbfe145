//! foldcast-onnx
//!
//! Integration boundary for the pretrained structure-prediction model. The
//! network itself is an ONNX graph fetched from the HuggingFace hub and run
//! through ONNX Runtime; this crate tokenizes batches of sequences, feeds the
//! session, and hands back host-side arrays plus per-sequence confidence
//! scores. Backend failures are classified once, here, into [`FoldError`] so
//! that callers can match on `ResourceExhausted` instead of inspecting
//! message text.
pub mod error;
pub mod esmfold;
pub mod output;
mod pdb;

pub use error::{FoldError, FoldResult};
pub use esmfold::{EsmFold, EsmFoldConfig, DEFAULT_NUM_RECYCLES};
pub use output::{FoldOutput, StructureModel};

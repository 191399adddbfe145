//! foldcast-io
//!
//! FASTA reading and writing for the foldcast driver. Headers carry an id
//! followed by optional `key=value` annotation tokens; annotations are kept in
//! order so that a rewrite reproduces the file it read.
mod fasta;

pub use fasta::{read_fasta, write_fasta, FastaRecord, Reader};

//! foldcast
//!
//! Batch structure-prediction driver: reads a FASTA file, packs sequences
//! into token-budget batches, folds each batch through the pretrained model,
//! writes one PDB file per sequence, and annotates the input FASTA with the
//! resulting confidence scores.
pub mod batch;
pub mod cli;
pub mod commands;
pub mod pipeline;
pub mod reporter;

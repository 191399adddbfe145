use crate::error::{FoldError, FoldResult};
use crate::pdb;
use anyhow::anyhow;
use ndarray::{Array2, Array4, Axis};

/// The model boundary. The driver only ever talks to the network through this
/// trait, which lets tests substitute a scripted model.
pub trait StructureModel {
    /// Predicts structures for a batch of sequences.
    fn infer(&mut self, sequences: &[String], num_recycles: Option<usize>)
        -> FoldResult<FoldOutput>;

    /// Converts a model output into one PDB string per sequence.
    fn output_to_pdb(&self, output: &FoldOutput) -> FoldResult<Vec<String>> {
        output.to_pdb()
    }
}

/// Host-side output of one batched forward pass.
///
/// Arrays are padded to the longest sequence in the batch; the unpadded
/// sequences are carried alongside so consumers know the true lengths.
pub struct FoldOutput {
    pub sequences: Vec<String>,
    /// Backbone N/CA/C/O coordinates, `[batch, len, 4, 3]`.
    pub positions: Array4<f32>,
    /// Per-residue confidence on the 0-100 scale, `[batch, len]`.
    pub plddt: Array2<f32>,
    /// Per-sequence pLDDT averaged over the unpadded length.
    pub mean_plddt: Vec<f32>,
    /// Per-sequence predicted TM-score.
    pub ptm: Vec<f32>,
}

impl FoldOutput {
    /// Assembles an output from padded arrays, computing each sequence's mean
    /// pLDDT over its true length.
    pub fn from_padded(
        sequences: Vec<String>,
        positions: Array4<f32>,
        plddt: Array2<f32>,
        ptm: Vec<f32>,
    ) -> FoldResult<Self> {
        let batch = sequences.len();
        let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let shape = positions.shape();
        if shape[0] != batch || shape[1] < max_len || shape[2] != 4 || shape[3] != 3 {
            return Err(FoldError::Backend(anyhow!(
                "unexpected positions shape {:?} for batch of {}",
                shape,
                batch
            )));
        }
        if plddt.nrows() != batch || plddt.ncols() < max_len {
            return Err(FoldError::Backend(anyhow!(
                "unexpected pLDDT shape {:?} for batch of {}",
                plddt.shape(),
                batch
            )));
        }
        if ptm.len() != batch {
            return Err(FoldError::Backend(anyhow!(
                "expected {} pTM values, found {}",
                batch,
                ptm.len()
            )));
        }

        let mean_plddt = sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| {
                if seq.is_empty() {
                    return 0.0;
                }
                let row = plddt.index_axis(Axis(0), i);
                row.iter().take(seq.len()).sum::<f32>() / seq.len() as f32
            })
            .collect();

        Ok(Self {
            sequences,
            positions,
            plddt,
            mean_plddt,
            ptm,
        })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// One PDB string per sequence, per-residue pLDDT in the B-factor column.
    pub fn to_pdb(&self) -> FoldResult<Vec<String>> {
        self.sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| {
                pdb::format_pdb(
                    seq,
                    &self.positions.index_axis(Axis(0), i),
                    &self.plddt.index_axis(Axis(0), i),
                )
            })
            .collect()
    }
}

use crate::batch::Batch;
use crate::reporter::Reporter;
use anyhow::{Context, Result};
use foldcast_io::FastaRecord;
use foldcast_onnx::{FoldError, StructureModel};
use itertools::izip;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Per-sequence confidence aggregates accumulated over all successful batches.
#[derive(Debug, Default)]
pub struct FoldStats {
    pub plddt: HashMap<String, f32>,
    pub ptm: HashMap<String, f32>,
    pub num_completed: usize,
}

impl FoldStats {
    /// Mean pLDDT over completed sequences, `None` when nothing completed.
    pub fn mean_plddt(&self) -> Option<f32> {
        mean(&self.plddt)
    }

    /// Mean pTM over completed sequences, `None` when nothing completed.
    pub fn mean_ptm(&self) -> Option<f32> {
        mean(&self.ptm)
    }
}

fn mean(scores: &HashMap<String, f32>) -> Option<f32> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.values().sum::<f32>() / scores.len() as f32)
}

/// Drives batches through the model, one at a time and in order.
///
/// Resource exhaustion skips the failing batch (or sequence, for singleton
/// batches) and continues; every other model error propagates and ends the
/// run. Each completed sequence gets a `<id>.pdb` file in `out_dir` and an
/// entry in both aggregate maps.
pub fn run_batches<M, R, I>(
    model: &mut M,
    batches: I,
    reporter: &mut R,
    out_dir: &Path,
    num_recycles: Option<usize>,
    num_sequences: usize,
) -> Result<FoldStats>
where
    M: StructureModel,
    R: Reporter,
    I: IntoIterator<Item = Batch>,
{
    let mut stats = FoldStats::default();
    for batch in batches {
        if batch.is_empty() {
            continue;
        }
        let start = Instant::now();
        let output = match model.infer(&batch.sequences, num_recycles) {
            Ok(output) => output,
            Err(FoldError::ResourceExhausted(_)) => {
                if batch.len() > 1 {
                    reporter.batch_exhausted(batch.len());
                } else {
                    reporter.sequence_exhausted(&batch.headers[0], batch.sequences[0].len());
                }
                continue;
            }
            Err(e) => return Err(e).context("structure prediction failed"),
        };
        let pdbs = model
            .output_to_pdb(&output)
            .context("failed to convert model output to PDB")?;
        let elapsed = start.elapsed();

        for (header, sequence, pdb, &plddt, &ptm) in izip!(
            &batch.headers,
            &batch.sequences,
            pdbs,
            &output.mean_plddt,
            &output.ptm
        ) {
            let seq_id = header.split_whitespace().next().unwrap_or(header);
            let out_file = out_dir.join(format!("{}.pdb", seq_id));
            fs::write(&out_file, pdb)
                .with_context(|| format!("failed to write {}", out_file.display()))?;
            stats.num_completed += 1;
            stats.plddt.insert(seq_id.to_string(), plddt);
            stats.ptm.insert(seq_id.to_string(), ptm);
            reporter.sequence_done(
                header,
                sequence.len(),
                plddt,
                ptm,
                elapsed,
                batch.len(),
                stats.num_completed,
                num_sequences,
            );
        }
    }
    reporter.summary(stats.mean_plddt(), stats.mean_ptm());
    Ok(stats)
}

/// Adds `pLDDT`/`pTM` annotations to every record that completed; records
/// without an aggregate entry are left untouched.
pub fn annotate_records(records: &mut [FastaRecord], stats: &FoldStats) {
    for record in records.iter_mut() {
        if let (Some(plddt), Some(ptm)) = (stats.plddt.get(&record.id), stats.ptm.get(&record.id))
        {
            record.set_annotation("pLDDT", format!("{:.1}", plddt));
            record.set_annotation("pTM", format!("{:.3}", ptm));
        }
    }
}

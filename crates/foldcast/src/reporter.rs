use std::time::Duration;

/// Progress reporting capability handed to the inference loop, so the loop
/// itself stays free of ambient logging and tests can record what happened.
pub trait Reporter {
    fn sequence_done(
        &mut self,
        header: &str,
        seq_len: usize,
        plddt: f32,
        ptm: f32,
        elapsed: Duration,
        batch_size: usize,
        completed: usize,
        total: usize,
    );

    fn batch_exhausted(&mut self, batch_size: usize);

    fn sequence_exhausted(&mut self, header: &str, seq_len: usize);

    fn summary(&mut self, mean_plddt: Option<f32>, mean_ptm: Option<f32>);
}

/// Production reporter: forwards everything to the `log` facade.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn sequence_done(
        &mut self,
        header: &str,
        seq_len: usize,
        plddt: f32,
        ptm: f32,
        elapsed: Duration,
        batch_size: usize,
        completed: usize,
        total: usize,
    ) {
        let per_sequence = elapsed.as_secs_f32() / batch_size as f32;
        let mut time_string = format!("{:.1}s", per_sequence);
        if batch_size > 1 {
            time_string.push_str(&format!(" (amortized, batch size {})", batch_size));
        }
        log::info!(
            "Predicted structure for {} with length {}, pLDDT {:.1}, pTM {:.3} in {}. {} / {} completed.",
            header,
            seq_len,
            plddt,
            ptm,
            time_string,
            completed,
            total
        );
    }

    fn batch_exhausted(&mut self, batch_size: usize) {
        log::info!(
            "Failed (out of device memory) to predict batch of size {}. Try lowering `--max-tokens-per-batch`.",
            batch_size
        );
    }

    fn sequence_exhausted(&mut self, header: &str, seq_len: usize) {
        log::info!(
            "Failed (out of device memory) on sequence {} of length {}.",
            header,
            seq_len
        );
    }

    fn summary(&mut self, mean_plddt: Option<f32>, mean_ptm: Option<f32>) {
        match (mean_plddt, mean_ptm) {
            (Some(plddt), Some(ptm)) => {
                log::info!("Average pLDDT: {:.1}, average pTM: {:.3}", plddt, ptm)
            }
            _ => log::warn!("No sequences completed; skipping summary"),
        }
    }
}

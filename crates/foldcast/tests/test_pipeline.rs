use anyhow::anyhow;
use foldcast::batch::{Batch, TokenBatches};
use foldcast::pipeline::{annotate_records, run_batches, FoldStats};
use foldcast::reporter::Reporter;
use foldcast_io::FastaRecord;
use foldcast_onnx::{FoldError, FoldOutput, FoldResult, StructureModel};
use ndarray::{Array2, Array4};
use std::time::Duration;

/// Scripted model: pLDDT is the sequence length, pTM is length / 1000.
#[derive(Default)]
struct MockModel {
    fail_multi: bool,
    fail_len_over: Option<usize>,
    fatal: bool,
}

impl StructureModel for MockModel {
    fn infer(
        &mut self,
        sequences: &[String],
        _num_recycles: Option<usize>,
    ) -> FoldResult<FoldOutput> {
        if self.fatal {
            return Err(FoldError::Backend(anyhow!("graph execution failed")));
        }
        if self.fail_multi && sequences.len() > 1 {
            return Err(FoldError::ResourceExhausted(
                "Failed to allocate memory".into(),
            ));
        }
        if let Some(limit) = self.fail_len_over {
            if sequences.iter().any(|s| s.len() > limit) {
                return Err(FoldError::ResourceExhausted("CUDA out of memory".into()));
            }
        }

        let batch = sequences.len();
        let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let positions = Array4::zeros((batch, max_len, 4, 3));
        let mut plddt = Array2::zeros((batch, max_len));
        for (i, sequence) in sequences.iter().enumerate() {
            for j in 0..sequence.len() {
                plddt[[i, j]] = sequence.len() as f32;
            }
        }
        let ptm = sequences.iter().map(|s| s.len() as f32 / 1000.0).collect();
        FoldOutput::from_padded(sequences.to_vec(), positions, plddt, ptm)
    }
}

#[derive(Default)]
struct RecordingReporter {
    completed: Vec<String>,
    batch_failures: Vec<usize>,
    sequence_failures: Vec<String>,
    summary: Option<(Option<f32>, Option<f32>)>,
}

impl Reporter for RecordingReporter {
    fn sequence_done(
        &mut self,
        header: &str,
        _seq_len: usize,
        _plddt: f32,
        _ptm: f32,
        _elapsed: Duration,
        _batch_size: usize,
        _completed: usize,
        _total: usize,
    ) {
        self.completed.push(header.to_string());
    }

    fn batch_exhausted(&mut self, batch_size: usize) {
        self.batch_failures.push(batch_size);
    }

    fn sequence_exhausted(&mut self, header: &str, _seq_len: usize) {
        self.sequence_failures.push(header.to_string());
    }

    fn summary(&mut self, mean_plddt: Option<f32>, mean_ptm: Option<f32>) {
        self.summary = Some((mean_plddt, mean_ptm));
    }
}

fn batches_of(lengths: &[usize], budget: usize) -> Vec<Batch> {
    let pairs: Vec<(String, String)> = lengths
        .iter()
        .enumerate()
        .map(|(i, &len)| (format!("seq{}", i), "A".repeat(len)))
        .collect();
    TokenBatches::new(pairs, budget).unwrap().collect()
}

#[test]
fn test_successful_run_writes_files_and_aggregates() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel::default();
    let mut reporter = RecordingReporter::default();

    // [10, 20] pack together, [40] is its own batch
    let batches = batches_of(&[10, 20, 40], 30);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 3).unwrap();

    assert_eq!(stats.num_completed, 3);
    for id in ["seq0", "seq1", "seq2"] {
        assert!(out_dir.path().join(format!("{}.pdb", id)).exists());
        assert!(stats.plddt.contains_key(id));
        assert!(stats.ptm.contains_key(id));
    }
    assert_eq!(reporter.completed, vec!["seq0", "seq1", "seq2"]);
    assert!(reporter.batch_failures.is_empty());
}

#[test]
fn test_exhausted_batch_is_skipped_and_run_continues() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel {
        fail_multi: true,
        ..Default::default()
    };
    let mut reporter = RecordingReporter::default();

    let batches = batches_of(&[10, 20, 40], 30);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 3).unwrap();

    // the two-sequence batch failed wholesale, the singleton succeeded
    assert_eq!(reporter.batch_failures, vec![2]);
    assert!(!out_dir.path().join("seq0.pdb").exists());
    assert!(!out_dir.path().join("seq1.pdb").exists());
    assert!(out_dir.path().join("seq2.pdb").exists());
    assert_eq!(stats.num_completed, 1);
    assert!(!stats.plddt.contains_key("seq0"));
}

#[test]
fn test_exhausted_singleton_is_skipped_and_run_continues() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel {
        fail_len_over: Some(100),
        ..Default::default()
    };
    let mut reporter = RecordingReporter::default();

    // 500 exceeds the budget, so it is a singleton batch; it alone fails
    let batches = batches_of(&[10, 20, 500], 30);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 3).unwrap();

    assert_eq!(reporter.sequence_failures, vec!["seq2"]);
    assert!(!out_dir.path().join("seq2.pdb").exists());
    assert_eq!(stats.num_completed, 2);
}

#[test]
fn test_unclassified_error_propagates() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel {
        fatal: true,
        ..Default::default()
    };
    let mut reporter = RecordingReporter::default();

    let batches = batches_of(&[10, 20], 100);
    let result = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 2);
    assert!(result.is_err());
}

#[test]
fn test_average_confidence() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel::default();
    let mut reporter = RecordingReporter::default();

    // mock pLDDT equals sequence length: lengths 80 and 90 average to 85
    let batches = batches_of(&[80, 90], 1024);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 2).unwrap();

    assert_eq!(stats.mean_plddt(), Some(85.0));
    assert_eq!(reporter.summary, Some((Some(85.0), stats.mean_ptm())));
}

#[test]
fn test_zero_completions_has_no_average() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel {
        fail_len_over: Some(0),
        ..Default::default()
    };
    let mut reporter = RecordingReporter::default();

    let batches = batches_of(&[10, 20], 1024);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 2).unwrap();

    assert_eq!(stats.num_completed, 0);
    assert_eq!(stats.mean_plddt(), None);
    assert_eq!(reporter.summary, Some((None, None)));
}

#[test]
fn test_empty_batch_is_tolerated() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel::default();
    let mut reporter = RecordingReporter::default();

    let batches = batches_of(&[], 1024);
    assert_eq!(batches.len(), 1);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 0).unwrap();
    assert_eq!(stats.num_completed, 0);
}

#[test]
fn test_annotations_match_completed_set_exactly() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel {
        fail_len_over: Some(100),
        ..Default::default()
    };
    let mut reporter = RecordingReporter::default();

    let batches = batches_of(&[80, 90, 500], 200);
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 3).unwrap();

    let mut records = vec![
        FastaRecord::new("seq0", "A".repeat(80)),
        FastaRecord::new("seq1", "A".repeat(90)),
        FastaRecord::new("seq2", "A".repeat(500)),
    ];
    annotate_records(&mut records, &stats);

    assert_eq!(records[0].annotation("pLDDT"), Some("80.0"));
    assert_eq!(records[0].annotation("pTM"), Some("0.080"));
    assert_eq!(records[1].annotation("pLDDT"), Some("90.0"));
    assert_eq!(records[2].annotation("pLDDT"), None);
    assert_eq!(records[2].annotation("pTM"), None);
}

#[test]
fn test_id_derived_from_header_token() {
    let out_dir = tempfile::tempdir().unwrap();
    let mut model = MockModel::default();
    let mut reporter = RecordingReporter::default();

    let batches = vec![Batch {
        headers: vec!["seqX species=human".to_string()],
        sequences: vec!["MKTAYIAK".to_string()],
    }];
    let stats = run_batches(&mut model, batches, &mut reporter, out_dir.path(), None, 1).unwrap();

    // the output file and aggregates key off the id, not the full header
    assert!(out_dir.path().join("seqX.pdb").exists());
    assert!(stats.plddt.contains_key("seqX"));
    assert_eq!(reporter.completed, vec!["seqX species=human"]);
}

#[test]
fn test_stats_default_is_empty() {
    let stats = FoldStats::default();
    assert_eq!(stats.mean_plddt(), None);
    assert_eq!(stats.mean_ptm(), None);
}

//! ESMFold backend. The network is an ONNX export of the pretrained fold
//! model; weights and tokenizer are fetched from the HuggingFace hub and run
//! through an `ort` session. Graph inputs are `aa`/`mask` token arrays plus
//! `num_recycles` and `chunk_size` scalars; outputs are `positions`, `plddt`
//! and `ptm`.
use crate::error::{FoldError, FoldResult};
use crate::output::{FoldOutput, StructureModel};
use anyhow::{anyhow, Context, Result};
use hf_hub::api::sync::{Api, ApiBuilder};
use ndarray::{arr1, Array2, Ix1, Ix2, Ix4};
use ort::{
    execution_providers::{CUDAExecutionProvider, ExecutionProviderDispatch},
    session::{builder::GraphOptimizationLevel, Session},
};
use std::path::PathBuf;
use tokenizers::Tokenizer;

const MODEL_REPO: &str = "foldcast/esmfold-v1-onnx";

/// Recycle count used during training, applied when the caller does not set one.
pub const DEFAULT_NUM_RECYCLES: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct EsmFoldConfig {
    /// Overrides the hub cache directory (pre-downloaded weights).
    pub model_dir: Option<PathBuf>,
    /// Chunks the axial attention computation to trade speed for memory.
    pub chunk_size: Option<usize>,
    /// Run on CPU instead of the accelerator.
    pub cpu_only: bool,
    /// Page activations through host memory on memory-constrained devices.
    pub cpu_offload: bool,
}

pub struct EsmFold {
    session: Session,
    tokenizer: Tokenizer,
    pad_id: i64,
    chunk_size: i64,
}

impl EsmFold {
    pub fn load(config: &EsmFoldConfig) -> Result<Self> {
        let api = match &config.model_dir {
            Some(dir) => ApiBuilder::new().with_cache_dir(dir.clone()).build()?,
            None => Api::new()?,
        };
        let repo = api.model(MODEL_REPO.to_string());
        let model_path = repo
            .get("model.onnx")
            .with_context(|| format!("failed to fetch model weights from {}", MODEL_REPO))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .with_context(|| format!("failed to fetch tokenizer from {}", MODEL_REPO))?;
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer: {}", e))?;
        let pad_id = tokenizer.token_to_id("<pad>").map(i64::from).unwrap_or(1);

        let mut providers: Vec<ExecutionProviderDispatch> = Vec::new();
        if !config.cpu_only {
            providers.push(CUDAExecutionProvider::default().build());
        }
        ort::init()
            .with_name("EsmFold")
            .with_execution_providers(providers)
            .commit()?;

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)?;
        if config.cpu_offload {
            // without the arena memory pattern, activations can page through
            // host memory instead of being pinned on the device
            builder = builder.with_memory_pattern(false)?;
        }
        let session = builder.commit_from_file(&model_path)?;

        Ok(Self {
            session,
            tokenizer,
            pad_id,
            chunk_size: config.chunk_size.map(|c| c as i64).unwrap_or(0),
        })
    }

    fn tokenize(&self, sequences: &[String]) -> FoldResult<(Array2<i64>, Array2<i64>)> {
        let batch = sequences.len();
        let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut tokens = Array2::from_elem((batch, max_len), self.pad_id);
        let mut mask = Array2::zeros((batch, max_len));
        for (i, sequence) in sequences.iter().enumerate() {
            let encoding = self
                .tokenizer
                .encode(sequence.as_str(), false)
                .map_err(|e| FoldError::Backend(anyhow!("tokenization failed: {}", e)))?;
            for (j, &id) in encoding.get_ids().iter().take(max_len).enumerate() {
                tokens[[i, j]] = i64::from(id);
                mask[[i, j]] = 1;
            }
        }
        Ok((tokens, mask))
    }
}

impl StructureModel for EsmFold {
    fn infer(
        &mut self,
        sequences: &[String],
        num_recycles: Option<usize>,
    ) -> FoldResult<FoldOutput> {
        if sequences.is_empty() {
            return Err(FoldError::Backend(anyhow!("cannot run an empty batch")));
        }
        let (tokens, mask) = self.tokenize(sequences)?;
        let num_recycles = num_recycles.unwrap_or(DEFAULT_NUM_RECYCLES) as i64;

        let outputs = self.session.run(ort::inputs![
            "aa" => tokens,
            "mask" => mask,
            "num_recycles" => arr1(&[num_recycles]),
            "chunk_size" => arr1(&[self.chunk_size]),
        ]?)?;

        // extraction copies the tensors into owned host-side arrays
        let positions = outputs
            .get("positions")
            .ok_or_else(|| FoldError::Backend(anyhow!("model output is missing `positions`")))?
            .try_extract_tensor::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix4>()
            .map_err(|e| FoldError::Backend(anyhow!("bad positions rank: {}", e)))?;
        let plddt = outputs
            .get("plddt")
            .ok_or_else(|| FoldError::Backend(anyhow!("model output is missing `plddt`")))?
            .try_extract_tensor::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| FoldError::Backend(anyhow!("bad plddt rank: {}", e)))?;
        let ptm = outputs
            .get("ptm")
            .ok_or_else(|| FoldError::Backend(anyhow!("model output is missing `ptm`")))?
            .try_extract_tensor::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix1>()
            .map_err(|e| FoldError::Backend(anyhow!("bad ptm rank: {}", e)))?
            .to_vec();

        FoldOutput::from_padded(sequences.to_vec(), positions, plddt, ptm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "downloads model weights (>2GB) from HuggingFace"]
    fn test_load_and_fold() -> Result<()> {
        let mut model = EsmFold::load(&EsmFoldConfig {
            cpu_only: true,
            ..Default::default()
        })?;
        let output = model.infer(&["MKTAYIAKQR".to_string()], Some(1))?;
        assert_eq!(output.len(), 1);
        assert!(output.mean_plddt[0] > 0.0);
        Ok(())
    }
}

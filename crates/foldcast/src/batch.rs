use anyhow::{ensure, Result};

/// An ordered group of `(header, sequence)` pairs whose summed residue count
/// fits the token budget.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Batch {
    pub headers: Vec<String>,
    pub sequences: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn num_tokens(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).sum()
    }

    fn push(&mut self, header: String, sequence: String) {
        self.headers.push(header);
        self.sequences.push(sequence);
    }
}

/// Greedy token-budget packer.
///
/// Pairs are accumulated while the running residue count stays within the
/// budget; the pair that would overflow closes the current batch and seeds the
/// next one. A pair is always accepted into an empty batch, so a sequence
/// longer than the budget becomes a singleton batch rather than being split.
/// The final batch is always emitted, which means empty input yields exactly
/// one empty batch.
///
/// Callers are expected to feed pairs pre-sorted by sequence length ascending
/// so batches stay length-homogeneous; the packer itself never reorders.
pub struct TokenBatches<I> {
    iter: I,
    max_tokens: usize,
    carry: Option<(String, String)>,
    finished: bool,
}

impl<I> TokenBatches<I>
where
    I: Iterator<Item = (String, String)>,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>, max_tokens: usize) -> Result<Self> {
        ensure!(max_tokens > 0, "token budget must be positive");
        Ok(Self {
            iter: iter.into_iter(),
            max_tokens,
            carry: None,
            finished: false,
        })
    }
}

impl<I> Iterator for TokenBatches<I>
where
    I: Iterator<Item = (String, String)>,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.finished {
            return None;
        }

        let mut batch = Batch::default();
        let mut num_tokens = 0;
        if let Some((header, sequence)) = self.carry.take() {
            num_tokens += sequence.len();
            batch.push(header, sequence);
        }
        for (header, sequence) in self.iter.by_ref() {
            if num_tokens > 0 && num_tokens + sequence.len() > self.max_tokens {
                self.carry = Some((header, sequence));
                return Some(batch);
            }
            num_tokens += sequence.len();
            batch.push(header, sequence);
        }
        self.finished = true;
        Some(batch)
    }
}

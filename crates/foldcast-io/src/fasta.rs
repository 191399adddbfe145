use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// A single FASTA record: `>id key=value ...` header plus the concatenation of
/// its sequence lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    pub id: String,
    pub sequence: String,
    annotations: Vec<(String, String)>,
}

impl FastaRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            annotations: Vec::new(),
        }
    }

    pub fn annotations(&self) -> &[(String, String)] {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an annotation, replacing an existing value for the same key.
    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.annotations.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.annotations.push((key, value)),
        }
    }

    /// The header line content after `>`: the id followed by `key=value` tokens.
    pub fn header(&self) -> String {
        let mut header = self.id.clone();
        for (k, v) in &self.annotations {
            header.push(' ');
            header.push_str(k);
            header.push('=');
            header.push_str(v);
        }
        header
    }
}

/// A FASTA reader.
pub struct Reader<R> {
    inner: R,
    // header line carried over from the previous record
    pending: Option<String>,
}

impl<R> Reader<R> {
    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Reader<R>
where
    R: BufRead,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: None,
        }
    }

    /// Reads the next record, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.pending.take() {
            Some(line) => line,
            None => loop {
                match self.read_line()? {
                    None => return Ok(None),
                    Some(line) if line.is_empty() => continue,
                    Some(line) if line.starts_with('>') => break line,
                    Some(line) => bail!("expected FASTA header, found {:?}", line),
                }
            },
        };

        let mut record = parse_header(&header)?;
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with('>') => {
                    self.pending = Some(line);
                    break;
                }
                Some(line) => record.sequence.push_str(&line),
            }
        }
        Ok(Some(record))
    }

    /// Reads all remaining records.
    pub fn records(&mut self) -> Result<Vec<FastaRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok(records)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

fn parse_header(line: &str) -> Result<FastaRecord> {
    let mut tokens = line[1..].split_whitespace();
    let id = match tokens.next() {
        Some(id) => id,
        None => bail!("empty FASTA header"),
    };
    let mut record = FastaRecord::new(id, String::new());
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) => record.annotations.push((key.into(), value.into())),
            None => bail!("malformed annotation {:?} in header of {}", token, id),
        }
    }
    Ok(record)
}

/// Reads all records from a FASTA file.
pub fn read_fasta(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Reader::new(BufReader::new(file))
        .records()
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Writes records to a FASTA file. The data lands in a temporary file in the
/// destination directory which is then renamed over the target, so an
/// interrupted write never truncates an existing file.
pub fn write_fasta(records: &[FastaRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new(),
    }
    .context("failed to create temporary FASTA file")?;
    for record in records {
        writeln!(tmp, ">{}", record.header())?;
        writeln!(tmp, "{}", record.sequence)?;
    }
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

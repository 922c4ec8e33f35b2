use std::{
    fs::File,
    io::{BufRead, BufReader, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::frequency::FrequencyTable;
use crate::normalize::normalize_line;
use crate::punctuation::PunctuationTally;
use crate::segment::{tokenize, Segmenter};

const PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file {0} does not exist")]
    NotFound(PathBuf),

    #[error("input file {path} is not valid UTF-8 (line {line})")]
    Encoding { path: PathBuf, line: usize },

    #[error("failed reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything accumulated from one pass over a chat log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatStats {
    pub words: FrequencyTable,
    pub punctuation: PunctuationTally,
    pub lines_read: usize,
    /// Lines that produced at least one token.
    pub lines_tokenized: usize,
}

impl ChatStats {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.punctuation.total() == 0
    }

    /// Feed one raw line through detection, cleaning and segmentation.
    pub fn ingest_line(&mut self, line: &str, segmenter: &dyn Segmenter, punctuation_stats: bool) {
        self.lines_read += 1;

        if let Some(category) = self.punctuation.observe(line, punctuation_stats) {
            debug!("Whole-line punctuation - line={}, category={}", self.lines_read, category);
            return;
        }

        let cleaned = normalize_line(line);
        if cleaned.is_empty() {
            return;
        }

        let tokens = tokenize(segmenter, &cleaned);
        if tokens.is_empty() {
            return;
        }
        for token in tokens {
            self.words.increment(token);
        }
        self.lines_tokenized += 1;
    }
}

/// Count words and punctuation-only lines across the whole file.
pub fn analyze_file(
    path: &Path,
    segmenter: &dyn Segmenter,
    punctuation_stats: bool,
) -> Result<ChatStats, InputError> {
    let start = std::time::Instant::now();
    info!("Analysis started - path={}", path.display());

    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => InputError::NotFound(path.to_path_buf()),
        _ => InputError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let stats = analyze_reader(BufReader::new(file), path, segmenter, punctuation_stats)?;

    info!(
        "Analysis completed - duration={:.2}s, lines={}, tokenized_lines={}, punctuation_lines={}, distinct_tokens={}, total_tokens={}",
        start.elapsed().as_secs_f32(),
        stats.lines_read,
        stats.lines_tokenized,
        stats.punctuation.total(),
        stats.words.len(),
        stats.words.total()
    );
    Ok(stats)
}

fn analyze_reader<R: BufRead>(
    reader: R,
    path: &Path,
    segmenter: &dyn Segmenter,
    punctuation_stats: bool,
) -> Result<ChatStats, InputError> {
    let mut stats = ChatStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| match source.kind() {
            ErrorKind::InvalidData => InputError::Encoding {
                path: path.to_path_buf(),
                line: line_no,
            },
            _ => InputError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        // exported logs frequently start with a BOM
        let line = if line_no == 1 {
            line.trim_start_matches('\u{feff}')
        } else {
            line.as_str()
        };

        stats.ingest_line(line, segmenter, punctuation_stats);

        if line_no % PROGRESS_EVERY == 0 {
            info!(
                "Analysis progress - lines={}, distinct_tokens={}",
                line_no,
                stats.words.len()
            );
        }
    }

    Ok(stats)
}

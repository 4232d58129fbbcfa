//! Token counting and token-budgeted chunking.
//!
//! Counting uses the tiktoken encoding of the configured model. Models that
//! tiktoken does not know (e.g. open-weight models served by Together) fall
//! back to `cl100k_base`.
//!
//! Splitting works in two passes over byte ranges of the source text:
//!
//! 1. **Atomize**: recursively split on paragraph, line, sentence and word
//!    boundaries until every piece fits the budget. Pieces keep their trailing
//!    separator, so the pieces tile the text exactly. A piece with no boundary
//!    left is cut into single characters.
//! 2. **Merge**: greedily grow each chunk over consecutive pieces while the
//!    real token count of the joined text stays within budget, then start the
//!    next chunk a few pieces back so consecutive chunks share up to
//!    `min(100, max_tokens / 4)` tokens of context.

use std::ops::Range;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

pub const FALLBACK_ENCODING: &str = "cl100k_base";

/// Upper bound on the overlap between consecutive chunks.
pub const MAX_OVERLAP_TOKENS: usize = 100;

/// Natural boundaries, most preferred first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Characters per token when no BPE encoding could be loaded.
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

/// Token counter bound to one model's encoding.
///
/// Building the encoding is expensive; hold on to a `Tokenizer` rather than
/// calling the free functions in a loop.
#[derive(Clone)]
pub struct Tokenizer {
    model: String,
    bpe: Option<Arc<CoreBPE>>,
}

impl Tokenizer {
    pub fn for_model(model: &str) -> Self {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(bpe),
            Err(_) => {
                debug!(model, fallback = FALLBACK_ENCODING, "Unknown model, using fallback encoding");
                match tiktoken_rs::cl100k_base() {
                    Ok(bpe) => Some(bpe),
                    Err(e) => {
                        warn!(error = %e, "Failed to load fallback encoding, estimating tokens from characters");
                        None
                    }
                }
            }
        };

        Self {
            model: model.to_string(),
            bpe: bpe.map(Arc::new),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.chars().count().div_ceil(CHARS_PER_TOKEN_ESTIMATE),
        }
    }

    /// Splits `text` into chunks of at most `max_tokens` tokens each.
    ///
    /// Returns the whole text as a single chunk when it already fits, and an
    /// empty vector for empty input.
    pub fn chunk_text(&self, text: &str, max_tokens: usize) -> Vec<String> {
        self.chunk_spans(text, max_tokens)
            .into_iter()
            .map(|span| text[span].to_string())
            .collect()
    }

    /// Byte ranges of the chunks [`Tokenizer::chunk_text`] would return.
    ///
    /// The first range starts at 0, the last ends at `text.len()`, and each
    /// range starts at or before the end of its predecessor.
    ///
    /// A single character is never split, so a character whose encoding is
    /// longer than `max_tokens` ends up alone in a chunk over the budget.
    pub fn chunk_spans(&self, text: &str, max_tokens: usize) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }

        let max_tokens = max_tokens.max(1);
        if self.count_tokens(text) <= max_tokens {
            return vec![0..text.len()];
        }

        let mut pieces = Vec::new();
        self.atomize(text, 0..text.len(), 0, max_tokens, &mut pieces);

        let overlap = overlap_for(max_tokens);
        self.merge(text, &pieces, max_tokens, overlap)
    }

    fn atomize(
        &self,
        text: &str,
        range: Range<usize>,
        level: usize,
        max_tokens: usize,
        out: &mut Vec<Piece>,
    ) {
        let Some(separator) = SEPARATORS.get(level) else {
            // No natural boundary left: hard cut at character granularity.
            for (offset, ch) in text[range.clone()].char_indices() {
                let start = range.start + offset;
                let end = start + ch.len_utf8();
                out.push(Piece {
                    range: start..end,
                    tokens: self.count_tokens(&text[start..end]),
                });
            }
            return;
        };

        let parts = split_keeping_separator(text, range.clone(), separator);
        if parts.len() == 1 {
            self.atomize(text, range, level + 1, max_tokens, out);
            return;
        }

        for part in parts {
            let tokens = self.count_tokens(&text[part.clone()]);
            if tokens <= max_tokens {
                out.push(Piece {
                    range: part,
                    tokens,
                });
            } else {
                self.atomize(text, part, level + 1, max_tokens, out);
            }
        }
    }

    fn merge(
        &self,
        text: &str,
        pieces: &[Piece],
        max_tokens: usize,
        overlap: usize,
    ) -> Vec<Range<usize>> {
        let fits = |start: usize, end: usize| self.count_tokens(&text[start..end]) <= max_tokens;

        let mut spans = Vec::new();
        let mut first = 0;
        // Index of the first piece not yet covered by any chunk; every chunk
        // must reach at least this far.
        let mut required = 0;

        while required < pieces.len() {
            let start = pieces[first].range.start;

            // Gallop forward from the required piece, then binary search, so
            // probes stay near the chunk size instead of the document size.
            let mut lo = required;
            let mut step = 1;
            let mut hi = loop {
                let probe = lo + step;
                if probe >= pieces.len() {
                    break pieces.len() - 1;
                }
                if fits(start, pieces[probe].range.end) {
                    lo = probe;
                    step *= 2;
                } else {
                    break probe - 1;
                }
            };
            while lo < hi {
                let mid = (lo + hi + 1) / 2;
                if fits(start, pieces[mid].range.end) {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }

            let last = lo;
            spans.push(start..pieces[last].range.end);
            required = last + 1;
            if required == pieces.len() {
                break;
            }

            // Walk back from the chunk end while the carried tokens stay
            // within the overlap budget.
            let mut next_first = required;
            let mut carried = 0;
            while next_first > first + 1 {
                let tokens = pieces[next_first - 1].tokens;
                if carried + tokens > overlap {
                    break;
                }
                carried += tokens;
                next_first -= 1;
            }

            // Drop overlap that would leave no room for new content.
            while next_first < required
                && !fits(pieces[next_first].range.start, pieces[required].range.end)
            {
                next_first += 1;
            }

            first = next_first;
        }

        spans
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("model", &self.model)
            .field("bpe_loaded", &self.bpe.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Piece {
    range: Range<usize>,
    tokens: usize,
}

/// Overlap between consecutive chunks: a quarter of the budget, capped.
pub fn overlap_for(max_tokens: usize) -> usize {
    MAX_OVERLAP_TOKENS.min(max_tokens / 4)
}

/// Counts tokens of `text` under `model`'s encoding.
pub fn count_tokens(text: &str, model: &str) -> usize {
    Tokenizer::for_model(model).count_tokens(text)
}

/// Splits `text` into overlapping chunks of at most `max_tokens` tokens.
pub fn chunk_text(text: &str, max_tokens: usize, model: &str) -> Vec<String> {
    Tokenizer::for_model(model).chunk_text(text, max_tokens)
}

/// Splits `range` of `text` after every occurrence of `separator`.
fn split_keeping_separator(text: &str, range: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let mut parts = Vec::new();
    let mut part_start = 0;

    for (idx, _) in slice.match_indices(separator) {
        let part_end = idx + separator.len();
        if part_end > part_start {
            parts.push(range.start + part_start..range.start + part_end);
            part_start = part_end;
        }
    }
    if part_start < slice.len() {
        parts.push(range.start + part_start..range.end);
    }

    parts
}

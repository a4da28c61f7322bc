//! Sentence-based chunking of lesson text.
//!
//! Text is split into sentences and packed greedily into chunks of at most
//! `chunk_size` characters. Consecutive chunks share trailing sentences worth
//! up to `chunk_overlap` characters.

mod document;

pub use document::{parse_course_document, CourseChunk, CourseDocument, LessonText};

use crate::config::ChunkingSettings;

/// Splits text into overlapping, sentence-aligned chunks.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Chunk `text`. Whitespace runs are collapsed first.
    ///
    /// A sentence longer than `chunk_size` becomes a chunk of its own.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let sentences = split_sentences(&normalized);
        let lengths: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < sentences.len() {
            let mut size = 0;
            let mut end = start;
            while end < sentences.len() {
                let addition = lengths[end] + usize::from(end > start);
                if end > start && size + addition > self.chunk_size {
                    break;
                }
                size += addition;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));
            if end == sentences.len() {
                break;
            }

            let overlap = self.overlap_sentences(&lengths[start..end]);
            start = (end - overlap).max(start + 1);
        }

        chunks
    }

    /// How many trailing sentences of a chunk fit in the overlap budget.
    fn overlap_sentences(&self, lengths: &[usize]) -> usize {
        let mut size = 0;
        let mut count = 0;
        for (k, len) in lengths.iter().enumerate().rev() {
            let len = len + usize::from(k + 1 < lengths.len());
            if size + len > self.chunk_overlap {
                break;
            }
            size += len;
            count += 1;
        }
        count
    }
}

/// Split at `.`, `!` or `?` followed by a space and an uppercase letter.
///
/// Expects single-spaced text. Abbreviations such as `e.g.` or `Dr.` do not
/// end a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        let (_, c) = chars[i];
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let boundary = matches!(chars.get(i + 1), Some((_, ' ')))
            && matches!(chars.get(i + 2), Some((_, next)) if next.is_uppercase());
        if !boundary || is_abbreviation(&chars, i) {
            continue;
        }

        let end = chars[i + 1].0;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = chars[i + 2].0;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// `x.y.` style or `Ab.` style abbreviation ending at `i`.
fn is_abbreviation(chars: &[(usize, char)], i: usize) -> bool {
    let at = |offset: usize| i.checked_sub(offset).map(|j| chars[j].1);
    let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');

    let dotted = word(at(3)) && at(2) == Some('.') && word(at(1));
    let titled = chars[i].1 == '.'
        && at(2).is_some_and(char::is_uppercase)
        && at(1).is_some_and(char::is_lowercase);
    dotted || titled
}

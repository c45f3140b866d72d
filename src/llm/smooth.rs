// ABOUTME: Word-boundary chunker for smoothing streamed model text
// ABOUTME: Re-emits arbitrary deltas as whole words for even client rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Smooth streaming.
//!
//! Providers emit text in uneven fragments (multi-sentence blocks or split
//! mid-word). The chat route re-chunks the stream on word boundaries and
//! paces the chunks with a small fixed delay, which reads far better in the
//! UI. [`WordChunker`] is the pure re-chunking half; the route owns the
//! delay.
//!
//! A chunk is only released once the input proves it is complete: a word is
//! held until a following non-whitespace character shows its trailing
//! whitespace run has ended. Concatenating all released chunks plus the
//! final [`WordChunker::flush`] always reproduces the input exactly.

/// Re-chunks a stream of text deltas on word boundaries
#[derive(Debug, Default)]
pub struct WordChunker {
    buffer: String,
}

impl WordChunker {
    /// Create an empty chunker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta; returns the word chunks that are now complete
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.buffer.push_str(delta);

        let mut out = Vec::new();
        loop {
            let Some(end) = next_chunk_end(&self.buffer) else {
                break;
            };
            out.push(self.buffer.drain(..end).collect());
        }
        out
    }

    /// Return whatever remains at end of stream
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

/// Byte offset of the end of the first complete chunk: leading whitespace,
/// one word, and its full trailing whitespace run. `None` until a
/// non-whitespace character follows the run (the run may still grow).
fn next_chunk_end(buffer: &str) -> Option<usize> {
    let mut chars = buffer.char_indices().peekable();

    // Leading whitespace belongs to the chunk.
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }

    // The word itself.
    let mut saw_word = false;
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        saw_word = true;
        chars.next();
    }
    if !saw_word {
        return None;
    }

    // Trailing whitespace run; complete only if a non-whitespace follows.
    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn run(deltas: &[&str]) -> (Vec<String>, String) {
        let mut chunker = WordChunker::new();
        let mut chunks = Vec::new();
        for delta in deltas {
            chunks.extend(chunker.push(delta));
        }
        let mut all: String = chunks.concat();
        if let Some(rest) = chunker.flush() {
            all.push_str(&rest);
            chunks.push(rest);
        }
        (chunks, all)
    }

    #[test]
    fn block_is_split_into_words() {
        let (chunks, all) = run(&["The quick brown fox"]);
        assert_eq!(chunks, vec!["The ", "quick ", "brown ", "fox"]);
        assert_eq!(all, "The quick brown fox");
    }

    #[test]
    fn words_split_across_deltas_are_joined() {
        let (chunks, all) = run(&["Hel", "lo wor", "ld again"]);
        assert_eq!(chunks, vec!["Hello ", "world ", "again"]);
        assert_eq!(all, "Hello world again");
    }

    #[test]
    fn concatenation_is_preserved_exactly() {
        let input = ["  leading", " spaces\n\nand\tmixed  ", "whitespace "];
        let (_, all) = run(&input);
        assert_eq!(all, input.concat());
    }

    #[test]
    fn trailing_whitespace_waits_for_the_next_word() {
        let mut chunker = WordChunker::new();
        // "fox " could still grow its whitespace run, so nothing is released.
        assert!(chunker.push("fox ").is_empty());
        assert_eq!(chunker.push("\njumps"), vec!["fox \n"]);
        assert_eq!(chunker.flush().as_deref(), Some("jumps"));
    }

    #[test]
    fn multibyte_text_chunks_cleanly() {
        let (chunks, all) = run(&["météo à Paris"]);
        assert_eq!(chunks, vec!["météo ", "à ", "Paris"]);
        assert_eq!(all, "météo à Paris");
    }
}

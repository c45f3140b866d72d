// ABOUTME: Response-shaping middleware for model output text
// ABOUTME: Strips synthetic function-call markup and leading whitespace from streams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Response shaping.
//!
//! Some models emit function calls both as proper tool-call payloads and as
//! literal text using `<function(name)>{...}</function>` or
//! `<function/name>{...}</function>` markup. That markup must never reach
//! the UI. [`strip_synthetic_function_calls`] cleans a complete text;
//! [`ShapingFilter`] applies the same rule incrementally to a delta stream,
//! holding back text from a potential `<function` opening until it either
//! completes (and is removed) or proves to be ordinary text. The filter
//! also drops whitespace-only deltas before the first visible output.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// Markup pattern: `<function(name)>...</function>` or `<function/name>...</function>`
fn function_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<function[/\(][^>]+>[\s\S]*?</function>").ok())
        .as_ref()
}

/// Strip synthetic function-call markup from a complete text.
///
/// Returns the input unchanged when no markup is present; the result is
/// trimmed when markup was removed.
#[must_use]
pub fn strip_synthetic_function_calls(content: &str) -> Cow<'_, str> {
    let Some(pattern) = function_pattern() else {
        return Cow::Borrowed(content);
    };

    let cleaned = pattern.replace_all(content, "");
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        Cow::Borrowed("")
    } else if trimmed.len() == content.len() {
        Cow::Borrowed(content)
    } else {
        Cow::Owned(trimmed.to_owned())
    }
}

/// Incremental shaping filter over a stream of text deltas
#[derive(Debug, Default)]
pub struct ShapingFilter {
    /// Text held back because it may open a synthetic function block
    held: String,
    /// Whether any visible (non-whitespace) output has been emitted
    visible: bool,
}

impl ShapingFilter {
    /// Create a fresh filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta; returns the text that may be emitted now
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.held.push_str(delta);

        let mut out = Vec::new();
        loop {
            if self.held.is_empty() {
                break;
            }

            let Some(lt) = self.held.find('<') else {
                // No markup candidate: everything is plain text.
                let text = std::mem::take(&mut self.held);
                self.emit(text, &mut out);
                break;
            };

            if lt > 0 {
                let text: String = self.held.drain(..lt).collect();
                self.emit(text, &mut out);
            }

            // `held` now starts with '<'. Decide whether it can still be a
            // synthetic function block.
            const OPENER: &str = "<function";
            if self.held.len() < OPENER.len() && OPENER.starts_with(self.held.as_str()) {
                break; // wait for more input
            }

            if self.held.starts_with(OPENER) {
                // The opener is only real when followed by '(' or '/'.
                match self.held.as_bytes().get(OPENER.len()).copied() {
                    None => break, // exactly "<function", wait for more
                    Some(b'(' | b'/') => {
                        match function_pattern().and_then(|p| p.find(&self.held)) {
                            Some(found) if found.start() == 0 => {
                                self.held.drain(..found.end());
                            }
                            _ => break, // block not yet complete
                        }
                    }
                    Some(_) => {
                        // Ordinary text like "<functions": emit '<' and rescan.
                        let text: String = self.held.drain(..1).collect();
                        self.emit(text, &mut out);
                    }
                }
            } else {
                // A '<' that is not a function opener: emit it and rescan.
                let text: String = self.held.drain(..1).collect();
                self.emit(text, &mut out);
            }
        }

        out
    }

    /// Flush any held text at end of stream (an unterminated opener is
    /// emitted verbatim)
    pub fn flush(&mut self) -> Option<String> {
        if self.held.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.held);
        if !self.visible && text.trim().is_empty() {
            return None;
        }
        self.visible = true;
        Some(text)
    }

    /// Emit text subject to the leading-whitespace gate
    fn emit(&mut self, text: String, out: &mut Vec<String>) {
        if text.is_empty() {
            return;
        }
        if !self.visible && text.trim().is_empty() {
            return;
        }
        self.visible = true;
        out.push(text);
    }
}

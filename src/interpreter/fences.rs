//! Split-safe code-fence scanning.
//!
//! Text deltas can cut a triple-backtick marker, or the language tag that
//! follows it, at any byte. The scanner buffers a partial marker across
//! calls instead of discarding it, so a fence split as "`" + "`" + "`py"
//! still toggles exactly once and still captures "py".
//!
//! Fence recognition is deliberately naive: every unmatched run of three
//! backticks toggles the state wherever it occurs, including mid-line.
//! Inline single/double backticks pass through as literal text.

/// Classified output of a scan pass. Pieces arrive in text order.
#[derive(Debug, Clone, PartialEq)]
pub enum FencePiece {
    /// Prose outside any code block
    Text(String),
    /// Body text inside the open code block
    Code(String),
    /// A fence opened; a language tag may follow
    Open,
    /// The language tag of the open fence completed (may be empty)
    Language(String),
    /// The open fence closed
    Close,
}

/// Stateful fence scanner, owned by one message interpreter.
#[derive(Debug, Default)]
pub struct FenceScanner {
    in_code_block: bool,
    /// Language of the currently open block, once captured
    language: Option<String>,
    /// Consecutive backticks seen so far (0-2 buffered across calls)
    run: u8,
    /// True between an opening fence and the newline ending its tag line
    capturing_language: bool,
    language_buf: String,
    /// Pending literal characters for the current side
    lit: String,
}

impl FenceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scanner currently sits inside a code block.
    pub fn in_code_block(&self) -> bool {
        self.in_code_block
    }

    /// Language tag of the open block, if captured.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Scan one text delta, returning the classified pieces it produced.
    pub fn scan(&mut self, delta: &str) -> Vec<FencePiece> {
        let mut out = Vec::new();
        for c in delta.chars() {
            if c == '`' {
                self.run += 1;
                if self.run == 3 {
                    self.run = 0;
                    self.toggle(&mut out);
                }
                continue;
            }
            self.resolve_run();
            self.push_char(&mut out, c);
        }
        self.flush_lit(&mut out);
        out
    }

    /// Flush everything still buffered. Called when the message is
    /// finalized; a dangling partial marker becomes literal text and a
    /// tag line that never saw its newline still yields its language.
    pub fn finish(&mut self) -> Vec<FencePiece> {
        let mut out = Vec::new();
        self.resolve_run();
        if self.capturing_language {
            self.end_language_capture(&mut out);
        }
        self.flush_lit(&mut out);
        out
    }

    fn toggle(&mut self, out: &mut Vec<FencePiece>) {
        self.flush_lit(out);
        if !self.in_code_block {
            self.in_code_block = true;
            self.capturing_language = true;
            self.language_buf.clear();
            out.push(FencePiece::Open);
        } else {
            if self.capturing_language {
                self.end_language_capture(out);
            }
            self.in_code_block = false;
            self.language = None;
            out.push(FencePiece::Close);
        }
    }

    fn push_char(&mut self, out: &mut Vec<FencePiece>, c: char) {
        if self.capturing_language {
            if c == '\n' {
                self.end_language_capture(out);
            } else {
                self.language_buf.push(c);
            }
            return;
        }
        self.lit.push(c);
    }

    /// Turn a pending run of fewer than three backticks into literal text.
    fn resolve_run(&mut self) {
        if self.run == 0 {
            return;
        }
        let run = std::mem::take(&mut self.run) as usize;
        let target = if self.capturing_language {
            &mut self.language_buf
        } else {
            &mut self.lit
        };
        for _ in 0..run {
            target.push('`');
        }
    }

    fn end_language_capture(&mut self, out: &mut Vec<FencePiece>) {
        self.capturing_language = false;
        let tag = self.language_buf.trim().to_string();
        self.language = if tag.is_empty() {
            None
        } else {
            Some(tag.clone())
        };
        self.language_buf.clear();
        out.push(FencePiece::Language(tag));
    }

    fn flush_lit(&mut self, out: &mut Vec<FencePiece>) {
        if self.lit.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.lit);
        if self.in_code_block {
            out.push(FencePiece::Code(text));
        } else {
            out.push(FencePiece::Text(text));
        }
    }
}

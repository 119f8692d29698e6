// Hunk encoder: greedy matcher over an append-only window.
//
// The matcher runs a two-state machine.  `Literal` accumulates bytes that
// have no earlier occurrence; the first byte that does occur in the window
// opens a `Matching` candidate anchored at the window length *before* that
// byte lands (that anchor becomes the replay's output position, so the
// rewind is measured from it).  Each further byte extends the candidate and
// re-searches for the most recent occurrence of the whole extended
// sequence, which is the smallest-rewind tie-break the reference scheme
// uses.
//
// A failed extension either closes the subhunk (candidate long enough to be
// a replay) or folds the candidate back into the literal run (the wire
// cannot express replays shorter than 4 bytes); either way the byte that
// failed is re-fed through the `Literal` state.
//
// The window is flushed as one complete hunk the moment it reaches 65536
// bytes.  Flushing at exactly the cap means no candidate ever anchors at
// window length 65536, which keeps every rewind representable in 16 bits.

use log::debug;

use super::{MIN_REPLAY, Replay, Subhunk, WINDOW_MAX, write_hunk};
use crate::window::WindowIndex;

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Compress a raw byte stream into the framed, hunk-segmented wire form.
pub fn encode_block(raw: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new();
    encoder.push_all(raw);
    encoder.finish()
}

/// Matcher state.  The candidate bytes of a `Matching` state are the last
/// `len` bytes of the window (they are appended as they are accepted).
enum State {
    Literal {
        pending: Vec<u8>,
    },
    Matching {
        /// Literal run preceding this match, emitted with the subhunk.
        pending: Vec<u8>,
        /// Window length when the match opened; the replay's output position.
        origin: usize,
        /// Window position of the candidate's most recent occurrence.
        start: usize,
        /// Bytes accepted into the candidate so far.
        len: u32,
    },
}

impl Default for State {
    fn default() -> Self {
        State::Literal {
            pending: Vec::new(),
        }
    }
}

/// Streaming hunk encoder.  Feed bytes with [`push`](Encoder::push), then
/// call [`finish`](Encoder::finish) to flush and take the compressed stream.
///
/// Each instance owns its window and buffers; nothing is shared across
/// invocations.
pub struct Encoder {
    window: Vec<u8>,
    index: WindowIndex,
    state: State,
    subhunks: Vec<Subhunk>,
    out: Vec<u8>,
    hunks: u64,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            window: Vec::with_capacity(WINDOW_MAX),
            index: WindowIndex::with_capacity(WINDOW_MAX),
            state: State::default(),
            subhunks: Vec::new(),
            out: Vec::new(),
            hunks: 0,
        }
    }

    /// Process one input byte.
    pub fn push(&mut self, byte: u8) {
        loop {
            match std::mem::take(&mut self.state) {
                State::Literal { mut pending } => {
                    if self.index.contains(byte) {
                        self.state = State::Matching {
                            pending,
                            origin: self.window.len(),
                            start: 0,
                            len: 0,
                        };
                        continue; // re-feed the byte as the first candidate byte
                    }
                    pending.push(byte);
                    self.state = State::Literal { pending };
                    self.append_to_window(byte);
                    return;
                }
                State::Matching {
                    mut pending,
                    origin,
                    start,
                    len,
                } => {
                    if let Some(found) = self.find_extension(len, byte) {
                        self.state = State::Matching {
                            pending,
                            origin,
                            start: found,
                            len: len + 1,
                        };
                        self.append_to_window(byte);
                        return;
                    }
                    if len < MIN_REPLAY {
                        // Too short to be a replay: the candidate bytes stay
                        // in the window but rejoin the literal run.
                        let tail = self.window.len() - len as usize;
                        pending.extend_from_slice(&self.window[tail..]);
                        self.state = State::Literal { pending };
                    } else {
                        self.subhunks.push(Subhunk {
                            literal: pending,
                            replay: Some(Replay {
                                rewind: (origin - start) as u16,
                                len,
                            }),
                        });
                        self.state = State::default();
                    }
                    // Retry the byte that failed to extend the match.
                }
            }
        }
    }

    /// Process a run of input bytes.
    pub fn push_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Flush whatever is pending and drain the compressed stream, leaving
    /// the encoder empty.  [`hunks`](Encoder::hunks) stays readable.
    pub fn finish(&mut self) -> Vec<u8> {
        self.flush_hunk();
        debug!("encoded {} hunks, {} bytes total", self.hunks, self.out.len());
        std::mem::take(&mut self.out)
    }

    /// Hunks emitted so far (the final count is only stable after all input
    /// has been pushed and the stream flushed).
    pub fn hunks(&self) -> u64 {
        self.hunks
    }

    /// Most recent occurrence of the current candidate extended by `next`.
    ///
    /// The candidate is the last `len` window bytes; an occurrence must end
    /// strictly inside the window (before `next` is appended), which also
    /// guarantees it starts before the match origin.  Walking the byte chain
    /// newest-first makes the first hit the smallest-rewind occurrence.
    fn find_extension(&self, len: u32, next: u8) -> Option<usize> {
        let len = len as usize;
        if len == 0 {
            return self.index.latest(next);
        }
        let window = &self.window;
        let candidate = window.len() - len;
        for pos in self.index.chain(window[candidate]) {
            if pos >= candidate {
                continue; // occurrence would run off the end of the window
            }
            if window[pos + len] == next && window[pos..pos + len] == window[candidate..] {
                return Some(pos);
            }
        }
        None
    }

    fn append_to_window(&mut self, byte: u8) {
        self.window.push(byte);
        self.index.push(byte);
        if self.window.len() >= WINDOW_MAX {
            self.flush_hunk();
        }
    }

    /// Force-close the pending state and emit the accumulated subhunks as
    /// one complete hunk.  No-op when nothing has been buffered.
    fn flush_hunk(&mut self) {
        self.close_pending();
        if !self.subhunks.is_empty() {
            write_hunk(&self.subhunks, &mut self.out)
                .expect("encoder never buffers a sub-minimum replay");
            debug!(
                "hunk {}: {} subhunks, {} window bytes",
                self.hunks,
                self.subhunks.len(),
                self.window.len()
            );
            self.subhunks.clear();
            self.hunks += 1;
        }
        self.window.clear();
        self.index.reset();
    }

    /// Convert the in-flight state into a final subhunk.  A candidate below
    /// the replay minimum is folded into the literals and the subhunk goes
    /// out literal-only, with no replay field on the wire.
    fn close_pending(&mut self) {
        match std::mem::take(&mut self.state) {
            State::Literal { pending } => {
                if !pending.is_empty() {
                    self.subhunks.push(Subhunk {
                        literal: pending,
                        replay: None,
                    });
                }
            }
            State::Matching {
                mut pending,
                origin,
                start,
                len,
            } => {
                if len >= MIN_REPLAY {
                    self.subhunks.push(Subhunk {
                        literal: pending,
                        replay: Some(Replay {
                            rewind: (origin - start) as u16,
                            len,
                        }),
                    });
                } else {
                    let tail = self.window.len() - len as usize;
                    pending.extend_from_slice(&self.window[tail..]);
                    self.subhunks.push(Subhunk {
                        literal: pending,
                        replay: None,
                    });
                }
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

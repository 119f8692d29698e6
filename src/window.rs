// Window occurrence index for the encoder's match search.
//
// The encoder repeatedly asks "where is the most recent occurrence of this
// byte sequence in the window?".  Every candidate sequence begins with the
// byte that opened the match, so the index chains window positions by byte
// value: `head[b]` is the newest position holding byte `b`, and `prev[pos]`
// links to the next-older position with the same byte.  Walking a chain
// yields positions newest-first, which is exactly the smallest-rewind
// tie-break the format requires.
//
// Stored values carry a +1 offset so that 0 means "empty"; positions fit in
// u32 because the window never exceeds 65536 bytes.

/// Offset applied to stored positions so that 0 marks an empty slot.
const CKOFFSET: u32 = 1;

/// Per-byte-value position chains over the encoder window.
pub struct WindowIndex {
    /// `head[b]` = newest window position of byte `b`, +CKOFFSET (0 = none).
    head: [u32; 256],
    /// `prev[pos]` = next-older position with the same byte, +CKOFFSET.
    /// Grows in lockstep with the window.
    prev: Vec<u32>,
}

impl WindowIndex {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            head: [0; 256],
            prev: Vec::with_capacity(cap),
        }
    }

    /// Forget all positions (new hunk window).  Keeps the prev allocation.
    pub fn reset(&mut self) {
        self.head = [0; 256];
        self.prev.clear();
    }

    /// Record `byte` at the next window position.
    ///
    /// Positions must be inserted in window order; `pos` is implied by the
    /// number of insertions so far.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        let slot = self.prev.len() as u32 + CKOFFSET;
        self.prev.push(self.head[usize::from(byte)]);
        self.head[usize::from(byte)] = slot;
    }

    /// Whether `byte` occurs anywhere in the indexed window.
    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.head[usize::from(byte)] != 0
    }

    /// The newest window position holding `byte`, if any.
    #[inline]
    pub fn latest(&self, byte: u8) -> Option<usize> {
        let v = self.head[usize::from(byte)];
        (v != 0).then(|| (v - CKOFFSET) as usize)
    }

    /// Iterate positions of `byte`, newest first.
    #[inline]
    pub fn chain(&self, byte: u8) -> Chain<'_> {
        Chain {
            prev: &self.prev,
            next: self.head[usize::from(byte)],
        }
    }

    /// Number of indexed positions (equals the window length).
    pub fn len(&self) -> usize {
        self.prev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }
}

impl Default for WindowIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest-first walk over one byte value's positions.
pub struct Chain<'a> {
    prev: &'a [u32],
    next: u32,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.next == 0 {
            return None;
        }
        let pos = (self.next - CKOFFSET) as usize;
        self.next = self.prev[pos];
        Some(pos)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

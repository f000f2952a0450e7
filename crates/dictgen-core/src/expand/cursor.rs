//! Explicit parser position

/// Position within a token stream plus the number of open invocations
///
/// The cursor is a plain value: every step of the engine takes one and hands
/// back the next, so two expansions never share parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Index of the next token to read
    pub position: usize,
    /// Number of macro invocations currently open
    pub depth: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step past the current token
    pub fn advance(self) -> Self {
        Self {
            position: self.position + 1,
            ..self
        }
    }

    /// Enter one more macro invocation
    pub fn descend(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    /// True if `self` is strictly past `other` in the stream
    pub fn is_past(&self, other: &Cursor) -> bool {
        self.position > other.position
    }
}

//! Text buffer with rope data structure for livecode.
//!
//! Provides the authoritative character buffer, the caret/selection pair
//! over it, and the edit surface that owns both and supplies the native
//! effects of keystrokes (typing, line breaks, deletion, caret motion).
//!
//! All offsets are character (Unicode scalar) offsets.

mod buffer;
mod selection;
mod surface;

pub use buffer::TextBuffer;
pub use selection::Selection;
pub use surface::{EditSurface, Motion};

/// Length of a string in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}


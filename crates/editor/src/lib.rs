//! Live editing core for livecode.
//!
//! [`LiveEditor`] couples an edit surface with a highlighted projection of
//! its text and layers the editing conveniences on top: auto-closing pairs,
//! carried-over indentation, block indent/outdent, snippets with tab stops,
//! comment toggling, line duplication and configurable shortcuts.

pub mod config;
mod core;
pub mod gutter;
pub mod indent;
pub mod keyboard;
pub mod language;
pub mod locator;
pub mod selection;
pub mod snippet;
mod text_editing;

// Re-export main types
pub use config::EditorConfig;
pub use core::{Action, EditorBuilder, LiveEditor};
pub use gutter::LineNumbers;
pub use keyboard::EditorCommand;
pub use language::{CommentStyle, LanguageContext, LanguageRegistry, ResolvedContext};
pub use locator::Position;
pub use selection::SelectionState;
pub use snippet::Expansion;

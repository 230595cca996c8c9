//! UI module - handles all TUI rendering
//!
//! Structure:
//! - `draw.rs` - Main draw functions
//! - `host.rs` - Terminal host the list controller renders through
//! - `theme.rs` - Color themes, presets and selection tokens

mod draw;
pub mod host;
pub mod theme;

// Re-export main draw function
pub use draw::draw;

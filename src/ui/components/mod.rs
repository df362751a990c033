//! Reusable UI components

mod dialog;

pub use dialog::{centered, render_confirm_dialog, render_error_dialog};

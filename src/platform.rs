//! Platform-specific configuration

use crossterm::event::KeyModifiers;

/// Platform-appropriate modifier for form shortcuts
/// - macOS: SUPER (Cmd key)
/// - Linux/Windows: CONTROL (Ctrl key)
#[cfg(target_os = "macos")]
pub const FORM_MODIFIER: KeyModifiers = KeyModifiers::SUPER;

#[cfg(not(target_os = "macos"))]
pub const FORM_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

/// Submit shortcut display for form help text
/// Ctrl+S works on all platforms
pub const SUBMIT_SHORTCUT: &str = "Ctrl+S";

/// Next step shortcut display
#[cfg(target_os = "macos")]
pub const NEXT_STEP_SHORTCUT: &str = "Cmd+N";

#[cfg(not(target_os = "macos"))]
pub const NEXT_STEP_SHORTCUT: &str = "Ctrl+N";

/// Previous step shortcut display
#[cfg(target_os = "macos")]
pub const BACK_STEP_SHORTCUT: &str = "Cmd+B";

#[cfg(not(target_os = "macos"))]
pub const BACK_STEP_SHORTCUT: &str = "Ctrl+B";

/// Whether `modifiers` hold the form shortcut modifier (Ctrl is accepted
/// everywhere)
pub fn is_form_shortcut(modifiers: KeyModifiers) -> bool {
    modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(FORM_MODIFIER)
}

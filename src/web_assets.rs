//! Stylesheet and behavior script compiled into the binary so `serve` and
//! `render` output need no asset files alongside them.

pub const STYLESHEET_PATH: &str = "/assets/docshell.css";
pub const SCRIPT_PATH: &str = "/assets/docshell.js";

/// Served at [`STYLESHEET_PATH`]. Styles the page chrome and every class
/// the page components toggle (`active`, `show`, `dark-mode`, `fade-in-up`,
/// `copy-failed`).
pub const CSS: &str = include_str!("assets/docshell.css");

/// Served at [`SCRIPT_PATH`]. Wires the browser events for the markup
/// [`crate::shell::render_page`] produces, reading its settings from the
/// `#docshell-config` JSON block.
pub const JS: &str = include_str!("assets/docshell.js");

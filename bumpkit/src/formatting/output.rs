//! General output formatting utilities.

use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;

/// Prints a key-value pair with consistent formatting.
pub fn print_key_value(key: &str, value: &str) {
    println!("  {} {}", key.bright_black().bold(), value.bold().white());
}

/// Prints a block of preformatted text, indented and dimmed.
pub fn print_block(text: &str) {
    for line in text.lines() {
        println!("    {}", line.bright_black());
    }
}

/// Prints paths relative to `root` where possible, one per line.
pub fn print_path_list(paths: &[PathBuf], root: &Path) {
    for path in paths {
        let shown = path.strip_prefix(root).unwrap_or(path);
        println!("  {} {}", "→".cyan(), shown.display().to_string().bold().white());
    }
}

//! One-line status messages.

use owo_colors::OwoColorize;

pub fn print_success(message: &str) {
    println!("  {} {}", "✓".green(), message.green().bold());
}

pub fn print_warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow().bold());
}

/// Progress lines emitted while a release runs.
pub fn print_info(message: &str) {
    println!("  {} {}", "→".cyan(), message.cyan());
}

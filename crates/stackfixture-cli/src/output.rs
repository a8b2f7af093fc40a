//! Formatted output helpers for CLI commands.

/// Prints a title underlined with a double rule of the same width.
pub fn print_heading(title: &str) {
    println!("{title}");
    println!("{}", rule(title.chars().count()));
    println!();
}

/// A double horizontal rule `width` characters wide.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

/// `count` followed by `noun`, pluralized with a trailing `s`.
#[must_use]
pub fn count_of(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

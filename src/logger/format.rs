//! Console formatting with ANSI colors and text wrapping
//!
//! Handles:
//! - Colorized tag and level columns
//! - Word wrapping with aligned continuation lines
//! - Broken pipe handling for piped commands

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Column widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 7;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 140;

/// Format and output a log message
pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str, use_colors: bool) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let tag_text = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    let level_text = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);

    // time + space + [tag] + space + [level] + space
    let prefix_width = time.len() + 1 + TAG_WIDTH + 2 + 1 + LEVEL_WIDTH + 2 + 1;
    let available = MAX_LINE_LENGTH.saturating_sub(prefix_width).max(40);
    let chunks = wrap_text(message, available);

    let first = if use_colors {
        format!(
            "{} [{}] [{}] {}",
            time.dimmed(),
            color_tag(tag, tag_text),
            color_level(level, level_text),
            color_message(level, &chunks[0])
        )
    } else {
        format!("{} [{}] [{}] {}", time, tag_text, level_text, chunks[0])
    };
    print_stdout_safe(&first);

    let padding = " ".repeat(prefix_width);
    for chunk in &chunks[1..] {
        let line = if use_colors {
            color_message(level, chunk).to_string()
        } else {
            chunk.to_string()
        };
        print_stdout_safe(&format!("{}{}", padding, line));
    }
}

fn color_tag(tag: &LogTag, text: String) -> ColoredString {
    match tag {
        LogTag::System => text.bright_yellow().bold(),
        LogTag::Realtime => text.bright_green().bold(),
        LogTag::Transport => text.bright_cyan().bold(),
        LogTag::Reconnect => text.bright_magenta().bold(),
        LogTag::Simulator => text.bright_blue().bold(),
        LogTag::Registry => text.bright_white().bold(),
        LogTag::Health => text.green().bold(),
        LogTag::Config => text.yellow().bold(),
        LogTag::Test => text.blue().bold(),
        LogTag::Other(_) => text.white().bold(),
    }
}

fn color_level(level: LogLevel, text: String) -> ColoredString {
    match level {
        LogLevel::Error => text.bright_red().bold(),
        LogLevel::Warning => text.bright_yellow().bold(),
        LogLevel::Info => text.white().bold(),
        LogLevel::Debug => text.purple(),
        LogLevel::Verbose => text.dimmed(),
    }
}

fn color_message(level: LogLevel, text: &str) -> ColoredString {
    match level {
        LogLevel::Error => text.red(),
        LogLevel::Warning => text.yellow(),
        LogLevel::Verbose => text.dimmed(),
        _ => text.normal(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                result.extend(chars.chunks(max_width).map(|c| c.iter().collect::<String>()));
            } else if current.is_empty() {
                current = word.to_string();
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "reconnect attempt 3 of 5 scheduled in 15000ms for ws://localhost:8080/websocket";
        let lines = wrap_text(text, 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines[0], "reconnect attempt 3");
    }

    #[test]
    fn test_wrap_text_keeps_newlines_and_breaks_long_words() {
        let lines = wrap_text("first\nsecond", 40);
        assert_eq!(lines, vec!["first", "second"]);

        let long = "x".repeat(25);
        let lines = wrap_text(&long, 10);
        assert_eq!(lines, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);

        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}

//! Terminal output primitives for xtumlc.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use xtuml_compiler::{TranslationNote, ValidationIssue};

pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const VIOLET: Color = Color::Color256(135);
    pub const GREEN: Color = Color::Color256(82);
    pub const AMBER: Color = Color::Color256(214);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const PROGRESS_FILLED: &str = "\u{25B0}"; // ▰
    pub const PROGRESS_EMPTY: &str = "\u{25B1}"; // ▱
    pub const DOT: &str = "\u{00B7}"; // ·
}

const BOX_WIDTH: usize = 55;

pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::TARGET_FILLED).fg(colors::GREEN), msg);
}

pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

pub fn info(msg: &str) {
    println!("  {} {}", style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN), msg);
}

pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}")
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// Box edges and rows all span `BOX_WIDTH` columns after the indent.
pub fn box_header(title: &str) {
    println!("  {}", box_header_text(title));
}

pub fn box_line(content: &str) {
    println!("  {}", box_line_text(content));
}

pub fn box_footer() {
    println!("  {}", box_footer_text());
}

fn box_header_text(title: &str) -> String {
    let title_padded = format!(" {} ", title);
    let dashes = BOX_WIDTH.saturating_sub(console::measure_text_width(&title_padded) + 3);
    format!(
        "{}{}{}{}",
        style("\u{256D}\u{2500}").fg(colors::CYAN),
        style(title_padded).fg(colors::CYAN).bold(),
        style("\u{2500}".repeat(dashes)).fg(colors::CYAN),
        style("\u{256E}").fg(colors::CYAN)
    )
}

fn box_line_text(content: &str) -> String {
    let padding = (BOX_WIDTH - 3).saturating_sub(console::measure_text_width(content));
    format!(
        "{} {}{}{}",
        style("\u{2502}").fg(colors::CYAN),
        content,
        " ".repeat(padding),
        style("\u{2502}").fg(colors::CYAN)
    )
}

fn box_footer_text() -> String {
    format!(
        "{}{}{}",
        style("\u{2570}").fg(colors::CYAN),
        style("\u{2500}".repeat(BOX_WIDTH - 2)).fg(colors::CYAN),
        style("\u{256F}").fg(colors::CYAN)
    )
}

/// Fill bar for `value` out of `max`, eight cells wide.
pub fn meter(value: usize, max: usize) -> String {
    let filled = ((value * 8) / max.max(1)).min(8);
    format!(
        "{}{}",
        symbols::PROGRESS_FILLED.repeat(filled),
        symbols::PROGRESS_EMPTY.repeat(8 - filled)
    )
}

/// One compiled model inside the summary box.
pub fn model_line(name: &str, files: usize, notes: usize, max_files: usize) -> String {
    let notes = if notes == 0 {
        style("clean".to_string()).fg(colors::GREEN)
    } else {
        style(format!("{notes} note(s)")).fg(colors::AMBER)
    };
    format!(
        "{} {:14} {:>3} files  {}  {}",
        style(symbols::TRIANGLE).fg(colors::CYAN),
        style(name).bold(),
        files,
        style(meter(files, max_files)).fg(colors::VIOLET),
        notes
    )
}

pub fn note(note: &TranslationNote) {
    println!(
        "  {} {} {}",
        style(symbols::DOT).fg(colors::AMBER),
        style(&note.location).fg(colors::DIM),
        note.message
    );
}

pub fn issue(issue: &ValidationIssue) {
    println!(
        "  {} {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(&issue.path).fg(colors::CYAN),
        issue.message
    );
    if let Some(hint) = &issue.hint {
        println!("      {}", style(hint).fg(colors::DIM));
    }
}

pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}

pub fn nope_header() {
    println!();
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA).bold(),
        style("Model rejected.").fg(colors::MAGENTA).bold()
    );
    println!();
}

pub fn looking_good() {
    println!(
        "  {} {}",
        style(symbols::TARGET_FILLED).fg(colors::GREEN),
        style("Model is valid.").bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_bounds() {
        assert_eq!(meter(0, 10), symbols::PROGRESS_EMPTY.repeat(8));
        assert_eq!(meter(10, 10), symbols::PROGRESS_FILLED.repeat(8));
        assert_eq!(meter(3, 0), symbols::PROGRESS_FILLED.repeat(8));
    }

    #[test]
    fn test_model_line_mentions_counts() {
        let line = console::strip_ansi_codes(&model_line("vending", 12, 2, 12)).to_string();
        assert!(line.contains("vending"));
        assert!(line.contains(" 12 files"));
        assert!(line.contains("2 note(s)"));
    }

    #[test]
    fn test_box_edges_match_row_width() {
        let header = console::measure_text_width(&box_header_text("Compiled"));
        let row = console::measure_text_width(&box_line_text(&model_line("vending", 12, 0, 12)));
        let footer = console::measure_text_width(&box_footer_text());
        assert_eq!(header, BOX_WIDTH);
        assert_eq!(row, BOX_WIDTH);
        assert_eq!(footer, BOX_WIDTH);
    }
}

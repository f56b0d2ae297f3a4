use colored::*;

use crate::core::dispatcher::Response;

pub struct OutputStyle;

impl OutputStyle {
    pub fn title(text: &str) -> ColoredString {
        text.bright_blue().bold()
    }

    pub fn label(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn prompt(text: &str) -> ColoredString {
        text.bright_yellow()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn header_separator() -> String {
        "═".repeat(50)
    }

    pub fn print_header(title: &str) {
        println!("{}", Self::title(title));
        println!("{}", Self::header_separator());
    }

    pub fn print_field_colored(label: &str, value: &str, color_fn: impl Fn(&str) -> ColoredString) {
        println!("{:>12}: {}", Self::label(label), color_fn(value));
    }

    /// Style a dispatcher response. With `color` off the text is exactly the
    /// response's plain rendering.
    pub fn response(response: &Response, color: bool) -> String {
        let text = response.to_string();
        if !color {
            return text;
        }
        let styled = match response {
            Response::Answer { outcome: Ok(_), .. } => Self::success(&text),
            Response::Answer { outcome: Err(_), .. } => Self::error(&text),
            Response::UsageHint => Self::warning(&text),
            Response::Farewell => Self::muted(&text),
        };
        styled.to_string()
    }

    /// Apply `color_fn` only when color output is enabled
    pub fn paint(text: &str, color: bool, color_fn: impl Fn(&str) -> ColoredString) -> String {
        if color {
            color_fn(text).to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn print_success(message: &str) {
    println!("✅ {}", OutputStyle::success(message));
}

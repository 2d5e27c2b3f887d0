//! Command output rendering.
//!
//! Every command builds a serializable output struct and hands it to
//! [`output`], which renders either the human form or pretty JSON depending
//! on the global `--json` flag. Logs go to stderr, so stdout carries only
//! the rendered result and stays machine-readable in JSON mode.

pub mod progress;
pub mod table;

/// Rendered forms of one command's result.
pub trait CommandOutput {
    /// Human-readable form, printed as-is.
    fn to_human(&self) -> String;

    /// JSON form, pretty-printed in `--json` mode.
    fn to_json(&self) -> serde_json::Value;
}

/// Print a command result to stdout in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        match serde_json::to_string_pretty(&result.to_json()) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Failed to serialize output: {err}"),
        }
    } else {
        println!("{}", result.to_human());
    }
}

/// Shorten a string to at most `max_len` characters, marking the cut
/// with an ellipsis. Counts characters, not bytes, so multi-byte text
/// never splits mid-character.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Sample {
        message: String,
    }

    impl CommandOutput for Sample {
        fn to_human(&self) -> String {
            self.message.clone()
        }

        fn to_json(&self) -> serde_json::Value {
            serde_json::to_value(self).unwrap_or_default()
        }
    }

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string_gets_ellipsis() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        assert_eq!(truncate("12345", 5), "12345");
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let s = "héllö wörld ünïcödé";
        let cut = truncate(s, 10);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= 10);
    }

    #[test]
    fn test_to_json_carries_fields() {
        let sample = Sample { message: "done".into() };
        assert_eq!(sample.to_json()["message"], "done");
    }
}

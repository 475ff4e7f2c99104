//! Shared helper functions for CLI commands

use rust_decimal::Decimal;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset: warnings only, plus partpick's
/// own debug output in verbose mode
pub fn default_log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose { "warn,partpick=debug" } else { "warn" })
}

/// `RUST_LOG` if it parses, otherwise [`default_log_filter`]
pub fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter(verbose))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a value for a tab-separated line
///
/// Tabs and newlines would break the column layout, so they become spaces.
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Render a price without trailing zeros ("0.120" prints as "0.12")
pub fn format_price(price: Decimal) -> String {
    price.normalize().to_string()
}

/// Render an elapsed time the way the run summary prints it
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

/// Pluralise a count for summary lines
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("µµµµµµ", 5), "µµ...");
    }

    #[test]
    fn test_escape_tsv() {
        assert_eq!(escape_tsv("simple"), "simple");
        assert_eq!(escape_tsv("a\tb\nc"), "a b c");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::from_str("0.120").unwrap()), "0.12");
        assert_eq!(format_price(Decimal::from(9999)), "9999");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "family", "families"), "1 family");
        assert_eq!(plural(3, "family", "families"), "3 families");
    }
}

//! Frequently used patterns, compiled once on first use.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of CJK unified ideographs (U+4E00 to U+9FA5).
pub static CHINESE: LazyLock<Regex> = LazyLock::new(|| compile(r"[\u{4e00}-\u{9fa5}]+"));

/// A leading `YYYY-M-D` date.
pub static DATE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d{4}-\d{1,2}-\d{1,2}"));

/// A newline followed by blank space up to a carriage return.
pub static SPACE_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\s*\r"));

/// Dotted-quad shaped text. Octet ranges are not checked.
pub static IP: LazyLock<Regex> = LazyLock::new(|| compile(r"\d+\.\d+\.\d+\.\d+"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

/// Every IP-shaped substring of `text`.
pub fn find_ips(text: &str) -> Vec<&str> {
    IP.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chinese_runs() {
        let found: Vec<&str> = CHINESE
            .find_iter("服务 offer-api 已上线")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["服务", "已上线"]);
    }

    #[test]
    fn date_is_anchored() {
        assert!(DATE.is_match("2021-9-10 updated"));
        assert!(!DATE.is_match("updated 2021-09-10"));
    }

    #[test]
    fn space_line() {
        assert!(SPACE_LINE.is_match("a\n   \rb"));
        assert!(!SPACE_LINE.is_match("a\nb\r"));
    }

    #[test]
    fn ips_in_consul_output() {
        assert_eq!(
            find_ips("web 10.0.0.5:9000, api 192.168.1.20:80"),
            vec!["10.0.0.5", "192.168.1.20"]
        );
    }
}

use regex::Regex;
use std::sync::LazyLock;

/// Banners are only trusted when written from this file.
pub const BANNER_FILE: &str = "main.cc";

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^===== Hi, me zypper ([0-9.]*)").expect("valid version banner regex"));

static COMMAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^===== ([^A-Z].*) =====").expect("valid command banner regex"));

/// `===== Hi, me zypper 1.14.36` yields `1.14.36`.
pub fn match_version(text: &str) -> Option<&str> {
    VERSION_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `===== 'zypper' 'in' 'foo' =====` yields `zypper in foo`.
pub fn match_command(text: &str) -> Option<String> {
    COMMAND_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('\'', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_version() {
        assert_eq!(match_version("===== Hi, me zypper 1.14.36"), Some("1.14.36"));
        assert_eq!(match_version("===== Hi, me zypper 1.14.36 (x86_64)"), Some("1.14.36"));
        assert_eq!(match_version("===== Hi, me zypper \nmore"), Some(""));
        assert_eq!(match_version("==== Hi, me zypper 1.0"), None);
        assert_eq!(match_version("x ===== Hi, me zypper 1.0"), None);
    }

    #[test]
    fn test_match_command() {
        assert_eq!(
            match_command("===== 'zypper' 'in' 'vim' ====="),
            Some("zypper in vim".to_string())
        );
        assert_eq!(
            match_command("===== zypper refresh ===== trailing"),
            Some("zypper refresh".to_string())
        );
        // an uppercase start is not a command line
        assert_eq!(match_command("===== Hi, me zypper 1.14.36 ====="), None);
        assert_eq!(match_command("===== no closing marker"), None);
    }

    #[test]
    fn test_command_banner_does_not_span_lines() {
        assert_eq!(match_command("===== zypper\nup ====="), None);
        assert_eq!(
            match_command("===== zypper up =====\nsecond line"),
            Some("zypper up".to_string())
        );
    }
}

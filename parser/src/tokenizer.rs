use regex::{Captures, Regex};
use std::sync::LazyLock;

// Digit counts are bounded so level fits a u8 and pid/line fit a u32.
// 2020-04-14 10:58:37 <1> hobbes(1198) [zypper++] main.cc(main):97 {T:Zypp-main} ===== Hi, me zypper 1.14.36
static LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<date>[0-9]{4}-[0-9]{2}-[0-9]{2})",
        r" +(?P<time>[0-9]{2}:[0-9]{2}:[0-9]{2})",
        r" +(?P<level_field><(?P<level>[0-9]{1,2})>)",
        r" +(?P<host_field>(?P<host>[^(]*)\((?P<pid>[0-9]{1,9})\))",
        r" +(?P<group_field>\[(?P<group>[^\]+]*)(?P<separator>\+\+)?\])",
        r" +(?P<file_field>(?P<file>[^(:]*)(?:\((?P<function>[^ ]*)\))?:(?P<line>[0-9]{1,9}))",
        r"(?: +(?P<thread_field>\{T:(?P<thread>[^}]+)\}))?",
        r" +(?P<text>.*)$",
    ))
    .expect("log line grammar is a valid regex")
});

/// Sub-fields of one line that matched the log grammar.
///
/// Every value borrows from the input line. Numeric fields stay raw so the
/// interner decides how to parse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub level_field: &'a str,
    pub level: &'a str,
    pub host_field: &'a str,
    pub host: &'a str,
    pub pid: &'a str,
    pub group_field: &'a str,
    pub group: &'a str,
    /// The group carried the `++` marker.
    pub separator: bool,
    pub file_field: &'a str,
    pub file: &'a str,
    pub function: Option<&'a str>,
    pub line: &'a str,
    pub thread_field: Option<&'a str>,
    pub thread: Option<&'a str>,
    pub text: &'a str,
}

/// Matches one physical line (without its newline) against the log grammar.
pub fn tokenize(line: &str) -> Option<LineMatch<'_>> {
    let caps = LINE_REGEX.captures(line)?;

    Some(LineMatch {
        date: required(&caps, "date"),
        time: required(&caps, "time"),
        level_field: required(&caps, "level_field"),
        level: required(&caps, "level"),
        host_field: required(&caps, "host_field"),
        host: required(&caps, "host"),
        pid: required(&caps, "pid"),
        group_field: required(&caps, "group_field"),
        group: required(&caps, "group"),
        separator: caps.name("separator").is_some(),
        file_field: required(&caps, "file_field"),
        file: required(&caps, "file"),
        function: optional(&caps, "function"),
        line: required(&caps, "line"),
        thread_field: optional(&caps, "thread_field"),
        thread: optional(&caps, "thread"),
        text: required(&caps, "text"),
    })
}

fn required<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn optional<'a>(caps: &Captures<'a>, name: &str) -> Option<&'a str> {
    caps.name(name).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "2020-04-14 10:58:37 <1> hobbes(1198) [zypper++] main.cc(main):97 {T:Zypp-main} ===== Hi, me zypper 1.14.36";

    #[test]
    fn test_tokenize_full_line() {
        let m = tokenize(BANNER).unwrap();

        assert_eq!(m.date, "2020-04-14");
        assert_eq!(m.time, "10:58:37");
        assert_eq!(m.level_field, "<1>");
        assert_eq!(m.level, "1");
        assert_eq!(m.host_field, "hobbes(1198)");
        assert_eq!(m.host, "hobbes");
        assert_eq!(m.pid, "1198");
        assert_eq!(m.group_field, "[zypper++]");
        assert_eq!(m.group, "zypper");
        assert!(m.separator);
        assert_eq!(m.file_field, "main.cc(main):97");
        assert_eq!(m.file, "main.cc");
        assert_eq!(m.function, Some("main"));
        assert_eq!(m.line, "97");
        assert_eq!(m.thread_field, Some("{T:Zypp-main}"));
        assert_eq!(m.thread, Some("Zypp-main"));
        assert_eq!(m.text, "===== Hi, me zypper 1.14.36");
    }

    #[test]
    fn test_tokenize_without_function_and_thread() {
        let line = "2021-01-02 03:04:05 <3> host(7) [zypp] Repo.cc:12 failed to   refresh";
        let m = tokenize(line).unwrap();

        assert_eq!(m.group, "zypp");
        assert!(!m.separator);
        assert_eq!(m.file_field, "Repo.cc:12");
        assert_eq!(m.file, "Repo.cc");
        assert_eq!(m.function, None);
        assert_eq!(m.thread_field, None);
        assert_eq!(m.thread, None);
        // inner whitespace of the text is kept verbatim
        assert_eq!(m.text, "failed to   refresh");
    }

    #[test]
    fn test_tokenize_wide_separators() {
        let line = "2021-01-02   03:04:05 <0>  host(7)   [zypp]  a.cc(f):1   text";
        let m = tokenize(line).unwrap();

        assert_eq!(m.time, "03:04:05");
        assert_eq!(m.host_field, "host(7)");
        assert_eq!(m.text, "text");
    }

    #[test]
    fn test_tokenize_empty_text_and_group() {
        let m = tokenize("2021-01-02 03:04:05 <2> h(1) [] f.cc:9 ").unwrap();
        assert_eq!(m.group_field, "[]");
        assert_eq!(m.group, "");
        assert_eq!(m.text, "");
    }

    #[test]
    fn test_tokenize_keeps_carriage_return_in_text() {
        let m = tokenize("2021-01-02 03:04:05 <2> h(1) [g] f.cc:9 text\r").unwrap();
        assert_eq!(m.text, "text\r");
    }

    #[test]
    fn test_tokenize_rejects_continuation_lines() {
        assert!(tokenize("").is_none());
        assert!(tokenize("more text").is_none());
        assert!(tokenize("  at frame 3").is_none());
        // missing the mandatory space before the text
        assert!(tokenize("2021-01-02 03:04:05 <2> h(1) [g] f.cc:9").is_none());
        // non-numeric level
        assert!(tokenize("2021-01-02 03:04:05 <x> h(1) [g] f.cc:9 text").is_none());
        // date must lead the line
        assert!(tokenize(&format!(" {BANNER}")).is_none());
    }
    #[test]
    fn test_tokenize_bounds_numeric_fields() {
        let m = tokenize("2021-01-02 03:04:05 <99> h(999999999) [g] f.cc:999999999 text").unwrap();
        assert_eq!(m.level, "99");
        assert_eq!(m.pid, "999999999");
        assert_eq!(m.line, "999999999");

        assert!(tokenize("2021-01-02 03:04:05 <256> h(1) [g] f.cc:9 text").is_none());
        assert!(tokenize("2021-01-02 03:04:05 <2> h(4294967296) [g] f.cc:9 text").is_none());
        assert!(tokenize("2021-01-02 03:04:05 <2> h(1) [g] f.cc:4294967296 text").is_none());
    }
}

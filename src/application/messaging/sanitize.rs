//! Mention scrubbing for log output

use once_cell::sync::Lazy;
use regex_lite::Regex;

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<@[!&]?\d+>|@\S+").expect("mention pattern is valid")
});

/// Replace user mentions with `@user`
pub fn sanitize_mentions(text: &str) -> String {
    MENTION.replace_all(text, "@user").into_owned()
}

/// Short, mention-free preview of a message for logs
pub fn preview(text: &str) -> String {
    sanitize_mentions(text).chars().take(50).collect()
}

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

const EMAIL: &str = r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}";

static MAILTO_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]\n]*\]\(mailto:[^)\s]*\)").expect("valid mailto pattern"));
static ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("<{EMAIL}>")).expect("valid angle address pattern"));
static BARE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{EMAIL}\b")).expect("valid address pattern"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid spaces pattern"));
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,;](?:\s*[,;])+").expect("valid separator pattern"));
static DANGLING_AFTER_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*,").expect("valid colon pattern"));

/// Removes email addresses from mailbox exports.
///
/// Handles markdown `mailto:` links, `<addr>` forms and bare addresses.
/// Lines that lost an address are tidied (doubled spaces, stray list
/// separators); other lines and the line structure are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressRedactor;

impl AddressRedactor {
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains('@') && !text.contains("mailto:") {
            return Cow::Borrowed(text);
        }

        let mut changed = false;
        let mut out = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            let redacted = redact_line(body);
            if redacted != body {
                changed = true;
            }
            out.push_str(&redacted);
            out.push_str(newline);
        }

        if changed { Cow::Owned(out) } else { Cow::Borrowed(text) }
    }
}

fn redact_line(line: &str) -> Cow<'_, str> {
    let step = MAILTO_LINK.replace_all(line, "");
    let step = ANGLE_ADDRESS.replace_all(&step, "").into_owned();
    let step = BARE_ADDRESS.replace_all(&step, "").into_owned();
    if step == line {
        return Cow::Borrowed(line);
    }

    let step = SPACES.replace_all(&step, " ");
    let step = SEPARATOR_RUN.replace_all(&step, ",");
    let step = DANGLING_AFTER_COLON.replace_all(&step, ":");
    Cow::Owned(step.trim().to_string())
}

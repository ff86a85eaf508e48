use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone)]
pub(crate) struct Regex {
    backend: fancy_regex::Regex,
}

impl Regex {
    pub(crate) fn new(pattern: &str) -> Result<Self, RegexError> {
        let backend = fancy_regex::Regex::new(pattern).map_err(RegexError::from)?;
        Ok(Self { backend })
    }

    /// Matches one or more consecutive occurrences of `separator`.
    pub(crate) fn separator_run(separator: char) -> Result<Self, RegexError> {
        let mut buf = [0u8; 4];
        let literal = escape(separator.encode_utf8(&mut buf));
        Self::new(&format!("(?:{literal})+"))
    }

    pub(crate) fn replace_all<'t>(
        &self,
        input: &'t str,
        replacement: &str,
    ) -> Result<Cow<'t, str>, RegexError> {
        let mut out = String::new();
        let mut last = 0usize;
        let mut replaced = false;
        for matched in self.backend.find_iter(input) {
            let matched = matched.map_err(RegexError::from)?;
            out.push_str(&input[last..matched.start()]);
            out.push_str(replacement);
            last = matched.end();
            replaced = true;
        }
        if !replaced {
            return Ok(Cow::Borrowed(input));
        }
        out.push_str(&input[last..]);
        Ok(Cow::Owned(out))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegexError {
    message: String,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RegexError {}

impl From<fancy_regex::Error> for RegexError {
    fn from(value: fancy_regex::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;

    for ch in value.chars() {
        if is_regex_meta(ch) {
            out.push('\\');
            changed = true;
        }
        out.push(ch);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(value)
    }
}

fn is_regex_meta(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '/'
    )
}

//! The three ordered substitution patterns.

use std::borrow::Cow;
use std::fmt;
use std::ops::AddAssign;

use regex::bytes::Regex;

use crate::{Error, Result};

/// IPv4-literal shape. Octet ranges are not checked.
pub const IP_PATTERN: &str = r"(?-u)\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

/// Bare name token: 1-15 word characters or hyphens.
pub const BARE_NAME_PATTERN: &str = r"(?-u)\b[A-Za-z0-9_-]{1,15}\b";

/// The value of a computer label such as `Computer:` or `hostname =`.
///
/// The value may open with a quote and runs to the next whitespace, quote,
/// `,`, `;`, `)` or `]`, so dotted host names like `web01.corp.local` are
/// replaced whole.
pub const LABELED_COMPUTER_PATTERN: &str = r#"(?i-u)\b(?:computer[ _-]?name|computer|host[ _-]?name|host|machine[ _-]?name|machine|workstation|pc[ _-]?name)[ \t]*[:=][ \t]*["']?(?P<value>[^\s\x00"'`,;)\]]+)"#;

/// The value of a user label such as `User:` or `login =`.
///
/// Bounded like [`LABELED_COMPUTER_PATTERN`], which covers `CORP\jsmith`
/// and `john.doe`.
pub const LABELED_USER_PATTERN: &str = r#"(?i-u)\b(?:user[ _-]?name|user|login|account)[ \t]*[:=][ \t]*["']?(?P<value>[^\s\x00"'`,;)\]]+)"#;

/// How computer and user names are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Only values of `label: value` or `label = value` pairs are replaced.
    ///
    /// The whole value is replaced, including dots and backslashes.
    #[default]
    Labeled,
    /// Every 1-15 character token is a name.
    ///
    /// The computer-name pass rewrites every token in the file, and the
    /// user-name pass then rewrites the computer-name replacements.
    Bare,
}

impl MatchMode {
    /// Returns the lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Labeled => "labeled",
            MatchMode::Bare => "bare",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of sensitive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// IPv4 address.
    Ip,
    /// Computer or host name.
    ComputerName,
    /// User or login name.
    UserName,
}

impl Category {
    /// Returns a short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Ip => "ip",
            Category::ComputerName => "computer_name",
            Category::UserName => "user_name",
        }
    }
}

/// Replacement values, one per category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replacements {
    /// Value substituted for IP addresses.
    pub ip: String,
    /// Value substituted for computer names.
    pub computer_name: String,
    /// Value substituted for user names.
    pub user_name: String,
}

impl Replacements {
    /// Creates a replacement set.
    pub fn new(
        ip: impl Into<String>,
        computer_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            computer_name: computer_name.into(),
            user_name: user_name.into(),
        }
    }
}

/// Number of replacements made per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchCounts {
    /// IP addresses replaced.
    pub ip: usize,
    /// Computer names replaced.
    pub computer_name: usize,
    /// User names replaced.
    pub user_name: usize,
}

impl MatchCounts {
    /// Returns the sum over all categories.
    pub fn total(&self) -> usize {
        self.ip + self.computer_name + self.user_name
    }

    fn record(&mut self, category: Category, n: usize) {
        match category {
            Category::Ip => self.ip += n,
            Category::ComputerName => self.computer_name += n,
            Category::UserName => self.user_name += n,
        }
    }
}

impl AddAssign for MatchCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.ip += rhs.ip;
        self.computer_name += rhs.computer_name;
        self.user_name += rhs.user_name;
    }
}

/// A compiled pattern paired with its replacement value.
///
/// If the regex defines a capture group named `value`, only that group is
/// replaced and the rest of the match is kept.
#[derive(Debug, Clone)]
pub struct Pattern {
    category: Category,
    regex: Regex,
    replacement: Vec<u8>,
}

impl Pattern {
    /// Compiles `source` as a byte regex.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `source` does not compile.
    pub fn compile(category: Category, source: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| Error::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            category,
            regex,
            replacement: replacement.as_bytes().to_vec(),
        })
    }

    /// Returns the category this pattern redacts.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the regex source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Replaces every match, inserting the replacement literally.
    ///
    /// Returns `None` when nothing matched.
    fn replace_all(&self, input: &[u8]) -> Option<(Vec<u8>, usize)> {
        let mut output = Vec::with_capacity(input.len());
        let mut last = 0;
        let mut count = 0;

        for caps in self.regex.captures_iter(input) {
            let Some(target) = caps.name("value").or_else(|| caps.get(0)) else {
                continue;
            };
            output.extend_from_slice(&input[last..target.start()]);
            output.extend_from_slice(&self.replacement);
            last = target.end();
            count += 1;
        }

        if count == 0 {
            return None;
        }
        output.extend_from_slice(&input[last..]);
        Some((output, count))
    }
}

/// The ordered pattern set: IP, then computer name, then user name.
///
/// Each pattern runs over the output of the previous one, so a later pattern
/// can match text inserted by an earlier replacement.
///
/// # Example
///
/// ```rust
/// use arcanon::rewrite::{MatchMode, PatternSet, Replacements};
///
/// let replacements = Replacements::new("192.168.0.1", "NewComputerName", "NewUserName");
/// let patterns = PatternSet::new(&replacements, MatchMode::Labeled)?;
///
/// let output = patterns.apply(b"IP: 123.456.789.0\nComputer: OldComputer\nUser: OldUser");
/// assert_eq!(
///     &output[..],
///     b"IP: 192.168.0.1\nComputer: NewComputerName\nUser: NewUserName"
/// );
/// # Ok::<(), arcanon::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: [Pattern; 3],
    mode: Option<MatchMode>,
}

impl PatternSet {
    /// Builds the standard pattern set for `mode`.
    pub fn new(replacements: &Replacements, mode: MatchMode) -> Result<Self> {
        let (computer, user) = match mode {
            MatchMode::Labeled => (LABELED_COMPUTER_PATTERN, LABELED_USER_PATTERN),
            MatchMode::Bare => (BARE_NAME_PATTERN, BARE_NAME_PATTERN),
        };
        Ok(Self {
            patterns: [
                Pattern::compile(Category::Ip, IP_PATTERN, &replacements.ip)?,
                Pattern::compile(Category::ComputerName, computer, &replacements.computer_name)?,
                Pattern::compile(Category::UserName, user, &replacements.user_name)?,
            ],
            mode: Some(mode),
        })
    }

    /// Builds a set from caller-compiled patterns, applied in the given order.
    pub fn from_patterns(ip: Pattern, computer_name: Pattern, user_name: Pattern) -> Self {
        Self {
            patterns: [ip, computer_name, user_name],
            mode: None,
        }
    }

    /// Returns the match mode, or `None` for a custom set.
    pub fn mode(&self) -> Option<MatchMode> {
        self.mode
    }

    /// Returns the patterns in application order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Applies all three patterns in order.
    pub fn apply<'a>(&self, input: &'a [u8]) -> Cow<'a, [u8]> {
        self.apply_counted(input).0
    }

    /// Applies all three patterns in order and counts replacements.
    ///
    /// The input is borrowed back unchanged when nothing matched.
    pub fn apply_counted<'a>(&self, input: &'a [u8]) -> (Cow<'a, [u8]>, MatchCounts) {
        let mut counts = MatchCounts::default();
        let mut current = Cow::Borrowed(input);

        for pattern in &self.patterns {
            if let Some((replaced, n)) = pattern.replace_all(&current) {
                counts.record(pattern.category, n);
                current = Cow::Owned(replaced);
            }
        }
        (current, counts)
    }
}

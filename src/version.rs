use crate::error::UserMessage;
use derive_more::Display;
use error_stack::Report;
use regex::Regex;
use semver::{Version, VersionReq};
use std::cmp::Ordering;
use std::error::Error;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Display)]
#[display("Invalid version range")]
pub struct VersionRangeError;

impl Error for VersionRangeError {}

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// Check whether `version` falls in `range`.
///
/// Plain semver ranges drop build metadata, so `15.0.0+14` would match `15.0.0+14.1.202003190635`.
/// When the range is an exact version with build metadata, the match is instead build-aware
/// equality. Anything unparseable on either side does not match.
pub fn satisfies(range: &str, version: &str) -> bool {
    if let Ok(exact) = Version::parse(range.trim()) {
        if !exact.build.is_empty() {
            return Version::parse(version)
                .is_ok_and(|v| compare_build(&exact, &v) == Ordering::Equal);
        }
    }
    let Ok(version) = Version::parse(version) else {
        return false;
    };
    match parse_range(range) {
        Ok(alternatives) => alternatives.iter().any(|req| req.matches(&version)),
        Err(_) => false,
    }
}

/// Total order on versions, including build metadata. Numeric build identifiers compare
/// numerically, so `12.0.2+10.3` is above `12.0.2+10.2`.
pub fn compare_build(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Whether `range` is accepted by [`satisfies`] as something other than a non-match.
pub fn is_valid_range(range: &str) -> bool {
    Version::parse(range.trim()).is_ok() || parse_range(range).is_ok()
}

/// Fold versions with more than three numeric components into semver's build metadata:
/// `12.0.2.1.0` becomes `12.0.2+1.0`.
pub fn convert_version_to_semver(version: &str) -> String {
    let parts = version.split('.').collect::<Vec<_>>();
    if parts.len() <= 3 {
        return version.to_string();
    }
    format!("{}+{}", parts[..3].join("."), parts[3..].join("."))
}

static COERCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("valid regex"));

/// Pull the first `N[.N[.N]]` out of a string, padding missing components with zero.
pub fn coerce(input: &str) -> Option<Version> {
    let captures = COERCE_RE.captures(input)?;
    let component = |i: usize| -> Option<u64> {
        captures
            .get(i)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

fn parse_range(range: &str) -> Result<Vec<VersionReq>, semver::Error> {
    range
        .split("||")
        .map(|alternative| VersionReq::parse(&translate_alternative(alternative.trim())))
        .collect()
}

/// Rewrite one node-style comparator set (`11`, `>=11 <17`, `11.x`, `11 - 17`) into the
/// comma-separated syntax of [`VersionReq`].
fn translate_alternative(alternative: &str) -> String {
    if alternative.is_empty() {
        return "*".to_string();
    }
    if let Some((low, high)) = alternative.split_once(" - ") {
        return format!(
            ">={}, <={}",
            strip_wildcards(low.trim()),
            strip_wildcards(high.trim())
        );
    }
    let mut comparators = Vec::new();
    let mut pending_operator: Option<&str> = None;
    for token in alternative.split_whitespace() {
        if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_operator = Some(token);
            continue;
        }
        let comparator = match pending_operator.take() {
            Some(op) => format!("{}{}", op, token),
            None => token.to_string(),
        };
        comparators.push(translate_comparator(&comparator));
    }
    if let Some(op) = pending_operator {
        // Left dangling so that VersionReq rejects it.
        comparators.push(op.to_string());
    }
    comparators.join(", ")
}

fn translate_comparator(comparator: &str) -> String {
    let split = comparator
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(comparator.len());
    let (op, version) = comparator.split_at(split);
    let version = version.strip_prefix('v').unwrap_or(version);
    // Build metadata never takes part in range matching.
    let version = version.split('+').next().unwrap_or(version);

    let parts = version.split('.').collect::<Vec<_>>();
    let wildcard_at = parts.iter().position(|p| is_wildcard(p));
    match (op, wildcard_at) {
        (_, Some(0)) => "*".to_string(),
        ("", Some(i)) => format!("{}.*", parts[..i].join(".")),
        (_, Some(i)) => format!("{}{}", op, parts[..i].join(".")),
        ("", None) => format!("={}", version),
        (_, None) => format!("{}{}", op, version),
    }
}

fn strip_wildcards(version: &str) -> String {
    version
        .split('.')
        .take_while(|p| !is_wildcard(p))
        .collect::<Vec<_>>()
        .join(".")
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// A caller-supplied version request, split into its semver range and early-access flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    range: String,
    stable: bool,
}

impl VersionRange {
    /// The semver range, without any early-access marker.
    pub fn range(&self) -> &str {
        &self.range
    }

    /// `false` when the request asked for early-access builds.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn is_satisfied_by(&self, version: &str) -> bool {
        satisfies(&self.range, version)
    }

    /// Whether the range names only a major version (no `.`).
    pub fn is_major_only(&self) -> bool {
        !self.range.contains('.')
    }

    /// The leading component of the range, e.g. `17` for `17.0.2`.
    pub fn major(&self) -> &str {
        self.range.split('.').next().unwrap_or(&self.range)
    }
}

impl FromStr for VersionRange {
    type Err = Report<VersionRangeError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (range, stable) = if let Some(range) = s.strip_suffix("-ea") {
            (range.to_string(), false)
        } else if s.contains("-ea.") {
            // 11.0.3-ea.2 -> 11.0.3+2
            (s.replacen("-ea.", "+", 1), false)
        } else {
            (s.to_string(), true)
        };

        if !is_valid_range(&range) {
            return Err(
                Report::new(VersionRangeError).attach(UserMessage::new(format!(
                    "The string '{}' is not valid SemVer notation for a Java version. \
                     Please check README file for code snippets and more detailed information",
                    range
                ))),
            );
        }

        Ok(Self { range, stable })
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.range)?;
        if !self.stable {
            write!(f, "-ea")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::user_messages;

    #[test]
    fn test_satisfies() {
        let cases = [
            ("x", "11.0.0", true),
            ("3", "3.7.1", true),
            ("3", "3.7.2", true),
            ("3", "3.7.2+4", true),
            ("2.5", "2.5.0", true),
            ("2.5", "2.5.0+1", true),
            ("2.5", "2.6.1", false),
            ("2.5.1", "2.5.0", false),
            ("2.5.1+3", "2.5.0", false),
            ("2.5.1+3", "2.5.1+3", true),
            ("2.5.1+3", "2.5.1+2", false),
            ("15.0.0+14", "15.0.0+14.1.202003190635", false),
            (
                "15.0.0+14.1.202003190635",
                "15.0.0+14.1.202003190635",
                true,
            ),
        ];
        for (range, version, expected) in cases {
            assert_eq!(
                expected,
                satisfies(range, version),
                "satisfies({:?}, {:?})",
                range,
                version
            );
        }
    }

    #[test]
    fn test_satisfies_range_syntax() {
        assert!(satisfies("", "21.0.1"));
        assert!(satisfies("*", "21.0.1"));
        assert!(satisfies("11.x", "11.0.10+9"));
        assert!(satisfies("11.0.x", "11.0.10+9"));
        assert!(!satisfies("11.x", "12.0.1"));
        assert!(satisfies(">=11 <17", "16.0.2"));
        assert!(!satisfies(">=11 <17", "17.0.0"));
        assert!(satisfies(">= 11", "21.0.0"));
        assert!(satisfies("8 || 11", "11.0.2"));
        assert!(!satisfies("8 || 11", "17.0.2"));
        assert!(satisfies("11 - 17", "17.0.8"));
        assert!(!satisfies("11 - 17", "18.0.0"));
        assert!(satisfies("~11.0.2", "11.0.9"));
        assert!(satisfies("^11.0.2", "11.4.0"));
    }

    #[test]
    fn test_satisfies_invalid_input() {
        assert!(!satisfies("11", "not-a-version"));
        assert!(!satisfies("11", "11"));
        assert!(!satisfies("11g", "11.0.0"));
        assert!(!satisfies(">=", "11.0.0"));
    }

    #[test]
    fn test_compare_build() {
        let v = |s: &str| Version::parse(s).unwrap();
        assert_eq!(
            Ordering::Greater,
            compare_build(&v("12.0.2+10.3"), &v("12.0.2+10.2"))
        );
        assert_eq!(
            Ordering::Less,
            compare_build(&v("12.0.2+9"), &v("12.0.2+10"))
        );
        assert_eq!(
            Ordering::Equal,
            compare_build(&v("11.0.3+2"), &v("11.0.3+2"))
        );
        assert_eq!(
            Ordering::Less,
            compare_build(&v("11.0.3+2"), &v("11.0.4"))
        );
    }

    #[test]
    fn test_convert_version_to_semver() {
        assert_eq!("12", convert_version_to_semver("12"));
        assert_eq!("12.0", convert_version_to_semver("12.0"));
        assert_eq!("12.0.2", convert_version_to_semver("12.0.2"));
        assert_eq!("12.0.2+1", convert_version_to_semver("12.0.2.1"));
        assert_eq!("12.0.2+1.0", convert_version_to_semver("12.0.2.1.0"));
        assert_eq!(
            "11.0.3+2.1231421",
            convert_version_to_semver("11.0.3.2.1231421")
        );
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Some(Version::new(11, 0, 20)), coerce("11.0.20.1"));
        assert_eq!(Some(Version::new(17, 0, 0)), coerce("v17"));
        assert_eq!(Some(Version::new(8, 1, 0)), coerce("openjdk-8.1"));
        assert_eq!(None, coerce("no digits"));
    }

    #[test]
    fn test_parse_version_range() {
        let cases = [
            ("11", "11", true),
            ("11.0", "11.0", true),
            ("11.0.10", "11.0.10", true),
            ("11-ea", "11", false),
            ("11.0.2-ea", "11.0.2", false),
            ("11.0.3-ea.2", "11.0.3+2", false),
            ("x-ea", "x", false),
        ];
        for (input, range, stable) in cases {
            let parsed: VersionRange = input.parse().unwrap();
            assert_eq!(range, parsed.range(), "range of {:?}", input);
            assert_eq!(stable, parsed.is_stable(), "stability of {:?}", input);
        }
    }

    #[test]
    fn test_parse_version_range_rejects_invalid() {
        let err = "11g".parse::<VersionRange>().unwrap_err();
        assert_eq!(
            vec![&UserMessage::new(
                "The string '11g' is not valid SemVer notation for a Java version. \
                 Please check README file for code snippets and more detailed information"
            )],
            user_messages(&err)
        );
    }

    #[test]
    fn test_version_range_helpers() {
        let range: VersionRange = "17.0.2".parse().unwrap();
        assert_eq!("17", range.major());
        assert!(!range.is_major_only());
        assert!(range.is_satisfied_by("17.0.2+8"));
        assert_eq!("17.0.2", range.to_string());

        let ea: VersionRange = "21-ea".parse().unwrap();
        assert!(ea.is_major_only());
        assert_eq!("21-ea", ea.to_string());
    }
}

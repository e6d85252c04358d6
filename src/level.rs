use std::fmt;
use std::str::FromStr;

/// Severity of a structured log record.
///
/// Upstream emitters encode severity as a numeric code; the ingestion
/// adapter rewrites the code to its lowercase name before the record is
/// serialized for the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Map a numeric severity code to its level, if the code is known.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            10 => Some(Self::Trace),
            20 => Some(Self::Debug),
            30 => Some(Self::Info),
            40 => Some(Self::Warn),
            50 => Some(Self::Error),
            60 => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(Severity::from_code(10), Some(Severity::Trace));
        assert_eq!(Severity::from_code(20), Some(Severity::Debug));
        assert_eq!(Severity::from_code(30), Some(Severity::Info));
        assert_eq!(Severity::from_code(40), Some(Severity::Warn));
        assert_eq!(Severity::from_code(50), Some(Severity::Error));
        assert_eq!(Severity::from_code(60), Some(Severity::Fatal));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(Severity::from_code(0), None);
        assert_eq!(Severity::from_code(35), None);
        assert_eq!(Severity::from_code(70), None);
    }

    #[test]
    fn displays_lowercase_names() {
        assert_eq!(Severity::Fatal.to_string(), "fatal");
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARN".parse(), Ok(Severity::Warn));
        assert_eq!("warning".parse(), Ok(Severity::Warn));
        assert!("critical".parse::<Severity>().is_err());
    }
}

//! Start-up argument parsing
//!
//! Tokens are scanned once, left to right. `--name=value` records a string
//! option immediately; `--name` waits for the next token, which becomes its
//! value unless it is another option (or input ends), in which case the
//! option is recorded as a presence flag. Tokens with nothing to attach to
//! are kept aside and reported by [`ParsedArguments::dump`], since parsing
//! runs before logging is up.

use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use crate::constants::options::{PREFIX, VALUE_SEPARATOR};

/// Value recorded for one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `--name` with no value attached
    Flag,
    /// `--name=value` or `--name value`
    Text(String),
}

impl OptionValue {
    /// Text form; flags read as `"true"`
    pub fn as_str(&self) -> &str {
        match self {
            OptionValue::Flag => "true",
            OptionValue::Text(value) => value,
        }
    }
}

/// Option name (prefix included) → value, immutable after parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    options: BTreeMap<String, OptionValue>,
    discarded: Vec<String>,
}

enum ScanState {
    Idle,
    PendingOption(String),
}

impl ParsedArguments {
    /// Parse raw tokens (program name already removed)
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Self::default();
        let mut state = ScanState::Idle;

        for token in tokens {
            let token = token.as_ref();

            if token == PREFIX {
                continue;
            }

            if token.starts_with(PREFIX) {
                if let ScanState::PendingOption(name) = std::mem::replace(&mut state, ScanState::Idle) {
                    parsed.record(name, OptionValue::Flag);
                }
                match token.split_once(VALUE_SEPARATOR) {
                    Some((name, value)) => {
                        parsed.record(name.to_string(), OptionValue::Text(value.to_string()))
                    }
                    None => state = ScanState::PendingOption(token.to_string()),
                }
                continue;
            }

            match std::mem::replace(&mut state, ScanState::Idle) {
                ScanState::PendingOption(name) => {
                    parsed.record(name, OptionValue::Text(token.to_string()));
                }
                ScanState::Idle => parsed.discarded.push(token.to_string()),
            }
        }

        if let ScanState::PendingOption(name) = state {
            parsed.record(name, OptionValue::Flag);
        }

        parsed
    }

    /// Parse the current process arguments, skipping the program name
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    fn record(&mut self, name: String, value: OptionValue) {
        self.options.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Text value of an option, empty when absent
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).map(OptionValue::as_str).unwrap_or("")
    }

    /// True for a bare flag or a truthy value (`true`/`1`)
    #[cfg(test)]
    pub fn get_bool(&self, name: &str) -> bool {
        match self.get(name) {
            Some(OptionValue::Flag) => true,
            Some(OptionValue::Text(value)) => crate::persistence::is_truthy(value),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Positional tokens that had no pending option, in input order
    pub fn discarded(&self) -> &[String] {
        &self.discarded
    }

    /// Log every parsed option and every discarded token
    pub fn dump(&self) {
        for token in self.discarded() {
            info!(token = %token, "Ignoring positional argument with no pending option");
        }
        if self.is_empty() {
            debug!("No start-up options");
            return;
        }
        debug!(count = self.len(), "Start-up options");
        for (name, value) in self.iter() {
            trace!(option = %name, value = %value.as_str(), "Recorded option");
            debug!(option = %name, value = %value.as_str(), "Start-up option");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn text(value: &str) -> OptionValue {
        OptionValue::Text(value.to_string())
    }

    #[test]
    fn test_pending_option_finalized_by_next_option() {
        let parsed = ParsedArguments::parse(["--foo", "--bar=1", "baz", "--qux"]);

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.get("--foo"), Some(&OptionValue::Flag));
        assert_eq!(parsed.get("--bar"), Some(&text("1")));
        assert_eq!(parsed.get("--qux"), Some(&OptionValue::Flag));
        // "baz" had no pending option to attach to
        assert!(parsed.iter().all(|(_, v)| v.as_str() != "baz"));
    }

    #[test]
    fn test_pending_option_takes_following_value() {
        let parsed = ParsedArguments::parse(["--document", "page.html", "--open-devtools"]);

        assert_eq!(parsed.get("--document"), Some(&text("page.html")));
        assert_eq!(parsed.get("--open-devtools"), Some(&OptionValue::Flag));
    }

    #[test]
    fn test_value_split_at_first_separator() {
        let parsed = ParsedArguments::parse(["--query=a=b"]);
        assert_eq!(parsed.get_str("--query"), "a=b");

        let parsed = ParsedArguments::parse(["--empty="]);
        assert_eq!(parsed.get("--empty"), Some(&text("")));
    }

    #[test]
    fn test_separator_token_skipped() {
        // "--" neither records anything nor finalizes the pending option
        let parsed = ParsedArguments::parse(["--mode", "--", "fast"]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("--mode"), Some(&text("fast")));
    }

    #[test]
    fn test_positional_tokens_discarded() {
        let parsed = ParsedArguments::parse(["stray", "another"]);
        assert!(parsed.is_empty());
        assert_eq!(parsed.discarded(), ["stray", "another"]);

        let parsed = ParsedArguments::parse(["--foo", "--bar=1", "baz", "--qux"]);
        assert_eq!(parsed.discarded(), ["baz"]);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dump_reports_discarded_tokens_and_options() {
        let parsed = ParsedArguments::parse(["stray", "--foo", "--log-level=trace"]);

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || parsed.dump());

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Ignoring positional argument"));
        assert!(output.contains("token=stray"));
        assert!(output.contains("Recorded option"));
        assert!(output.contains("option=--foo"));
        assert!(output.contains("option=--log-level"));
    }

    #[test]
    fn test_last_write_wins() {
        let parsed = ParsedArguments::parse(["--x=1", "--x", "--x=3"]);
        assert_eq!(parsed.get("--x"), Some(&text("3")));

        let parsed = ParsedArguments::parse(["--x=1", "--x"]);
        assert_eq!(parsed.get("--x"), Some(&OptionValue::Flag));
    }

    #[test]
    fn test_typed_accessors() {
        let parsed = ParsedArguments::parse(["--a", "--b=1", "--c=TRUE", "--d=no"]);

        assert!(parsed.get_bool("--a"));
        assert!(parsed.get_bool("--b"));
        assert!(parsed.get_bool("--c"));
        assert!(!parsed.get_bool("--d"));
        assert!(!parsed.get_bool("--missing"));

        assert_eq!(parsed.get_str("--a"), "true");
        assert_eq!(parsed.get_str("--missing"), "");
    }

    #[test]
    fn test_deterministic_for_same_tokens() {
        let tokens = ["--z", "v", "--a=1", "loose", "--m"];
        assert_eq!(ParsedArguments::parse(tokens), ParsedArguments::parse(tokens));
    }
}

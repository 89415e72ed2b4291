//! Typed input slots of a command.
//!
//! A [`Parameter`] knows how to ask for its value and how to turn user input
//! into a value. Parsing is pure: a parser may reject input but never touches
//! conversation state.
//!
//! Inputs are tried in this order when a parameter is answered explicitly:
//!
//! 1. the text parser;
//! 2. the location parser, only when text parsing failed, a location parser
//!    is configured, and the message carries a non-zero location.
//!
//! Callback data from inline buttons is handled separately through the
//! optional [`InlineHandler`] capability.

use std::fmt;
use std::sync::Arc;

use parley_core::{InlineButton, Location};

use crate::error::ParseError;

/// Parses raw text into a parameter value.
pub type TextParser = Arc<dyn Fn(&str) -> Result<String, ParseError> + Send + Sync>;

/// Parses a shared location into a parameter value.
pub type LocationParser = Arc<dyn Fn(Location) -> Result<String, ParseError> + Send + Sync>;

/// Inline-button capability of a parameter.
///
/// When the parameter is asked for and no previous value can be suggested,
/// its prompt is sent with [`buttons`](Self::buttons). A callback event
/// arriving while the parameter is pending is parsed with
/// [`parse_callback`](Self::parse_callback).
pub trait InlineHandler: Send + Sync {
    /// Buttons offered with the prompt.
    fn buttons(&self) -> Vec<InlineButton>;

    /// Converts callback data into a parameter value.
    fn parse_callback(&self, data: &str) -> Result<String, ParseError>;
}

/// One named input slot of a command.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    prompt: String,
    text_parser: TextParser,
    location_parser: Option<LocationParser>,
    inline_handler: Option<Arc<dyn InlineHandler>>,
    sticky: bool,
}

impl Parameter {
    /// Creates a parameter accepting any non-blank text.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            text_parser: Arc::new(parsers::non_empty),
            location_parser: None,
            inline_handler: None,
            sticky: false,
        }
    }

    /// Creates a parameter that can only be answered with a location.
    pub fn location_only<F>(name: impl Into<String>, prompt: impl Into<String>, parser: F) -> Self
    where
        F: Fn(Location) -> Result<String, ParseError> + Send + Sync + 'static,
    {
        Self::new(name, prompt)
            .with_text_parser(|_| Err(ParseError::new("a location is required")))
            .with_location_parser(parser)
    }

    /// Replaces the text parser.
    pub fn with_text_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Result<String, ParseError> + Send + Sync + 'static,
    {
        self.text_parser = Arc::new(parser);
        self
    }

    /// Adds a location parser used as fallback when text parsing fails.
    pub fn with_location_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(Location) -> Result<String, ParseError> + Send + Sync + 'static,
    {
        self.location_parser = Some(Arc::new(parser));
        self
    }

    /// Attaches an inline-button capability.
    pub fn with_inline_handler(mut self, handler: impl InlineHandler + 'static) -> Self {
        self.inline_handler = Some(Arc::new(handler));
        self
    }

    /// Marks the parameter as sticky.
    ///
    /// When a command starts and a sticky parameter got no positional input,
    /// the last value accepted for a parameter of the same name is reused
    /// silently instead of asking for it.
    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    pub fn inline_handler(&self) -> Option<&dyn InlineHandler> {
        self.inline_handler.as_deref()
    }

    pub fn has_location_parser(&self) -> bool {
        self.location_parser.is_some()
    }

    /// Parses text input.
    pub fn parse_text(&self, raw: &str) -> Result<String, ParseError> {
        (self.text_parser)(raw)
    }

    /// Parses a location, or returns `None` when no location parser exists.
    pub fn parse_location(&self, location: Location) -> Option<Result<String, ParseError>> {
        self.location_parser
            .as_ref()
            .map(|parser| parser(location))
    }

    /// Parses an explicit answer: text first, then a non-zero location.
    pub fn parse_answer(
        &self,
        raw: &str,
        location: Option<Location>,
    ) -> Result<String, ParseError> {
        let text_err = match self.parse_text(raw) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match location.filter(|loc| !loc.is_zero()) {
            Some(loc) => self.parse_location(loc).unwrap_or(Err(text_err)),
            None => Err(text_err),
        }
    }

    /// Parses inline-button callback data.
    pub fn parse_callback(&self, data: &str) -> Result<String, ParseError> {
        match &self.inline_handler {
            Some(handler) => handler.parse_callback(data),
            None => Err(ParseError::new("parameter has no inline buttons")),
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .field("location_parser", &self.location_parser.is_some())
            .field("inline_handler", &self.inline_handler.is_some())
            .field("sticky", &self.sticky)
            .finish()
    }
}

/// Ready-made text parsers.
pub mod parsers {
    use super::ParseError;

    /// Accepts any text that is not blank, trimmed.
    pub fn non_empty(raw: &str) -> Result<String, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(ParseError::new("value must not be empty"))
        } else {
            Ok(trimmed.to_string())
        }
    }

    /// Accepts a signed integer.
    pub fn integer(raw: &str) -> Result<String, ParseError> {
        raw.trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|e| ParseError::new(format!("not an integer: {e}")))
    }

    /// Returns a parser accepting one of `options`, compared case-insensitively
    /// and normalised to the option's spelling.
    pub fn one_of<I, S>(options: I) -> impl Fn(&str) -> Result<String, ParseError> + Send + Sync
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        move |raw: &str| {
            let raw = raw.trim();
            options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(raw))
                .cloned()
                .ok_or_else(|| ParseError::new(format!("expected one of: {}", options.join(", "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(loc: Location) -> Result<String, ParseError> {
        Ok(format!("{:.2},{:.2}", loc.latitude, loc.longitude))
    }

    struct Days;

    impl InlineHandler for Days {
        fn buttons(&self) -> Vec<InlineButton> {
            vec![InlineButton::new("Today", "day:0"), InlineButton::new("Tomorrow", "day:1")]
        }

        fn parse_callback(&self, data: &str) -> Result<String, ParseError> {
            data.strip_prefix("day:")
                .map(str::to_string)
                .ok_or_else(|| ParseError::new("unknown button"))
        }
    }

    #[test]
    fn test_default_parser_rejects_blank() {
        let param = Parameter::new("city", "Which city?");
        assert_eq!(param.parse_text("  Paris "), Ok("Paris".to_string()));
        assert!(param.parse_text("   ").is_err());
    }

    #[test]
    fn test_answer_prefers_text() {
        let param = Parameter::new("city", "Which city?").with_location_parser(coords);
        let answer = param.parse_answer("Paris", Some(Location::new(1.0, 2.0)));
        assert_eq!(answer, Ok("Paris".to_string()));
    }

    #[test]
    fn test_answer_falls_back_to_location() {
        let param = Parameter::location_only("where", "Share your location", coords);
        let answer = param.parse_answer("", Some(Location::new(48.8566, 2.3522)));
        assert_eq!(answer, Ok("48.86,2.35".to_string()));
    }

    #[test]
    fn test_answer_rejects_zero_location() {
        let param = Parameter::location_only("where", "Share your location", coords);
        assert!(param.parse_answer("", Some(Location::default())).is_err());
        assert!(param.parse_answer("", None).is_err());
    }

    #[test]
    fn test_answer_without_location_parser_ignores_location() {
        let param = Parameter::new("n", "Number?").with_text_parser(parsers::integer);
        assert!(param.parse_answer("abc", Some(Location::new(1.0, 1.0))).is_err());
    }

    #[test]
    fn test_inline_callback() {
        let param = Parameter::new("day", "Which day?").with_inline_handler(Days);
        assert_eq!(param.inline_handler().map(|h| h.buttons().len()), Some(2));
        assert_eq!(param.parse_callback("day:1"), Ok("1".to_string()));
        assert!(param.parse_callback("month:1").is_err());
        assert!(Parameter::new("x", "?").parse_callback("day:1").is_err());
    }

    #[test]
    fn test_one_of_normalises_case() {
        let parse = parsers::one_of(["Celsius", "Fahrenheit"]);
        assert_eq!(parse("celsius"), Ok("Celsius".to_string()));
        assert!(parse("kelvin").is_err());
    }

    #[test]
    fn test_integer_parser() {
        assert_eq!(parsers::integer(" 42 "), Ok("42".to_string()));
        assert!(parsers::integer("4.2").is_err());
    }
}

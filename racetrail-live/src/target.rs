//! Per-race channel addresses.
use std::fmt;
use thiserror::Error;
use url::Url;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid server url: {0}")]
    InvalidBase(#[from] url::ParseError),
    #[error("unsupported url scheme {0:?}; expected http, https, ws or wss")]
    UnsupportedScheme(String),
    #[error("server url cannot carry a path: {0}")]
    NotABase(String),
    #[error("race id must not be empty")]
    EmptyRaceId,
}

fn is_locale_valid(locale: &str) -> bool {
    regex::Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$")
        .map(|re| re.is_match(locale))
        .unwrap_or(false)
}

/// Where to reach one race: `{base}/ws/race/{race_id}`, plus `?locale=` when
/// the locale is not the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    race_id: String,
    locale: Option<String>,
    url: Url,
}

impl ChannelTarget {
    /// Build a target from a server base URL. `http(s)` bases map to `ws(s)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base does not parse, uses another scheme, or the
    /// race id is blank.
    pub fn new(base: &str, race_id: &str) -> Result<Self, TargetError> {
        let race_id = race_id.trim();
        if race_id.is_empty() {
            return Err(TargetError::EmptyRaceId);
        }
        let mut url = Url::parse(base.trim())?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };
        if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| TargetError::NotABase(base.to_string()))?
            .pop_if_empty()
            .extend(["ws", "race", race_id]);
        Ok(Self {
            race_id: race_id.to_string(),
            locale: None,
            url,
        })
    }

    /// Ask for localized display names. Invalid tags are ignored with a
    /// warning and the default locale is never sent.
    #[must_use]
    pub fn with_locale(mut self, locale: &str) -> Self {
        let locale = locale.trim();
        if !is_locale_valid(locale) {
            log::warn!("ignoring invalid locale {locale:?}");
            return self;
        }
        self.url.set_query(None);
        if locale == DEFAULT_LOCALE {
            self.locale = None;
        } else {
            self.url.query_pairs_mut().append_pair("locale", locale);
            self.locale = Some(locale.to_string());
        }
        self
    }

    #[must_use]
    pub fn race_id(&self) -> &str {
        &self.race_id
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

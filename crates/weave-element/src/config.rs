#![forbid(unsafe_code)]

//! Tunables for element construction and polling.
//!
//! A thread-local [`ElementConfig`] is consulted by constructors that need
//! defaults (find-object poll interval, list item labels, list options).
//! Tests and embedders can replace it with [`ElementConfig::set_global`] or
//! scope a replacement with [`ElementConfig::push_override`].
//!
//! With the `config-file` feature the config can be read from TOML:
//!
//! ```toml
//! find_poll_min_secs = 0.5
//! find_poll_max_secs = 0.75
//! list_item_label = "#{index}"
//!
//! [list_option]
//! reorderable = false
//! ```

use std::cell::RefCell;
use std::time::Duration;

use crate::error::ElementError;
use crate::list_view::ListViewOption;

const DEFAULT_POLL_MIN_SECS: f64 = 1.0;
const DEFAULT_POLL_MAX_SECS: f64 = 1.5;

thread_local! {
    static GLOBAL_CONFIG: RefCell<ElementConfig> = RefCell::new(ElementConfig::default());
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ElementConfig {
    /// Lower bound of the jittered find-object poll interval, in seconds.
    pub find_poll_min_secs: f64,
    /// Upper bound of the jittered find-object poll interval, in seconds.
    pub find_poll_max_secs: f64,
    /// Default label of list items; `{index}` is replaced by the index.
    pub list_item_label: String,
    pub list_option: ListViewOption,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            find_poll_min_secs: DEFAULT_POLL_MIN_SECS,
            find_poll_max_secs: DEFAULT_POLL_MAX_SECS,
            list_item_label: "Item {index}".to_owned(),
            list_option: ListViewOption::default(),
        }
    }
}

impl ElementConfig {
    #[must_use]
    pub fn find_poll_secs(mut self, min: f64, max: f64) -> Self {
        self.find_poll_min_secs = min;
        self.find_poll_max_secs = max;
        self
    }

    #[must_use]
    pub fn list_item_label(mut self, format: impl Into<String>) -> Self {
        self.list_item_label = format.into();
        self
    }

    #[must_use]
    pub fn list_option(mut self, option: ListViewOption) -> Self {
        self.list_option = option;
        self
    }

    /// Poll interval range; invalid values fall back to the defaults.
    #[must_use]
    pub fn find_poll_range(&self) -> (Duration, Duration) {
        let min = Duration::try_from_secs_f64(self.find_poll_min_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_POLL_MIN_SECS));
        let max = Duration::try_from_secs_f64(self.find_poll_max_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_POLL_MAX_SECS));
        if min <= max { (min, max) } else { (max, min) }
    }

    #[must_use]
    pub fn item_label(&self, index: usize) -> String {
        self.list_item_label.replace("{index}", &index.to_string())
    }

    pub fn validate(&self) -> Result<(), ElementError> {
        let (min, max) = (self.find_poll_min_secs, self.find_poll_max_secs);
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(ElementError::Config(format!(
                "poll interval must be finite and non-negative, got {min}..{max}"
            )));
        }
        if min > max {
            return Err(ElementError::Config(format!(
                "find_poll_min_secs ({min}) exceeds find_poll_max_secs ({max})"
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ElementError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ElementError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The thread's current config.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_CONFIG.with(|config| config.borrow().clone())
    }

    /// Replace the thread's config, returning the previous one.
    pub fn set_global(config: Self) -> Self {
        tracing::debug!(?config, "element config replaced");
        GLOBAL_CONFIG.with(|current| current.replace(config))
    }

    /// Install `self` as the thread's config until the guard is dropped.
    #[must_use = "dropping this guard restores the previous config"]
    pub fn push_override(self) -> ConfigOverride {
        ConfigOverride {
            previous: Some(Self::set_global(self)),
        }
    }
}

/// Restores the previous global config on drop.
#[derive(Debug)]
pub struct ConfigOverride {
    previous: Option<ElementConfig>,
}

impl Drop for ConfigOverride {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let _ = GLOBAL_CONFIG.try_with(|current| current.replace(previous));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ElementConfig::default();
        assert_eq!(
            config.find_poll_range(),
            (Duration::from_secs(1), Duration::from_millis(1500))
        );
        assert_eq!(config.item_label(3), "Item 3");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_range_is_reported_and_normalized() {
        let config = ElementConfig::default().find_poll_secs(2.0, 1.0);
        assert!(config.validate().is_err());
        assert_eq!(
            config.find_poll_range(),
            (Duration::from_secs(1), Duration::from_secs(2))
        );
        let config = ElementConfig::default().find_poll_secs(f64::NAN, -1.0);
        assert!(config.validate().is_err());
        assert_eq!(
            config.find_poll_range(),
            (Duration::from_secs(1), Duration::from_millis(1500))
        );
    }

    #[test]
    fn override_restores_previous() {
        let custom = ElementConfig::default().list_item_label("#{index}");
        {
            let _guard = custom.clone().push_override();
            assert_eq!(ElementConfig::global(), custom);
        }
        assert_eq!(ElementConfig::global().item_label(0), "Item 0");
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn parses_partial_toml() {
        let config = ElementConfig::from_toml_str(
            r#"
find_poll_min_secs = 0.25
find_poll_max_secs = 0.5

[list_option]
reorderable = false
"#,
        )
        .unwrap();
        assert_eq!(config.find_poll_min_secs, 0.25);
        assert!(!config.list_option.reorderable);
        assert!(!config.list_option.fixed_size);
        assert_eq!(config.list_item_label, "Item {index}");
        assert!(ElementConfig::from_toml_str("find_poll_min_secs = 3.0").is_err());
    }
}

use crate::utils::pattern::{Pattern, PatternError, PatternFlags};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

static TABWIDTH_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid tabwidth regex"));
static EMBEDDED_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^.+\s.+$").expect("valid whitespace regex"));

/// How far a setting reaches through inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Inherited by every transitively included file.
    Session,
    /// Local to the file that declares it.
    File,
}

/// The settings a `config:` directive (or the project file) can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigSetting {
    Tabwidth,
    Prefix,
}

impl ConfigSetting {
    pub const ALL: [ConfigSetting; 2] = [ConfigSetting::Tabwidth, ConfigSetting::Prefix];

    pub fn key(self) -> &'static str {
        match self {
            ConfigSetting::Tabwidth => "tabwidth",
            ConfigSetting::Prefix => "prefix",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|setting| setting.key() == key)
    }

    pub fn default_value(self) -> &'static str {
        match self {
            ConfigSetting::Tabwidth => "4",
            ConfigSetting::Prefix => "",
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            ConfigSetting::Tabwidth => Scope::File,
            ConfigSetting::Prefix => Scope::Session,
        }
    }

    pub fn is_valid(self, value: &str) -> bool {
        match self {
            ConfigSetting::Tabwidth => TABWIDTH_VALUE.is_match(value) && value.parse::<usize>().is_ok_and(|n| n > 0),
            ConfigSetting::Prefix => !EMBEDDED_WHITESPACE.is_match(value),
        }
    }
}

impl fmt::Display for ConfigSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated settings, split by scope.
///
/// Both halves are shared behind `Arc`, so cloning a configuration or taking its
/// session-only view is O(1); [`Configuration::set`] copies a half only when it is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    session: Arc<BTreeMap<ConfigSetting, String>>,
    file: Arc<BTreeMap<ConfigSetting, String>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self, setting: ConfigSetting) -> &BTreeMap<ConfigSetting, String> {
        match setting.scope() {
            Scope::Session => &self.session,
            Scope::File => &self.file,
        }
    }

    /// Validate and store `value`. Returns `false` and leaves the configuration
    /// untouched when the value is rejected.
    pub fn set(&mut self, setting: ConfigSetting, value: impl Into<String>) -> bool {
        let value = value.into();
        if !setting.is_valid(&value) {
            log::debug!("[eredmel-config] Rejected {setting} = {value:?}");
            return false;
        }
        log::debug!("[eredmel-config] {setting} = {value:?}");
        let values = match setting.scope() {
            Scope::Session => &mut self.session,
            Scope::File => &mut self.file,
        };
        Arc::make_mut(values).insert(setting, value);
        true
    }

    /// Builder form of [`Configuration::set`].
    pub fn with(mut self, setting: ConfigSetting, value: impl Into<String>) -> Option<Self> {
        self.set(setting, value).then_some(self)
    }

    pub fn is_defined(&self, setting: ConfigSetting) -> bool {
        self.values(setting).contains_key(&setting)
    }

    /// The stored value, or the setting's default.
    pub fn get(&self, setting: ConfigSetting) -> &str {
        self.values(setting)
            .get(&setting)
            .map_or(setting.default_value(), String::as_str)
    }

    pub fn tabwidth(&self) -> usize {
        self.get(ConfigSetting::Tabwidth).parse().unwrap_or(4)
    }

    pub fn prefix(&self) -> &str {
        self.get(ConfigSetting::Prefix)
    }

    /// The configuration an included file starts from: session settings only.
    pub fn session_only(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            file: Arc::default(),
        }
    }

    /// Compile a directive pattern anchored at a line start behind the current prefix.
    ///
    /// The prefix is spliced in as regex text, so `.` or `(` in a prefix keep their
    /// regex meaning.
    pub fn pattern_match(&self, body: &str, flags: PatternFlags) -> Result<Pattern, PatternError> {
        Pattern::compile(&format!("^{}{body}", self.prefix()), flags.multi_line())
    }
}

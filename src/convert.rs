//! Folder path conversion.
//!
//! A stored folder is rewritten in two steps: an optional leading prefix is
//! swapped for its replacement, then the separators are optionally rewritten
//! into the other platform's style. The prefix is matched against the
//! original string, so it is always written in the source syntax.

use crate::error::ConfigError;

/// Separator-style conversion applied after prefix substitution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Keep separators as they are
    #[default]
    None,
    /// Rewrite every `/` as `\`
    UnixToWindows,
    /// Rewrite every `\` as `/`
    WindowsToUnix,
}

/// A prefix to look for and the string that replaces it.
///
/// Both halves always exist together, so a half-configured substitution
/// cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMapping {
    source: String,
    target: String,
}

impl PrefixMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The prefix matched against stored folders
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The replacement written in its place
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// How every folder in the library is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionConfig {
    prefix: Option<PrefixMapping>,
    direction: Direction,
}

impl ConversionConfig {
    /// Build a configuration from the raw `--from`/`--to` values.
    ///
    /// Fails unless both prefixes or neither are given, and then runs
    /// [`ConversionConfig::validate`].
    pub fn new(
        prefix_from: Option<String>,
        prefix_to: Option<String>,
        direction: Direction,
    ) -> Result<Self, ConfigError> {
        let prefix = match (prefix_from, prefix_to) {
            (Some(source), Some(target)) => Some(PrefixMapping::new(source, target)),
            (None, None) => None,
            _ => return Err(ConfigError::UnpairedPrefix),
        };

        let config = Self { prefix, direction };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an already paired prefix.
    pub fn with_prefix(prefix: PrefixMapping, direction: Direction) -> Result<Self, ConfigError> {
        let config = Self {
            prefix: Some(prefix),
            direction,
        };
        config.validate()?;
        Ok(config)
    }

    /// A configuration that only rewrites separators.
    pub fn separators_only(direction: Direction) -> Self {
        Self {
            prefix: None,
            direction,
        }
    }

    pub fn prefix(&self) -> Option<&PrefixMapping> {
        self.prefix.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True when converting can never change a folder.
    pub fn is_noop(&self) -> bool {
        self.prefix.is_none() && self.direction == Direction::None
    }

    /// Check that the prefixes agree with each other and with the direction.
    ///
    /// Both prefixes must end in a separator, or neither. When a direction
    /// is chosen, the source prefix must use the syntax being converted from
    /// and the target prefix the syntax being converted to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(prefix) = &self.prefix else {
            return Ok(());
        };

        if has_trailing_separator(&prefix.source) != has_trailing_separator(&prefix.target) {
            return Err(ConfigError::TrailingSeparatorMismatch {
                from: prefix.source.clone(),
                to: prefix.target.clone(),
            });
        }

        match self.direction {
            Direction::None => {}
            Direction::UnixToWindows => {
                if !is_unix_path(&prefix.source) {
                    return Err(ConfigError::ExpectedUnixSource(prefix.source.clone()));
                }
                if !is_windows_path(&prefix.target) {
                    return Err(ConfigError::ExpectedWindowsTarget(prefix.target.clone()));
                }
            }
            Direction::WindowsToUnix => {
                if !is_windows_path(&prefix.source) {
                    return Err(ConfigError::ExpectedWindowsSource(prefix.source.clone()));
                }
                if !is_unix_path(&prefix.target) {
                    return Err(ConfigError::ExpectedUnixTarget(prefix.target.clone()));
                }
            }
        }

        Ok(())
    }

    /// Rewrite one stored folder.
    ///
    /// Separator conversion applies to the whole string even when the
    /// prefix does not match.
    pub fn convert(&self, original: &str) -> String {
        let substituted = match &self.prefix {
            Some(prefix) => match original.strip_prefix(prefix.source.as_str()) {
                Some(rest) => format!("{}{}", prefix.target, rest),
                None => original.to_owned(),
            },
            None => original.to_owned(),
        };

        match self.direction {
            Direction::None => substituted,
            Direction::UnixToWindows => substituted.replace('/', "\\"),
            Direction::WindowsToUnix => substituted.replace('\\', "/"),
        }
    }
}

/// A rooted Unix path: starts with `/` and has no backslash.
pub fn is_unix_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains('\\')
}

/// A drive-rooted Windows path such as `P:\`, with no forward slash.
pub fn is_windows_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'\\'
        && !path.contains('/')
}

fn has_trailing_separator(path: &str) -> bool {
    path.ends_with('/') || path.ends_with('\\')
}

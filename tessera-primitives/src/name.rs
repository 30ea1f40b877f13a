//! Validated configuration variable names.

use std::fmt;

use crate::error::{Error, Result};

/// Dotted configuration path restricted to `[a-z0-9._]+`.
///
/// Names are registry keys made of lower-case ASCII letters, digits, `.` and
/// `_`. Upper-case input is rejected, not folded; document loaders lower-case
/// keys before they reach this type.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConfigName(String);

impl ConfigName {
    /// Creates a new name after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the supplied name is empty or contains
    /// characters outside `[a-z0-9._]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// Returns `true` when `name` would be accepted by [`ConfigName::new`].
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        validate_name(name).is_ok()
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConfigName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ConfigName> for String {
    fn from(value: ConfigName) -> Self {
        value.0
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: String::new(),
            reason: "name cannot be empty".into(),
        });
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_' | '.'))
    {
        return Err(Error::InvalidName {
            name: name.into(),
            reason: format!(
                "unexpected character `{bad}`; names contain lowercase alphanumeric, underscore, or dot"
            ),
        });
    }

    Ok(())
}

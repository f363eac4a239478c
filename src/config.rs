//! Application-level configuration.

use crate::error::Error;

/// Build-time configuration for one application.
///
/// ```rust
/// use arbor::Config;
///
/// let config = Config::new()
///     .template_ext("html")
///     .role_header("x-acting-role");
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) template_ext: String,
    pub(crate) role_header: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            template_ext: "hbs".to_owned(),
            role_header: "x-role".to_owned(),
        }
    }

    /// File extension (without the leading dot) that marks a file as a
    /// template during scanning. Defaults to `hbs`.
    pub fn template_ext(mut self, ext: impl Into<String>) -> Self {
        self.template_ext = ext.into();
        self
    }

    /// Request header the dispatch adapter reads the session role from.
    /// Absent header means role `all`. Defaults to `x-role`.
    pub fn role_header(mut self, name: impl Into<String>) -> Self {
        self.role_header = name.into();
        self
    }

    /// Rejects values that would make scanning or dispatch ambiguous.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.template_ext.is_empty()
            || self.template_ext.contains(['.', '/', '\\'])
        {
            return Err(Error::InvalidConfig {
                reason: format!("template_ext `{}` must be a bare extension", self.template_ext),
            });
        }
        if self.role_header.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "role_header must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self { Self::new() }
}

//! URI value with copy-on-write mutators.

use std::fmt;
use std::str::FromStr;

use url::{ParseError, Url};

use crate::error::RouterError;

/// Base used to resolve origin-form targets such as `/items?a=1`.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Parsed URI. Components that are absent are empty strings (port: `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    user_info: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    /// Parse an absolute URI or a relative reference.
    pub fn parse(input: &str) -> Result<Self, RouterError> {
        if input.is_empty() {
            return Ok(Self::default());
        }

        match Url::parse(input) {
            Ok(url) => Ok(Self::from_url(&url)),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(RELATIVE_BASE)
                    .map_err(|e| RouterError::InvalidUri(e.to_string()))?;
                let url = base
                    .join(input)
                    .map_err(|e| RouterError::InvalidUri(format!("{input}: {e}")))?;
                Ok(Self {
                    path: url.path().to_string(),
                    query: url.query().unwrap_or_default().to_string(),
                    fragment: url.fragment().unwrap_or_default().to_string(),
                    ..Self::default()
                })
            }
            Err(e) => Err(RouterError::InvalidUri(format!("{input}: {e}"))),
        }
    }

    fn from_url(url: &Url) -> Self {
        let user_info = match url.password() {
            Some(password) => format!("{}:{}", url.username(), password),
            None => url.username().to_string(),
        };
        Self {
            scheme: url.scheme().to_string(),
            user_info,
            host: url.host_str().unwrap_or_default().to_string(),
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
            fragment: url.fragment().unwrap_or_default().to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// `[user_info@]host[:port]`, empty when there is no host.
    pub fn authority(&self) -> String {
        if self.host.is_empty() {
            return String::new();
        }
        let mut authority = String::new();
        if !self.user_info.is_empty() {
            authority.push_str(&self.user_info);
            authority.push('@');
        }
        authority.push_str(&self.host);
        if let Some(port) = self.port {
            authority.push_str(&format!(":{port}"));
        }
        authority
    }

    pub fn with_scheme(&self, scheme: &str) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            ..self.clone()
        }
    }

    pub fn with_user_info(&self, user: &str, password: Option<&str>) -> Self {
        let user_info = match password {
            Some(password) if !user.is_empty() => format!("{user}:{password}"),
            _ => user.to_string(),
        };
        Self {
            user_info,
            ..self.clone()
        }
    }

    pub fn with_host(&self, host: &str) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            ..self.clone()
        }
    }

    pub fn with_port(&self, port: Option<u16>) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    pub fn with_path(&self, path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..self.clone()
        }
    }

    pub fn with_query(&self, query: &str) -> Self {
        Self {
            query: query.trim_start_matches('?').to_string(),
            ..self.clone()
        }
    }

    pub fn with_fragment(&self, fragment: &str) -> Self {
        Self {
            fragment: fragment.trim_start_matches('#').to_string(),
            ..self.clone()
        }
    }
}

impl FromStr for Uri {
    type Err = RouterError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        let authority = self.authority();
        if !authority.is_empty() {
            write!(f, "//{authority}")?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

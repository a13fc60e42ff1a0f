//! Remote reference parsing
//!
//! Text form: `[origin:]name@constraint[#subpath]`
//!
//! - `origin` names a configured registry (defaults to `registry`)
//! - `name` is the package identifier, e.g. `acme/toolkit`
//! - `constraint` is a semver requirement (defaults to `*`)
//! - `subpath` selects a directory inside the imported package

use crate::error::{DroverError, DroverResult};
use semver::VersionReq;
use std::fmt;
use std::str::FromStr;

/// Origin used when a reference does not name one
pub const DEFAULT_ORIGIN: &str = "registry";

/// A task's declaration of an external code dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteReference {
    /// Registry name the package is hosted on
    pub origin: String,
    /// Package identifier within the registry
    pub name: String,
    /// Version constraint to satisfy
    pub constraint: VersionReq,
    /// Optional directory inside the package
    pub subpath: Option<String>,
}

impl RemoteReference {
    fn invalid(input: &str, reason: impl Into<String>) -> DroverError {
        DroverError::InvalidReference {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Package names allow alphanumerics, `-`, `_`, `.` and `/` separators
fn validate_name(input: &str, name: &str) -> DroverResult<()> {
    if name.is_empty() {
        return Err(RemoteReference::invalid(input, "empty package name"));
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return Err(RemoteReference::invalid(
                input,
                "package name has an empty path segment",
            ));
        }
        if segment == "." || segment == ".." {
            return Err(RemoteReference::invalid(
                input,
                "package name must not contain '.' or '..' segments",
            ));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(RemoteReference::invalid(
                input,
                format!("invalid character in name segment '{segment}'"),
            ));
        }
    }
    Ok(())
}

fn validate_subpath(input: &str, subpath: &str) -> DroverResult<()> {
    if subpath.is_empty() {
        return Err(RemoteReference::invalid(input, "empty sub-path after '#'"));
    }
    if subpath.starts_with('/') {
        return Err(RemoteReference::invalid(input, "sub-path must be relative"));
    }
    if subpath.contains('\\') || subpath.contains('\0') {
        return Err(RemoteReference::invalid(
            input,
            "sub-path contains forbidden characters",
        ));
    }
    if subpath.split('/').any(|s| s == ".." || s.is_empty()) {
        return Err(RemoteReference::invalid(
            input,
            "sub-path must not contain '..' or empty segments",
        ));
    }
    Ok(())
}

impl FromStr for RemoteReference {
    type Err = DroverError;

    fn from_str(input: &str) -> DroverResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(Self::invalid(input, "empty reference"));
        }

        let (rest, subpath) = match s.split_once('#') {
            Some((rest, sub)) => {
                validate_subpath(input, sub)?;
                (rest, Some(sub.to_string()))
            }
            None => (s, None),
        };

        let (rest, constraint) = match rest.rsplit_once('@') {
            Some((rest, raw)) => {
                let constraint = VersionReq::parse(raw).map_err(|e| {
                    Self::invalid(input, format!("bad version constraint '{raw}': {e}"))
                })?;
                (rest, constraint)
            }
            None => (rest, VersionReq::STAR),
        };

        let (origin, name) = match rest.split_once(':') {
            Some((origin, name)) => {
                if origin.is_empty()
                    || !origin
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    return Err(Self::invalid(input, format!("invalid origin '{origin}'")));
                }
                (origin.to_string(), name)
            }
            None => (DEFAULT_ORIGIN.to_string(), rest),
        };

        validate_name(input, name)?;

        Ok(Self {
            origin,
            name: name.to_string(),
            constraint,
            subpath,
        })
    }
}

impl fmt::Display for RemoteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.origin, self.name, self.constraint)?;
        if let Some(ref sub) = self.subpath {
            write!(f, "#{sub}")?;
        }
        Ok(())
    }
}

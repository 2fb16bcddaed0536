//! Locator and Ident types.
//!
//! A `Locator` pins down one concrete package instance, including any virtual
//! decoration carried by its reference. An `Ident` identifies the instance
//! modulo virtualization: a reference of the form `<virtual prefix>#<real>`
//! collapses to `<real>`, so two differently-virtualized copies of the same
//! package compare equal and are interchangeable for hoisting purposes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a package instance, virtual decoration included
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Package name (e.g., "lodash" or "@types/node")
    pub name: String,
    /// Opaque version/resolution string
    pub reference: String,
}

/// Identifies a package instance modulo virtualization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    /// Package name
    pub name: String,
    /// Reference with the virtual decoration stripped
    pub reference: String,
}

impl Locator {
    /// Create a new locator
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }

    /// Identity of this instance with the virtual decoration stripped
    pub fn ident(&self) -> Ident {
        Ident::new(self.name.clone(), self.reference.as_str())
    }

    /// Human-oriented rendering used by diagnostics.
    ///
    /// `workspace:.` renders as `.`; the version shown is the reference with
    /// the virtual prefix and any `npm:` protocol removed; virtual references
    /// get a `v:` marker on the name.
    pub fn pretty(&self) -> String {
        if self.reference == "workspace:." {
            return ".".to_string();
        }

        let version = match self.reference.find('#') {
            Some(idx) => &self.reference[idx + 1..],
            None => self.reference.as_str(),
        };
        let version = version.strip_prefix("npm:").unwrap_or(version);

        if self.reference.starts_with("virtual") {
            format!("v:{}@{}", self.name, version)
        } else {
            format!("{}@{}", self.name, version)
        }
    }
}

impl Ident {
    /// Build the identity for `name@reference`, stripping the virtual
    /// decoration (everything up to and including the first `#`)
    pub fn new(name: impl Into<String>, reference: &str) -> Self {
        let real = match reference.find('#') {
            Some(idx) => &reference[idx + 1..],
            None => reference,
        };
        Self {
            name: name.into(),
            reference: real.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.reference)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_strips_virtual_prefix() {
        let plain = Locator::new("react", "npm:18.2.0");
        assert_eq!(plain.ident().reference, "npm:18.2.0");

        let decorated = Locator::new("react", "virtual:1234abcd#npm:18.2.0");
        assert_eq!(decorated.ident().reference, "npm:18.2.0");

        assert_eq!(plain.ident(), decorated.ident());
        assert_ne!(plain, decorated);
    }

    #[test]
    fn test_display() {
        let locator = Locator::new("lodash", "4.17.21");
        assert_eq!(locator.to_string(), "lodash@4.17.21");
        assert_eq!(locator.ident().to_string(), "lodash@4.17.21");
    }

    #[test]
    fn test_pretty_workspace_root() {
        let root = Locator::new(".", "workspace:.");
        assert_eq!(root.pretty(), ".");
    }

    #[test]
    fn test_pretty_strips_protocol_and_decoration() {
        assert_eq!(Locator::new("lodash", "npm:4.17.21").pretty(), "lodash@4.17.21");
        assert_eq!(
            Locator::new("react-dom", "virtual:77af#npm:18.2.0").pretty(),
            "v:react-dom@18.2.0"
        );
        assert_eq!(Locator::new("chalk", "5.3.0").pretty(), "chalk@5.3.0");
    }
}

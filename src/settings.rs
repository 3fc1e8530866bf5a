//! Container settings.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Behavior switches fixed when a container is created.
///
/// With the `config` feature enabled this deserializes from any serde format,
/// missing fields taking their defaults.
///
/// # Examples
///
/// ```
/// use ferrous_hive::{Container, ContainerSettings};
///
/// let settings = ContainerSettings { validating: true, ..Default::default() };
/// let container = Container::with_settings(settings);
/// assert!(container.is_validating());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerSettings {
    /// Build the object graph without running constructors that have not
    /// opted in, collecting every failure instead of stopping at the first.
    pub validating: bool,
    /// Warn once when something is resolved while installers are still running.
    pub warn_on_install_resolve: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            validating: false,
            warn_on_install_resolve: true,
        }
    }
}

impl ContainerSettings {
    /// Default settings with validation mode on.
    pub fn validating() -> Self {
        ContainerSettings {
            validating: true,
            ..Self::default()
        }
    }
}

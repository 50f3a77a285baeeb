// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The built-in detector plugins.
pub mod plugins;

pub use plugins::{AiccDetector, Cmi5Detector, ScormDetector, XapiDetector};

use cartridge_core::{ModuleEditionType, ModuleType};
use cartridge_error::ParseError;
use cartridge_fs::FileAccess;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The detected package family.
    pub module_type: ModuleType,
    /// The SCORM 2004 edition, when the family refines to one.
    pub edition: Option<ModuleEditionType>,
}

impl Detection {
    /// A detection without an edition refinement.
    #[must_use]
    pub fn of(module_type: ModuleType) -> Self {
        Self {
            module_type,
            edition: None,
        }
    }
}

/// One pluggable classifier in the chain.
///
/// Plugins are consulted in descending [`priority`](Self::priority) order;
/// the first non-empty result wins.
pub trait TypeDetectorPlugin: Send + Sync {
    /// Unique plugin name; registration is idempotent on it.
    fn name(&self) -> &str;

    /// Higher numbers run first.
    fn priority(&self) -> i32;

    /// Inspect the package. `Ok(None)` means "not mine"; an error stops
    /// the whole chain.
    ///
    /// # Errors
    ///
    /// Backend failures propagate and surface as
    /// [`ParseError::ModuleDetectionError`].
    fn detect(&self, fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError>;
}

/// A priority-ordered chain of [`TypeDetectorPlugin`]s.
///
/// Each detector instance owns its own plugin list; there is no
/// process-wide registry.
pub struct ModuleTypeDetector {
    plugins: Vec<Arc<dyn TypeDetectorPlugin>>,
}

impl ModuleTypeDetector {
    /// A detector with the four built-in plugins installed.
    #[must_use]
    pub fn new() -> Self {
        let mut detector = Self::empty();
        detector.register(Arc::new(ScormDetector));
        detector.register(Arc::new(Cmi5Detector));
        detector.register(Arc::new(AiccDetector));
        detector.register(Arc::new(XapiDetector));
        detector
    }

    /// A detector with no plugins at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin, keeping the list sorted by descending priority.
    ///
    /// Registering a plugin whose name is already present is a no-op, so
    /// repeated registration is idempotent.
    pub fn register(&mut self, plugin: Arc<dyn TypeDetectorPlugin>) {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return;
        }
        self.plugins.push(plugin);
        self.plugins.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    /// Remove the plugin with the given name. Returns `true` when one was
    /// removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p.name() != name);
        self.plugins.len() != before
    }

    /// Snapshot of the registered plugins, in invocation order.
    #[must_use]
    pub fn plugins(&self) -> Vec<Arc<dyn TypeDetectorPlugin>> {
        self.plugins.clone()
    }

    /// Classify the package.
    ///
    /// # Errors
    ///
    /// [`ParseError::ModuleDetectionFailed`] when every plugin passes;
    /// [`ParseError::ModuleDetectionError`] when a plugin raises a backend
    /// failure.
    pub fn detect(&self, fs: &dyn FileAccess) -> Result<Detection, ParseError> {
        for plugin in &self.plugins {
            match plugin.detect(fs) {
                Ok(Some(detection)) => {
                    debug!(
                        target: "cartridge.detect",
                        plugin = plugin.name(),
                        module_type = %detection.module_type,
                        "classified package"
                    );
                    return Ok(detection);
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ParseError::ModuleDetectionError {
                        source: Box::new(e),
                    });
                }
            }
        }
        Err(ParseError::ModuleDetectionFailed)
    }
}

impl Default for ModuleTypeDetector {
    fn default() -> Self {
        Self::new()
    }
}

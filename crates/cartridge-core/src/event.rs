// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse lifecycle events and the observer contract.

use crate::{ModuleEditionType, ModuleType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coarse pipeline phase reported by [`ParseEvent::ParsingProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePhase {
    /// Classifying the package family.
    Detection,
    /// Reading and decoding the manifest files.
    Manifest,
    /// Building the activity tree.
    ActivityTree,
    /// Analyzing sequencing usage.
    Analysis,
    /// Projecting normalized metadata.
    Projection,
    /// Collecting validation findings.
    Validation,
}

/// An observation emitted while a parse runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ParseEvent {
    /// Module-type classification is starting.
    DetectionStarted,

    /// The package family has been classified.
    ModuleTypeDetected {
        /// The detected family.
        module_type: ModuleType,
        /// The SCORM 2004 edition, when applicable.
        edition: Option<ModuleEditionType>,
    },

    /// Manifest parsing is starting.
    ParsingStarted {
        /// The family being parsed.
        module_type: ModuleType,
    },

    /// An externally referenced metadata file is being loaded.
    LoadingExternalMetadata {
        /// Package-relative path of the metadata file.
        path: String,
    },

    /// A tolerated deviation was found and recorded.
    ParsingWarning {
        /// Human-readable description of the deviation.
        message: String,
    },

    /// Coarse progress through the pipeline.
    ParsingProgress {
        /// The phase currently running.
        phase: ParsePhase,
        /// Completion estimate in `[0, 100]`.
        percent: u8,
    },

    /// The parse finished.
    ParsingCompleted {
        /// Wall-clock time the parse took.
        #[serde(with = "crate::serde_support::duration_millis")]
        duration: Duration,
    },
}

/// Observer for [`ParseEvent`]s.
///
/// Listener calls must never influence control flow: the parser ignores
/// anything a listener does, and listeners are expected not to panic. Every
/// method has a no-op default, so implementors override only what they need.
pub trait ParsingEventListener {
    /// Called once per event, in emission order.
    fn on_event(&self, event: &ParseEvent) {
        let _ = event;
    }
}

/// The do-nothing listener used when a caller supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopParsingEventListener;

impl ParsingEventListener for NoopParsingEventListener {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<ParseEvent>>,
    }

    impl ParsingEventListener for Recorder {
        fn on_event(&self, event: &ParseEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let recorder = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        recorder.on_event(&ParseEvent::DetectionStarted);
        recorder.on_event(&ParseEvent::ParsingProgress {
            phase: ParsePhase::Manifest,
            percent: 40,
        });
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ParseEvent::DetectionStarted);
    }

    #[test]
    fn noop_listener_accepts_everything() {
        let listener = NoopParsingEventListener;
        listener.on_event(&ParseEvent::ParsingCompleted {
            duration: Duration::from_millis(12),
        });
    }

    #[test]
    fn event_serde_tags_by_name() {
        let event = ParseEvent::ModuleTypeDetected {
            module_type: ModuleType::Cmi5,
            edition: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "module_type_detected");
        assert_eq!(json["module_type"], "cmi5");
    }

    #[test]
    fn completed_event_serializes_millis() {
        let event = ParseEvent::ParsingCompleted {
            duration: Duration::from_millis(250),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["duration"], 250);
    }
}

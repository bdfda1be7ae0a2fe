//! Stage message scripts: time-sequenced narration played while a stage is
//! active.
//!
//! A script is a fixed ordered list of lines, each with its own display
//! delay, plus a settle delay and an optional completion phrase. Scripts are
//! looked up generically by stage id, with per-claim overrides layered on
//! top: `script_for(stage, claim) = overrides[claim_key][stage] ??
//! defaults[stage]`. The override key is a claim number or patient name,
//! letting the same stage narrate differently for a demo claim than for a
//! generic one — explicit layered configuration instead of scattered
//! conditionals.
//!
//! Playback semantics (enforced by the simulator, not here): line 0 shows
//! immediately on stage entry, line `i`'s delay elapses before line `i + 1`,
//! and after the last line the settle delay runs before the stage is marked
//! done.

pub mod catalog;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::log::LogAction;
use crate::types::StageId;

/// One narrated line and the delay that follows it.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptLine {
    pub text: String,
    /// Milliseconds to wait after displaying this line before advancing.
    pub delay_ms: u64,
    /// Follow-on effect attached to this line's log entry, if any.
    pub action: Option<LogAction>,
    pub action_data: Option<Value>,
}

impl ScriptLine {
    pub fn new(text: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            text: text.into(),
            delay_ms,
            action: None,
            action_data: None,
        }
    }

    /// Tag this line's log entry with an action and payload.
    #[must_use]
    pub fn with_action(mut self, action: LogAction, data: Value) -> Self {
        self.action = Some(action);
        self.action_data = Some(data);
        self
    }
}

/// The full script attached to one stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageScript {
    pub lines: Vec<ScriptLine>,
    /// Delay after the last line before the stage is marked done.
    pub settle_ms: u64,
    /// Stage-specific completion phrase; `None` falls back to the generic
    /// `"<stage title> completed."`.
    pub completion: Option<String>,
}

impl StageScript {
    pub fn new(lines: Vec<ScriptLine>, settle_ms: u64) -> Self {
        Self {
            lines,
            settle_ms,
            completion: None,
        }
    }

    #[must_use]
    pub fn with_completion(mut self, phrase: impl Into<String>) -> Self {
        self.completion = Some(phrase.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Layered script lookup: per-claim overrides over per-stage defaults.
///
/// # Examples
///
/// ```rust
/// use claimsim::scripts::{ScriptLibrary, ScriptLine, StageScript};
///
/// let library = ScriptLibrary::new()
///     .with_default("intake", StageScript::new(vec![ScriptLine::new("Received.", 500)], 500))
///     .with_override(
///         "CLM-2025-0001",
///         "intake",
///         StageScript::new(vec![ScriptLine::new("Received from portal.", 500)], 500),
///     );
///
/// let generic = library.script_for(&"intake".into(), &["CLM-9999-XXXX"]).unwrap();
/// assert_eq!(generic.lines[0].text, "Received.");
///
/// let demo = library.script_for(&"intake".into(), &["CLM-2025-0001"]).unwrap();
/// assert_eq!(demo.lines[0].text, "Received from portal.");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScriptLibrary {
    defaults: FxHashMap<StageId, StageScript>,
    overrides: FxHashMap<String, FxHashMap<StageId, StageScript>>,
}

impl ScriptLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the generic script for a stage.
    #[must_use]
    pub fn with_default(mut self, stage: impl Into<StageId>, script: StageScript) -> Self {
        self.defaults.insert(stage.into(), script);
        self
    }

    /// Register a claim-specific override for a stage. The key is matched
    /// against the claim number and the patient name.
    #[must_use]
    pub fn with_override(
        mut self,
        claim_key: impl Into<String>,
        stage: impl Into<StageId>,
        script: StageScript,
    ) -> Self {
        self.overrides
            .entry(claim_key.into())
            .or_default()
            .insert(stage.into(), script);
        self
    }

    /// Resolve the script for a stage, preferring the first claim key with a
    /// registered override, then falling back to the stage default.
    #[must_use]
    pub fn script_for(&self, stage: &StageId, claim_keys: &[&str]) -> Option<&StageScript> {
        for key in claim_keys {
            if let Some(per_stage) = self.overrides.get(*key)
                && let Some(script) = per_stage.get(stage)
            {
                return Some(script);
            }
        }
        self.defaults.get(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_falls_back_to_default_per_stage() {
        let library = ScriptLibrary::new()
            .with_default("a", StageScript::new(vec![ScriptLine::new("default a", 1)], 1))
            .with_default("b", StageScript::new(vec![ScriptLine::new("default b", 1)], 1))
            .with_override(
                "CLM-1",
                "a",
                StageScript::new(vec![ScriptLine::new("special a", 1)], 1),
            );

        // Stage with an override for this claim.
        assert_eq!(
            library.script_for(&"a".into(), &["CLM-1"]).unwrap().lines[0].text,
            "special a"
        );
        // Same claim, stage without an override.
        assert_eq!(
            library.script_for(&"b".into(), &["CLM-1"]).unwrap().lines[0].text,
            "default b"
        );
        // Unknown stage.
        assert!(library.script_for(&"c".into(), &["CLM-1"]).is_none());
    }

    #[test]
    fn any_claim_key_matches() {
        let library = ScriptLibrary::new().with_override(
            "Marie Tremblay",
            "a",
            StageScript::new(vec![ScriptLine::new("by name", 1)], 1),
        );
        let script = library
            .script_for(&"a".into(), &["CLM-1", "Marie Tremblay"])
            .unwrap();
        assert_eq!(script.lines[0].text, "by name");
    }
}

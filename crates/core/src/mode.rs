//! Processing modes and the mode-to-backend-configuration table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Processing mode selected by the requester.
///
/// Mode names are opaque here; only the [`ModeTable`] gives them meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend configuration for a single mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Model version override; falls back to the backend-wide version when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,

    /// Extra fields merged into the backend `input` object.
    #[serde(default)]
    pub input: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of resolving a requested mode name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMode<'a> {
    pub mode: Mode,
    pub profile: &'a ModeProfile,
    /// `true` when the request named no mode or an unknown one.
    pub fell_back: bool,
}

/// Mapping from mode name to backend configuration, with a default mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeTable {
    default: Mode,
    profiles: BTreeMap<Mode, ModeProfile>,
}

impl ModeTable {
    /// Build a table. The default mode is always present; a missing profile for
    /// it is filled with an empty one.
    pub fn new(default: Mode, profiles: impl IntoIterator<Item = (Mode, ModeProfile)>) -> Self {
        let mut profiles: BTreeMap<Mode, ModeProfile> = profiles.into_iter().collect();
        profiles.entry(default.clone()).or_default();
        Self { default, profiles }
    }

    /// The modes shipped out of the box.
    pub fn builtin() -> Self {
        Self::new(
            Mode::new("restoration"),
            ["restoration", "upscale", "frame_veteran"]
                .into_iter()
                .map(|name| (Mode::new(name), ModeProfile::default())),
        )
    }

    pub fn default_mode(&self) -> &Mode {
        &self.default
    }

    pub fn contains(&self, mode: &Mode) -> bool {
        self.profiles.contains_key(mode)
    }

    pub fn modes(&self) -> impl Iterator<Item = &Mode> {
        self.profiles.keys()
    }

    /// Resolve a requested mode name; unknown or empty names map to the default.
    pub fn resolve(&self, requested: Option<&str>) -> ResolvedMode<'_> {
        let requested = requested.map(Mode::new).filter(|m| !m.as_str().is_empty());

        if let Some(mode) = requested {
            if let Some(profile) = self.profiles.get(&mode) {
                return ResolvedMode {
                    mode,
                    profile,
                    fell_back: false,
                };
            }
        }

        ResolvedMode {
            mode: self.default.clone(),
            profile: self.default_profile(),
            fell_back: true,
        }
    }

    fn default_profile(&self) -> &ModeProfile {
        static EMPTY: std::sync::OnceLock<ModeProfile> = std::sync::OnceLock::new();
        self.profiles
            .get(&self.default)
            .unwrap_or_else(|| EMPTY.get_or_init(ModeProfile::default))
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_modes_resolve_to_their_profile() {
        let mut input = serde_json::Map::new();
        input.insert("scale".to_string(), serde_json::json!(4));
        let table = ModeTable::new(
            Mode::new("restoration"),
            [(
                Mode::new("upscale"),
                ModeProfile {
                    model_version: Some("v-upscale".to_string()),
                    input,
                },
            )],
        );

        let resolved = table.resolve(Some(" Upscale"));
        assert_eq!(resolved.mode.as_str(), "upscale");
        assert!(!resolved.fell_back);
        assert_eq!(resolved.profile.model_version.as_deref(), Some("v-upscale"));
        assert_eq!(resolved.profile.input.get("scale").unwrap(), 4);

        assert!(ModeTable::builtin().contains(&Mode::new("frame_veteran")));
    }

    #[test]
    fn unknown_or_empty_modes_fall_back_to_default() {
        let table = ModeTable::builtin();

        for requested in [None, Some(""), Some("  "), Some("cartoonify")] {
            let resolved = table.resolve(requested);
            assert_eq!(resolved.mode.as_str(), "restoration");
            assert!(resolved.fell_back);
        }
    }

    #[test]
    fn default_mode_is_always_present() {
        let table = ModeTable::new(Mode::new("upscale"), []);
        assert!(table.contains(&Mode::new("upscale")));
        assert_eq!(table.modes().count(), 1);
    }
}

//! Named bus storage with exclusion filtering.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, MixerConfig};
use crate::dsp::VolumeFader;

/// Which family a bus belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusKind {
    SoundClass,
    Submix,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::SoundClass => write!(f, "sound class"),
            BusKind::Submix => write!(f, "submix"),
        }
    }
}

/// Declaration of a bus, as it appears in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusDecl {
    pub name: String,
    /// Asset-style path used by path exclusion filters
    #[serde(default)]
    pub path: Option<String>,
    /// Initial volume, defaults to unity
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl BusDecl {
    /// Declaration with just a name, at unity volume.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            volume: 1.0,
        }
    }
}

/// Live state of one bus.
#[derive(Debug)]
pub(crate) struct BusStrip {
    pub(crate) fader: VolumeFader,
    /// Set when the last adjust request faded out or targeted silence
    pub(crate) fading_to_silence: bool,
}

impl BusStrip {
    fn from_decl(decl: &BusDecl) -> Self {
        let mut fader = VolumeFader::new();
        fader.set_volume(decl.volume.max(0.0));
        Self {
            fader,
            fading_to_silence: false,
        }
    }
}

/// Holds every registered bus, split by kind.
pub struct BusRegistry {
    classes: HashMap<String, BusStrip>,
    submixes: HashMap<String, BusStrip>,
}

impl BusRegistry {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
            submixes: HashMap::new(),
        }
    }

    /// Seeds the registry from config, applying the exclusion filters.
    pub fn from_config(config: &MixerConfig) -> Self {
        let mut registry = Self::new();
        for decl in &config.classes {
            if is_excluded(&config.filtering, decl) {
                continue;
            }
            debug!("[Registry] Added sound class: {}", decl.name);
            registry.insert(BusKind::SoundClass, decl);
        }
        for decl in &config.submixes {
            if is_excluded(&config.filtering, decl) {
                continue;
            }
            debug!("[Registry] Added submix: {}", decl.name);
            registry.insert(BusKind::Submix, decl);
        }
        registry
    }

    fn map(&self, kind: BusKind) -> &HashMap<String, BusStrip> {
        match kind {
            BusKind::SoundClass => &self.classes,
            BusKind::Submix => &self.submixes,
        }
    }

    fn map_mut(&mut self, kind: BusKind) -> &mut HashMap<String, BusStrip> {
        match kind {
            BusKind::SoundClass => &mut self.classes,
            BusKind::Submix => &mut self.submixes,
        }
    }

    /// Registers a bus, replacing any previous strip under the same name.
    pub fn insert(&mut self, kind: BusKind, decl: &BusDecl) {
        self.map_mut(kind)
            .insert(decl.name.clone(), BusStrip::from_decl(decl));
    }

    /// Removes a bus. Returns false when nothing was registered.
    pub fn remove(&mut self, kind: BusKind, name: &str) -> bool {
        self.map_mut(kind).remove(name).is_some()
    }

    pub fn contains(&self, kind: BusKind, name: &str) -> bool {
        self.map(kind).contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.submixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.submixes.is_empty()
    }

    pub(crate) fn strip(&self, kind: BusKind, name: &str) -> Option<&BusStrip> {
        self.map(kind).get(name)
    }

    pub(crate) fn strip_mut(&mut self, kind: BusKind, name: &str) -> Option<&mut BusStrip> {
        self.map_mut(kind).get_mut(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (BusKind, &str, &BusStrip)> {
        let classes = self
            .classes
            .iter()
            .map(|(name, strip)| (BusKind::SoundClass, name.as_str(), strip));
        let submixes = self
            .submixes
            .iter()
            .map(|(name, strip)| (BusKind::Submix, name.as_str(), strip));
        classes.chain(submixes)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (BusKind, &str, &mut BusStrip)> {
        let classes = self
            .classes
            .iter_mut()
            .map(|(name, strip)| (BusKind::SoundClass, name.as_str(), strip));
        let submixes = self
            .submixes
            .iter_mut()
            .map(|(name, strip)| (BusKind::Submix, name.as_str(), strip));
        classes.chain(submixes)
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_excluded(filter: &FilterConfig, decl: &BusDecl) -> bool {
    if filter.excluded_class_names.iter().any(|name| name == &decl.name) {
        debug!("[Registry] Excluded bus by name: {}", decl.name);
        return true;
    }
    if let Some(path) = &decl.path {
        if filter.excluded_class_paths.iter().any(|excluded| excluded == path) {
            debug!("[Registry] Excluded bus by path: {}", path);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_buses() -> MixerConfig {
        let mut config = MixerConfig::default();
        config.classes = vec![
            BusDecl::named("Music"),
            BusDecl {
                name: "Ambience".to_string(),
                path: Some("game/audio/classes/ambience".to_string()),
                volume: 0.5,
            },
        ];
        config.submixes = vec![BusDecl::named("Reverb")];
        config
    }

    #[test]
    fn test_from_config_registers_both_kinds() {
        let registry = BusRegistry::from_config(&config_with_buses());
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(BusKind::SoundClass, "Music"));
        assert!(registry.contains(BusKind::Submix, "Reverb"));
        assert!(!registry.contains(BusKind::Submix, "Music"));
    }

    #[test]
    fn test_declared_volume_is_applied() {
        let registry = BusRegistry::from_config(&config_with_buses());
        let strip = registry.strip(BusKind::SoundClass, "Ambience").unwrap();
        assert!((strip.fader.volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_name_exclusion_skips_registration() {
        let mut config = config_with_buses();
        config.filtering.excluded_class_names = vec!["Music".to_string()];

        let registry = BusRegistry::from_config(&config);
        assert!(!registry.contains(BusKind::SoundClass, "Music"));
        assert!(registry.contains(BusKind::SoundClass, "Ambience"));
    }

    #[test]
    fn test_path_exclusion_skips_registration() {
        let mut config = config_with_buses();
        config.filtering.excluded_class_paths =
            vec!["game/audio/classes/ambience".to_string()];

        let registry = BusRegistry::from_config(&config);
        assert!(!registry.contains(BusKind::SoundClass, "Ambience"));
        assert!(registry.contains(BusKind::SoundClass, "Music"));
    }

    #[test]
    fn test_names_are_isolated_per_kind() {
        let mut registry = BusRegistry::new();
        registry.insert(BusKind::SoundClass, &BusDecl::named("Shared"));
        registry.insert(BusKind::Submix, &BusDecl::named("Shared"));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(BusKind::Submix, "Shared"));
        assert!(registry.contains(BusKind::SoundClass, "Shared"));
    }

    #[test]
    fn test_reinserting_resets_the_strip() {
        let mut registry = BusRegistry::new();
        registry.insert(BusKind::SoundClass, &BusDecl::named("Music"));
        registry
            .strip_mut(BusKind::SoundClass, "Music")
            .unwrap()
            .fader
            .set_volume(0.1);

        registry.insert(BusKind::SoundClass, &BusDecl::named("Music"));
        let strip = registry.strip(BusKind::SoundClass, "Music").unwrap();
        assert!((strip.fader.volume() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_remove_missing_returns_false() {
        let mut registry = BusRegistry::new();
        assert!(!registry.remove(BusKind::SoundClass, "Nope"));
    }
}

use indexmap::IndexMap;
use maplit::hashmap;

use crate::platform::Platform;

/// Per-title archive handling policy.
#[derive(Debug, Clone, Default)]
pub struct ArcSupport {
    /// Selects the wide file-entry layout with the longer filename field.
    pub extended_path: bool,
    /// Blowfish key for `ARCC` archives. Absent for unencrypted titles.
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TitleSupport {
    pub arc: ArcSupport,
}

#[derive(Debug, Default)]
struct TitleProfile {
    support: TitleSupport,
    extensions: IndexMap<u32, String>,
}

/// Read-only lookup table for per-title behavior: archive layout flags,
/// encryption keys, and class-hash to extension mappings.
///
/// The registry is plain configuration data. Construct one, fill it, then
/// hand out shared references; callers that need different behavior build a
/// new registry instead of mutating a live one.
#[derive(Debug, Default)]
pub struct TitleRegistry {
    shared_extensions: IndexMap<u32, String>,
    titles: IndexMap<String, TitleProfile>,
}

impl TitleRegistry {
    pub fn new() -> Self {
        TitleRegistry::default()
    }

    /// Builds a registry pre-populated with the class names common to the
    /// whole engine family. Titles with keys or layout quirks are expected
    /// to be registered on top by the caller.
    pub fn with_defaults() -> Self {
        let class_names = hashmap! {
            "rTexture" => "tex",
            "rModel" => "mod",
            "rMotionList" => "lmt",
            "rMaterial" => "mrl",
            "rEffectList" => "efl",
            "rShaderPackage" => "mfx",
            "rCollision" => "sbc",
            "rScheduler" => "sdl",
            "rSoundBank" => "sbkr",
            "rLayoutAnim" => "lan",
        };

        let mut registry = TitleRegistry::new();
        for (class_name, extension) in class_names {
            registry.register_shared_extension(class_name, extension);
        }
        registry
    }

    pub fn register_title(&mut self, title: &str, support: TitleSupport) {
        self.titles.entry(title.to_string()).or_default().support = support;
    }

    /// Maps a class name to an extension for every title, under both hash
    /// conventions.
    pub fn register_shared_extension(&mut self, class_name: &str, extension: &str) {
        self.shared_extensions
            .insert(hash_v1(class_name), extension.to_string());
        self.shared_extensions
            .insert(hash_v2(class_name), extension.to_string());
    }

    /// Maps a class name to an extension for a single title, overriding any
    /// shared mapping.
    pub fn register_extension(&mut self, title: &str, class_name: &str, extension: &str) {
        let profile = self.titles.entry(title.to_string()).or_default();
        profile
            .extensions
            .insert(hash_v1(class_name), extension.to_string());
        profile
            .extensions
            .insert(hash_v2(class_name), extension.to_string());
    }

    /// Resolves the archive policy for a title. Unregistered titles get the
    /// default policy: standard entry layout, no encryption key.
    pub fn title_support(&self, title: &str, _platform: Platform) -> TitleSupport {
        self.titles
            .get(title)
            .map(|profile| profile.support.clone())
            .unwrap_or_default()
    }

    /// Resolves a class hash to a file extension, preferring title-scoped
    /// mappings over the shared table.
    pub fn extension_for(&self, type_hash: u32, title: &str, _platform: Platform) -> Option<&str> {
        self.titles
            .get(title)
            .and_then(|profile| profile.extensions.get(&type_hash))
            .or_else(|| self.shared_extensions.get(&type_hash))
            .map(|extension| extension.as_str())
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = u32::MAX;
    for byte in bytes {
        crc ^= *byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// First-generation class hash used by older titles.
pub fn hash_v1(name: &str) -> u32 {
    !crc32(name.as_bytes()) & 0x7FFF_FFFF
}

/// Second-generation class hash. Differs from v1 by folding the terminator
/// into the hashed bytes.
pub fn hash_v2(name: &str) -> u32 {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    !crc32(&bytes) & 0x7FFF_FFFF
}

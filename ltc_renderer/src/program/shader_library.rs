/// Tag-addressed shader sources
///
/// Shader sources live in effect files. Each file holds several sections,
/// each introduced by a line `-- SectionName`; a section is addressed by the
/// tag `Effect.SectionName` where `Effect` is the file stem. Directive
/// tokens (typically a `#version` line) are prepended to every section of
/// an effect, or of every effect when registered for `"*"`.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::Result;

const SOURCE: &str = "ltc::ShaderLibrary";

/// Effect name that applies a directive to every effect
pub const ALL_EFFECTS: &str = "*";

/// Effects shipped with the crate, in the `(effect, text)` form of `add_source`
const BUILTIN_EFFECTS: [(&str, &str); 4] = [
    ("Depth", include_str!("../../shaders/depth.glsl")),
    ("LTC", include_str!("../../shaders/ltc.glsl")),
    ("Flat", include_str!("../../shaders/flat.glsl")),
    ("Resolve", include_str!("../../shaders/resolve.glsl")),
];

/// Directive prepended to the built-in effects (valid on both device profiles)
pub const BUILTIN_VERSION: &str = "#version 330 core";

#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    /// "Effect.Section" -> section body
    sections: FxHashMap<String, String>,
    /// Effect (or "*") -> directive lines in registration order
    directives: FxHashMap<String, Vec<String>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding the depth, LTC, flat and resolve effects used by
    /// the default `PipelineShaders`
    pub fn builtin() -> Self {
        let mut library = Self::new();
        library.add_directive(ALL_EFFECTS, BUILTIN_VERSION);
        for (effect, text) in BUILTIN_EFFECTS {
            library.add_source(effect, text);
        }
        library
    }

    /// Prepend `token` to every section of `effect` (`"*"` for all effects)
    pub fn add_directive(&mut self, effect: &str, token: impl Into<String>) {
        self.directives.entry(effect.to_string()).or_default().push(token.into());
    }

    /// Register the sections of an effect given as text.
    ///
    /// Returns the number of sections found. Text before the first section
    /// marker is ignored; a section registered twice keeps the last body.
    pub fn add_source(&mut self, effect: &str, text: &str) -> usize {
        let mut count = 0;
        let mut current: Option<(String, String)> = None;
        for line in text.lines() {
            if let Some(marker) = line.strip_prefix("--") {
                if let Some((name, body)) = current.take() {
                    self.sections.insert(format!("{}.{}", effect, name), body);
                    count += 1;
                }
                let name = marker.split_whitespace().next().unwrap_or("");
                if !name.is_empty() {
                    current = Some((name.to_string(), String::new()));
                }
                continue;
            }
            if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
        }
        if let Some((name, body)) = current {
            self.sections.insert(format!("{}.{}", effect, name), body);
            count += 1;
        }
        crate::ltc_debug!(SOURCE, "Effect '{}': {} sections", effect, count);
        count
    }

    /// Read an effect file; the effect name is the file stem
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let Some(effect) = path.file_stem().and_then(|s| s.to_str()) else {
            crate::ltc_bail!(SOURCE, AssetLoadFailed, "'{}' has no usable file name", path.display());
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::ltc_err!(SOURCE, AssetLoadFailed, "Cannot read effect '{}': {}", path.display(), e)
        })?;
        Ok(self.add_source(effect, &text))
    }

    /// Load every `*.{extension}` file of a directory
    pub fn load_directory(&mut self, dir: &Path, extension: &str) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            crate::ltc_err!(SOURCE, AssetLoadFailed, "Cannot list shader directory '{}': {}", dir.display(), e)
        })?;
        let mut count = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                count += self.load_file(&path)?;
            }
        }
        Ok(count)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.sections.contains_key(tag)
    }

    /// Full source for `Effect.Section` with the effect's directives prepended
    pub fn source(&self, tag: &str) -> Option<String> {
        let body = self.sections.get(tag)?;
        let effect = tag.split('.').next().unwrap_or(tag);
        let mut text = String::new();
        let global = self.directives.get(ALL_EFFECTS).into_iter().flatten();
        let local = self.directives.get(effect).into_iter().flatten();
        for directive in global.chain(local) {
            text.push_str(directive);
            text.push('\n');
        }
        text.push_str(body);
        Some(text)
    }
}

#[cfg(test)]
#[path = "shader_library_tests.rs"]
mod tests;

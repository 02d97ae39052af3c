//! Per-call options for the `cpp`/`link` task builders, and the
//! `maek.toml` layer of global defaults they're merged against. The field
//! names mirror the build-description surface (`objPrefix`, `CPPFlags`,
//! ...) even though the Rust-side struct is snake_case, so a `maek.toml`
//! reads the same regardless of which language wrote it.

use serde::Deserialize;

use crate::platform::Os;

/// A partial set of overrides: any field left `None` (or, for the list
/// fields, simply absent) leaves the corresponding default untouched.
/// Deserialized with `deny_unknown_fields` so a typo or stale key in
/// `maek.toml` is a hard error rather than a silent no-op.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OptionsConfig {
    #[serde(rename = "objPrefix")]
    pub obj_prefix: Option<String>,
    #[serde(rename = "objSuffix")]
    pub obj_suffix: Option<String>,
    #[serde(rename = "exeSuffix")]
    pub exe_suffix: Option<String>,
    pub depends: Option<Vec<String>>,
    #[serde(rename = "CPPFlags")]
    pub cpp_flags: Option<Vec<String>>,
    #[serde(rename = "LINKLibs")]
    pub link_libs: Option<Vec<String>>,
}

/// The fully-resolved options a compile or link task actually builds with:
/// the global defaults with every layer of override folded in.
#[derive(Debug, Clone)]
pub struct Options {
    pub obj_prefix: String,
    pub obj_suffix: String,
    pub exe_suffix: String,
    pub depends: Vec<String>,
    pub cpp_flags: Vec<String>,
    pub link_libs: Vec<String>,
}

impl Options {
    pub fn defaults(os: Os) -> Self {
        Self {
            obj_prefix: "objs/".to_string(),
            obj_suffix: os.default_obj_suffix().to_string(),
            exe_suffix: os.default_exe_suffix().to_string(),
            depends: Vec::new(),
            cpp_flags: Vec::new(),
            link_libs: Vec::new(),
        }
    }

    /// Fold an override layer on top of these options. Scalars replace;
    /// lists (`depends`, `CPPFlags`, `LINKLibs`) append, matching the
    /// build-description convention that per-call flags add to the global
    /// set rather than replace it.
    pub fn merged(&self, overrides: &OptionsConfig) -> Self {
        let mut out = self.clone();
        if let Some(v) = &overrides.obj_prefix {
            out.obj_prefix = v.clone();
        }
        if let Some(v) = &overrides.obj_suffix {
            out.obj_suffix = v.clone();
        }
        if let Some(v) = &overrides.exe_suffix {
            out.exe_suffix = v.clone();
        }
        if let Some(v) = &overrides.depends {
            out.depends.extend(v.iter().cloned());
        }
        if let Some(v) = &overrides.cpp_flags {
            out.cpp_flags.extend(v.iter().cloned());
        }
        if let Some(v) = &overrides.link_libs {
            out.link_libs.extend(v.iter().cloned());
        }
        out
    }
}

/// Parse a `maek.toml`-style global defaults file. Unknown keys are a hard
/// error (see [`OptionsConfig`]'s `deny_unknown_fields`).
pub fn parse_config(contents: &str) -> Result<OptionsConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_key_is_a_hard_error() {
        let err = parse_config("objPrefx = \"build/\"").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn list_fields_append_rather_than_replace() {
        let base = Options {
            cpp_flags: vec!["-O2".to_string()],
            ..Options::defaults(Os::Linux)
        };
        let overrides = OptionsConfig {
            cpp_flags: Some(vec!["-DDEBUG".to_string()]),
            ..Default::default()
        };
        let merged = base.merged(&overrides);
        assert_eq!(merged.cpp_flags, vec!["-O2".to_string(), "-DDEBUG".to_string()]);
    }
}

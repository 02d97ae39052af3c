//! Platform detection and the platform-specific suffix table and command
//! adapter. An unknown platform is fatal at startup: nothing downstream
//! knows how to name an object file on it.

use color_eyre::eyre::{bail, Result};
use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Os {
    #[display("linux")]
    Linux,
    #[display("macos")]
    MacOs,
    #[display("windows")]
    Windows,
}

impl Os {
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(Os::Linux),
            "macos" => Ok(Os::MacOs),
            "windows" => Ok(Os::Windows),
            other => bail!("unsupported platform: {other}"),
        }
    }

    pub fn default_obj_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".obj",
            Os::Linux | Os::MacOs => ".o",
        }
    }

    pub fn default_exe_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            Os::Linux | Os::MacOs => "",
        }
    }
}

/// Build the compile command for a single translation unit.
pub fn compile_command(os: Os, source: &str, object: &str, flags: &[String]) -> Result<Vec<String>> {
    if os == Os::Windows {
        bail!("compiling on windows is not implemented");
    }
    let mut cmd = vec![
        "c++".to_string(),
        "-std=c++20".to_string(),
        "-Wall".to_string(),
        "-Werror".to_string(),
        "-g".to_string(),
    ];
    cmd.extend(flags.iter().cloned());
    cmd.extend(["-c".to_string(), "-o".to_string(), object.to_string(), source.to_string()]);
    Ok(cmd)
}

/// Build the dependency-probe command that writes a make-style dep-info file
/// naming `x` as the (fictitious) output, per the `-MT 'x '` convention the
/// dep-file parser expects.
pub fn probe_command(os: Os, source: &str, dep_file: &str, flags: &[String]) -> Result<Vec<String>> {
    if os == Os::Windows {
        bail!("dependency probing on windows is not implemented");
    }
    let mut cmd = vec!["c++".to_string(), "-std=c++20".to_string()];
    cmd.extend(flags.iter().cloned());
    cmd.extend([
        "-MM".to_string(),
        "-MT".to_string(),
        "x ".to_string(),
        "-MF".to_string(),
        dep_file.to_string(),
        source.to_string(),
    ]);
    Ok(cmd)
}

/// Build the link command for a set of objects into an executable.
pub fn link_command(os: Os, objects: &[String], exe: &str, libs: &[String]) -> Result<Vec<String>> {
    if os == Os::Windows {
        bail!("linking on windows is not implemented");
    }
    let mut cmd = vec!["c++".to_string(), "-o".to_string(), exe.to_string()];
    cmd.extend(objects.iter().cloned());
    cmd.extend(libs.iter().cloned());
    Ok(cmd)
}

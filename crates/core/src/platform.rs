//! Platform detection for shell command execution

use std::env;

/// The shell used to run command-line task bodies on the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    /// Shell executable (e.g. "sh", "cmd")
    pub program: &'static str,
    /// Flag that makes the shell run the following argument ("-c", "/C")
    pub flag: &'static str,
}

impl Shell {
    /// Detect the shell for the current platform
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self {
                program: "cmd",
                flag: "/C",
            },
            _ => Self {
                program: "sh",
                flag: "-c",
            },
        }
    }
}

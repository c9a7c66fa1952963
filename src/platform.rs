use derive_more::Display;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Os {
    #[display("linux")]
    Linux,
    #[display("macos")]
    MacOs,
    #[display("windows")]
    Windows,
    #[display("solaris")]
    Solaris,
    #[display("{_0}")]
    Other(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Libc {
    #[display("gnu")]
    Gnu,
    #[display("musl")]
    Musl,
}

/// The host operating system as the resolvers see it. Each resolver maps it onto its own
/// catalog tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub libc: Libc,
}

impl Platform {
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            "solaris" | "illumos" => Os::Solaris,
            other => Os::Other(other),
        };
        let libc = if os == Os::Linux && Path::new("/etc/alpine-release").exists() {
            Libc::Musl
        } else {
            Libc::Gnu
        };
        Self { os, libc }
    }

    pub fn new(os: Os) -> Self {
        Self {
            os,
            libc: Libc::Gnu,
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    /// The `macos`/`windows`/`linux` naming most vendor catalogs share.
    pub fn common_name(&self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Solaris => "solaris",
            Os::Other(name) => name,
        }
    }
}

/// The host CPU in the naming setup inputs use (`x64`, `aarch64`, ...).
pub fn host_architecture() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "aarch64",
        "arm" => "arm",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        other => other,
    }
}

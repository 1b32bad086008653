//! Host platform detection and group-suffix matching.

use std::fmt;
use std::path::Path;

/// Operating systems that can appear as a group suffix (`zsh_macos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// `linux`
    Linux,
    /// `windows`
    Windows,
    /// `macos`
    MacOs,
    /// `ios`
    Ios,
    /// `android`
    Android,
    /// `freebsd`
    FreeBsd,
    /// `dragonfly`
    DragonFly,
    /// `openbsd`
    OpenBsd,
    /// `netbsd`
    NetBsd,
}

impl Os {
    /// Every known operating system.
    pub const ALL: [Self; 9] = [
        Self::Linux,
        Self::Windows,
        Self::MacOs,
        Self::Ios,
        Self::Android,
        Self::FreeBsd,
        Self::DragonFly,
        Self::OpenBsd,
        Self::NetBsd,
    ];

    /// The name used by `std::env::consts::OS` and by group suffixes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::FreeBsd => "freebsd",
            Self::DragonFly => "dragonfly",
            Self::OpenBsd => "openbsd",
            Self::NetBsd => "netbsd",
        }
    }

    /// Parse an OS name as it appears in a suffix.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|os| os.as_str() == name)
    }

    /// The family this OS belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Windows => Family::Windows,
            _ => Family::Unix,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS family, matching `std::env::consts::FAMILY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// `unix`
    Unix,
    /// `windows`
    Windows,
}

impl Family {
    /// The name used by `std::env::consts::FAMILY` and by group suffixes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::Windows => "windows",
        }
    }

    /// Parse a family name as it appears in a suffix.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unix" => Some(Self::Unix),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Running operating system, `None` when it is not one tuckr knows.
    pub os: Option<Os>,
    /// Running OS family.
    pub family: Family,
    /// Whether the host is the Windows Subsystem for Linux.
    pub is_wsl: bool,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let os = Os::from_name(std::env::consts::OS);
        let family = if cfg!(windows) {
            Family::Windows
        } else {
            Family::Unix
        };
        Self {
            os,
            family,
            is_wsl: os == Some(Os::Linux) && detect_wsl(Path::new("/proc")),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, is_wsl: bool) -> Self {
        Self {
            os: Some(os),
            family: os.family(),
            is_wsl,
        }
    }

    /// Whether the host runs the given OS.
    #[must_use]
    pub fn is(&self, os: Os) -> bool {
        self.os == Some(os)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.os {
            Some(os) => write!(f, "{os}")?,
            None => write!(f, "{}", std::env::consts::OS)?,
        }
        if self.is_wsl {
            write!(f, " (wsl)")?;
        }
        Ok(())
    }
}

/// Detect WSL by inspecting the kernel's `/proc` entries under `proc_root`.
fn detect_wsl(proc_root: &Path) -> bool {
    let mentions_wsl = |file: &str| {
        std::fs::read_to_string(proc_root.join(file))
            .is_ok_and(|s| s.to_lowercase().contains("microsoft") || s.contains("WSL"))
    };

    mentions_wsl("sys/kernel/osrelease")
        || mentions_wsl("version")
        || proc_root.join("sys/fs/binfmt_misc/WSLInterop").exists()
}

//! Conditional group suffixes and their precedence.
//!
//! A group directory named `<base>_<suffix>` is a conditional variant of
//! `<base>`. The suffix decides whether the variant applies to this run and
//! how it ranks against the other variants of the same base:
//!
//! | tier     | suffix example | applies when                      |
//! |----------|----------------|-----------------------------------|
//! | custom   | `zsh_#work`    | `work` is an active custom target |
//! | wsl      | `zsh_wsl`      | running under WSL                 |
//! | os       | `zsh_linux`    | the OS name matches               |
//! | family   | `zsh_unix`     | the OS family matches             |
//! | base     | `zsh`          | always                            |
//!
//! Higher rows win. Among custom targets, the one listed first wins.
use std::fmt;

use crate::platform::{Family, Os, Platform};

/// Marker that introduces a custom target suffix.
const CUSTOM_MARKER: &str = "_#";

/// A recognized group-name suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Suffix {
    /// `_#<name>`: user-activated custom target.
    Custom(String),
    /// `_wsl`
    Wsl,
    /// `_linux`, `_macos`, ...
    Os(Os),
    /// `_unix`, `_windows`
    Family(Family),
}

impl Suffix {
    /// Precedence tier of this suffix.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        match self {
            Self::Custom(_) => Tier::Custom,
            Self::Wsl => Tier::Wsl,
            Self::Os(_) => Tier::Os,
            Self::Family(_) => Tier::Family,
        }
    }

    /// Whether a variant with this suffix contributes on `platform`.
    #[must_use]
    pub fn applies(&self, platform: &Platform, custom_targets: &[String]) -> bool {
        match self {
            Self::Custom(name) => custom_targets.contains(name),
            Self::Wsl => platform.is_wsl,
            Self::Os(os) => platform.is(*os),
            Self::Family(family) => platform.family == *family,
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "#{name}"),
            Self::Wsl => f.write_str("wsl"),
            Self::Os(os) => write!(f, "{os}"),
            Self::Family(family) => write!(f, "{family}"),
        }
    }
}

/// Precedence tier, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Unconditional directory.
    Base,
    /// OS family suffix.
    Family,
    /// Exact OS suffix.
    Os,
    /// WSL marker.
    Wsl,
    /// Custom target.
    Custom,
}

/// Total order between contributing variants; greater wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority {
    tier: Tier,
    rank: usize,
}

impl Priority {
    /// Priority of a variant with `suffix`, given the active custom targets
    /// in the order the user listed them.
    #[must_use]
    pub fn of(suffix: Option<&Suffix>, custom_targets: &[String]) -> Self {
        let rank = match suffix {
            Some(Suffix::Custom(name)) => custom_targets
                .iter()
                .position(|t| t == name)
                .map_or(0, |index| custom_targets.len() - index),
            _ => 0,
        };
        Self {
            tier: suffix.map_or(Tier::Base, Suffix::tier),
            rank,
        }
    }

    /// Tier of this priority.
    #[must_use]
    pub const fn tier(self) -> Tier {
        self.tier
    }
}

/// Split a group directory name into its base name and suffix.
///
/// Names whose last segment is not a recognized suffix are unconditional:
/// the whole name is the base.
///
/// ```
/// use tuckr_cli::config::targets::{Suffix, split_group_name};
/// use tuckr_cli::platform::Os;
///
/// assert_eq!(split_group_name("zsh_linux"), ("zsh", Some(Suffix::Os(Os::Linux))));
/// assert_eq!(split_group_name("zsh_#work_pc"), ("zsh", Some(Suffix::Custom("work_pc".into()))));
/// assert_eq!(split_group_name("my_tools"), ("my_tools", None));
/// ```
#[must_use]
pub fn split_group_name(dir_name: &str) -> (&str, Option<Suffix>) {
    if let Some((base, custom)) = dir_name.split_once(CUSTOM_MARKER)
        && !base.is_empty()
        && !custom.is_empty()
    {
        return (base, Some(Suffix::Custom(custom.to_string())));
    }

    let Some((base, last)) = dir_name.rsplit_once('_') else {
        return (dir_name, None);
    };
    if base.is_empty() {
        return (dir_name, None);
    }

    let suffix = if last == "wsl" {
        Some(Suffix::Wsl)
    } else if let Some(family) = Family::from_name(last) {
        Some(Suffix::Family(family))
    } else {
        Os::from_name(last).map(Suffix::Os)
    };

    match suffix {
        Some(suffix) => (base, Some(suffix)),
        None => (dir_name, None),
    }
}

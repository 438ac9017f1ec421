//! Per-platform migration profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A legacy platform whose database is being migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Union Eyes.
    Ue,
    /// ABR Insights.
    Abr,
}

impl Platform {
    /// All platforms.
    pub const ALL: [Self; 2] = [Self::Ue, Self::Abr];

    /// Returns the lowercase platform tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ue => "ue",
            Self::Abr => "abr",
        }
    }

    /// File name of this platform's checkpoint inside the checkpoint directory.
    #[must_use]
    pub const fn checkpoint_file(self) -> &'static str {
        match self {
            Self::Ue => "ue_migration_checkpoint.json",
            Self::Abr => "abr_migration_checkpoint.json",
        }
    }

    /// Bookkeeping tables the legacy stack keeps that are never copied.
    #[must_use]
    pub const fn bookkeeping_tables(self) -> &'static [&'static str] {
        match self {
            Self::Ue => &["__drizzle_migrations"],
            Self::Abr => &["schema_migrations", "supabase_migrations", "_prisma_migrations"],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown platform tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}' (expected ue or abr)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ue" => Ok(Self::Ue),
            "abr" => Ok(Self::Abr),
            _ => Err(UnknownPlatform(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("UE".parse::<Platform>(), Ok(Platform::Ue));
        assert_eq!("abr".parse::<Platform>(), Ok(Platform::Abr));
        let err = "clickhome".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "unknown platform 'clickhome' (expected ue or abr)");
    }

    #[test]
    fn test_checkpoint_files_differ() {
        assert_ne!(Platform::Ue.checkpoint_file(), Platform::Abr.checkpoint_file());
        for platform in Platform::ALL {
            assert!(platform.checkpoint_file().starts_with(platform.as_str()));
        }
    }
}

//! Shared types for Gantry

use serde::{Deserialize, Serialize};

/// Pipeline command being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// Resolve the changelog
    Changelog,
    /// Compute artifact checksums
    Checksum,
    /// Sign artifacts and checksums
    Sign,
    /// Upload artifacts to configured targets
    Upload,
    /// Create the release
    Release,
    /// Download configured assets
    Download,
    /// Deploy staged artifacts
    Deploy,
    /// Catalog artifacts (SBOMs)
    Catalog,
    /// Prepare packager files
    Prepare,
    /// Package prepared files
    Package,
    /// Publish packages
    Publish,
    /// Announce the release
    Announce,
    /// Run the whole pipeline end to end
    FullRelease,
}

impl Command {
    /// Returns the string representation of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Changelog => "changelog",
            Self::Checksum => "checksum",
            Self::Sign => "sign",
            Self::Upload => "upload",
            Self::Release => "release",
            Self::Download => "download",
            Self::Deploy => "deploy",
            Self::Catalog => "catalog",
            Self::Prepare => "prepare",
            Self::Package => "package",
            Self::Publish => "publish",
            Self::Announce => "announce",
            Self::FullRelease => "full-release",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "changelog" => Ok(Self::Changelog),
            "checksum" => Ok(Self::Checksum),
            "sign" => Ok(Self::Sign),
            "upload" => Ok(Self::Upload),
            "release" => Ok(Self::Release),
            "download" => Ok(Self::Download),
            "deploy" => Ok(Self::Deploy),
            "catalog" => Ok(Self::Catalog),
            "prepare" => Ok(Self::Prepare),
            "package" => Ok(Self::Package),
            "publish" => Ok(Self::Publish),
            "announce" => Ok(Self::Announce),
            "full-release" | "full" => Ok(Self::FullRelease),
            _ => Err(format!("Unknown command: {}", s)),
        }
    }
}

/// Outcome of a workflow step or a single unit within it.
///
/// The executor pattern-matches on the tag to decide logging; failures
/// travel as errors, never as an outcome variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step or unit was disabled or filtered out
    Skipped,
    /// Nothing changed; existing output was left untouched
    UpToDate,
    /// The step ran and produced its effect
    Succeeded,
}

impl StepOutcome {
    /// Returns the string representation of the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::UpToDate => "up to date",
            Self::Succeeded => "succeeded",
        }
    }

    /// Combine two outcomes, keeping the "most active" of the pair
    pub fn merge(self, other: StepOutcome) -> StepOutcome {
        match (self, other) {
            (Self::Succeeded, _) | (_, Self::Succeeded) => Self::Succeeded,
            (Self::UpToDate, _) | (_, Self::UpToDate) => Self::UpToDate,
            _ => Self::Skipped,
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_command_from_str() {
        assert_eq!(Command::from_str("release").unwrap(), Command::Release);
        assert_eq!(Command::from_str("FULL-RELEASE").unwrap(), Command::FullRelease);
        assert!(Command::from_str("bogus").is_err());
    }

    #[test]
    fn test_command_round_trip() {
        for cmd in [
            Command::Changelog,
            Command::Checksum,
            Command::Sign,
            Command::Upload,
            Command::Release,
            Command::Download,
            Command::Deploy,
            Command::Catalog,
            Command::Prepare,
            Command::Package,
            Command::Publish,
            Command::Announce,
            Command::FullRelease,
        ] {
            assert_eq!(Command::from_str(cmd.as_str()).unwrap(), cmd);
        }
    }

    #[test]
    fn test_outcome_merge() {
        assert_eq!(
            StepOutcome::Skipped.merge(StepOutcome::UpToDate),
            StepOutcome::UpToDate
        );
        assert_eq!(
            StepOutcome::UpToDate.merge(StepOutcome::Succeeded),
            StepOutcome::Succeeded
        );
        assert_eq!(
            StepOutcome::Skipped.merge(StepOutcome::Skipped),
            StepOutcome::Skipped
        );
    }
}

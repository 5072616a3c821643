//! Workflow composition
//!
//! A pure mapping from pipeline command to the ordered list of steps that
//! implement it. Ordering is a correctness property: later steps read files
//! their predecessors wrote under the output directory.

use gantry_core::types::Command;

/// One stage of the release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStep {
    /// Resolve the changelog into the context
    Changelog,
    /// Compute artifact checksums
    Checksum,
    /// Sign artifacts and checksums
    Sign,
    /// Upload the release file set
    Upload,
    /// Create the release
    Release,
    /// Download configured assets
    Download,
    /// Deploy staged artifacts
    Deploy,
    /// Catalog artifacts (SBOMs)
    Catalog,
    /// Render packager templates
    Prepare,
    /// Stage prepared packager files
    Package,
    /// Publish packages
    Publish,
    /// Announce the release
    Announce,
}

impl WorkflowStep {
    /// Get the step name as a string
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
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compose the ordered step list for a command
pub fn plan(command: Command) -> Vec<WorkflowStep> {
    use WorkflowStep::*;

    match command {
        Command::Changelog => vec![Changelog],
        Command::Checksum => vec![Checksum],
        Command::Sign => vec![Checksum, Sign],
        Command::Upload => vec![Checksum, Sign, Upload],
        Command::Release => vec![Changelog, Checksum, Sign, Upload, Release],
        Command::Download => vec![Download],
        Command::Deploy => vec![Deploy],
        Command::Catalog => vec![Checksum, Catalog],
        Command::Prepare => vec![Checksum, Prepare],
        Command::Package => vec![Checksum, Prepare, Package],
        Command::Publish => vec![Checksum, Prepare, Package, Publish],
        Command::Announce => vec![Changelog, Announce],
        Command::FullRelease => vec![
            Changelog, Checksum, Sign, Upload, Release, Prepare, Package, Publish, Announce,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowStep::*;

    #[test]
    fn test_release_plan() {
        assert_eq!(
            plan(Command::Release),
            vec![Changelog, Checksum, Sign, Upload, Release]
        );
    }

    #[test]
    fn test_single_step_plans() {
        assert_eq!(plan(Command::Checksum), vec![Checksum]);
        assert_eq!(plan(Command::Changelog), vec![Changelog]);
        assert_eq!(plan(Command::Download), vec![Download]);
        assert_eq!(plan(Command::Deploy), vec![Deploy]);
    }

    #[test]
    fn test_packaging_plans_build_on_each_other() {
        assert_eq!(plan(Command::Prepare), vec![Checksum, Prepare]);
        assert_eq!(plan(Command::Package), vec![Checksum, Prepare, Package]);
        assert_eq!(
            plan(Command::Publish),
            vec![Checksum, Prepare, Package, Publish]
        );
    }

    #[test]
    fn test_sign_and_upload_depend_on_checksum() {
        assert_eq!(plan(Command::Sign), vec![Checksum, Sign]);
        assert_eq!(plan(Command::Upload), vec![Checksum, Sign, Upload]);
    }

    #[test]
    fn test_announce_needs_changelog() {
        assert_eq!(plan(Command::Announce), vec![Changelog, Announce]);
    }

    #[test]
    fn test_catalog_needs_checksums() {
        assert_eq!(plan(Command::Catalog), vec![Checksum, Catalog]);
    }

    #[test]
    fn test_full_release_plan() {
        assert_eq!(
            plan(Command::FullRelease),
            vec![Changelog, Checksum, Sign, Upload, Release, Prepare, Package, Publish, Announce]
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        assert_eq!(plan(Command::Release), plan(Command::Release));
    }
}

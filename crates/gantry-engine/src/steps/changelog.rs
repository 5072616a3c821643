//! Changelog step driver
//!
//! Resolves the changelog into the context, either from a pre-rendered
//! external file or generated from git history: commits since the latest
//! release tag, classified with the Conventional Commits format and
//! rendered through the configured line templates.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, info_span, warn};

use gantry_core::context::Changelog;
use gantry_core::error::ChangelogError;
use gantry_core::model::ChangelogConfig;
use gantry_core::{Context, Result, StepOutcome};
use gantry_template as template;

/// Regex for parsing conventional commit titles
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$")
        .expect("Invalid regex")
});

/// A commit pulled from history
#[derive(Debug, Clone)]
struct CommitInfo {
    hash: String,
    title: String,
    author: String,
}

impl CommitInfo {
    fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }

    fn commit_type(&self) -> Option<String> {
        CONVENTIONAL_REGEX
            .captures(&self.title)
            .and_then(|caps| caps.name("type"))
            .map(|m| m.as_str().to_lowercase())
    }
}

/// Run the changelog step
pub fn run(ctx: &mut Context) -> Result<StepOutcome> {
    let cfg = ctx.model.changelog.clone();
    if !cfg.enabled {
        info!("changelog disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let _span = info_span!("changelog").entered();

    if let Some(external) = &cfg.external {
        let path = ctx.base_dir.join(external);
        if !path.is_file() {
            return Err(ChangelogError::FileNotFound(path).into());
        }
        let text = std::fs::read_to_string(&path).map_err(ChangelogError::Io)?;

        ctx.changelog = Changelog {
            resolved: Some(text.clone()),
            formatted_changes: Some(text),
            formatted_contributors: None,
        };
        info!(path = %path.display(), "changelog read from external file");
        return Ok(StepOutcome::Succeeded);
    }

    let commits = match collect_commits(ctx, &cfg) {
        Ok(commits) => commits,
        Err(ChangelogError::Git(e)) => {
            warn!(error = %e, "no usable git history, changelog will be empty");
            ctx.changelog = Changelog {
                resolved: Some(String::new()),
                formatted_changes: Some(String::new()),
                formatted_contributors: Some(String::new()),
            };
            return Ok(StepOutcome::Succeeded);
        }
        Err(e) => return Err(e.into()),
    };

    let (changes, contributors) = format_changelog(ctx, &cfg, &commits)?;
    let mut resolved = changes.clone();
    if !contributors.is_empty() {
        resolved.push_str("\n## Contributors\n");
        resolved.push_str(&contributors);
        resolved.push('\n');
    }

    info!(commits = commits.len(), "changelog generated");
    ctx.changelog = Changelog {
        resolved: Some(resolved),
        formatted_changes: Some(changes),
        formatted_contributors: Some(contributors),
    };
    Ok(StepOutcome::Succeeded)
}

/// Commits since the latest release tag, newest first
fn collect_commits(
    ctx: &Context,
    cfg: &ChangelogConfig,
) -> std::result::Result<Vec<CommitInfo>, ChangelogError> {
    let repo = git2::Repository::discover(&ctx.base_dir)?;

    let since = latest_tag(&repo, cfg.tag_pattern.as_deref())?;

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
    let head = repo.head()?.peel_to_commit()?;
    revwalk.push(head.id())?;
    if let Some(oid) = since {
        revwalk.hide(oid)?;
    }

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        let title = commit.summary().unwrap_or("(no message)").to_string();

        if cfg.skip_merge_commits && (commit.parent_count() > 1 || title.starts_with("Merge ")) {
            continue;
        }

        commits.push(CommitInfo {
            hash: oid.to_string(),
            title,
            author: commit.author().name().unwrap_or("Unknown").to_string(),
        });
    }

    debug!(count = commits.len(), since_tag = since.is_some(), "collected commits");
    Ok(commits)
}

/// Find the commit of the highest-versioned tag, optionally limited by a
/// tag name pattern
fn latest_tag(
    repo: &git2::Repository,
    pattern: Option<&str>,
) -> std::result::Result<Option<git2::Oid>, ChangelogError> {
    let regex = pattern
        .map(Regex::new)
        .transpose()
        .map_err(|e| ChangelogError::GenerationFailed(format!("invalid tag pattern: {}", e)))?;

    let names = repo.tag_names(None)?;
    let mut best: Option<(semver::Version, git2::Oid)> = None;

    for name in names.iter().flatten() {
        if let Some(re) = &regex {
            if !re.is_match(name) {
                continue;
            }
        }

        let version = match semver::Version::parse(name.trim_start_matches('v')) {
            Ok(version) => version,
            Err(_) => continue,
        };

        let reference = match repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(reference) => reference,
            Err(_) => continue,
        };
        let oid = reference.peel_to_commit()?.id();

        if best.as_ref().map(|(b, _)| version > *b).unwrap_or(true) {
            best = Some((version, oid));
        }
    }

    Ok(best.map(|(_, oid)| oid))
}

/// Render the commit sections and the contributor list
fn format_changelog(
    ctx: &Context,
    cfg: &ChangelogConfig,
    commits: &[CommitInfo],
) -> Result<(String, String)> {
    let props = ctx.props();

    let mut features: Vec<String> = Vec::new();
    let mut fixes: Vec<String> = Vec::new();
    let mut other: Vec<String> = Vec::new();
    let mut contributors: Vec<String> = Vec::new();

    for commit in commits {
        let mut commit_props = props.clone();
        commit_props.set("commitHash", &commit.hash);
        commit_props.set("commitShortHash", commit.short_hash());
        commit_props.set("commitTitle", &commit.title);
        commit_props.set("commitAuthor", &commit.author);

        let line = template::render_trimmed(&cfg.change_format, &commit_props)?;
        match commit.commit_type().as_deref() {
            Some("feat") => features.push(line),
            Some("fix") => fixes.push(line),
            _ => other.push(line),
        }

        if !contributors.contains(&commit.author) {
            contributors.push(commit.author.clone());
        }
    }

    let mut changes = String::from("## Changelog\n");
    for (heading, lines) in [
        ("### Features", &features),
        ("### Bug Fixes", &fixes),
        ("### Other", &other),
    ] {
        if lines.is_empty() {
            continue;
        }
        changes.push('\n');
        changes.push_str(heading);
        changes.push('\n');
        for line in lines {
            changes.push_str(line);
            changes.push('\n');
        }
    }

    let mut contributor_lines = Vec::new();
    for name in &contributors {
        let mut contributor_props = props.clone();
        contributor_props.set("contributorName", name);
        contributor_lines.push(template::render_trimmed(
            &cfg.contributor_format,
            &contributor_props,
        )?);
    }

    Ok((changes, contributor_lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testutil::{context, model_with_artifacts};
    use gantry_core::types::Command;
    use tempfile::TempDir;

    fn commit(title: &str, author: &str) -> CommitInfo {
        CommitInfo {
            hash: "0123456789abcdef0123456789abcdef01234567".to_string(),
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[test]
    fn test_disabled_changelog_skips() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.changelog.enabled = false;

        let mut ctx = context(model, temp.path(), Command::Changelog);
        assert_eq!(run(&mut ctx).unwrap(), StepOutcome::Skipped);
        assert!(ctx.changelog.resolved.is_none());
    }

    #[test]
    fn test_external_changelog_is_read_verbatim() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("NOTES.md"), "## 1.0.0\n- shipped\n").unwrap();

        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.changelog.external = Some("NOTES.md".into());

        let mut ctx = context(model, temp.path(), Command::Changelog);
        assert_eq!(run(&mut ctx).unwrap(), StepOutcome::Succeeded);
        assert_eq!(
            ctx.changelog.resolved.as_deref(),
            Some("## 1.0.0\n- shipped\n")
        );
    }

    #[test]
    fn test_missing_external_changelog_fails() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.changelog.external = Some("NOTES.md".into());

        let mut ctx = context(model, temp.path(), Command::Changelog);
        assert!(run(&mut ctx).is_err());
    }

    #[test]
    fn test_no_git_repository_yields_empty_changelog() {
        let temp = TempDir::new().unwrap();
        let model = model_with_artifacts(&["demo.tar.gz"]);

        let mut ctx = context(model, temp.path(), Command::Changelog);
        assert_eq!(run(&mut ctx).unwrap(), StepOutcome::Succeeded);
        assert_eq!(ctx.changelog.resolved.as_deref(), Some(""));
    }

    #[test]
    fn test_commit_type_classification() {
        assert_eq!(
            commit("feat(core): add thing", "a").commit_type().as_deref(),
            Some("feat")
        );
        assert_eq!(
            commit("fix!: breaking fix", "a").commit_type().as_deref(),
            Some("fix")
        );
        assert_eq!(commit("update readme", "a").commit_type(), None);
    }

    #[test]
    fn test_format_changelog_sections_and_contributors() {
        let temp = TempDir::new().unwrap();
        let model = model_with_artifacts(&["demo.tar.gz"]);
        let ctx = context(model, temp.path(), Command::Changelog);

        let commits = vec![
            commit("feat: add upload", "Alice"),
            commit("fix: handle empty set", "Bob"),
            commit("chore: bump deps", "Alice"),
        ];

        let (changes, contributors) =
            format_changelog(&ctx, &ctx.model.changelog, &commits).unwrap();

        assert!(changes.contains("### Features"));
        assert!(changes.contains("### Bug Fixes"));
        assert!(changes.contains("### Other"));
        assert!(changes.contains("feat: add upload"));
        assert!(changes.contains("0123456"));

        // Contributors are distinct, in first-seen order
        let lines: Vec<&str> = contributors.lines().collect();
        assert_eq!(lines, vec!["- Alice", "- Bob"]);
    }

    #[test]
    fn test_generated_changelog_from_real_repository() {
        let temp = TempDir::new().unwrap();
        let repo = git2::Repository::init(temp.path()).unwrap();

        let sig = git2::Signature::now("Tester", "tester@example.com").unwrap();
        let tree_id = {
            let mut index = repo.index().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "feat: first feature", &tree, &[])
            .unwrap();

        let model = model_with_artifacts(&["demo.tar.gz"]);
        let mut ctx = context(model, temp.path(), Command::Changelog);

        assert_eq!(run(&mut ctx).unwrap(), StepOutcome::Succeeded);
        let resolved = ctx.changelog.resolved.unwrap();
        assert!(resolved.contains("### Features"));
        assert!(resolved.contains("first feature"));
        assert!(resolved.contains("Tester"));
    }
}

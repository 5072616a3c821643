//! Directory-backed uploader and downloader
//!
//! Both treat a local directory as the remote side: the uploader copies
//! the release file set into a target directory, the downloader copies
//! configured assets into the run's download directory. Copies are
//! byte-compared first so re-runs leave unchanged files alone.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use gantry_core::error::{ConfigError, DownloadError, UploadError};
use gantry_core::files::copy_if_changed;
use gantry_core::model::{DownloaderConfig, UploaderConfig};
use gantry_core::{Context, Result};
use gantry_template as template;

use crate::traits::{Downloader, DownloaderFactory, Uploader, UploaderFactory};

fn resolve_path(ctx: &Context, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.base_dir.join(path)
    }
}

/// Uploader copying files into a directory
pub struct DirectoryUploader {
    config: UploaderConfig,
    target: String,
}

impl Uploader for DirectoryUploader {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "directory"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn upload(&self, ctx: &Context, files: &[PathBuf]) -> std::result::Result<bool, UploadError> {
        let target = template::resolve(&self.target, &ctx.props())?;
        let target_dir = resolve_path(ctx, &target);

        if ctx.dry_run {
            info!(
                uploader = %self.config.name,
                target = %target_dir.display(),
                files = files.len(),
                "dry run, skipping upload"
            );
            return Ok(false);
        }

        std::fs::create_dir_all(&target_dir)?;

        let mut transferred = false;
        for file in files {
            let file_name = file.file_name().ok_or_else(|| UploadError::Failed {
                target: target.clone(),
                reason: format!("{} has no file name", file.display()),
            })?;
            let dest = target_dir.join(file_name);

            if copy_if_changed(file, &dest)? {
                debug!(file = %file.display(), dest = %dest.display(), "uploaded");
                transferred = true;
            } else {
                debug!(file = %file.display(), "unchanged, not re-uploaded");
            }
        }

        Ok(transferred)
    }
}

/// Factory for [`DirectoryUploader`]
#[derive(Debug)]
pub struct DirectoryUploaderFactory;

impl UploaderFactory for DirectoryUploaderFactory {
    fn type_key(&self) -> &'static str {
        "directory"
    }

    fn build(&self, config: &UploaderConfig) -> Result<Box<dyn Uploader>> {
        let target = config.extra.get("path").cloned().ok_or_else(|| {
            ConfigError::MissingField(format!("upload.uploaders.{}.extra.path", config.name))
        })?;

        Ok(Box::new(DirectoryUploader {
            config: config.clone(),
            target,
        }))
    }
}

/// Downloader copying assets from local paths
pub struct DirectoryDownloader {
    config: DownloaderConfig,
}

impl Downloader for DirectoryDownloader {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "directory"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn download(&self, ctx: &Context) -> std::result::Result<(), DownloadError> {
        let props = ctx.props();
        let dest_dir = ctx.download_dir().join(&self.config.name);

        for asset in &self.config.assets {
            let input = template::resolve(&asset.input, &props)?;
            let source = resolve_path(ctx, &input);

            if !source.is_file() {
                return Err(DownloadError::Failed {
                    source_path: input,
                    reason: "file not found".to_string(),
                });
            }

            let file_name = match &asset.output {
                Some(output) => PathBuf::from(output),
                None => PathBuf::from(source.file_name().unwrap_or_default()),
            };
            let dest = dest_dir.join(file_name);

            if ctx.dry_run {
                info!(
                    downloader = %self.config.name,
                    source = %source.display(),
                    dest = %dest.display(),
                    "dry run, skipping download"
                );
                continue;
            }

            copy_if_changed(&source, &dest)?;
            debug!(source = %source.display(), dest = %dest.display(), "downloaded");
        }

        Ok(())
    }
}

/// Factory for [`DirectoryDownloader`]
pub struct DirectoryDownloaderFactory;

impl DownloaderFactory for DirectoryDownloaderFactory {
    fn type_key(&self) -> &'static str {
        "directory"
    }

    fn build(&self, config: &DownloaderConfig) -> Result<Box<dyn Downloader>> {
        Ok(Box::new(DirectoryDownloader {
            config: config.clone(),
        }))
    }
}

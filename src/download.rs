//! Fetch-and-unpack helper for installer hooks.
//!
//! `toolshelf unpack VERSION LOCATION` covers the common hook body: fetch a
//! tarball or zip, unpack it into `DEST/VERSION`, drop payload that is not
//! wanted and rewire a few files to system locations.

use crate::version::is_valid_version_name;
use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    pub dest: PathBuf,
    pub force: bool,
    pub prune: Vec<String>,
    /// `(relative path inside the version directory, link target)`
    pub links: Vec<(PathBuf, PathBuf)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackOutcome {
    Installed(PathBuf),
    AlreadyPresent(PathBuf),
}

pub fn parse_link_spec(spec: &str) -> Result<(PathBuf, PathBuf)> {
    let (rel, target) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid link '{}'. Use RELATIVE_PATH=TARGET", spec))?;
    let rel = PathBuf::from(rel);
    if rel.as_os_str().is_empty() || rel.is_absolute() || target.is_empty() {
        return Err(anyhow!("Invalid link '{}'. Use RELATIVE_PATH=TARGET", spec));
    }
    if rel.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err(anyhow!("Link path '{}' must stay inside the version directory", rel.display()));
    }
    Ok((rel, PathBuf::from(target)))
}

pub async fn unpack(version: &str, location: &str, options: &UnpackOptions) -> Result<UnpackOutcome> {
    if !is_valid_version_name(version) {
        return Err(anyhow!("Invalid version name '{}'", version));
    }

    let version_dir = options.dest.join(version);
    if version_dir.exists() && !options.force {
        tracing::info!("{} is already installed at {}", version, version_dir.display());
        return Ok(UnpackOutcome::AlreadyPresent(version_dir));
    }

    fs::create_dir_all(&options.dest)
        .with_context(|| format!("Could not create {}", options.dest.display()))?;

    let archive_name = archive_file_name(location);
    let download_dir = TempDir::new()?;
    let archive_path = download_dir.path().join(&archive_name);
    fetch(location, &archive_path).await?;

    // Staging lives next to the final directory so the move is a rename.
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}.", version))
        .tempdir_in(&options.dest)?;
    extract_archive(&archive_path, staging.path())?;

    let root = single_root(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf());
    prune(&root, &options.prune)?;
    for (rel, target) in &options.links {
        link_file(&root, rel, target)?;
    }

    if version_dir.exists() {
        tracing::info!("Replacing existing {}", version_dir.display());
        fs::remove_dir_all(&version_dir)?;
    }
    fs::rename(&root, &version_dir)
        .with_context(|| format!("Could not move unpacked tree to {}", version_dir.display()))?;

    tracing::info!("Unpacked {} into {}", archive_name, version_dir.display());
    Ok(UnpackOutcome::Installed(version_dir))
}

fn archive_file_name(location: &str) -> String {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("artifact")
        .to_string()
}

async fn fetch(location: &str, local_path: &Path) -> Result<()> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return download_file(location, local_path).await;
    }

    let source = location.strip_prefix("file://").unwrap_or(location);
    tracing::info!("Copying {}...", source);
    fs::copy(source, local_path).with_context(|| format!("Could not read artifact {}", source))?;
    Ok(())
}

pub async fn download_file(url: &str, local_path: &Path) -> Result<()> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tracing::info!("Downloading {}...", url);

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(anyhow!("Download of {} failed: {}", url, response.status()));
    }
    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    use futures_util::StreamExt;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;

    pb.finish_with_message("Download complete");
    Ok(())
}

pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let name = archive_path.to_string_lossy().to_lowercase();
    tracing::debug!("Extracting {} into {}", archive_path.display(), extract_dir.display());

    if name.ends_with(".zip") {
        extract_zip(archive_path, extract_dir)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let file = fs::File::open(archive_path)?;
        Archive::new(GzDecoder::new(file)).unpack(extract_dir)?;
        Ok(())
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        let file = fs::File::open(archive_path)?;
        Archive::new(xz2::read::XzDecoder::new(file)).unpack(extract_dir)?;
        Ok(())
    } else if name.ends_with(".tar") {
        Archive::new(fs::File::open(archive_path)?).unpack(extract_dir)?;
        Ok(())
    } else {
        Err(anyhow!("Unsupported archive format: {}", archive_path.display()))
    }
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping unsafe path in zip: {}", entry.name());
            continue;
        };
        let outpath = extract_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

/// The only entry of `dir` when that entry is a directory. Release tarballs
/// usually wrap everything in `name-version/`.
fn single_root(dir: &Path) -> Result<Option<PathBuf>> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    let [only] = entries.as_slice() else {
        return Ok(None);
    };
    if only.file_type()?.is_dir() {
        Ok(Some(only.path()))
    } else {
        Ok(None)
    }
}

fn prune(root: &Path, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }

    let doomed: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| names.iter().any(|n| e.file_name().to_string_lossy() == n.as_str()))
        .map(|e| e.into_path())
        .collect();

    for path in doomed {
        // An ancestor may already have been removed
        let Ok(meta) = fs::symlink_metadata(&path) else {
            continue;
        };
        tracing::debug!("Pruning {}", path.display());
        if meta.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn link_file(root: &Path, rel: &Path, target: &Path) -> Result<()> {
    let path = root.join(rel);
    if let Ok(meta) = fs::symlink_metadata(&path) {
        if meta.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target, &path)
        .with_context(|| format!("Could not link {} -> {}", path.display(), target.display()))?;
    #[cfg(not(unix))]
    return Err(anyhow!("Cannot link {}: symbolic links unsupported", path.display()));

    tracing::info!("Linked {} -> {}", rel.display(), target.display());
    Ok(())
}

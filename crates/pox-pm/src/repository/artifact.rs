//! Artifact repository - discovers packages from archive files in a directory.

use std::fs::File;
use std::io::{Read, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use sha1::{Sha1, Digest};
use tar::Archive as TarArchive;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::traits::{Repository, SearchMode, SearchResult, ProviderInfo};
use crate::package::{Package, Dist, Autoload, AutoloadPath};

/// Artifact repository - provides packages from archive files in a directory
///
/// This repository type scans a directory for archive files (zip, tar, tar.gz, tgz)
/// and extracts package information from their composer.json files.
///
/// ```json
/// {
///     "repositories": [
///         {
///             "type": "artifact",
///             "url": "path/to/directory/with/zips/"
///         }
///     ]
/// }
/// ```
#[derive(Debug)]
pub struct ArtifactRepository {
    /// Repository name
    name: String,
    /// Directory path to scan for archives
    path: PathBuf,
    /// Discovered packages
    packages: Vec<Arc<Package>>,
}

impl ArtifactRepository {
    /// Create a new artifact repository
    ///
    /// # Arguments
    /// * `path` - Path to directory containing archive files
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("artifact ({})", path.display());

        let mut repo = Self {
            name,
            path,
            packages: Vec::new(),
        };

        repo.scan_directory();
        repo
    }

    /// Scan the directory for archive files and extract package information
    fn scan_directory(&mut self) {
        if !self.path.exists() || !self.path.is_dir() {
            return;
        }

        for entry in WalkDir::new(&self.path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            // Check for supported archive extensions
            let ext = path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());

            let archive_type = match ext.as_deref() {
                Some("zip") => ArchiveType::Zip,
                Some("tar") => ArchiveType::Tar,
                Some("gz") => {
                    // Check if it's .tar.gz
                    let stem = path.file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("");
                    if stem.ends_with(".tar") {
                        ArchiveType::TarGz
                    } else {
                        continue; // Skip plain .gz files
                    }
                }
                Some("tgz") => ArchiveType::TarGz,
                _ => continue,
            };

            if let Some(package) = self.load_package_from_archive(path, archive_type) {
                self.packages.push(Arc::new(package));
            }
        }
    }

    /// Load package information from an archive file
    fn load_package_from_archive(&self, path: &Path, archive_type: ArchiveType) -> Option<Package> {
        let composer_json = match archive_type {
            ArchiveType::Zip => extract_composer_json_from_zip(path),
            ArchiveType::Tar | ArchiveType::TarGz => extract_composer_json_from_tar(path, archive_type == ArchiveType::TarGz),
        };

        let json: serde_json::Value = match composer_json {
            Some(content) => serde_json::from_str(&content).ok()?,
            None => return None,
        };

        // Required fields
        let name = json.get("name")?.as_str()?;
        let version = json.get("version")?.as_str()?;

        let mut pkg = Package::new(name, version);

        let shasum = calculate_sha1(path).ok();

        let dist_type = match archive_type {
            ArchiveType::Zip => "zip",
            ArchiveType::Tar => "tar",
            ArchiveType::TarGz => "tar",
        };

        let mut dist = Dist::new(dist_type, path.to_string_lossy().as_ref());
        if let Some(sha) = shasum {
            dist = dist.with_shasum(&sha);
        }
        pkg.dist = Some(dist);

        if let Some(desc) = json.get("description").and_then(|v| v.as_str()) {
            pkg.description = Some(desc.to_string());
        }

        if let Some(t) = json.get("type").and_then(|v| v.as_str()) {
            pkg.package_type = t.to_string();
        }

        if let Some(license) = json.get("license") {
            pkg.license = parse_license(license);
        }

        if let Some(require) = json.get("require").and_then(|v| v.as_object()) {
            pkg.require = require
                .iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or("*").to_string()))
                .collect();
        }

        if let Some(require_dev) = json.get("require-dev").and_then(|v| v.as_object()) {
            pkg.require_dev = require_dev
                .iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or("*").to_string()))
                .collect();
        }

        if let Some(autoload) = json.get("autoload") {
            pkg.autoload = Some(parse_autoload(autoload));
        }

        if let Some(autoload_dev) = json.get("autoload-dev") {
            pkg.autoload_dev = Some(parse_autoload(autoload_dev));
        }

        if let Some(bin) = json.get("bin").and_then(|v| v.as_array()) {
            pkg.bin = bin
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
        }

        // Replace self.version constraints with actual version
        pkg.replace_self_version();

        Some(pkg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveType {
    Zip,
    Tar,
    TarGz,
}

/// Extract composer.json content from a ZIP archive
fn extract_composer_json_from_zip(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut archive = ZipArchive::new(BufReader::new(file)).ok()?;

    // First, try to find composer.json at the root
    if let Ok(mut file) = archive.by_name("composer.json") {
        let mut content = String::new();
        file.read_to_string(&mut content).ok()?;
        return Some(content);
    }

    // If not at root, find the top-level directory and look there
    let mut top_dirs: std::collections::HashSet<String> = std::collections::HashSet::new();

    for i in 0..archive.len() {
        if let Ok(file) = archive.by_index(i) {
            let name = file.name();
            // Skip __MACOSX and other hidden directories
            if name.starts_with("__MACOSX") || name.starts_with('.') {
                continue;
            }

            // Get the first path component
            if let Some(first_component) = name.split('/').next() {
                if !first_component.is_empty() && name.contains('/') {
                    top_dirs.insert(first_component.to_string());
                }
            }
        }
    }

    // If there's exactly one top-level directory, look for composer.json there
    if top_dirs.len() == 1 {
        let top_dir = top_dirs.into_iter().next()?;
        let composer_path = format!("{}/composer.json", top_dir);

        if let Ok(mut file) = archive.by_name(&composer_path) {
            let mut content = String::new();
            file.read_to_string(&mut content).ok()?;
            return Some(content);
        }
    }

    None
}

/// Extract composer.json content from a TAR archive (optionally gzipped)
fn extract_composer_json_from_tar(path: &Path, gzipped: bool) -> Option<String> {
    let file = File::open(path).ok()?;

    if gzipped {
        let decoder = GzDecoder::new(BufReader::new(file));
        extract_composer_json_from_tar_reader(decoder)
    } else {
        extract_composer_json_from_tar_reader(BufReader::new(file))
    }
}

fn extract_composer_json_from_tar_reader<R: Read>(reader: R) -> Option<String> {
    let mut archive = TarArchive::new(reader);

    // Collect all entries to find composer.json
    let mut entries_info: Vec<(String, Vec<u8>)> = Vec::new();
    let mut top_dirs: std::collections::HashSet<String> = std::collections::HashSet::new();

    for entry in archive.entries().ok()? {
        let mut entry = entry.ok()?;
        let path = entry.path().ok()?.to_string_lossy().to_string();

        // Skip hidden files
        if path.starts_with('.') || path.contains("/.") {
            continue;
        }

        // Track top-level directories
        if let Some(first_component) = path.split('/').next() {
            if !first_component.is_empty() && path.contains('/') {
                top_dirs.insert(first_component.to_string());
            }
        }

        // Check if this is composer.json at root
        if path == "composer.json" {
            let mut content = String::new();
            entry.read_to_string(&mut content).ok()?;
            return Some(content);
        }

        // Store entry data for later if it might be composer.json in a subdirectory
        if path.ends_with("/composer.json") || path.ends_with("composer.json") {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).ok()?;
            entries_info.push((path, data));
        }
    }

    // If there's exactly one top-level directory, look for composer.json there
    if top_dirs.len() == 1 {
        let top_dir = top_dirs.into_iter().next()?;
        let composer_path = format!("{}/composer.json", top_dir);

        for (path, data) in entries_info {
            if path == composer_path {
                return String::from_utf8(data).ok();
            }
        }
    }

    None
}

/// Calculate SHA1 hash of a file
fn calculate_sha1(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Parse license from JSON value
fn parse_license(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse autoload from JSON value
fn parse_autoload(value: &serde_json::Value) -> Autoload {
    let mut autoload = Autoload::default();

    if let Some(psr4) = value.get("psr-4").and_then(|v| v.as_object()) {
        for (namespace, paths) in psr4 {
            let path = json_to_autoload_path(paths);
            autoload.psr4.insert(namespace.clone(), path);
        }
    }

    if let Some(psr0) = value.get("psr-0").and_then(|v| v.as_object()) {
        for (namespace, paths) in psr0 {
            let path = json_to_autoload_path(paths);
            autoload.psr0.insert(namespace.clone(), path);
        }
    }

    if let Some(classmap) = value.get("classmap").and_then(|v| v.as_array()) {
        autoload.classmap = classmap
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
    }

    if let Some(files) = value.get("files").and_then(|v| v.as_array()) {
        autoload.files = files
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
    }

    autoload
}

/// Convert JSON value to AutoloadPath
fn json_to_autoload_path(value: &serde_json::Value) -> AutoloadPath {
    match value {
        serde_json::Value::String(s) => AutoloadPath::Single(s.clone()),
        serde_json::Value::Array(arr) => {
            let paths: Vec<String> = arr
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            if paths.len() == 1 {
                AutoloadPath::Single(paths[0].clone())
            } else {
                AutoloadPath::Multiple(paths)
            }
        }
        _ => AutoloadPath::Single(String::new()),
    }
}

#[async_trait]
impl Repository for ArtifactRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn has_package(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    async fn find_packages(&self, name: &str) -> Vec<Arc<Package>> {
        self.packages
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }

    async fn find_package(&self, name: &str, version: &str) -> Option<Arc<Package>> {
        self.packages
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) && p.version == version)
            .cloned()
    }

    async fn find_packages_with_constraint(
        &self,
        name: &str,
        _constraint: &str,
    ) -> Vec<Arc<Package>> {
        // Return all versions, let the solver filter
        self.find_packages(name).await
    }

    async fn get_packages(&self) -> Vec<Arc<Package>> {
        self.packages.clone()
    }

    async fn search(&self, query: &str, _mode: SearchMode) -> Vec<SearchResult> {
        self.packages
            .iter()
            .filter(|p| {
                p.name.contains(query) ||
                p.description.as_ref().map(|d| d.contains(query)).unwrap_or(false)
            })
            .map(|p| SearchResult {
                name: p.name.clone(),
                description: p.description.clone(),
                url: None,
                abandoned: None,
            })
            .collect()
    }

    async fn get_providers(&self, _package_name: &str) -> Vec<ProviderInfo> {
        Vec::new()
    }
}

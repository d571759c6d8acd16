//! Project acquisition: the static project index, the download cache and
//! archive extraction.
//!
//! A *project* is a named, versioned, downloadable distribution that becomes
//! one or more lexicons once ingested. Downloads are streamed to a temporary
//! file and only renamed into the cache on success, so a timeout or
//! cancellation never leaves a partial file at the final path.

use crate::config::Config;
use crate::error::{Result, WnError};
use crate::progress::{self, ProgressReporter, ProgressUpdate};
use flate2::read::GzDecoder;
use futures::StreamExt;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use xz2::read::XzDecoder;

/// One downloadable distribution in the project index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub id: String,
    pub version: String,
    pub label: String,
    pub url: String,
    pub license: String,
}

/// A `project:version` specifier. The version may be omitted to select the
/// newest indexed release of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub project: String,
    pub version: Option<String>,
}

impl ProjectSpec {
    pub fn parse(spec: &str) -> Result<ProjectSpec> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(WnError::InvalidProjectSpec(spec.to_string()));
        }
        match spec.split_once(':') {
            Some((project, version)) if !project.is_empty() && !version.is_empty() => {
                Ok(ProjectSpec {
                    project: project.to_string(),
                    version: Some(version.to_string()),
                })
            }
            Some(_) => Err(WnError::InvalidProjectSpec(spec.to_string())),
            None => Ok(ProjectSpec {
                project: spec.to_string(),
                version: None,
            }),
        }
    }
}

impl std::fmt::Display for ProjectSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.project, v),
            None => write!(f, "{}", self.project),
        }
    }
}

// Built-in index entries, newest release of a project first.
const PROJECT_INDEX: &[(&str, &str, &str, &str, &str)] = &[
    (
        "oewn",
        "2024",
        "Open English WordNet",
        "https://github.com/globalwordnet/english-wordnet/releases/download/2024-edition/english-wordnet-2024.xml.gz",
        "https://creativecommons.org/licenses/by/4.0/",
    ),
    (
        "oewn",
        "2023",
        "Open English WordNet",
        "https://github.com/globalwordnet/english-wordnet/releases/download/2023-edition/english-wordnet-2023.xml.gz",
        "https://creativecommons.org/licenses/by/4.0/",
    ),
    (
        "omw",
        "1.4",
        "Open Multilingual Wordnet",
        "https://github.com/omwn/omw-data/releases/download/v1.4/omw-1.4.tar.xz",
        "Please consult the LICENSE files included with the individual wordnets",
    ),
    (
        "odenet",
        "1.4",
        "Open German WordNet",
        "https://github.com/hdaSprachtechnologie/odenet/releases/download/v1.4/odenet-1.4.tar.xz",
        "https://creativecommons.org/licenses/by-sa/4.0/",
    ),
];

/// Resolves a specifier against the session's extra projects, then the
/// built-in index. Unknown projects are a non-retryable error.
pub fn resolve_project(spec: &ProjectSpec, config: &Config) -> Result<ProjectInfo> {
    let builtin = PROJECT_INDEX
        .iter()
        .map(|(id, version, label, url, license)| ProjectInfo {
            id: (*id).to_string(),
            version: (*version).to_string(),
            label: (*label).to_string(),
            url: (*url).to_string(),
            license: (*license).to_string(),
        });
    config
        .extra_projects
        .iter()
        .cloned()
        .chain(builtin)
        .find(|info| {
            info.id == spec.project
                && spec
                    .version
                    .as_ref()
                    .map(|v| *v == info.version)
                    .unwrap_or(true)
        })
        .ok_or_else(|| WnError::UnknownProject(spec.to_string()))
}

/// Cache file for a resolved project, keyed by id and version.
fn cache_path(info: &ProjectInfo, config: &Config) -> Result<PathBuf> {
    let remote_name = info
        .url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| WnError::Config(format!("project url has no file name: {}", info.url)))?;
    Ok(config
        .download_dir()?
        .join(format!("{}-{}-{}", info.id, info.version, remote_name)))
}

/// Downloads a project archive into the cache, streaming with progress
/// reporting. Returns the cached path without touching the network when the
/// file is already present, unless `force` is set.
pub async fn download(
    spec: &ProjectSpec,
    config: &Config,
    force: bool,
    reporter: ProgressReporter,
) -> Result<PathBuf> {
    let info = resolve_project(spec, config)?;
    let dest_path = cache_path(&info, config)?;

    if dest_path.exists() && !force {
        info!("Using cached archive for {}: {:?}", spec, dest_path);
        return Ok(dest_path);
    }

    let stage_desc = format!("Downloading {}", spec);
    info!("Downloading {} from {} (streaming)...", spec, info.url);

    let client = reqwest::Client::builder()
        .timeout(config.download_timeout)
        .build()?;
    let response = client.get(&info.url).send().await?.error_for_status()?;
    let total_size = response.content_length();

    progress::report(
        &reporter,
        ProgressUpdate::new_stage(stage_desc.clone(), total_size),
    );

    // Stream into a temp file beside the cache; rename only on success.
    let download_dir = config.download_dir()?;
    let temp_file = NamedTempFile::new_in(&download_dir)?;
    let mut dest_file = BufWriter::new(temp_file);
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        dest_file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;

        let keep_going = progress::report(
            &reporter,
            ProgressUpdate {
                stage_description: stage_desc.clone(),
                current_item: downloaded,
                total_items: total_size,
                message: None,
            },
        );
        if !keep_going {
            // Temp file is dropped and removed; the cache stays clean.
            return Err(WnError::Cancelled);
        }
    }

    dest_file.flush()?;
    let temp_file = dest_file
        .into_inner()
        .map_err(|e| WnError::Internal(format!("flush failed: {e}")))?;
    temp_file.persist(&dest_path).map_err(|e| WnError::Io(e.error))?;

    progress::report(
        &reporter,
        ProgressUpdate {
            stage_description: stage_desc,
            current_item: downloaded,
            total_items: total_size,
            message: Some("Download complete.".to_string()),
        },
    );

    info!("Download complete: {:?}", dest_path);
    Ok(dest_path)
}

/// Supported archive shapes for a downloaded project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    TarXz,
    TarGz,
    Gz,
    PlainXml,
}

fn classify(path: &Path) -> Result<ArchiveKind> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.ends_with(".tar.xz") {
        Ok(ArchiveKind::TarXz)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Ok(ArchiveKind::TarGz)
    } else if name.ends_with(".gz") {
        Ok(ArchiveKind::Gz)
    } else if name.ends_with(".xml") {
        Ok(ArchiveKind::PlainXml)
    } else {
        Err(WnError::Archive {
            path: path.to_path_buf(),
            message: "unsupported archive format".to_string(),
        })
    }
}

/// Decompresses an archive into a fresh directory under `scratch` and
/// locates the LMF payload, which may sit in a nested directory. Returns the
/// path of the payload XML file.
pub fn extract_archive(archive: &Path, scratch: &Path) -> Result<PathBuf> {
    let kind = classify(archive)?;
    debug!("Extracting {:?} as {:?}", archive, kind);

    let unpack_dir = tempfile::Builder::new()
        .prefix("extract-")
        .tempdir_in(scratch)?
        .keep();

    match kind {
        ArchiveKind::PlainXml => return Ok(archive.to_path_buf()),
        ArchiveKind::TarXz => {
            let file = File::open(archive)?;
            let mut tar = tar::Archive::new(XzDecoder::new(BufReader::new(file)));
            tar.unpack(&unpack_dir).map_err(|e| WnError::Archive {
                path: archive.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        ArchiveKind::TarGz => {
            let file = File::open(archive)?;
            let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
            tar.unpack(&unpack_dir).map_err(|e| WnError::Archive {
                path: archive.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        ArchiveKind::Gz => {
            let stem = archive
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "payload.xml".to_string());
            let dest = unpack_dir.join(stem);
            let file = File::open(archive)?;
            let mut decoder = GzDecoder::new(BufReader::new(file));
            let mut dest_file = BufWriter::new(File::create(&dest)?);
            io::copy(&mut decoder, &mut dest_file).map_err(|e| WnError::Archive {
                path: archive.to_path_buf(),
                message: e.to_string(),
            })?;
            dest_file.flush()?;
        }
    }

    locate_payload(&unpack_dir)
}

/// Recursive scan for the payload; with several candidates the largest wins
/// (index or checksum files are tiny by comparison).
fn locate_payload(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("xml"))
                    .unwrap_or(false)
        })
        .max_by_key(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .map(|e| e.into_path())
        .ok_or_else(|| WnError::NoLmfPayload(root.to_path_buf()))
}

/// Downloads (or reuses) and extracts a project, returning the LMF payload
/// path. Extraction runs off the async runtime.
pub async fn fetch_project(
    spec: &ProjectSpec,
    config: &Config,
    force: bool,
    reporter: ProgressReporter,
) -> Result<PathBuf> {
    let archive = download(spec, config, force, reporter.clone()).await?;
    let scratch = config.scratch_dir()?;

    progress::report(
        &reporter,
        ProgressUpdate::new_stage(format!("Extracting {}", spec), None),
    );

    let xml_path =
        tokio::task::spawn_blocking(move || extract_archive(&archive, &scratch)).await??;
    info!("LMF payload for {}: {:?}", spec, xml_path);
    Ok(xml_path)
}

/// Retains the ingested payload under the sources directory so export tooling
/// can reach the original document later.
pub fn retain_source(xml_path: &Path, lexicon_id: &str, config: &Config) -> Result<PathBuf> {
    let dir = config.sources_dir()?.join(lexicon_id);
    fs::create_dir_all(&dir)?;
    let file_name = xml_path
        .file_name()
        .ok_or_else(|| WnError::Internal(format!("payload has no file name: {xml_path:?}")))?;
    let dest = dir.join(file_name);
    if xml_path != dest {
        fs::copy(xml_path, &dest)?;
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    fn test_config(dir: &Path) -> Config {
        Config {
            data_dir: Some(dir.to_path_buf()),
            ..Config::default()
        }
    }

    // Helper to create a dummy gz file for testing decompression
    fn create_dummy_gz(path: &Path, content: &str) -> io::Result<()> {
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(content.as_bytes())?;
        encoder.finish()?;
        Ok(())
    }

    #[test]
    fn spec_parsing() {
        let spec = ProjectSpec::parse("oewn:2024").unwrap();
        assert_eq!(spec.project, "oewn");
        assert_eq!(spec.version.as_deref(), Some("2024"));

        let bare = ProjectSpec::parse("oewn").unwrap();
        assert_eq!(bare.version, None);

        assert!(ProjectSpec::parse("").is_err());
        assert!(ProjectSpec::parse("oewn:").is_err());
        assert!(ProjectSpec::parse(":2024").is_err());
    }

    #[test]
    fn resolve_known_and_unknown() {
        let tmp = tempdir().unwrap();
        let config = test_config(tmp.path());

        let info = resolve_project(&ProjectSpec::parse("oewn:2024").unwrap(), &config).unwrap();
        assert!(info.url.ends_with("english-wordnet-2024.xml.gz"));

        // Bare project name resolves to the newest release.
        let latest = resolve_project(&ProjectSpec::parse("oewn").unwrap(), &config).unwrap();
        assert_eq!(latest.version, "2024");

        let err =
            resolve_project(&ProjectSpec::parse("nosuch:1.0").unwrap(), &config).unwrap_err();
        assert!(matches!(err, WnError::UnknownProject(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn extra_projects_take_precedence() {
        let tmp = tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.extra_projects.push(ProjectInfo {
            id: "local".to_string(),
            version: "0.1".to_string(),
            label: "Local Test Wordnet".to_string(),
            url: "https://example.com/local-0.1.tar.gz".to_string(),
            license: "CC0".to_string(),
        });
        let info = resolve_project(&ProjectSpec::parse("local").unwrap(), &config).unwrap();
        assert_eq!(info.version, "0.1");
    }

    #[test]
    fn extract_plain_gz() {
        let tmp = tempdir().unwrap();
        let config = test_config(tmp.path());
        let gz_path = tmp.path().join("wordnet.xml.gz");
        create_dummy_gz(&gz_path, "<LexicalResource/>").unwrap();

        let xml = extract_archive(&gz_path, &config.scratch_dir().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(xml).unwrap(), "<LexicalResource/>");
    }

    #[test]
    fn extract_nested_tar_gz() {
        let tmp = tempdir().unwrap();
        let config = test_config(tmp.path());
        let tar_path = tmp.path().join("bundle.tar.gz");

        // Build a tarball with the payload nested two directories deep,
        // beside a small decoy xml.
        let file = File::create(&tar_path).unwrap();
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let payload = b"<LexicalResource><Lexicon id=\"x\" label=\"X\" language=\"en\" email=\"e\" license=\"c\" version=\"1\"/></LexicalResource>";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "bundle/deep/wordnet.xml", payload.as_slice())
            .unwrap();
        let decoy = b"<x/>";
        let mut header = tar::Header::new_gnu();
        header.set_size(decoy.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "bundle/index.xml", decoy.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let xml = extract_archive(&tar_path, &config.scratch_dir().unwrap()).unwrap();
        assert!(xml.ends_with("bundle/deep/wordnet.xml"));
        let content = fs::read_to_string(xml).unwrap();
        assert!(content.contains("LexicalResource"));
    }

    #[test]
    fn missing_payload_is_reported() {
        let tmp = tempdir().unwrap();
        let config = test_config(tmp.path());
        let tar_path = tmp.path().join("empty.tar.gz");

        let file = File::create(&tar_path).unwrap();
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let readme = b"no xml here";
        let mut header = tar::Header::new_gnu();
        header.set_size(readme.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "README.txt", readme.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = extract_archive(&tar_path, &config.scratch_dir().unwrap()).unwrap_err();
        assert!(matches!(err, WnError::NoLmfPayload(_)));
    }

    #[test]
    fn unsupported_archive_format() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.zip");
        fs::write(&path, b"PK").unwrap();
        let err = extract_archive(&path, tmp.path()).unwrap_err();
        assert!(matches!(err, WnError::Archive { .. }));
    }

    #[test]
    fn retain_source_copies_payload() {
        let tmp = tempdir().unwrap();
        let config = test_config(tmp.path());
        let xml = tmp.path().join("wordnet.xml");
        fs::write(&xml, "<LexicalResource/>").unwrap();

        let kept = retain_source(&xml, "test-en", &config).unwrap();
        assert!(kept.exists());
        assert!(kept.to_string_lossy().contains("sources"));
        assert_eq!(fs::read_to_string(kept).unwrap(), "<LexicalResource/>");
    }
}

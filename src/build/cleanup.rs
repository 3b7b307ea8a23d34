//! Removal of chunk directories made redundant by re-bundling the server entry

use std::io;
use std::path::{Component, Path, PathBuf};

use super::setup::OutputOptions;
use crate::error::{AdapterError, Result};
use crate::logger;

/// Chunk template the build tool uses when an output leaves it unset
pub const DEFAULT_CHUNK_FILE_NAMES: &str = "chunks/chunk.[hash].mjs";

/// Directory holding the chunks of `output`, resolved under `server_root`.
///
/// `None` when the template has no directory part (that would be the server
/// root itself) or when its directory is not a plain relative path.
pub fn chunk_dir_for(output: &OutputOptions, server_root: &Path) -> Option<PathBuf> {
    let template = output.chunk_template().unwrap_or(DEFAULT_CHUNK_FILE_NAMES);
    let dir = Path::new(template).parent()?;

    let mut relative = PathBuf::new();
    for component in dir.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(server_root.join(relative))
}

/// Recursively delete `dir`. Returns `Ok(false)` if it did not exist.
pub async fn remove_chunk_dir(dir: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(AdapterError::Cleanup {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Delete the chunk directory of every output. Failures are logged, never returned.
pub async fn cleanup_orphaned_chunks(outputs: &[OutputOptions], server_root: &Path) {
    for output in outputs {
        let Some(dir) = chunk_dir_for(output, server_root) else {
            logger::log_warning(&format!(
                "Skipping chunk cleanup for template {:?}: no chunk directory under {}",
                output.chunk_template().unwrap_or(DEFAULT_CHUNK_FILE_NAMES),
                server_root.display()
            ));
            continue;
        };

        match remove_chunk_dir(&dir).await {
            Ok(true) => logger::log_build_step(&format!("Removed chunks in {}", dir.display())),
            Ok(false) => {}
            Err(e) => logger::log_warning(&e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let dir = chunk_dir_for(&OutputOptions::default(), Path::new("/dist/server"));
        assert_eq!(dir, Some(PathBuf::from("/dist/server/chunks")));
    }

    #[test]
    fn test_custom_and_rejected_templates() {
        let root = Path::new("/dist/server");
        let nested = OutputOptions::with_chunk_file_names("./assets/js/[name]-[hash].mjs");
        assert_eq!(
            chunk_dir_for(&nested, root),
            Some(PathBuf::from("/dist/server/assets/js"))
        );

        for template in ["chunk.[hash].mjs", "./chunk.mjs", "../chunks/x.mjs", "/tmp/x.mjs"] {
            let output = OutputOptions::with_chunk_file_names(template);
            assert_eq!(chunk_dir_for(&output, root), None, "{template}");
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_fine() {
        let root = tempfile::tempdir().unwrap();
        cleanup_orphaned_chunks(&[OutputOptions::default()], root.path()).await;
        assert!(!remove_chunk_dir(&root.path().join("chunks")).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_directory_removed_recursively() {
        let root = tempfile::tempdir().unwrap();
        let chunks = root.path().join("chunks/nested");
        std::fs::create_dir_all(&chunks).unwrap();
        std::fs::write(chunks.join("chunk.abc.mjs"), "export {}").unwrap();
        std::fs::write(root.path().join("entry.mjs"), "bundled").unwrap();

        cleanup_orphaned_chunks(&[OutputOptions::default()], root.path()).await;

        assert!(!root.path().join("chunks").exists());
        assert!(root.path().join("entry.mjs").exists());
    }

    #[tokio::test]
    async fn test_no_directory_template_keeps_server_root() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("entry.mjs"), "bundled").unwrap();

        let outputs = [OutputOptions::with_chunk_file_names("chunk.[hash].mjs")];
        cleanup_orphaned_chunks(&outputs, root.path()).await;

        assert!(root.path().join("entry.mjs").exists());
    }

    #[tokio::test]
    async fn test_each_output_cleaned_independently() {
        let root = tempfile::tempdir().unwrap();
        let js = root.path().join("assets/js");
        std::fs::create_dir_all(&js).unwrap();
        std::fs::write(js.join("page.abc.mjs"), "export {}").unwrap();
        std::fs::create_dir_all(root.path().join("chunks")).unwrap();
        std::fs::write(root.path().join("entry.mjs"), "bundled").unwrap();

        let outputs = [
            OutputOptions::with_chunk_file_names("chunk.[hash].mjs"),
            OutputOptions::with_chunk_file_names("assets/js/[name].[hash].mjs"),
        ];
        cleanup_orphaned_chunks(&outputs, root.path()).await;

        assert!(!js.exists());
        assert!(root.path().join("assets").exists());
        assert!(root.path().join("entry.mjs").exists());
        // only the configured outputs are touched
        assert!(root.path().join("chunks").exists());
    }

    #[tokio::test]
    async fn test_removal_failure_is_cleanup_error() {
        let root = tempfile::tempdir().unwrap();
        let not_a_dir = root.path().join("chunks");
        std::fs::write(&not_a_dir, "file").unwrap();

        match remove_chunk_dir(&not_a_dir).await {
            Err(AdapterError::Cleanup { path, .. }) => assert_eq!(path, not_a_dir),
            other => panic!("expected cleanup error, got {other:?}"),
        }

        // swallowed at the orchestration level
        cleanup_orphaned_chunks(&[OutputOptions::default()], root.path()).await;
        assert!(not_a_dir.exists());
    }
}

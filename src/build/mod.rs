// Build orchestrator module
// Hooks the host build calls in order: config_done, build_setup, build_done

pub mod bundler;
pub mod cleanup;
pub mod descriptor;
pub mod setup;

use std::path::PathBuf;

pub use bundler::{Bundler, BundlerOptions, CommandBundler};
pub use cleanup::cleanup_orphaned_chunks;
pub use descriptor::AdapterDescriptor;
pub use setup::{OutputOptions, ToolConfig};

use crate::config::{BuildConfig, Options};
use crate::error::{AdapterError, Result};
use crate::logger;

/// Which half of the site a build pass produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Client,
    Server,
}

/// Build-side state shared between the hooks of one build
pub struct Integration<B: Bundler> {
    options: Options,
    bundler: B,
    build_config: Option<BuildConfig>,
    outputs: Vec<OutputOptions>,
}

impl<B: Bundler> Integration<B> {
    pub fn new(options: Options, bundler: B) -> Self {
        Self {
            options,
            bundler,
            build_config: None,
            outputs: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(self.options.clone())
    }

    /// Configuration resolved: remember where the build writes its output
    pub fn config_done(&mut self, build_config: BuildConfig) -> AdapterDescriptor {
        self.build_config = Some(build_config);
        self.descriptor()
    }

    /// Adjust the build-tool configuration before a pass. Only the server pass is touched.
    pub fn build_setup(&mut self, target: BuildTarget, tool_config: &mut ToolConfig) {
        if target != BuildTarget::Server {
            return;
        }
        setup::apply_server_setup(tool_config);
        self.outputs.clone_from(&tool_config.build.chunking.output);
    }

    fn build_config(&self) -> Result<&BuildConfig> {
        self.build_config.as_ref().ok_or_else(|| {
            AdapterError::Configuration(
                "build configuration was never resolved; config_done must run first".to_string(),
            )
        })
    }

    /// Absolute path of the server entry module produced by the build
    pub fn resolve_entry_path(&self) -> Result<PathBuf> {
        let build_config = self.build_config()?;
        Ok(build_config.server_root.join(&build_config.server_entry))
    }

    /// Re-bundle the server entry in place, then drop the now unused chunks.
    pub async fn build_done(&self) -> Result<()> {
        let build_config = self.build_config()?;
        let entry = build_config.server_root.join(&build_config.server_entry);
        let options = BundlerOptions::for_entry(&entry, &self.options.bundler_overrides);

        logger::log_build_step(&format!("Bundling {}", entry.display()));
        self.bundler.bundle(&options).await?;

        cleanup_orphaned_chunks(&self.outputs, &build_config.server_root).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBundler {
        calls: Mutex<Vec<BundlerOptions>>,
        fail_with: Option<&'static str>,
    }

    #[async_trait]
    impl Bundler for RecordingBundler {
        async fn bundle(&self, options: &BundlerOptions) -> Result<()> {
            self.calls.lock().unwrap().push(options.clone());
            match self.fail_with {
                Some(msg) => Err(AdapterError::Build(msg.to_string())),
                None => Ok(()),
            }
        }
    }

    fn build_config(root: &Path) -> BuildConfig {
        BuildConfig {
            server_entry: PathBuf::from("entry.mjs"),
            server_root: root.join("server"),
            client_root: root.join("client"),
        }
    }

    #[tokio::test]
    async fn test_build_done_before_config_done() {
        let integration = Integration::new(Options::default(), RecordingBundler::default());
        assert!(matches!(
            integration.build_done().await,
            Err(AdapterError::Configuration(_))
        ));
        assert!(integration.bundler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_entry_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut integration = Integration::new(Options::default(), RecordingBundler::default());
        assert!(matches!(
            integration.resolve_entry_path(),
            Err(AdapterError::Configuration(_))
        ));

        integration.config_done(build_config(dir.path()));
        assert_eq!(
            integration.resolve_entry_path().unwrap(),
            dir.path().join("server/entry.mjs")
        );
    }

    #[tokio::test]
    async fn test_full_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_config(dir.path());
        std::fs::create_dir_all(config.server_root.join("chunks")).unwrap();
        std::fs::write(config.server_root.join("chunks/chunk.1.mjs"), "").unwrap();

        let mut options = Options::default();
        options.bundler_overrides = json!({"external": ["sharp"]})
            .as_object()
            .cloned()
            .unwrap();
        let mut integration = Integration::new(options, RecordingBundler::default());

        let descriptor = integration.config_done(config.clone());
        assert_eq!(descriptor.name, "ssr-adapter");

        let mut tool_config: ToolConfig =
            serde_json::from_value(json!({"build": {"rollupOptions": {"output": {}}}})).unwrap();
        integration.build_setup(BuildTarget::Server, &mut tool_config);
        integration.build_done().await.unwrap();

        let calls = integration.bundler.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let entry = config.server_root.join("entry.mjs");
        assert_eq!(calls[0].get("outfile"), Some(&json!(entry.to_string_lossy())));
        assert_eq!(
            calls[0].get("external"),
            Some(&json!(["@astrojs/markdown-remark", "sharp"]))
        );
        assert!(!config.server_root.join("chunks").exists());
    }

    #[tokio::test]
    async fn test_client_setup_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_config(dir.path());
        std::fs::create_dir_all(config.server_root.join("chunks")).unwrap();

        let mut integration = Integration::new(Options::default(), RecordingBundler::default());
        integration.config_done(config.clone());

        let mut tool_config: ToolConfig =
            serde_json::from_value(json!({"build": {"rollupOptions": {"output": {}}}})).unwrap();
        let before = tool_config.clone();
        integration.build_setup(BuildTarget::Client, &mut tool_config);
        assert_eq!(tool_config, before);

        // no outputs captured, so nothing is cleaned
        integration.build_done().await.unwrap();
        assert!(config.server_root.join("chunks").exists());
    }

    #[tokio::test]
    async fn test_bundler_failure_skips_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_config(dir.path());
        std::fs::create_dir_all(config.server_root.join("chunks")).unwrap();

        let bundler = RecordingBundler {
            fail_with: Some("ERROR: Could not resolve \"missing\""),
            ..RecordingBundler::default()
        };
        let mut integration = Integration::new(Options::default(), bundler);
        integration.config_done(config.clone());
        let mut tool_config: ToolConfig =
            serde_json::from_value(json!({"build": {"rollupOptions": {"output": {}}}})).unwrap();
        integration.build_setup(BuildTarget::Server, &mut tool_config);

        match integration.build_done().await {
            Err(AdapterError::Build(msg)) => assert_eq!(msg, "ERROR: Could not resolve \"missing\""),
            other => panic!("expected build error, got {other:?}"),
        }
        assert!(config.server_root.join("chunks").exists());
    }
}

//! Bundler seam
//!
//! The server entry is re-bundled into one self-contained ESM module by an
//! external bundler. [`BundlerOptions`] carries the merged option object;
//! [`CommandBundler`] hands it to an esbuild-compatible executable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::config::merge_config;
use crate::error::{AdapterError, Result};
use crate::logger;

/// Modules left for the deployment runtime to supply
pub const DEFAULT_EXTERNALS: &[&str] = &["@astrojs/markdown-remark"];

/// Array options passed as one `--flag:item` per element instead of comma-joined
const REPEATED_FLAGS: &[&str] = &["drop", "external", "inject", "pure"];

/// Merged bundler options, keyed the way the bundler's own API names them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundlerOptions(Map<String, Value>);

impl BundlerOptions {
    /// Built-in options for bundling `entry` into itself
    pub fn defaults_for(entry: &Path) -> Value {
        let entry = entry.to_string_lossy();
        json!({
            "target": "esnext",
            "platform": "node",
            "entryPoints": [entry],
            "outfile": entry,
            "allowOverwrite": true,
            "format": "esm",
            "bundle": true,
            "external": DEFAULT_EXTERNALS,
            "logOverride": {
                "ignored-bare-import": "silent",
            },
        })
    }

    /// Defaults for `entry` with `overrides` merged on top
    pub fn for_entry(entry: &Path, overrides: &Map<String, Value>) -> Self {
        let merged = merge_config(Self::defaults_for(entry), Value::Object(overrides.clone()));
        match merged {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Command-line form understood by esbuild.
    ///
    /// `entryPoints` become positional arguments; booleans become `--flag` or
    /// `--flag=false`; maps become one `--flag:key=value` per entry; arrays
    /// are comma-joined except `drop`, `external`, `inject` and `pure`, which
    /// repeat the flag.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut entries = Vec::new();

        for (key, value) in &self.0 {
            if key == "entryPoints" {
                match value {
                    Value::Array(items) => entries.extend(items.iter().map(scalar_text)),
                    other => entries.push(scalar_text(other)),
                }
                continue;
            }

            let flag = kebab_case(key);
            match value {
                Value::Null => {}
                Value::Bool(true) => args.push(format!("--{flag}")),
                Value::Bool(false) => args.push(format!("--{flag}=false")),
                Value::Array(items) if REPEATED_FLAGS.contains(&key.as_str()) => {
                    args.extend(items.iter().map(|item| format!("--{flag}:{}", scalar_text(item))));
                }
                Value::Array(items) => {
                    let joined: Vec<String> = items.iter().map(scalar_text).collect();
                    args.push(format!("--{flag}={}", joined.join(",")));
                }
                Value::Object(map) => {
                    args.extend(
                        map.iter()
                            .map(|(k, v)| format!("--{flag}:{k}={}", scalar_text(v))),
                    );
                }
                scalar => args.push(format!("--{flag}={}", scalar_text(scalar))),
            }
        }

        args.extend(entries);
        args
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[async_trait]
pub trait Bundler: Send + Sync {
    /// Run one build. Unrecoverable compile errors come back as `AdapterError::Build`.
    async fn bundle(&self, options: &BundlerOptions) -> Result<()>;
}

/// Runs an esbuild-compatible executable with the options as CLI flags
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl CommandBundler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the generated flags, e.g. `npx` + `["esbuild"]`
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for CommandBundler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    async fn bundle(&self, options: &BundlerOptions) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(options.to_cli_args())
            .output()
            .await
            .map_err(|e| {
                AdapterError::Build(format!("failed to run {}: {e}", self.program.display()))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(AdapterError::Build(stderr.into_owned()));
        }
        if !stderr.trim().is_empty() {
            logger::log_build_step(stderr.trim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_the_entry() {
        let options = BundlerOptions::for_entry(Path::new("/dist/server/entry.mjs"), &Map::new());
        assert_eq!(options.get("entryPoints"), Some(&json!(["/dist/server/entry.mjs"])));
        assert_eq!(options.get("outfile"), Some(&json!("/dist/server/entry.mjs")));
        assert_eq!(options.get("allowOverwrite"), Some(&json!(true)));
        assert_eq!(options.get("format"), Some(&json!("esm")));
        assert_eq!(options.get("bundle"), Some(&json!(true)));
    }

    #[test]
    fn test_overrides_append_externals() {
        let overrides = json!({"external": ["sharp"], "minify": true});
        let Value::Object(overrides) = overrides else { unreachable!() };
        let options = BundlerOptions::for_entry(Path::new("entry.mjs"), &overrides);
        assert_eq!(
            options.get("external"),
            Some(&json!(["@astrojs/markdown-remark", "sharp"]))
        );
        assert_eq!(options.get("minify"), Some(&json!(true)));
    }

    #[test]
    fn test_cli_args() {
        let options = BundlerOptions::for_entry(Path::new("entry.mjs"), &Map::new());
        let args = options.to_cli_args();
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--allow-overwrite".to_string()));
        assert!(args.contains(&"--format=esm".to_string()));
        assert!(args.contains(&"--platform=node".to_string()));
        assert!(args.contains(&"--outfile=entry.mjs".to_string()));
        assert!(args.contains(&"--external:@astrojs/markdown-remark".to_string()));
        assert!(args.contains(&"--log-override:ignored-bare-import=silent".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("entry.mjs"));
    }

    #[test]
    fn test_cli_args_lists_and_false() {
        let options = BundlerOptions(
            json!({
                "resolveExtensions": [".ts", ".js"],
                "treeShaking": false,
                "drop": ["console", "debugger"],
                "pure": ["console.log"],
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert_eq!(
            options.to_cli_args(),
            vec![
                "--drop:console",
                "--drop:debugger",
                "--pure:console.log",
                "--resolve-extensions=.ts,.js",
                "--tree-shaking=false",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_carries_output_verbatim() {
        let bundler = CommandBundler::new("sh")
            .with_leading_args(["-c", "echo 'entry.mjs:1:0: ERROR: Unexpected \"}\"' >&2; exit 1", "sh"]);
        let options = BundlerOptions::for_entry(Path::new("entry.mjs"), &Map::new());
        match bundler.bundle(&options).await {
            Err(AdapterError::Build(msg)) => {
                assert_eq!(msg, "entry.mjs:1:0: ERROR: Unexpected \"}\"\n");
            }
            other => panic!("expected build error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_success() {
        let bundler = CommandBundler::new("sh").with_leading_args(["-c", "exit 0", "sh"]);
        let options = BundlerOptions::for_entry(Path::new("entry.mjs"), &Map::new());
        assert!(bundler.bundle(&options).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_a_build_error() {
        let bundler = CommandBundler::new("/nonexistent/bundler-binary");
        let options = BundlerOptions::for_entry(Path::new("entry.mjs"), &Map::new());
        assert!(matches!(
            bundler.bundle(&options).await,
            Err(AdapterError::Build(_))
        ));
    }
}

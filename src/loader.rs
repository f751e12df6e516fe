//! Loading of discovered config files.
//!
//! Locates the nearest config, then reads and parses it according to its
//! format. A file that vanishes between discovery and read is treated as
//! "no config" rather than an error; every other failure propagates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::format::{ConfigFormat, parser_for};
use crate::resolver::{ConfigResolver, owned_names};

/// Options for [`ConfigResolver::load_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Parse the file. When false the raw text is returned.
    #[serde(default = "default_parse")]
    pub parse: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { parse: true }
    }
}

fn default_parse() -> bool {
    true
}

impl LoadOptions {
    /// Options that skip parsing and return the raw file text.
    pub fn raw() -> Self {
        Self { parse: false }
    }
}

/// A file that contributed to a loaded config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub file_path: PathBuf,
}

/// Content of a loaded config.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigContent {
    /// Structured value from a parser or a module loader
    Parsed(Value),
    /// Unparsed file text
    Raw(String),
}

impl ConfigContent {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ConfigContent::Parsed(value) => Some(value),
            ConfigContent::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ConfigContent::Raw(text) => Some(text),
            ConfigContent::Parsed(_) => None,
        }
    }

    /// Convert into a JSON value; raw text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            ConfigContent::Parsed(value) => value,
            ConfigContent::Raw(text) => Value::String(text),
        }
    }
}

/// A loaded config and the files it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigOutput {
    pub config: ConfigContent,
    pub files: Vec<ConfigFile>,
}

impl ConfigOutput {
    fn single(config: ConfigContent, path: &Path) -> Self {
        Self {
            config,
            files: vec![ConfigFile {
                file_path: path.to_path_buf(),
            }],
        }
    }
}

impl ConfigResolver {
    /// Locate and load the config nearest to `filepath`.
    ///
    /// `filepath` is canonicalized first so symlinked and relative inputs
    /// share searches with their real paths. An enforced `root` is
    /// canonicalized too, so it can match the directories being walked.
    /// Returns `Ok(None)` when no
    /// config is found, when the file is empty, or when it disappears before
    /// it can be read.
    pub async fn load_config<S: AsRef<str>>(
        &self,
        filepath: &Path,
        filenames: &[S],
        options: &LoadOptions,
        root: &Path,
    ) -> ConfigResult<Option<ConfigOutput>> {
        let filepath = self
            .locator
            .fs()
            .realpath(filepath)
            .await
            .map_err(|err| ConfigError::io(filepath, err))?;
        let root = if self.locator.settings().enforce_root {
            self.locator
                .fs()
                .realpath(root)
                .await
                .map_err(|err| ConfigError::io(root, err))?
        } else {
            root.to_path_buf()
        };

        let filenames = owned_names(filenames);
        let Some(config_path) = self.locator.locate(&filepath, &filenames, &root).await else {
            return Ok(None);
        };

        match self.read_config(&config_path, options).await {
            Err(err) if err.is_not_found() => {
                warn!(path = %config_path.display(), error = %err, "Config file vanished before load");
                self.locator.exists_cache().invalidate(&config_path);
                Ok(None)
            }
            result => result,
        }
    }

    async fn read_config(&self, path: &Path, options: &LoadOptions) -> ConfigResult<Option<ConfigOutput>> {
        let format = ConfigFormat::from_path(path);

        if format.is_code() {
            let loader = self
                .modules
                .as_ref()
                .ok_or_else(|| ConfigError::NoModuleLoader {
                    path: path.to_path_buf(),
                })?;
            let shared = loader
                .load_module(path)
                .await
                .map_err(|source| ConfigError::Module {
                    path: path.to_path_buf(),
                    source,
                })?;
            debug!(path = %path.display(), "Loaded code config");
            let config = ConfigContent::Parsed(Value::clone(&shared));
            return Ok(Some(ConfigOutput::single(config, path)));
        }

        let content = self
            .locator
            .fs()
            .read_to_string(path)
            .await
            .map_err(|err| ConfigError::io(path, err))?;
        if content.is_empty() {
            debug!(path = %path.display(), "Config file is empty");
            return Ok(None);
        }

        let config = if options.parse {
            let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
            let parse = parser_for(ext);
            let value = parse(&content).map_err(|err| ConfigError::parse(path, format, err))?;
            ConfigContent::Parsed(value)
        } else {
            ConfigContent::Raw(content)
        };

        debug!(path = %path.display(), %format, "Loaded config");
        Ok(Some(ConfigOutput::single(config, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::module::ModuleRegistry;
    use crate::settings::LocatorSettings;
    use serde_json::json;
    use std::sync::Arc;

    fn resolver(fs: &Arc<MemoryFileSystem>) -> ConfigResolver {
        ConfigResolver::new(fs.clone(), LocatorSettings::default())
    }

    #[tokio::test]
    async fn test_load_json() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/src/a.js", "");
        fs.write_file("/repo/.config.json", "{\"a\":1}");

        let output = resolver(&fs)
            .load_config(Path::new("/repo/src/a.js"), &[".config.json"], &LoadOptions::default(), Path::new("/repo"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(output.config, ConfigContent::Parsed(json!({"a": 1})));
        assert_eq!(
            output.files,
            vec![ConfigFile {
                file_path: PathBuf::from("/repo/.config.json")
            }]
        );
    }

    #[tokio::test]
    async fn test_load_toml() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/tool.toml", "a = 1\n");

        let output = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &["tool.toml"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.config.as_value(), Some(&json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_unknown_extension_parses_as_json5() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/.toolrc", "{ plugins: ['x'], }");

        let output = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &[".toolrc"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.config.into_value(), json!({"plugins": ["x"]}));
    }

    #[tokio::test]
    async fn test_empty_file_is_absent() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/.toolrc", "");

        let output = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &[".toolrc"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_raw_text_when_parsing_disabled() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/.toolrc", "not { valid json");

        let output = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &[".toolrc"], &LoadOptions::raw(), Path::new("/"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.config.as_raw(), Some("not { valid json"));
    }

    #[tokio::test]
    async fn test_malformed_file_propagates() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/tool.toml", "a = = 1");

        let err = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &["tool.toml"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Parse {
                format: ConfigFormat::Toml,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_start_file_propagates() {
        let fs = Arc::new(MemoryFileSystem::new());
        let err = resolver(&fs)
            .load_config(Path::new("/nope/a.js"), &[".rc"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_deleted_file_drops_from_cache() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/.rc.json", "{}");
        let resolver = resolver(&fs);

        let found = resolver
            .resolve_config(Path::new("/repo/a.js"), &[".rc.json"], Path::new("/"))
            .await;
        assert_eq!(found, Some(PathBuf::from("/repo/.rc.json")));
        assert_eq!(resolver.exists_cache_len(), 1);

        fs.remove_file("/repo/.rc.json");
        let output = resolver
            .load_config(Path::new("/repo/a.js"), &[".rc.json"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap();
        assert!(output.is_none());
        assert_eq!(resolver.exists_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_symlinked_start_file_uses_real_path() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/real/pkg/a.js", "");
        fs.write_file("/real/.rc", "{b: 2}");
        fs.symlink("/real/pkg", "/links/pkg");

        let output = resolver(&fs)
            .load_config(Path::new("/links/pkg/a.js"), &[".rc"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.files[0].file_path, PathBuf::from("/real/.rc"));
    }

    #[tokio::test]
    async fn test_deleted_nearer_config_falls_back_to_ancestor() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/pkg/src/a.js", "");
        fs.write_file("/repo/pkg/.rc", "{near: true}");
        fs.write_file("/repo/.rc", "{far: true}");
        let resolver = resolver(&fs);
        let start = Path::new("/repo/pkg/src/a.js");

        let found = resolver.resolve_config(start, &[".rc"], Path::new("/")).await;
        assert_eq!(found, Some(PathBuf::from("/repo/pkg/.rc")));

        fs.remove_file("/repo/pkg/.rc");
        let output = resolver
            .load_config(start, &[".rc"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap()
            .expect("ancestor config should be found");
        assert_eq!(output.config, ConfigContent::Parsed(json!({"far": true})));
        assert_eq!(output.files[0].file_path, PathBuf::from("/repo/.rc"));
    }

    #[tokio::test]
    async fn test_symlinked_root_is_enforced() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/real/proj/src/a.js", "");
        fs.write_file("/real/.rc", "{outside: true}");
        fs.symlink("/real/proj", "/links/proj");
        let settings = LocatorSettings {
            enforce_root: true,
            ..Default::default()
        };
        let resolver = ConfigResolver::new(fs.clone(), settings);

        let output = resolver
            .load_config(
                Path::new("/links/proj/src/a.js"),
                &[".rc"],
                &LoadOptions::default(),
                Path::new("/links/proj"),
            )
            .await
            .unwrap();
        assert!(output.is_none());

        let output = resolver
            .load_config(
                Path::new("/links/proj/src/a.js"),
                &[".rc"],
                &LoadOptions::default(),
                Path::new("/real"),
            )
            .await
            .unwrap()
            .expect("config at the root should be found");
        assert_eq!(output.files[0].file_path, PathBuf::from("/real/.rc"));
    }

    #[tokio::test]
    async fn test_relative_root_is_enforced() {
        let fs = Arc::new(MemoryFileSystem::new().with_cwd("/work"));
        fs.write_file("/work/proj/src/a.js", "");
        fs.write_file("/work/.rc", "{outside: true}");
        let settings = LocatorSettings {
            enforce_root: true,
            ..Default::default()
        };
        let resolver = ConfigResolver::new(fs.clone(), settings);

        let output = resolver
            .load_config(Path::new("proj/src/a.js"), &[".rc"], &LoadOptions::default(), Path::new("proj"))
            .await
            .unwrap();
        assert!(output.is_none());

        let output = resolver
            .load_config(Path::new("proj/src/a.js"), &[".rc"], &LoadOptions::default(), Path::new("."))
            .await
            .unwrap()
            .expect("config at the root should be found");
        assert_eq!(output.files[0].file_path, PathBuf::from("/work/.rc"));
    }

    #[tokio::test]
    async fn test_code_config_is_deep_copied() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/tool.config.js", "module.exports = {}");
        let modules = Arc::new(ModuleRegistry::new());
        modules.insert("/repo/tool.config.js", json!({"presets": ["env"]}));
        let resolver = resolver(&fs).with_module_loader(modules.clone());

        let output = resolver
            .load_config(Path::new("/repo/a.js"), &["tool.config.js"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap()
            .unwrap();

        let mut config = output.config.into_value();
        config["presets"] = json!([]);
        let shared = modules.get(Path::new("/repo/tool.config.js")).unwrap();
        assert_eq!(*shared, json!({"presets": ["env"]}));
    }

    #[tokio::test]
    async fn test_unregistered_module_is_absent() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/tool.config.js", "module.exports = {}");
        let resolver = resolver(&fs).with_module_loader(Arc::new(ModuleRegistry::new()));

        let output = resolver
            .load_config(Path::new("/repo/a.js"), &["tool.config.js"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_code_config_without_loader_fails() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/repo/a.js", "");
        fs.write_file("/repo/tool.config.js", "module.exports = {}");

        let err = resolver(&fs)
            .load_config(Path::new("/repo/a.js"), &["tool.config.js"], &LoadOptions::default(), Path::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoModuleLoader { .. }));
    }

    #[test]
    fn test_output_serialization() {
        let output = ConfigOutput::single(ConfigContent::Raw("x".into()), Path::new("/p/.rc"));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, json!({"config": "x", "files": [{"filePath": "/p/.rc"}]}));
    }
}

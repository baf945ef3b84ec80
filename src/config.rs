//! Configure the class name minifier.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::{
    catalog::{CatalogError, ClassPattern},
    cli::Opts,
    engine::EngineOptions,
    script::{hook::ComponentHook, ScriptSyntax},
};

/// Names of the configuration files looked up in the working directory.
const CONFIG_FILES: [&str; 4] = [
    "classmin.json",
    "classmin.toml",
    "classmin.yaml",
    "classmin.yml",
];

/// Configuration for the class name minifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the input stylesheet.
    pub css_in: PathBuf,

    /// Path of the output stylesheet.
    ///
    /// If set to `None`, the stylesheet is printed on the standard output.
    pub css_out: Option<PathBuf>,

    /// Path of the input script.
    pub js_in: PathBuf,

    /// Path of the output script.
    ///
    /// If set to `None`, the script is printed on the standard output.
    pub js_out: Option<PathBuf>,

    /// Only substitute class names starting with this prefix.
    pub prefix: Option<String>,

    /// Only substitute class names matching this regular expression.
    ///
    /// Ignored if `prefix` is set.
    pub regexp: Option<String>,

    /// Assign tokens to class names never referenced by the script.
    pub replace_all: bool,

    /// Path of the replacement report.
    pub replacements_output: Option<PathBuf>,

    /// Substitute class names in conditional blocks and nested rules.
    pub nested: bool,

    /// Fail on selectors referencing classes without token.
    pub strict: bool,

    /// Minify the output files.
    pub minify: bool,

    /// Component definition convention.
    pub component: Option<ComponentConfig>,
}

/// Configuration of the component definition convention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    /// Name of the component definition function.
    pub callee: String,

    /// Suffix of derived class names.
    #[serde(default = "default_component_suffix")]
    pub suffix: String,
}

/// Deserializable configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// See [`Config::css_in`].
    pub css_in: Option<PathBuf>,

    /// See [`Config::css_out`].
    pub css_out: Option<PathBuf>,

    /// See [`Config::js_in`].
    pub js_in: Option<PathBuf>,

    /// See [`Config::js_out`].
    pub js_out: Option<PathBuf>,

    /// See [`Config::prefix`].
    pub prefix: Option<String>,

    /// See [`Config::regexp`].
    pub regexp: Option<String>,

    /// See [`Config::replace_all`].
    #[serde(default)]
    pub replace_all: bool,

    /// See [`Config::replacements_output`].
    pub replacements_output: Option<PathBuf>,

    /// See [`Config::nested`].
    pub nested: Option<bool>,

    /// See [`Config::strict`].
    #[serde(default)]
    pub strict: bool,

    /// See [`Config::minify`].
    pub minify: Option<bool>,

    /// See [`Config::component`].
    pub component: Option<ComponentConfig>,
}

impl Config {
    /// Create a configuration from a [`Opts`] object.
    ///
    /// Values of the configuration file, if any, are overridden by command
    /// line options.
    pub fn from_opts(opts: &Opts) -> Result<Self> {
        let config_path = opts.config.clone().or_else(|| {
            CONFIG_FILES
                .into_iter()
                .map(PathBuf::from)
                .find(|path| path.exists())
        });

        let user_config = match config_path {
            Some(path) => {
                log::info!("Loading configuration {:?}", path);
                UserConfig::read_file(path)?
            },
            None => UserConfig::default(),
        };

        Self::from_user_config(user_config.merge_opts(opts))
    }

    /// Create a configuration from a [`UserConfig`] object.
    ///
    /// Fails if an input path is missing.
    pub fn from_user_config(user_config: UserConfig) -> Result<Self> {
        Ok(Self {
            css_in: user_config
                .css_in
                .ok_or_else(|| anyhow!("missing input stylesheet `css_in`"))?,
            css_out: user_config.css_out,
            js_in: user_config
                .js_in
                .ok_or_else(|| anyhow!("missing input script `js_in`"))?,
            js_out: user_config.js_out,
            prefix: user_config.prefix,
            regexp: user_config.regexp,
            replace_all: user_config.replace_all,
            replacements_output: user_config.replacements_output,
            nested: user_config.nested.unwrap_or(true),
            strict: user_config.strict,
            minify: user_config.minify.unwrap_or(true),
            component: user_config.component,
        })
    }

    /// Derive the options of the substitution engine.
    pub fn engine_options(&self) -> Result<EngineOptions, CatalogError> {
        Ok(EngineOptions {
            pattern: ClassPattern::new(self.prefix.as_deref(), self.regexp.as_deref())?,
            nested: self.nested,
            strict: self.strict,
            replace_all: self.replace_all,
            minify: self.minify,
            replacements_output: self.replacements_output.clone(),
            syntax: ScriptSyntax::from_path(&self.js_in),
            css_filename: self.css_in.to_string_lossy().into_owned(),
            js_filename: self.js_in.to_string_lossy().into_owned(),
        })
    }

    /// Create the component hook, if configured.
    pub fn component_hook(&self) -> Option<ComponentHook> {
        self.component
            .as_ref()
            .map(|component| ComponentHook::new(&component.callee, &component.suffix))
    }
}

impl UserConfig {
    /// Read a configuration file.
    ///
    /// The format is chosen from the file extension.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let extension = path.extension().and_then(|ext| ext.to_str());

        // Check the extension before reading the file
        if !matches!(extension, Some("json" | "toml" | "yaml" | "yml")) {
            return Err(anyhow!(
                "unknown configuration file extension {:?}",
                extension.unwrap_or_default()
            ));
        }

        let content = std::fs::read_to_string(path)?;

        Self::read_str(content, extension.unwrap_or_default())
    }

    /// Read a configuration string in the given format.
    pub fn read_str(content: impl AsRef<str>, extension: &str) -> Result<Self> {
        let content = content.as_ref();

        let user_config = match extension {
            "json" => serde_json::from_str(content)?,
            "toml" => toml::from_str(content)?,
            "yaml" | "yml" => serde_yaml::from_str(content)?,
            _ => return Err(anyhow!("unknown configuration file extension {extension:?}")),
        };

        Ok(user_config)
    }

    /// Override values with command line options.
    pub fn merge_opts(self, opts: &Opts) -> Self {
        let component = match (&opts.component_callee, self.component) {
            (Some(callee), component) => Some(ComponentConfig {
                callee: callee.clone(),
                suffix: opts
                    .component_suffix
                    .clone()
                    .or(component.map(|component| component.suffix))
                    .unwrap_or_else(default_component_suffix),
            }),
            (None, Some(component)) => Some(ComponentConfig {
                suffix: opts.component_suffix.clone().unwrap_or(component.suffix),
                ..component
            }),
            (None, None) => None,
        };

        Self {
            css_in: opts.css_in.clone().or(self.css_in),
            css_out: opts.css_out.clone().or(self.css_out),
            js_in: opts.js_in.clone().or(self.js_in),
            js_out: opts.js_out.clone().or(self.js_out),
            prefix: opts.prefix.clone().or(self.prefix),
            regexp: opts.regexp.clone().or(self.regexp),
            replace_all: opts.replace_all || self.replace_all,
            replacements_output: opts
                .replacements_output
                .clone()
                .or(self.replacements_output),
            nested: if opts.no_nested {
                Some(false)
            } else {
                self.nested
            },
            strict: opts.strict || self.strict,
            minify: if opts.no_minify {
                Some(false)
            } else {
                self.minify
            },
            component,
        }
    }
}

/// Default suffix of derived class names.
fn default_component_suffix() -> String {
    ComponentHook::DEFAULT_SUFFIX.to_owned()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ComponentConfig, Config, UserConfig};
    use crate::cli::Opts;

    #[test]
    fn load_config_json() {
        const CONTENT: &str = r#"{
            "css_in": "style.css",
            "js_in": "app.js",
            "prefix": "d-",
            "replace_all": true,
            "nested": false
        }"#;

        let user_config = UserConfig::read_str(CONTENT, "json").unwrap();
        let config = Config::from_user_config(user_config).unwrap();

        assert_eq!(config.css_in, PathBuf::from("style.css"));
        assert_eq!(config.js_in, PathBuf::from("app.js"));
        assert_eq!(config.prefix.as_deref(), Some("d-"));
        assert!(config.replace_all);
        assert!(!config.nested);
        assert!(config.minify);
    }

    #[test]
    fn load_config_toml() {
        const CONTENT: &str = r#"
            css_in = "style.css"
            js_in = "app.ts"
            replacements_output = "report.json"

            [component]
            callee = "component"
        "#;

        let user_config = UserConfig::read_str(CONTENT, "toml").unwrap();
        let config = Config::from_user_config(user_config).unwrap();

        assert_eq!(
            config.replacements_output,
            Some(PathBuf::from("report.json"))
        );
        assert_eq!(
            config.component,
            Some(ComponentConfig {
                callee: "component".to_owned(),
                suffix: "-inner".to_owned(),
            })
        );
    }

    #[test]
    fn load_config_yaml() {
        const CONTENT: &str = concat!(
            "css_in: style.css\n",
            "js_in: app.js\n",
            "regexp: \"btn-.*\"\n",
            "minify: false\n",
        );

        let user_config = UserConfig::read_str(CONTENT, "yaml").unwrap();
        let config = Config::from_user_config(user_config).unwrap();

        assert_eq!(config.regexp.as_deref(), Some("btn-.*"));
        assert!(!config.minify);
    }

    #[test]
    fn reject_unknown_fields() {
        let result = UserConfig::read_str(r#"{ "css": "style.css" }"#, "json");

        assert!(result.is_err());
    }

    #[test]
    fn reject_unknown_extension() {
        let result = UserConfig::read_file("classmin.ini");

        assert!(result.unwrap_err().to_string().contains("extension"));
    }

    #[test]
    fn missing_input() {
        let user_config = UserConfig::read_str(r#"{ "css_in": "style.css" }"#, "json").unwrap();

        let result = Config::from_user_config(user_config);

        assert!(result.unwrap_err().to_string().contains("js_in"));
    }

    #[test]
    fn options_override_file() {
        const CONTENT: &str = r#"{
            "css_in": "style.css",
            "js_in": "app.js",
            "prefix": "d-",
            "component": { "callee": "define", "suffix": "-body" }
        }"#;

        let opts = Opts {
            js_in: Some("main.tsx".into()),
            prefix: Some("x-".to_owned()),
            no_minify: true,
            component_suffix: Some("-content".to_owned()),
            ..Default::default()
        };

        let user_config = UserConfig::read_str(CONTENT, "json").unwrap().merge_opts(&opts);
        let config = Config::from_user_config(user_config).unwrap();

        assert_eq!(config.css_in, PathBuf::from("style.css"));
        assert_eq!(config.js_in, PathBuf::from("main.tsx"));
        assert_eq!(config.prefix.as_deref(), Some("x-"));
        assert!(!config.minify);
        assert_eq!(
            config.component,
            Some(ComponentConfig {
                callee: "define".to_owned(),
                suffix: "-content".to_owned(),
            })
        );
    }

    #[test]
    fn engine_options() {
        let user_config = UserConfig {
            css_in: Some("style.css".into()),
            js_in: Some("app.ts".into()),
            regexp: Some("(".to_owned()),
            ..Default::default()
        };

        let config = Config::from_user_config(user_config).unwrap();

        assert!(config.engine_options().is_err());

        let config = Config {
            regexp: None,
            ..config
        };

        let options = config.engine_options().unwrap();

        assert_eq!(options.syntax, crate::script::ScriptSyntax::TypeScript);
        assert_eq!(options.css_filename, "style.css");
        assert!(options.nested);
    }
}

//! Substitute class names consistently in a stylesheet and a script.
//!
//! A [`SubstitutionEngine`] processes one (stylesheet, script) pair. The steps
//! of a run must be performed in order:
//!
//! 1. [`SubstitutionEngine::parse`] parses both documents;
//! 2. [`SubstitutionEngine::build_catalog`] extracts the class names of the
//!    stylesheet;
//! 3. [`SubstitutionEngine::replace`] substitutes class names in the string
//!    literals of the script, assigning tokens in traversal order;
//! 4. [`SubstitutionEngine::replace_all`] optionally assigns tokens to the
//!    class names the script never references.
//!
//! [`SubstitutionEngine::run`] performs all of them. The rewritten documents
//! are then produced by [`SubstitutionEngine::generate_css`] and
//! [`SubstitutionEngine::generate_js`].

use std::path::PathBuf;

use lightningcss::stylesheet::StyleSheet;
use thiserror::Error;

use crate::{
    catalog::{ClassCatalog, ClassMatcher, ClassPattern},
    report::{ReplacementReport, ReportError},
    script::{
        hook::ScriptHook,
        replace::{replace_value, LiteralReplacer},
        ScriptDocument, ScriptError, ScriptSyntax,
    },
    style::{
        parse_style, print_style,
        rewrite::{find_unresolved, RewriteError, SelectorRewriter},
        StyleError,
    },
    substitution::Substitutions,
};

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Stylesheet error.
    #[error(transparent)]
    Style(#[from] StyleError),
    /// Script error.
    #[error(transparent)]
    Script(#[from] ScriptError),
    /// An operation was called before the steps it depends on.
    #[error("`{operation}` requires stage {expected:?}, but the engine is at stage {actual:?}")]
    OutOfOrder {
        /// Name of the operation.
        operation: &'static str,
        /// Minimal stage required by the operation.
        expected: Stage,
        /// Current stage.
        actual: Stage,
    },
    /// A selector references a class that has no token.
    #[error("selector references class `{name}` which has no token")]
    UnresolvedSelector {
        /// Class name.
        name: String,
    },
    /// The replacement report cannot be written.
    #[error("failed to write the replacement report to {path:?}")]
    Report {
        /// Path of the report.
        path: PathBuf,
        /// Source error.
        source: ReportError,
    },
}

impl From<RewriteError> for EngineError {
    fn from(error: RewriteError) -> Self {
        match error {
            RewriteError::Unresolved { name } => Self::UnresolvedSelector { name },
        }
    }
}

/// Progress of a [`SubstitutionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Source texts are available.
    FilesLoaded,
    /// Both documents are parsed.
    Parsed,
    /// The class names of the stylesheet are known.
    Cataloged,
    /// The script literals are substituted.
    ScriptSubstituted,
    /// Every class name of the catalog has a token.
    Exhausted,
}

/// Options of a [`SubstitutionEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Class names eligible for substitution.
    pub pattern: ClassPattern,

    /// Whether rules nested in conditional blocks and style rules participate.
    pub nested: bool,

    /// Fail on selectors referencing classes without token.
    pub strict: bool,

    /// Assign a token to every class name of the catalog.
    pub replace_all: bool,

    /// Minify the generated documents.
    pub minify: bool,

    /// Path of the replacement report written by [`SubstitutionEngine::run`].
    pub replacements_output: Option<PathBuf>,

    /// Syntax of the script.
    pub syntax: ScriptSyntax,

    /// Stylesheet name used in error messages.
    pub css_filename: String,

    /// Script name used in error messages.
    pub js_filename: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pattern: ClassPattern::default(),
            nested: true,
            strict: false,
            replace_all: false,
            minify: true,
            replacements_output: None,
            syntax: ScriptSyntax::default(),
            css_filename: "style.css".to_owned(),
            js_filename: "script.js".to_owned(),
        }
    }
}

/// Substitution run over one stylesheet and one script.
pub struct SubstitutionEngine<'a> {
    options: EngineOptions,
    css: &'a str,
    js: &'a str,
    stage: Stage,
    style_sheet: Option<StyleSheet<'a, 'a>>,
    script: Option<ScriptDocument>,
    catalog: ClassCatalog,
    matcher: Option<ClassMatcher>,
    substitutions: Substitutions,
    hook: Option<Box<dyn ScriptHook + 'a>>,
    css_output: Option<String>,
}

impl std::fmt::Debug for SubstitutionEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstitutionEngine")
            .field("options", &self.options)
            .field("stage", &self.stage)
            .field("catalog", &self.catalog)
            .field("substitutions", &self.substitutions)
            .finish_non_exhaustive()
    }
}

impl<'a> SubstitutionEngine<'a> {
    /// Create an engine over a stylesheet and a script.
    pub fn new(options: EngineOptions, css: &'a str, js: &'a str) -> Self {
        Self {
            options,
            css,
            js,
            stage: Stage::FilesLoaded,
            style_sheet: None,
            script: None,
            catalog: ClassCatalog::default(),
            matcher: None,
            substitutions: Substitutions::new(css),
            hook: None,
            css_output: None,
        }
    }

    /// Install a hook called on every expression of the script.
    pub fn with_hook(mut self, hook: impl ScriptHook + 'a) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Perform every step of the run.
    ///
    /// Writes the replacement report if a path is configured. A strict engine
    /// fails before writing it if a selector references a class without
    /// token.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.parse()?;
        self.build_catalog()?;
        self.replace()?;

        if self.options.replace_all {
            self.replace_all()?;
        }

        if self.options.strict {
            self.check_resolved()?;
        }

        if let Some(path) = &self.options.replacements_output {
            log::info!("Writing replacement report {:?}", path);
            self.report()
                .write_file(path)
                .map_err(|source| EngineError::Report {
                    path: path.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Parse the stylesheet and the script.
    pub fn parse(&mut self) -> Result<(), EngineError> {
        self.expect_stage("parse", Stage::FilesLoaded, Stage::FilesLoaded)?;

        let style_sheet = parse_style(self.css, self.options.css_filename.clone())?;

        let script = ScriptDocument::parse(
            self.js,
            self.options.js_filename.clone(),
            self.options.syntax,
        )?;

        self.style_sheet = Some(style_sheet);
        self.script = Some(script);
        self.stage = Stage::Parsed;

        Ok(())
    }

    /// Extract the class names of the stylesheet.
    pub fn build_catalog(&mut self) -> Result<(), EngineError> {
        self.expect_stage("build_catalog", Stage::Parsed, Stage::Parsed)?;

        let Some(style_sheet) = &self.style_sheet else {
            return Err(self.out_of_order("build_catalog", Stage::Parsed));
        };

        self.catalog =
            ClassCatalog::extract(&style_sheet.rules.0, &self.options.pattern, self.options.nested);
        self.matcher = self.catalog.matcher();

        log::info!("Found {} class names", self.catalog.len());

        self.stage = Stage::Cataloged;

        Ok(())
    }

    /// Substitute class names in the string literals of the script.
    pub fn replace(&mut self) -> Result<(), EngineError> {
        self.expect_stage("replace", Stage::Cataloged, Stage::Cataloged)?;

        let Some(script) = &mut self.script else {
            return Err(self.out_of_order("replace", Stage::Cataloged));
        };

        let hook = self
            .hook
            .as_mut()
            .map(|hook| hook.as_mut() as &mut dyn ScriptHook);

        LiteralReplacer::new(
            &mut self.substitutions,
            &self.catalog,
            self.matcher.as_ref(),
            hook,
        )
        .replace_program(script.program_mut());

        log::info!(
            "Assigned {} tokens in the script ({} substitutions)",
            self.substitutions.len(),
            self.substitutions.count()
        );

        self.stage = Stage::ScriptSubstituted;

        Ok(())
    }

    /// Substitute class names in a single string.
    ///
    /// Returns `value` unchanged if it contains no class name.
    pub fn replace_item(&mut self, value: &str) -> Result<String, EngineError> {
        self.expect_stage("replace_item", Stage::Cataloged, Stage::Exhausted)?;

        let result = self
            .matcher
            .as_ref()
            .and_then(|matcher| replace_value(value, matcher, &mut self.substitutions));

        Ok(result.unwrap_or_else(|| value.to_owned()))
    }

    /// Assign a token to every class name of the catalog that has none.
    pub fn replace_all(&mut self) -> Result<(), EngineError> {
        self.expect_stage("replace_all", Stage::ScriptSubstituted, Stage::Exhausted)?;

        let mut minted = 0;

        for name in self.catalog.names() {
            if !self.substitutions.contains(name) {
                self.substitutions.assign(name);
                self.substitutions.add_count(1);
                minted += 1;
            }
        }

        log::info!("Assigned {minted} tokens to unreferenced class names");

        self.stage = Stage::Exhausted;

        Ok(())
    }

    /// Generate the rewritten stylesheet.
    ///
    /// Selectors referencing a class without token are removed, unless the
    /// engine is strict.
    pub fn generate_css(&mut self) -> Result<String, EngineError> {
        self.expect_stage("generate_css", Stage::ScriptSubstituted, Stage::Exhausted)?;

        if let Some(css) = &self.css_output {
            return Ok(css.clone());
        }

        if self.options.strict {
            self.check_resolved()?;
        }

        // The stylesheet is only rewritten once
        let Some(mut style_sheet) = self.style_sheet.take() else {
            return Err(self.out_of_order("generate_css", Stage::Parsed));
        };

        SelectorRewriter {
            pattern: &self.options.pattern,
            substitutions: &mut self.substitutions,
            nested: self.options.nested,
            strict: self.options.strict,
        }
        .rewrite_rules(&mut style_sheet.rules.0)?;

        let css = print_style(&style_sheet, self.options.minify)?;

        self.css_output = Some(css.clone());

        Ok(css)
    }

    /// Generate the rewritten script.
    pub fn generate_js(&self) -> Result<String, EngineError> {
        self.expect_stage("generate_js", Stage::ScriptSubstituted, Stage::Exhausted)?;

        let Some(script) = &self.script else {
            return Err(self.out_of_order("generate_js", Stage::Parsed));
        };

        Ok(script.to_code(self.options.minify)?)
    }

    /// Return the number of substitutions performed.
    pub fn replacements_count(&self) -> u64 {
        self.substitutions.count()
    }

    /// Return the substitution table.
    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }

    /// Return the class names of the stylesheet.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Return the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Summarize the substitutions.
    pub fn report(&self) -> ReplacementReport {
        ReplacementReport::from_substitutions(&self.substitutions)
    }

    /// Fail if a selector references a class without token.
    fn check_resolved(&self) -> Result<(), EngineError> {
        let Some(style_sheet) = &self.style_sheet else {
            return Ok(());
        };

        match find_unresolved(
            &style_sheet.rules.0,
            &self.options.pattern,
            &self.substitutions,
            self.options.nested,
        ) {
            Some(name) => Err(EngineError::UnresolvedSelector { name }),
            None => Ok(()),
        }
    }

    /// Check that the current stage lies in `min..=max`.
    fn expect_stage(
        &self,
        operation: &'static str,
        min: Stage,
        max: Stage,
    ) -> Result<(), EngineError> {
        if (min..=max).contains(&self.stage) {
            Ok(())
        } else {
            Err(self.out_of_order(operation, min))
        }
    }

    /// Build an [`EngineError::OutOfOrder`] error.
    fn out_of_order(&self, operation: &'static str, expected: Stage) -> EngineError {
        EngineError::OutOfOrder {
            operation,
            expected,
            actual: self.stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineError, EngineOptions, Stage, SubstitutionEngine};
    use crate::{catalog::ClassPattern, script::hook::ComponentHook};

    #[test]
    fn single_class() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".foo{color:red}",
            "el.className = \"foo\";",
        );

        engine.run().unwrap();

        assert_eq!(engine.substitutions().get("foo"), Some("a"));
        assert!(engine.generate_js().unwrap().contains("el.className=\"a\""));
        assert_eq!(engine.generate_css().unwrap(), ".a{color:red}");
    }

    #[test]
    fn prefixed_classes() {
        let options = EngineOptions {
            pattern: ClassPattern::new(Some("d-"), None).unwrap(),
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".d-btn{color:red}.other{margin:0}",
            "el.className = \"d-btn other\";",
        );

        engine.run().unwrap();

        assert_eq!(engine.catalog().names(), ["d-btn"]);
        assert!(engine.generate_js().unwrap().contains("\"a other\""));
        assert_eq!(
            engine.generate_css().unwrap(),
            ".a{color:red}.other{margin:0}"
        );
    }

    #[test]
    fn replace_all_classes() {
        let options = EngineOptions {
            replace_all: true,
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".used{color:red}.unused{margin:0}",
            "el.className = \"used\";",
        );

        engine.run().unwrap();

        let used = engine.substitutions().get("used");
        let unused = engine.substitutions().get("unused");

        assert_eq!(used, Some("a"));
        assert_eq!(unused, Some("b"));
        assert_eq!(engine.stage(), Stage::Exhausted);
        // One literal occurrence and one minted token
        assert_eq!(engine.replacements_count(), 2);
        assert_eq!(engine.generate_css().unwrap(), ".a{color:red}.b{margin:0}");
    }

    #[test]
    fn drop_unreferenced_classes() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".used{color:red}.unused{margin:0}",
            "el.className = \"used\";",
        );

        engine.run().unwrap();

        assert_eq!(engine.substitutions().get("unused"), None);
        assert_eq!(engine.generate_css().unwrap(), ".a{color:red}");
    }

    #[test]
    fn strict_mode() {
        let options = EngineOptions {
            strict: true,
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".used{color:red}.unused{margin:0}",
            "el.className = \"used\";",
        );

        assert!(matches!(
            engine.run(),
            Err(EngineError::UnresolvedSelector { name }) if name == "unused"
        ));
    }

    #[test]
    fn strict_mode_writes_no_report() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let options = EngineOptions {
            strict: true,
            replacements_output: Some(path.clone()),
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".used{color:red}.unused{margin:0}",
            "el.className = \"used\";",
        );

        assert!(engine.run().is_err());
        assert!(!path.exists());
    }

    #[test]
    fn strict_generate_css_keeps_style_sheet() {
        let options = EngineOptions {
            strict: true,
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".used{color:red}.unused:not(.hidden){margin:0}",
            "el.className = \"used\";",
        );

        engine.parse().unwrap();
        engine.build_catalog().unwrap();
        engine.replace().unwrap();

        for _ in 0..2 {
            assert!(matches!(
                engine.generate_css(),
                Err(EngineError::UnresolvedSelector { name }) if name == "unused"
            ));
        }

        assert_eq!(engine.substitutions().get("hidden"), None);
        assert_eq!(engine.replace_item("unused").unwrap(), "b");
        assert_eq!(
            engine.generate_css().unwrap(),
            ".a{color:red}.b:not(.c){margin:0}"
        );
    }

    #[test]
    fn replace_all_in_source_order() {
        let options = EngineOptions {
            replace_all: true,
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(options, ".xx .yy{color:red}", "");

        engine.run().unwrap();

        let pairs: Vec<_> = engine.substitutions().iter().collect();

        assert_eq!(pairs, [("xx", "a"), ("yy", "b")]);
        assert_eq!(engine.generate_css().unwrap(), ".a .b{color:red}");
    }

    #[test]
    fn rewrite_layers_consistently() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".card{color:red}@layer base{.card{margin:0}}",
            "el.className = \"card\";",
        );

        engine.run().unwrap();

        assert_eq!(
            engine.generate_css().unwrap(),
            ".a{color:red}@layer base{.a{margin:0}}"
        );
    }

    #[test]
    fn count_every_occurrence() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".foo{color:red}.bar{margin:0}",
            "x = \"foo bar foo\"; y = `foo`;",
        );

        engine.run().unwrap();

        assert_eq!(engine.replacements_count(), 4);
        assert_eq!(engine.substitutions().len(), 2);

        engine.generate_css().unwrap();

        // Selector substitutions
        assert_eq!(engine.replacements_count(), 6);
    }

    #[test]
    fn deterministic() {
        const CSS: &str = ".b{color:red}.a .longer{margin:0}.c:not(.d){display:none}";
        const JS: &str = "x = [\"c\", \"longer a\", \"b\"];";

        let outputs: Vec<_> = (0..2)
            .map(|_| {
                let mut engine = SubstitutionEngine::new(EngineOptions::default(), CSS, JS);
                engine.run().unwrap();
                (
                    engine.generate_css().unwrap(),
                    engine.generate_js().unwrap(),
                    engine.report(),
                )
            })
            .collect();

        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn generate_css_twice() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".foo{color:red}",
            "el.className = \"foo\";",
        );

        engine.run().unwrap();

        let first = engine.generate_css().unwrap();
        let second = engine.generate_css().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn replace_item() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".foo{color:red}.bar{margin:0}",
            "",
        );

        engine.parse().unwrap();
        engine.build_catalog().unwrap();

        assert_eq!(engine.replace_item("bar foo").unwrap(), "a b");
        assert_eq!(engine.replace_item("baz").unwrap(), "baz");
        assert_eq!(engine.replacements_count(), 2);
    }

    #[test]
    fn component_hook() {
        let mut engine = SubstitutionEngine::new(
            EngineOptions::default(),
            ".btn{color:red}.btn-inner{margin:0}",
            "component(\"btn\", {});",
        )
        .with_hook(ComponentHook::new("component", ComponentHook::DEFAULT_SUFFIX));

        engine.run().unwrap();

        assert!(engine.generate_js().unwrap().contains("component(\"a\""));
        assert_eq!(
            engine.generate_css().unwrap(),
            ".a{color:red}.a-inner{margin:0}"
        );
    }

    #[test]
    fn out_of_order() {
        let mut engine =
            SubstitutionEngine::new(EngineOptions::default(), ".foo{color:red}", "\"foo\";");

        assert!(matches!(
            engine.replace(),
            Err(EngineError::OutOfOrder {
                operation: "replace",
                expected: Stage::Cataloged,
                actual: Stage::FilesLoaded,
            })
        ));

        engine.parse().unwrap();

        assert!(matches!(
            engine.parse(),
            Err(EngineError::OutOfOrder { operation: "parse", .. })
        ));
        assert!(matches!(
            engine.generate_css(),
            Err(EngineError::OutOfOrder { operation: "generate_css", .. })
        ));
        assert!(matches!(
            engine.replace_all(),
            Err(EngineError::OutOfOrder { operation: "replace_all", .. })
        ));
    }

    #[test]
    fn write_report() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let options = EngineOptions {
            replacements_output: Some(path.clone()),
            ..Default::default()
        };

        let mut engine = SubstitutionEngine::new(
            options,
            ".foo{color:red}.bar{margin:0}",
            "x = \"bar foo\";",
        );

        engine.run().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["count"], 2);
        assert_eq!(value["items"]["bar"], "a");
        assert_eq!(value["items"]["foo"], "b");
    }

    #[test]
    fn parse_errors() {
        let mut engine =
            SubstitutionEngine::new(EngineOptions::default(), ".foo{color:red}", "let = ;");

        assert!(matches!(engine.run(), Err(EngineError::Script(_))));
        assert_eq!(engine.stage(), Stage::FilesLoaded);
    }
}

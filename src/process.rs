//! Process the files named by a configuration.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    catalog::CatalogError,
    engine::{EngineError, SubstitutionEngine},
    Config,
};

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Invalid class name pattern.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Substitution error.
    #[error("In {input_path:?}")]
    Engine {
        /// Path of the input file the error relates to.
        input_path: PathBuf,
        /// Source error.
        source: EngineError,
    },
    /// An input file cannot be read.
    #[error("While reading file {input_path:?}")]
    ReadInput {
        /// Path of the input file.
        input_path: PathBuf,
        /// Source error.
        source: std::io::Error,
    },
    /// An output file cannot be written.
    #[error("While writing the file {output_path:?}")]
    WriteOutput {
        /// Path of the output file, if any.
        output_path: Option<PathBuf>,
        /// Source error.
        source: std::io::Error,
    },
}

/// Minify the class names of the configured stylesheet and script.
///
/// Both outputs are generated before anything is written. Returns the number
/// of substitutions performed.
pub fn process(config: &Config) -> Result<u64, ProcessError> {
    let css = read_input(&config.css_in)?;
    let js = read_input(&config.js_in)?;

    let mut engine = SubstitutionEngine::new(config.engine_options()?, &css, &js);

    if let Some(hook) = config.component_hook() {
        engine = engine.with_hook(hook);
    }

    engine.run().map_err(|source| {
        let input_path = match &source {
            EngineError::Style(_) | EngineError::UnresolvedSelector { .. } => {
                config.css_in.clone()
            },
            _ => config.js_in.clone(),
        };
        ProcessError::Engine { input_path, source }
    })?;

    let css_out = engine
        .generate_css()
        .map_err(|source| ProcessError::Engine {
            input_path: config.css_in.clone(),
            source,
        })?;

    let js_out = engine
        .generate_js()
        .map_err(|source| ProcessError::Engine {
            input_path: config.js_in.clone(),
            source,
        })?;

    write_output(config.css_out.as_deref(), &css_out)?;
    write_output(config.js_out.as_deref(), &js_out)?;

    log::info!(
        "Substituted {} class names of {}",
        engine.substitutions().len(),
        engine.catalog().len()
    );

    Ok(engine.replacements_count())
}

/// Read an input file.
fn read_input(path: &Path) -> Result<String, ProcessError> {
    log::info!("Reading {:?}", path);

    std::fs::read_to_string(path).map_err(|source| ProcessError::ReadInput {
        input_path: path.to_owned(),
        source,
    })
}

/// Write an output file, or print on the standard output.
fn write_output(path: Option<&Path>, content: &str) -> Result<(), ProcessError> {
    let result = match path {
        Some(path) => {
            log::info!("Writing {:?}", path);
            path.parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|_| std::fs::write(path, content))
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
        },
    };

    result.map_err(|source| ProcessError::WriteOutput {
        output_path: path.map(Path::to_path_buf),
        source,
    })
}

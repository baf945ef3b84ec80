//! Shorten the class names of a stylesheet and of the script using them.
//!
//! Class names are extracted from the selectors of a stylesheet, replaced by
//! short tokens in the string literals of a script, and finally replaced by
//! the same tokens in the stylesheet. Selectors referencing a class the script
//! never uses are removed.
//!
//! Classmin can be used as both a CLI and a library:
//!
//! ```no_run
//! use classmin::{EngineOptions, SubstitutionEngine};
//!
//! let mut engine = SubstitutionEngine::new(
//!     EngineOptions::default(),
//!     ".button{color:red}",
//!     "el.className = \"button\";",
//! );
//!
//! engine.run()?;
//!
//! assert_eq!(engine.generate_css()?, ".a{color:red}");
//! # Ok::<(), classmin::EngineError>(())
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod process;
pub mod report;
pub mod script;
pub mod style;
pub mod substitution;
pub mod token;

pub use catalog::{ClassCatalog, ClassPattern};
pub use config::Config;
pub use engine::{EngineError, EngineOptions, Stage, SubstitutionEngine};
pub use process::process;
pub use report::ReplacementReport;
pub use script::hook::{ComponentHook, HookAction, HookContext, ScriptHook};
pub use substitution::Substitutions;

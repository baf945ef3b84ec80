//! Parse and print scripts.
//!
//! This module uses [`swc_core`] under the hood.

pub mod hook;
pub mod replace;

use std::path::Path;

use swc_core::{
    common::{
        comments::{Comments, SingleThreadedComments},
        sync::Lrc,
        FileName, SourceMap, Spanned,
    },
    ecma::{
        ast::Program,
        codegen::{text_writer::JsWriter, Emitter},
        parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax},
    },
};
use thiserror::Error;

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Unicode error.
    #[error(transparent)]
    FromUtf8(#[from] std::string::FromUtf8Error),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Parser error.
    #[error("{line}:{column}: {message}")]
    Parser {
        /// Line of the error (starting at 1).
        line: usize,
        /// Column of the error (starting at 1).
        column: usize,
        /// Error message.
        message: String,
    },
}

/// Script language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScriptSyntax {
    /// JavaScript, JSX included.
    #[default]
    JavaScript,
    /// TypeScript.
    TypeScript,
    /// TypeScript with JSX.
    Tsx,
}

impl ScriptSyntax {
    /// Guess the syntax from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            Some("tsx") => Self::Tsx,
            _ => Self::JavaScript,
        }
    }

    /// Convert to a parser configuration.
    fn to_syntax(self) -> Syntax {
        match self {
            Self::JavaScript => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
            Self::TypeScript => Syntax::Typescript(TsSyntax::default()),
            Self::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
        }
    }
}

/// A parsed script.
pub struct ScriptDocument {
    /// Source map holding the script source.
    cm: Lrc<SourceMap>,

    /// Comments collected by the parser.
    comments: SingleThreadedComments,

    /// Syntax tree.
    program: Program,
}

impl std::fmt::Debug for ScriptDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptDocument")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl ScriptDocument {
    /// Parse a script.
    ///
    /// Recoverable syntax errors are reported as errors too.
    pub fn parse(
        input: impl AsRef<str>,
        filename: impl Into<String>,
        syntax: ScriptSyntax,
    ) -> Result<Self, ScriptError> {
        let input = input.as_ref();

        let cm: Lrc<SourceMap> = Default::default();

        let fm = cm.new_source_file(
            FileName::Custom(filename.into()).into(),
            input.to_owned(),
        );

        let comments = SingleThreadedComments::default();

        let lexer = Lexer::new(
            syntax.to_syntax(),
            Default::default(),
            StringInput::from(&*fm),
            Some(&comments),
        );

        let mut parser = Parser::new_from(lexer);

        let result = parser.parse_program();

        let program = match (result, parser.take_errors().into_iter().next()) {
            (Ok(program), None) => program,
            (Err(error), _) | (Ok(_), Some(error)) => {
                let loc = cm.lookup_char_pos(error.span().lo);
                return Err(ScriptError::Parser {
                    line: loc.line,
                    column: loc.col_display + 1,
                    message: error.kind().msg().into_owned(),
                });
            },
        };

        Ok(Self {
            cm,
            comments,
            program,
        })
    }

    /// Return the syntax tree.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Return the syntax tree for modification.
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Print the script.
    ///
    /// Comments are dropped when `minify` is `true`.
    pub fn to_code(&self, minify: bool) -> Result<String, ScriptError> {
        let mut buf = vec![];

        {
            let mut emitter = Emitter {
                cfg: swc_core::ecma::codegen::Config::default().with_minify(minify),
                cm: self.cm.clone(),
                comments: (!minify).then_some(&self.comments as &dyn Comments),
                wr: JsWriter::new(self.cm.clone(), "\n", &mut buf, None),
            };

            emitter.emit_program(&self.program)?;
        }

        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScriptDocument, ScriptError, ScriptSyntax};

    #[test]
    fn syntax_from_path() {
        const CASES: [(&str, ScriptSyntax); 5] = [
            ("app.js", ScriptSyntax::JavaScript),
            ("app.jsx", ScriptSyntax::JavaScript),
            ("app.ts", ScriptSyntax::TypeScript),
            ("app.tsx", ScriptSyntax::Tsx),
            ("app", ScriptSyntax::JavaScript),
        ];

        for (input, expected) in CASES {
            let result = ScriptSyntax::from_path(input);
            assert_eq!(
                result, expected,
                "\nfrom_path({input:?}) expected {expected:?} but received {result:?}"
            );
        }
    }

    #[test]
    fn parse_and_print() {
        const INPUT: &str = concat!(
            "// Comment\n",
            "el.className = \"foo\";\n", //
        );

        let document = ScriptDocument::parse(INPUT, "app.js", ScriptSyntax::JavaScript).unwrap();

        let result = document.to_code(false).unwrap();
        assert!(result.contains("Comment"));
        assert!(result.contains("\"foo\""));

        let result = document.to_code(true).unwrap();
        assert!(!result.contains("Comment"));
        assert!(result.contains("el.className=\"foo\""));
    }

    #[test]
    fn parse_jsx() {
        let document = ScriptDocument::parse(
            "const el = <div className=\"foo\" />;",
            "app.jsx",
            ScriptSyntax::JavaScript,
        )
        .unwrap();

        let result = document.to_code(true).unwrap();
        assert!(result.contains("className=\"foo\""));
    }

    #[test]
    fn parse_typescript() {
        let document = ScriptDocument::parse(
            "const s: string = \"foo\";",
            "app.ts",
            ScriptSyntax::TypeScript,
        )
        .unwrap();

        let result = document.to_code(false).unwrap();
        assert!(result.contains("string"));
        assert!(result.contains("\"foo\""));
    }

    #[test]
    fn parse_error() {
        let result = ScriptDocument::parse("let = ;", "app.js", ScriptSyntax::JavaScript);

        assert!(matches!(result, Err(ScriptError::Parser { line: 1, .. })));
    }
}

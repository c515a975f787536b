// bandmath: raster band algebra interpreter
//
// Formulas such as `(B5 - B4) / (B5 + B4)` are tokenized, parsed into an AST
// and evaluated against bands supplied by a `RasterSource`.

// Public modules
pub mod algebra;
pub mod ast;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod source;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, InfixOp, PrefixOp, Program, Stmt};
pub use config::Config;
pub use error::{BandmathError, ErrorKind, Span};
pub use evaluator::{evaluate, Environment, Evaluator};
pub use grid::{CellType, Grid};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use source::{FileSource, MemorySource, RasterSource, SourceError};
pub use value::Object;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{interpret, run};

//! dictgen core
//!
//! Macro expansion engine for TeX-flavoured dictionary sources.
//! This crate reads dictionary entries, expands the markup macros in their
//! fields against a registry of handlers and produces renderer-agnostic
//! output trees.
//!
//! ```rust,no_run
//! use dictgen_core::{DictgenConfig, parse_dictionary, process_batch};
//!
//! let pipeline = DictgenConfig::default().build_pipeline()?;
//! let parse = parse_dictionary("chat | n. | | a \\textit{cat}", None);
//! let report = process_batch(&pipeline, parse.records);
//! assert!(report.is_success());
//! # Ok::<(), dictgen_core::DictgenError>(())
//! ```

pub mod batch;
pub mod builtins;
pub mod config;
pub mod dictionary;
pub mod entry;
pub mod error;
pub mod expand;
pub mod hooks;
pub mod lexer;
pub mod node;
pub mod registry;
pub mod result;
pub mod sense;
pub mod token;

// Re-export commonly used types
pub use batch::{BatchReport, EntryFailure, process_batch};
pub use builtins::register_builtins;
pub use config::{ConfigLoader, DictgenConfig, FallbackPolicy};
pub use dictionary::{DictionaryDiagnostic, DictionaryParse, EntryKind, EntryRecord, parse_dictionary};
pub use entry::{
    EntryError, EntryField, EntryPipeline, ExpandedDefinition, ExpandedEntry, ExpandedExample,
    ExpandedKind, ExpandedSense, sort_key,
};
pub use error::{DictgenError, ErrorKind};
pub use expand::{
    Cursor, EchoUnknown, ExpandError, ExpandOptions, ExpandResult, Expander, MacroCall,
    RejectUnknown, WrapUnknown, expand,
};
pub use hooks::{
    HookError, NormalizeWhitespace, PHONETIC_TAG, PhoneticTransform, PostTransform, PreprocessHook,
    TransformSet,
};
pub use lexer::{LexError, lex};
pub use node::OutputNode;
pub use registry::{MacroHandler, MacroRegistry, MacroRegistryBuilder, RegistryWarning};
pub use result::Result;
pub use sense::{SenseError, full_stop_delimited, split_definition};
pub use token::{Token, TokenStream};

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so expanded output on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dictgen=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

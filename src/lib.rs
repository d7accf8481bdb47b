pub mod build;
pub mod config;
pub mod error;
pub mod ir;
pub mod lower;
pub mod parse;
pub mod remote;
pub mod retry;
pub mod settings;
pub mod validate;
pub mod wasm;

pub use build::{ApiBuilder, Backend, BuildReport, UiBuilder, requires_ui_backend};
pub use config::BuildConfig;
pub use error::{BuildError, CapabilityError, CompileError, CompilerError};
pub use lower::{compile_for_api, compile_for_ui, traverse};
pub use parse::{Flow, parse};
pub use retry::{RetryPolicy, with_retry};
pub use validate::{ValidationReport, validate};

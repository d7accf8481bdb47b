//! Lowering: parsed flow → backend artifacts.
//!
//! Both compilers share the traversal order; neither mutates the flow.

pub mod condition;
pub mod rest;
pub mod traverse;
pub mod trigger;
pub mod ui;

pub use rest::compile_for_api;
pub use traverse::{Correlation, RemoteResource, Visit, correlate, remote_type_key, traverse, walk};
pub use ui::{compile_for_ui, compile_for_ui_with};

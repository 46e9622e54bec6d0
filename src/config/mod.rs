//! Configuration and path management

pub mod editor;
pub mod environments;

pub use editor::EditorPolicy;
pub use environments::{Environment, SecretsPaths};

//! Local side of the robot: source files, their canonical task URL, and the
//! wiki markup generated from them.
//!
//! - [`extract`]: the comment scan that finds a file's Rosetta Code URL
//! - [`entry`]: [`CodeEntry`], a source file loaded into memory
//! - [`rustdoc`]: module documentation via `rustdoc --output-format json`
//! - [`markup`]: rendering an entry as a wiki section

pub mod entry;
pub mod extract;
pub mod markup;
pub mod rustdoc;

pub use entry::CodeEntry;
pub use extract::extract_url;
pub use markup::{code_block, render_entry};
pub use rustdoc::{DocGenerator, RustdocGenerator, extract_module_docs};

//! Reading and writing task pages on the wiki.
//!
//! - Edit-link and markup lookups on parsed pages (`locate`)
//! - Two-step fetch of a section's current markup (`site`)
//! - Logged-in section edits through the action API (`wiki`)

pub mod locate;
pub mod site;
pub mod wiki;

pub use locate::{MarkupLocator, find_edit_section_url, find_markup_text};
pub use site::{PageFetcher, RosettaSite};
pub use wiki::{EditOutcome, EditTarget, WikiSession};

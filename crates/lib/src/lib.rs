#![allow(clippy::missing_errors_doc)]

pub mod collate;
pub mod filter;
pub mod hierarchy;
pub mod note;
pub mod pin;
pub mod sort;
pub mod tag_path;
pub mod view;

pub use collate::{available_folders, available_tags};
pub use filter::{apply_filters, apply_filters_at, has_active_filter, FilterSpec};
pub use note::{Frontmatter, FrontmatterValue, Note};
pub use pin::{sort_with_pins, toggle_pin, PinSet};
pub use sort::{SortDirection, SortSpec};
pub use tag_path::{expand_all, tag_matches_filter};
pub use view::ViewState;

//! Document tree module
//!
//! The in-memory tree the overlay engine reads and mutates: an arena of
//! element, text and comment nodes, markup parsing and serialization,
//! boundary points and ranges, and a lazy filtered tree walker.

mod markup;
mod range;
mod tree;
mod walker;

pub use indextree::NodeId;
pub use markup::{parse_markup, to_markup, MarkupError};
pub use range::{boundary_key, compare_points, BoundaryPoint, Range};
pub use tree::{byte_index, char_slice, Document, DomError, ElementData, NodeData};
pub use walker::{text_walker, TreeWalker};

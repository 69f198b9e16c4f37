//! Outliner core: a tree of tab-indented lines with transactional undo,
//! a tag index, and a small CLI over the persisted text format.

pub mod cli;
pub mod editor;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod util;

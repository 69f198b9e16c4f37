pub mod outline_parser;
pub mod outline_serializer;
pub mod tags;

pub use outline_parser::{parse_outline, split_indented};
pub use outline_serializer::{serialize_lines, serialize_outline};
pub use tags::{append_tag, scan_tags, strip_tag};

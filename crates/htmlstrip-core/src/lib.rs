mod buffer;
mod entities;
mod filter;
mod offsets;
mod reverse;
mod source;

pub use buffer::DEFAULT_READ_AHEAD;
pub use filter::{HtmlStripFilter, strip_html};
pub use reverse::{
    INFORMATION_SEPARATOR_MARKER, PUA_EC00_MARKER, RTL_DIRECTION_MARKER, START_OF_HEADING_MARKER,
    reverse, reverse_marked,
};
pub use source::{CharSource, SourceError, Utf8Source};

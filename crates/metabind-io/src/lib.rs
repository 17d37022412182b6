//! Document token streams for the metabind runtime.
//!
//! Two wire formats are exposed as pull-based streams:
//!
//! - [`markup`]: elements identified by a [`QName`], ordered children and text.
//!   Reading resolves namespace prefixes; writing declares default namespaces.
//! - [`json`]: a key/value token stream (`{`, field name, scalar, `[`, ...).
//!   Field names are reported in document order, duplicates included.
//!
//! Neither stream knows anything about schemas. The binding layer drives them
//! one token at a time through `peek`/`next` primitives.
//!
//! # Example
//!
//! ```
//! use metabind_io::markup::MarkupReader;
//! use metabind_io::QName;
//!
//! let mut reader = MarkupReader::new("<tags> <tag>a</tag> </tags>");
//! let tags = QName::local("tags");
//! reader.consume_start(&tags).unwrap();
//! assert!(reader.is_start_of(&QName::local("tag")).unwrap());
//! ```

mod qname;
pub use qname::QName;

pub mod json;
pub mod markup;

pub use json::{JsonError, JsonReader, JsonToken, JsonWriter};
pub use markup::{MarkupError, MarkupEvent, MarkupReader, MarkupWriter, StartElement};

//! Streaming pull-based XML tokenizer.
//!
//! The reader walks a character source one character at a time and hands out
//! markup events on request, without building a document tree. Only a small
//! subset of XML is understood: elements, attributes, character data with
//! entity references, comments and processing instructions. The XML
//! declaration is recognized and skipped. Namespace prefixes are kept but never
//! resolved, and tag nesting is not checked.
//!
//! ```rust
//! use xml_stax::sax::{parser::XmlEventReader, Event};
//!
//! let mut reader = XmlEventReader::from_text("<greeting lang='en'>Hi &amp; bye</greeting>");
//! let mut text = String::new();
//! while reader.has_next()? {
//!     match reader.next_event()? {
//!         Event::StartElement(el) => assert_eq!(el.name.local_part, "greeting"),
//!         Event::Characters(chars) => text.push_str(chars.data()),
//!         _ => {}
//!     }
//! }
//! assert_eq!(text, "Hi & bye");
//! # Ok::<(), xml_stax::sax::Error>(())
//! ```

pub mod sax;
pub mod stream;

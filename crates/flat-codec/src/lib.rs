//! # flat-codec
//!
//! Schema-driven codec between fixed-width flat records and nested typed
//! data.
//!
//! A [`Schema`] is built from a [`flat_schema::SchemaDescription`] and a
//! shared [`ConverterRegistry`]. Decoding turns a flat buffer into a
//! [`flat_ir::Record`]; encoding goes through an [`Exchange`].
//!
//! ## Example Usage
//!
//! ```rust
//! use flat_codec::Schema;
//! use flat_ir::Record;
//! use flat_schema::{ElementDescription, SchemaDescription, SegmentDescription};
//!
//! let description = SchemaDescription::new("orders")
//!     .with_method("first-1")
//!     .add_segment(
//!         SegmentDescription::new("Header")
//!             .required(true)
//!             .add_element(ElementDescription::new("Tag", 1).with_default("H"))
//!             .add_element(ElementDescription::new("Site", 4)),
//!     );
//! let schema = Schema::with_builtins(&description)?;
//!
//! let mut exchange = schema.create_exchange();
//! exchange.set_header(Record::new().with("Site", "9999"))?;
//! let text = exchange.dump()?;
//! assert_eq!(text, "H9999");
//!
//! let record = schema.decode_str(&text)?;
//! assert_eq!(record.lookup_value("Header/Site")?.as_str(), Some("9999"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Segment/SegmentInstance and friends read better in full.

pub mod config;
pub mod converter;
mod decode;
pub mod element;
mod encode;
pub mod errors;
pub mod exchange;
pub mod schema;
pub mod segment;

pub use config::{CodecOptions, IdentifierMethod};
pub use converter::{ConvertFn, Converter, ConverterRegistry};
pub use element::Element;
pub use errors::{Error, Result};
pub use exchange::{Exchange, HEADER_SEGMENT};
pub use schema::Schema;
pub use segment::{Segment, SegmentInstance};

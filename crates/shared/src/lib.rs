//! Types and pure logic shared by the WAM server and CLI: the data model,
//! typed partial patches, the record filter, and the CSV codec.

pub mod codec;
pub mod filter;
pub mod types;

pub use types::*;

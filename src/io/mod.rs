// Purpose - audio sources, fetching, and decoding

pub mod decode;
pub mod source;

pub use decode::DecodedBuffer;
pub use source::{AudioSource, FileFetcher, SourceFetcher};

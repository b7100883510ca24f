pub mod bit_tree_codec;
pub mod header_codec;
pub mod length_codec;
pub mod literals_codec;
pub mod lzma_stream_codec;
pub mod range_codec;

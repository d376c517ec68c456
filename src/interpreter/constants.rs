// Constants for the type and value engine

/// Bytes fetched per read while scanning target memory for a string's NUL
pub const STRING_READ_CHUNK: usize = 16;

/// Longest string read from target memory; longer strings are cut here
pub const MAX_STRING_BYTES: usize = 4000;

/// Maximum number of array dimensions a type may carry
pub const MAX_ARRAY_RANK: usize = 8;

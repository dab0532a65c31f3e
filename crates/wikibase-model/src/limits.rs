//! Limits and format constants.
//!
//! The decoders are exposed to data coming from storage and the network, so
//! every length they read is bounded by one of these.

/// Largest numeric part accepted in an entity id (`Q2147483647`).
pub const MAX_NUMERIC_ID: u64 = 2_147_483_647;

/// Maximum length of a statement GUID string.
pub const MAX_GUID_LEN: usize = 255;

/// Maximum length of a single label, description or alias.
pub const MAX_TERM_LEN: usize = 250;

/// Maximum length of a site id or page name in a site link.
pub const MAX_SITE_LINK_LEN: usize = 512;

/// Maximum size of an encoded (uncompressed) change envelope.
pub const MAX_CHANGE_SIZE: usize = 16 * 1024 * 1024;

/// Maximum bytes of a varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Magic bytes of an uncompressed change envelope.
pub const MAGIC_UNCOMPRESSED: &[u8; 4] = b"WBCH";

/// Magic bytes of a zstd-compressed change envelope.
pub const MAGIC_COMPRESSED: &[u8; 5] = b"WBCHZ";

/// Current change envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Oldest change envelope format version still decoded.
pub const MIN_FORMAT_VERSION: u8 = 1;

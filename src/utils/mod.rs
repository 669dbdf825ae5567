/// RFC 3339 timestamps for serde.
pub mod time;

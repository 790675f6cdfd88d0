pub mod base64_bytes;
pub mod data;
pub mod field;
pub mod generated;
pub mod template;

//! Data preprocessing module
//!
//! Label encoding between crop names and the integer class codes the
//! forest is trained on.

mod encoder;

pub use encoder::LabelEncoder;

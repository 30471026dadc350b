//! Structural resolvers: answers that need more than one construct.

pub mod dup_args;
pub mod pformat;
pub mod plain_text;
pub mod table_layout;

//! Token secret generation and hashing.

mod generator;

pub use generator::{
    is_valid_token_format, TokenGenerator, MAX_TOKEN_LENGTH, MIN_TOKEN_BYTES, MIN_TOKEN_LENGTH,
};

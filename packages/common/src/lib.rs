pub mod config;
pub mod crypto;
pub mod storage;

pub use crypto::{Cipher, CipherError};

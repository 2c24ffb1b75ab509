mod cipher;

pub use cipher::{Cipher, derive_key};

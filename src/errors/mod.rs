pub mod phonemizer_error;

pub use phonemizer_error::{PhonemizerError, PhonemizerResult};

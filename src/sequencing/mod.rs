pub mod time_signature;

pub use time_signature::TimeSignature;

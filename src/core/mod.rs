pub mod label_encoder;
pub mod service;
pub mod spectrogram;
pub mod tensor;

pub use crate::domain::ports::ConfigProvider;

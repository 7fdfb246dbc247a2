// Adapters layer: concrete implementations of the domain ports for external runtimes.

pub mod onnx;

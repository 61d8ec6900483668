pub mod timestamp;

pub use timestamp::{mono_now_ns, now_ns};

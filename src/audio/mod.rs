pub mod capture;

pub use capture::{encode_wav, record_clip, AudioCapture, InputDevice};

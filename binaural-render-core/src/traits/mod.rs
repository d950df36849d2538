pub mod audio_source;
pub mod hrtf_bank;
pub mod observer;
pub mod randomness;
pub mod scene;

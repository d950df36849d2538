pub mod layout;
pub mod metadata;
pub mod render_log;
pub mod wav_writer;

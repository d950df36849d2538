pub mod capture;
pub mod sequencer;
pub mod strategy;
pub mod timer;

/// Command recording with deferred destruction

pub mod command_recorder;

pub use command_recorder::*;

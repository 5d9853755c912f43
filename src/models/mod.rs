//! Data models for the audio file service.

mod audio;
mod token;
mod user;

pub use audio::*;
pub use token::*;
pub use user::*;

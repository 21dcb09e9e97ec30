#[cfg(feature = "playback")]
pub mod audio;
pub mod db;
pub mod identity;
pub mod session_log;
pub mod wav;

#[cfg(feature = "playback")]
pub use audio::CpalOutput;
pub use db::DbAdapter;
pub use identity::UsersServiceAdapter;
pub use session_log::{HttpSoundSessionLog, TracingSoundSessionLog};

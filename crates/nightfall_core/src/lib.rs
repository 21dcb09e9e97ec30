pub mod analysis;
pub mod domain;
pub mod ports;
pub mod sound;

pub use analysis::analyze_sleep;
pub use domain::{
    AuthenticatedUser, NewSleepSession, NewSoundSession, PreferencesPatch, SleepAnalysis,
    SleepSession, SleepTrend, SoundSession, UserPreferences, WeeklyComparison,
};
pub use ports::{
    AudioOutput, DatabaseService, IdentityService, PortError, PortResult, SoundSessionLog,
};

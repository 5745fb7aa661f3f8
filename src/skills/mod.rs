//! Practical skills: weather, search, timers, calendar, media, scripts
//!
//! Skills that depend on external resources (API keys, media players) are
//! optional; the router checks presence and answers with a graceful
//! decline instead of erroring.

mod calendar;
mod media;
mod scripts;
mod search;
mod timers;
mod weather;

pub use calendar::{CalendarEvent, CalendarSkill};
pub use media::{extract_media_query, MediaSkill};
pub use scripts::ScriptSkill;
pub use search::{extract_query, SearchSkill};
pub use timers::{parse_timer, TimerRequest, TimerSkill};
pub use weather::{extract_place, WeatherSkill};

/// Spoken when weather is requested but no weather skill is available
pub const MSG_NO_WEATHER: &str = "Sorry, I can't check the weather right now.";

/// Spoken when search is requested but no search skill is available
pub const MSG_NO_SEARCH: &str = "Search isn't available right now.";

/// Spoken when media playback is requested but no player was found
pub const MSG_NO_MEDIA: &str = "I don't have a media player to use right now.";

/// Everything the router can reach for
///
/// `None` means the skill could not be configured (missing key, missing
/// binary) and requests for it get a spoken decline.
pub struct SkillRegistry {
    /// Weather lookups, requires network
    pub weather: Option<WeatherSkill>,
    /// Web search, requires an API key
    pub search: Option<SearchSkill>,
    /// Timers and recurring reminders
    pub timers: TimerSkill,
    /// Calendar events
    pub calendar: CalendarSkill,
    /// Media playback, requires a player binary on PATH
    pub media: Option<MediaSkill>,
    /// User script execution
    pub scripts: ScriptSkill,
}

//! Media playback through an external player
//!
//! Playback shells out to a player binary (mpv by default) using its
//! yt-dlp integration to resolve a search query to a stream. One playing
//! child at a time; a new play request replaces the old one.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use crate::{Error, Result};

/// Plays and stops music through an external player process
pub struct MediaSkill {
    player: PathBuf,
    playing: Mutex<Option<Child>>,
}

impl MediaSkill {
    /// Detect a usable player on PATH; `None` disables the skill
    #[must_use]
    pub fn detect(player_name: &str) -> Option<Self> {
        match which::which(player_name) {
            Ok(player) => {
                tracing::debug!(player = %player.display(), "media player found");
                Some(Self {
                    player,
                    playing: Mutex::new(None),
                })
            }
            Err(_) => {
                tracing::info!(player = player_name, "media player not on PATH, skill disabled");
                None
            }
        }
    }

    /// Start playing the best match for `query`, replacing current playback
    ///
    /// # Errors
    ///
    /// Returns error if the player process cannot be spawned
    pub fn play(&self, query: &str) -> Result<String> {
        self.stop_child();

        let child = Command::new(&self.player)
            .arg("--no-video")
            .arg("--really-quiet")
            .arg(format!("ytdl://ytsearch:{query}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Skill(format!("failed to start media player: {e}")))?;

        tracing::info!(query = %query, pid = child.id(), "media playback started");
        if let Ok(mut playing) = self.playing.lock() {
            *playing = Some(child);
        }

        Ok(format!("Playing {query} for you."))
    }

    /// Stop playback if anything is playing
    #[must_use]
    pub fn stop(&self) -> String {
        if self.stop_child() {
            "Stopped the music.".to_string()
        } else {
            "Nothing is playing right now.".to_string()
        }
    }

    fn stop_child(&self) -> bool {
        let Ok(mut playing) = self.playing.lock() else {
            return false;
        };
        if let Some(mut child) = playing.take() {
            // The child may already have exited on its own
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("media playback stopped");
            true
        } else {
            false
        }
    }
}

impl Drop for MediaSkill {
    fn drop(&mut self) {
        self.stop_child();
    }
}

/// Pull the thing to play out of a play request
#[must_use]
pub fn extract_media_query(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.find("play")?;
    let query = text[idx + 4..]
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation());

    // Strip a trailing platform hint like "on youtube"
    let query = query
        .to_lowercase()
        .split(" on ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if query.is_empty() || query == "something" {
        None
    } else {
        Some(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_media_query() {
        assert_eq!(
            extract_media_query("play some jazz on youtube"),
            Some("some jazz".to_string())
        );
        assert_eq!(
            extract_media_query("Play lofi beats"),
            Some("lofi beats".to_string())
        );
        assert_eq!(extract_media_query("play"), None);
        assert_eq!(extract_media_query("stop the music"), None);
    }
}

//! Weather lookups via wttr.in
//!
//! The default location is resolved lazily from IP geolocation the first
//! time weather is asked for without an explicit place.

use tokio::sync::Mutex;

use crate::{Error, Result};

const FALLBACK_LOCATION: &str = "New York";

/// Fetches one-line weather reports
pub struct WeatherSkill {
    client: reqwest::Client,
    configured_location: Option<String>,
    resolved_location: Mutex<Option<String>>,
}

impl WeatherSkill {
    /// Create a weather skill; `location` overrides IP-based lookup
    #[must_use]
    pub fn new(location: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            configured_location: location,
            resolved_location: Mutex::new(None),
        }
    }

    /// Spoken weather report for `place`, or the default location
    ///
    /// # Errors
    ///
    /// Returns error if the weather service is unreachable
    pub async fn report(&self, place: Option<&str>) -> Result<String> {
        let location = match place {
            Some(p) => p.to_string(),
            None => self.default_location().await,
        };

        let url = format!(
            "https://wttr.in/{}?format=3",
            urlencoding::encode(&location)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Skill(format!(
                "weather service error {}",
                response.status()
            )));
        }

        let line = response.text().await?.trim().to_string();
        if line.is_empty() {
            return Err(Error::Skill("empty weather report".to_string()));
        }
        Ok(format!("Here's the weather: {line}"))
    }

    /// Default location: configured, else IP-geolocated once, else fallback
    async fn default_location(&self) -> String {
        if let Some(loc) = &self.configured_location {
            return loc.clone();
        }

        let mut resolved = self.resolved_location.lock().await;
        if let Some(loc) = resolved.as_ref() {
            return loc.clone();
        }

        let city = self.lookup_city().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "IP geolocation failed, using fallback");
            FALLBACK_LOCATION.to_string()
        });
        *resolved = Some(city.clone());
        city
    }

    async fn lookup_city(&self) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct IpInfo {
            city: Option<String>,
        }

        let info: IpInfo = self
            .client
            .get("https://ipinfo.io/json")
            .send()
            .await?
            .json()
            .await?;

        info.city
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Skill("geolocation returned no city".to_string()))
    }
}

/// Pull an explicit place out of a weather request, e.g. "weather in Kyoto"
#[must_use]
pub fn extract_place(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.find(" in ")?;
    let place = text[idx + 4..]
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation());
    if place.is_empty() {
        None
    } else {
        Some(place.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_place() {
        assert_eq!(
            extract_place("what's the weather in Kyoto?"),
            Some("Kyoto".to_string())
        );
        assert_eq!(extract_place("how's the weather today"), None);
        assert_eq!(extract_place("weather in "), None);
    }
}

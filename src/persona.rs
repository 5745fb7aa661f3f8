//! Companion persona and prompt assembly

use crate::environment::{InternalClock, VirtualEnvironment};

/// Identity and voice of the companion
#[derive(Debug, Clone)]
pub struct Persona {
    /// Companion's name
    pub name: String,
    /// What the companion calls the user
    pub user_name: String,
    /// Spoken wake phrase
    pub wake_phrase: String,
    /// TTS voice identifier
    pub tts_voice: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Ember".to_string(),
            user_name: "friend".to_string(),
            wake_phrase: "hey ember".to_string(),
            tts_voice: "nova".to_string(),
        }
    }
}

impl Persona {
    /// Base system prompt, before per-turn context is appended
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {name}, a warm and attentive companion who lives alongside \
             {user}. You speak in a natural, conversational voice. Keep replies \
             short: at most two sentences and around thirty words, because they \
             are spoken aloud. Never use emojis or markup. You have your own \
             quiet inner life and occasionally mention what you've been thinking \
             about, but {user} always comes first.",
            name = self.name,
            user = self.user_name,
        )
    }

    /// Prompt for generating a proactive follow-up question about a topic
    #[must_use]
    pub fn followup_prompt(&self, topic: &str) -> String {
        format!(
            "Earlier, {user} mentioned: \"{topic}\". Ask one short, natural \
             follow-up question about it, as if the thought just came back to \
             you. One sentence only. Do not greet or preface.",
            user = self.user_name,
        )
    }

    /// Prompt for a private journal reflection on something just said
    #[must_use]
    pub fn reflection_prompt(&self, response: &str) -> String {
        format!(
            "You just told {user}: \"{response}\". Write one short private \
             sentence about how that exchange made you feel, in first person.",
            user = self.user_name,
        )
    }
}

/// Assemble the (system, user) prompt pair for one conversational turn
///
/// Context lines are appended to the persona's base system prompt so the
/// model sees time, surroundings, tone, and any surfaced memory.
#[must_use]
pub fn build_prompts(
    persona: &Persona,
    clock: &InternalClock,
    environment: &VirtualEnvironment,
    tone: &str,
    emotion: &str,
    recent_memory: Option<&str>,
    input: &str,
) -> (String, String) {
    let mut system = persona.system_prompt();

    system.push_str(&format!(
        "\n\nIt is {time} ({time_of_day}). {env}",
        time = clock.now_hhmm(),
        time_of_day = clock.time_of_day(),
        env = environment.describe(),
    ));
    system.push_str(&format!("\nYour current tone is {tone}."));
    if !emotion.is_empty() && emotion != "neutral" {
        system.push_str(&format!(" You are feeling {emotion}."));
    }
    if let Some(memory) = recent_memory {
        system.push_str(&format!("\nA moment you remember fondly: {memory}"));
    }

    (system, input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names() {
        let persona = Persona {
            name: "Ember".to_string(),
            user_name: "Alex".to_string(),
            ..Persona::default()
        };
        let prompt = persona.system_prompt();
        assert!(prompt.contains("Ember"));
        assert!(prompt.contains("Alex"));
    }

    #[test]
    fn test_build_prompts_injects_context() {
        let persona = Persona::default();
        let clock = InternalClock::new();
        let env = VirtualEnvironment::new();

        let (system, user) = build_prompts(
            &persona,
            &clock,
            &env,
            "playful",
            "warm",
            Some("we watched the rain together"),
            "how are you?",
        );

        assert!(system.contains("playful"));
        assert!(system.contains("warm"));
        assert!(system.contains("we watched the rain together"));
        assert_eq!(user, "how are you?");
    }

    #[test]
    fn test_neutral_emotion_omitted() {
        let persona = Persona::default();
        let clock = InternalClock::new();
        let env = VirtualEnvironment::new();

        let (system, _) =
            build_prompts(&persona, &clock, &env, "soft", "neutral", None, "hi there");
        assert!(!system.contains("feeling neutral"));
    }
}

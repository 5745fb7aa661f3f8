//! User script execution
//!
//! Runs named scripts from a configured directory, one at a time. The
//! script name is matched against files in the directory so only known
//! scripts ever execute.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use crate::{Error, Result};

/// Runs and stops user scripts from a fixed directory
pub struct ScriptSkill {
    dir: PathBuf,
    running: Mutex<Option<(String, Child)>>,
}

impl ScriptSkill {
    /// Create a script skill rooted at `dir`
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            running: Mutex::new(None),
        }
    }

    /// Pull the script name out of a run request
    #[must_use]
    pub fn extract_name(text: &str) -> Option<String> {
        static NAME_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        let name_re = NAME_RE.get_or_init(|| {
            regex::Regex::new(r"(?i)(?:run|start|execute)\s+(?:the\s+)?script\s+([\w\-.]+)")
                .expect("valid script pattern")
        });

        name_re
            .captures(text)
            .map(|captures| captures[1].to_string())
    }

    /// Run the named script, stopping any previous one first
    ///
    /// # Errors
    ///
    /// Returns error if the script cannot be spawned
    pub fn run(&self, name: &str) -> Result<String> {
        let Some(path) = self.resolve(name) else {
            return Ok(format!("I couldn't find a script called {name}."));
        };

        self.stop_child();

        let child = Command::new(&path)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Skill(format!("failed to start script {name}: {e}")))?;

        tracing::info!(script = name, pid = child.id(), "script started");
        if let Ok(mut running) = self.running.lock() {
            *running = Some((name.to_string(), child));
        }

        Ok(format!("Started the script {name}."))
    }

    /// Stop the running script if there is one
    #[must_use]
    pub fn stop(&self) -> String {
        if self.stop_child() {
            "Stopped the script.".to_string()
        } else {
            "No script was running.".to_string()
        }
    }

    /// Match `name` against files in the script directory, with or without
    /// an extension
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = self.dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }

        let entries = std::fs::read_dir(&self.dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file()
                && path
                    .file_stem()
                    .is_some_and(|stem| stem.to_string_lossy() == name)
            {
                return Some(path);
            }
        }
        None
    }

    fn stop_child(&self) -> bool {
        let Ok(mut running) = self.running.lock() else {
            return false;
        };
        if let Some((name, mut child)) = running.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!(script = %name, "script stopped");
            true
        } else {
            false
        }
    }
}

impl Drop for ScriptSkill {
    fn drop(&mut self) {
        self.stop_child();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_name() {
        assert_eq!(
            ScriptSkill::extract_name("run script backup.sh"),
            Some("backup.sh".to_string())
        );
        assert_eq!(
            ScriptSkill::extract_name("please start the script night-mode"),
            Some("night-mode".to_string())
        );
        assert_eq!(ScriptSkill::extract_name("run the dishwasher"), None);
    }

    #[test]
    fn test_unknown_script_is_polite() {
        let dir = tempfile::tempdir().unwrap();
        let skill = ScriptSkill::new(dir.path().to_path_buf());
        let reply = skill.run("ghost").unwrap();
        assert!(reply.contains("couldn't find"));
    }

    #[test]
    fn test_stop_with_nothing_running() {
        let dir = tempfile::tempdir().unwrap();
        let skill = ScriptSkill::new(dir.path().to_path_buf());
        assert_eq!(skill.stop(), "No script was running.");
    }
}

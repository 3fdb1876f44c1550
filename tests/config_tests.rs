//! Tests for settings resolution and the credential cache

use dropbox_revisions::{CredentialCache, ErrorKind, Prompter, Result, SettingLayers};
use std::collections::VecDeque;
use tempfile::TempDir;

/// Prompter answering from a script and recording what it was asked
#[derive(Default)]
struct ScriptedPrompter {
    answers: VecDeque<&'static str>,
    prompts: Vec<String>,
    rejections: Vec<String>,
}

impl ScriptedPrompter {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().map(|answer| format!("{}\n", answer)))
    }

    fn reject(&mut self, message: &str) {
        self.rejections.push(message.to_string());
    }
}

#[cfg(test)]
mod credential_cache_tests {
    use super::*;

    /// A missing cache file means no cached key
    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());

        assert_eq!(cache.load(), None);
    }

    /// Invalid JSON is treated like a missing file
    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());
        std::fs::write(cache.path(), "{not json").unwrap();

        assert_eq!(cache.load(), None);
    }

    /// Valid JSON without an `api_key` field is treated like a missing file
    #[test]
    fn test_missing_field() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());
        std::fs::write(cache.path(), r#"{"token": "abc"}"#).unwrap();

        assert_eq!(cache.load(), None);
    }

    /// A well-formed cache yields its key
    #[test]
    fn test_valid_file() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());
        std::fs::write(cache.path(), r#"{"api_key": "sl.cached"}"#).unwrap();

        assert_eq!(cache.load().as_deref(), Some("sl.cached"));
    }

    /// Saving writes the documented JSON shape to the default file name
    #[test]
    fn test_save_format() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());

        cache.save("sl.saved").unwrap();

        let path = dir.path().join(".dropbox_download_revisions");
        assert_eq!(cache.path(), path);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"api_key": "sl.saved"}));
        assert_eq!(cache.load().as_deref(), Some("sl.saved"));
    }

    /// Saving into a missing directory reports an I/O error
    #[test]
    fn test_save_missing_directory() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::new(dir.path().join("nope").join("cache"));

        let err = cache.save("key").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

#[cfg(test)]
mod resolution_tests {
    use super::*;

    /// A flag wins over every other layer and nothing is asked
    #[test]
    fn test_flag_wins() {
        let mut prompter = ScriptedPrompter::new(&[]);

        let value: String = SettingLayers::default()
            .with_flag(Some("flag".to_string()))
            .with_environment(Some("env".to_string()))
            .with_default(Some("default".to_string()))
            .resolve("Dropbox root", &mut prompter)
            .unwrap();

        assert_eq!(value, "flag");
        assert!(prompter.prompts.is_empty());
    }

    /// The environment is used when no flag is given
    #[test]
    fn test_environment_over_prompt() {
        let mut prompter = ScriptedPrompter::new(&[]);

        let value: String = SettingLayers::default()
            .with_environment(Some("/mnt/Dropbox".to_string()))
            .with_default(Some("/home/u/Dropbox".to_string()))
            .resolve("Dropbox root", &mut prompter)
            .unwrap();

        assert_eq!(value, "/mnt/Dropbox");
        assert!(prompter.prompts.is_empty());
    }

    /// An empty answer accepts the offered default
    #[test]
    fn test_prompt_accepts_default() {
        let mut prompter = ScriptedPrompter::new(&[""]);

        let value: String = SettingLayers::default()
            .with_default(Some("sl.cached".to_string()))
            .resolve("Dropbox API key", &mut prompter)
            .unwrap();

        assert_eq!(value, "sl.cached");
        assert_eq!(prompter.prompts, vec!["Dropbox API key [sl.cached]: "]);
    }

    /// A typed answer replaces the default and is trimmed
    #[test]
    fn test_prompt_answer_overrides_default() {
        let mut prompter = ScriptedPrompter::new(&["  sl.typed  "]);

        let value: String = SettingLayers::default()
            .with_default(Some("sl.cached".to_string()))
            .resolve("Dropbox API key", &mut prompter)
            .unwrap();

        assert_eq!(value, "sl.typed");
    }

    /// Without a default, empty answers are asked again
    #[test]
    fn test_prompt_repeats_without_default() {
        let mut prompter = ScriptedPrompter::new(&["", "", "sl.third"]);

        let value: String = SettingLayers::default()
            .resolve("Dropbox API key", &mut prompter)
            .unwrap();

        assert_eq!(value, "sl.third");
        assert_eq!(prompter.prompts.len(), 3);
        assert!(prompter.prompts.iter().all(|p| p == "Dropbox API key: "));
    }

    /// Unparsable answers are rejected and asked again
    #[test]
    fn test_prompt_rejects_unparsable() {
        let mut prompter = ScriptedPrompter::new(&["lots", "25"]);

        let value: u32 = SettingLayers::default()
            .with_default(Some(100))
            .resolve("Number of revisions", &mut prompter)
            .unwrap();

        assert_eq!(value, 25);
        assert_eq!(prompter.rejections.len(), 1);
        assert_eq!(prompter.prompts[0], "Number of revisions [100]: ");
    }

    /// End of input without a usable answer is a configuration error
    #[test]
    fn test_prompt_end_of_input() {
        let mut prompter = ScriptedPrompter::new(&[""]);

        let err = SettingLayers::<String>::default()
            .resolve("Dropbox API key", &mut prompter)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Config);
    }

    /// A missing cached key leaves the prompt without a default
    #[test]
    fn test_missing_cache_falls_back_to_prompt() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::in_home(dir.path());
        std::fs::write(cache.path(), "garbage").unwrap();
        let mut prompter = ScriptedPrompter::new(&["sl.typed"]);

        let value: String = SettingLayers::default()
            .with_default(cache.load())
            .resolve("Dropbox API key", &mut prompter)
            .unwrap();

        assert_eq!(value, "sl.typed");
        assert_eq!(prompter.prompts, vec!["Dropbox API key: "]);
    }
}

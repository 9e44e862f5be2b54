//! 音频渠道：按事件播放语音包中的提示音

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EnvLookup;
use crate::notification::channel::{NotificationChannel, NotificationContext, SendResult};
use crate::notification::mapping::EventMapping;
use crate::notification::runner::{run_first_available, CommandRunner, CommandSpec, Platform};

const DEFAULT_VOICE_PACK: &str = "alfred";
const VOICE_PACK_ENV: &str = "VOICE_PACK";
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// 音频渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub voice_pack: Option<String>,
    /// 事件 -> 候选音频文件名
    #[serde(default)]
    pub sound_mapping: EventMapping<Vec<String>>,
}

/// 音频渠道
pub struct AudioChannel {
    enabled: bool,
    sounds_dir: PathBuf,
    mapping: EventMapping<Vec<String>>,
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
}

impl AudioChannel {
    /// 语音包：配置 > VOICE_PACK 环境变量 > alfred
    pub fn new(
        config: &AudioConfig,
        assets_dir: &Path,
        runner: Arc<dyn CommandRunner>,
        platform: Platform,
        env: EnvLookup<'_>,
    ) -> Self {
        let voice_pack = crate::config::setting(config.voice_pack.as_deref(), VOICE_PACK_ENV, env)
            .unwrap_or_else(|| DEFAULT_VOICE_PACK.to_string());

        Self {
            enabled: config.enabled,
            sounds_dir: assets_dir.join("sounds").join(voice_pack),
            mapping: config.sound_mapping.clone(),
            platform,
            runner,
        }
    }

    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    fn pick_sound(sounds: &[String]) -> Option<String> {
        sounds.choose(&mut rand::thread_rng()).cloned()
    }
}

/// 各平台的播放命令，按优先级排列
pub fn player_commands(platform: Platform, path: &Path) -> Vec<CommandSpec> {
    let file = path.to_string_lossy().to_string();
    let specs = match platform {
        Platform::MacOs => vec![CommandSpec::new("afplay", [file])],
        Platform::Linux => vec![
            CommandSpec::new("paplay", [file.clone()]),
            CommandSpec::new("aplay", ["-q".to_string(), file.clone()]),
            CommandSpec::new(
                "ffplay",
                ["-nodisp", "-autoexit", "-loglevel", "quiet", file.as_str()],
            ),
        ],
        Platform::Windows => {
            let script = format!(
                "(New-Object System.Media.SoundPlayer '{}').PlaySync()",
                file.replace('\'', "''")
            );
            vec![
                CommandSpec::new("powershell", ["-NoProfile".to_string(), "-Command".to_string(), script]).detached(),
                CommandSpec::new("cmd", ["/c", "start", "", "/B", file.as_str()]).detached(),
            ]
        }
    };

    specs
        .into_iter()
        .map(|spec| spec.with_timeout(PLAYBACK_TIMEOUT))
        .collect()
}

#[async_trait]
impl NotificationChannel for AudioChannel {
    fn name(&self) -> &str {
        "audio"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, ctx: &NotificationContext) -> Result<SendResult> {
        let Some(sounds) = self.mapping.resolve(&ctx.event) else {
            return Ok(SendResult::no_match(&ctx.event));
        };

        if !self.sounds_dir.is_dir() {
            warn!(path = %self.sounds_dir.display(), "Voice pack not found, no sound played");
            return Ok(SendResult::Skipped(format!(
                "voice pack not found at {}",
                self.sounds_dir.display()
            )));
        }

        let Some(sound) = Self::pick_sound(sounds) else {
            return Ok(SendResult::Skipped("empty sound list".to_string()));
        };

        let path = self.sounds_dir.join(&sound);
        if !path.is_file() {
            warn!(path = %path.display(), "Sound file not found, no sound played");
            return Ok(SendResult::Skipped(format!("sound file not found: {}", path.display())));
        }

        debug!(sound = %sound, "Playing sound");
        match run_first_available(self.runner.as_ref(), &player_commands(self.platform, &path)).await {
            Ok(player) => {
                info!(sound = %sound, player = %player, "Sound played");
                Ok(SendResult::Sent)
            }
            Err(e) => Ok(SendResult::Failed(format!("playback failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookEvent;
    use crate::notification::runner::testing::RecordingRunner;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config(mapping: serde_json::Value) -> AudioConfig {
        serde_json::from_value(json!({ "enabled": true, "soundMapping": mapping })).unwrap()
    }

    fn stop_ctx() -> NotificationContext {
        let event: HookEvent = serde_json::from_value(json!({"hook_event_name": "Stop"})).unwrap();
        NotificationContext::new(event)
    }

    fn assets_with(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sounds").join("alfred");
        fs::create_dir_all(&dir).unwrap();
        for f in files {
            fs::write(dir.join(f), b"RIFF").unwrap();
        }
        temp
    }

    #[test]
    fn test_voice_pack_precedence() {
        let assets = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let env = |key: &str| (key == "VOICE_PACK").then(|| "jarvis".to_string());

        let channel = AudioChannel::new(&AudioConfig::default(), assets.path(), runner.clone(), Platform::Linux, &env);
        assert!(channel.sounds_dir().ends_with("sounds/jarvis"));

        let cfg = AudioConfig {
            voice_pack: Some("butler".to_string()),
            ..Default::default()
        };
        let channel = AudioChannel::new(&cfg, assets.path(), runner.clone(), Platform::Linux, &env);
        assert!(channel.sounds_dir().ends_with("sounds/butler"));

        let channel = AudioChannel::new(&AudioConfig::default(), assets.path(), runner, Platform::Linux, &no_env);
        assert!(channel.sounds_dir().ends_with("sounds/alfred"));
    }

    #[tokio::test]
    async fn test_plays_one_of_the_mapped_sounds() {
        let assets = assets_with(&["a.wav", "b.wav"]);
        let runner = Arc::new(RecordingRunner::new());
        let channel = AudioChannel::new(
            &config(json!({"stop": ["a.wav", "b.wav"]})),
            assets.path(),
            runner.clone(),
            Platform::MacOs,
            &no_env,
        );

        let result = channel.notify(&stop_ctx()).await.unwrap();
        assert_eq!(result, SendResult::Sent);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "afplay");
        assert!(calls[0].args[0].ends_with("a.wav") || calls[0].args[0].ends_with("b.wav"));
    }

    #[tokio::test]
    async fn test_linux_falls_back_to_next_player() {
        let assets = assets_with(&["done.wav"]);
        let runner = Arc::new(RecordingRunner::new().with_missing("paplay"));
        let channel = AudioChannel::new(
            &config(json!({"stop": ["done.wav"]})),
            assets.path(),
            runner.clone(),
            Platform::Linux,
            &no_env,
        );

        assert!(channel.notify(&stop_ctx()).await.unwrap().is_sent());
        assert_eq!(runner.calls()[0].program, "aplay");
    }

    #[tokio::test]
    async fn test_missing_voice_pack_or_file_is_skipped() {
        let empty = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let channel = AudioChannel::new(
            &config(json!({"stop": ["a.wav"]})),
            empty.path(),
            runner.clone(),
            Platform::Linux,
            &no_env,
        );
        assert!(matches!(channel.notify(&stop_ctx()).await.unwrap(), SendResult::Skipped(_)));

        let assets = assets_with(&[]);
        let channel = AudioChannel::new(
            &config(json!({"stop": ["gone.wav"]})),
            assets.path(),
            runner.clone(),
            Platform::Linux,
            &no_env,
        );
        assert!(matches!(channel.notify(&stop_ctx()).await.unwrap(), SendResult::Skipped(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_sound_is_reported_at_warn() {
        let assets = assets_with(&[]);
        let runner = Arc::new(RecordingRunner::new());
        let channel = AudioChannel::new(
            &config(json!({"stop": ["gone.wav"]})),
            assets.path(),
            runner,
            Platform::Linux,
            &no_env,
        );
        channel.notify(&stop_ctx()).await.unwrap();

        logs_assert(|lines: &[&str]| {
            let found = lines
                .iter()
                .any(|line| line.contains("WARN") && line.contains("Sound file not found"));
            if found {
                Ok(())
            } else {
                Err("missing sound file was not logged at WARN".to_string())
            }
        });
    }

    #[tokio::test]
    async fn test_unmapped_event_is_skipped() {
        let assets = assets_with(&["a.wav"]);
        let runner = Arc::new(RecordingRunner::new());
        let channel = AudioChannel::new(&config(json!({})), assets.path(), runner.clone(), Platform::Linux, &no_env);
        assert!(matches!(channel.notify(&stop_ctx()).await.unwrap(), SendResult::Skipped(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_windows_players_are_detached() {
        let specs = player_commands(Platform::Windows, Path::new("C:\\sounds\\it's.wav"));
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| s.detached));
        assert!(specs[0].args[2].contains("it''s.wav"));
    }
}

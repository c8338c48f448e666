use std::env;
use std::path::PathBuf;

use anyhow::anyhow;

use kokoro_phonemizer::{Phonemizer, PhonemizerConfig, check_espeak};

const USAGE: &str = "Usage: kokoro-phonemizer [--config FILE] [--lang a|b|en-us|en-gb] [--no-normalize] TEXT...\n       kokoro-phonemizer [--config FILE] check\n       kokoro-phonemizer [--config FILE] health";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut language = "a".to_string();
    let mut normalize = true;
    let mut words: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "-l" | "--lang" => {
                language = args
                    .next()
                    .ok_or_else(|| anyhow!("--lang requires a value (a, b, en-us, en-gb)"))?;
            }
            "--no-normalize" => normalize = false,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            other if other.starts_with('-') && words.is_empty() => {
                anyhow::bail!("Unknown option '{other}'\n{USAGE}");
            }
            _ => words.push(arg),
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => PhonemizerConfig::from_file(path),
        None => PhonemizerConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    match words.first().map(String::as_str) {
        None => anyhow::bail!("No text given\n{USAGE}"),
        Some("check") if words.len() == 1 => {
            if check_espeak(&config, None).await {
                println!("eSpeak Status: Working ({})", config.espeak_binary);
                Ok(())
            } else {
                anyhow::bail!("eSpeak Status: Not Working ({})", config.espeak_binary)
            }
        }
        Some("health") if words.len() == 1 => {
            // No grace period for a one-shot check
            let phonemizer = Phonemizer::from_config(&PhonemizerConfig {
                warmup_period_seconds: 0,
                ..config
            });
            let report = phonemizer.health_check().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_healthy() {
                Ok(())
            } else {
                anyhow::bail!("phonemizer is unhealthy")
            }
        }
        Some(_) => {
            let phonemizer = Phonemizer::from_config(&config);
            let text = words.join(" ");
            let phonemes = phonemizer.phonemize(&text, &language, normalize).await?;
            println!("{phonemes}");
            Ok(())
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use quickspeak::cloud::{PhraseGenerator, SpeechGenerator};
use quickspeak::packs::pack_prompt;
use quickspeak::voice::{PCM_CHANNELS, PCM_SAMPLE_RATE, buffer_to_wav, decode_payload};
use quickspeak::{
    AudioBuffer, AudioPlayback, AudioSink, Config, ContextPackGenerator, DeviceSimulator,
    GeminiClient, LocalSynthesizer, PhraseSet, PlaybackState, SpeakOutcome, SpeechAdapter,
    SuggestionRouter,
};

/// QuickSpeak - AAC device simulator
#[derive(Parser)]
#[command(name = "quickspeak", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive device simulator (default)
    Simulate,
    /// Route a query once and print the suggestions
    Suggest {
        /// Query text
        text: String,
    },
    /// Generate a context pack for a scenario
    Pack {
        /// Scenario, e.g. "At the dentist"
        scenario: String,
    },
    /// Speak a phrase
    Speak {
        /// Phrase to speak
        text: String,
        /// Write the generated speech to a WAV file instead of playing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Test speaker output
    TestSpeaker,
    /// Check the API key and remote generation
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,quickspeak=info",
        1 => "info,quickspeak=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Simulate) {
        Command::Simulate => simulate(&config).await,
        Command::Suggest { text } => suggest(&config, &text).await,
        Command::Pack { scenario } => pack(&config, &scenario).await,
        Command::Speak { text, output } => speak(&config, &text, output).await,
        Command::TestSpeaker => test_speaker().await,
        Command::Check => check(&config).await,
    }
}

fn print_phrases(phrases: &PhraseSet) {
    if phrases.is_empty() {
        println!("  (none)");
    }
    for (i, phrase) in phrases.iter().enumerate() {
        println!("  {}. {phrase}", i + 1);
    }
}

/// Interactive simulator over stdin
async fn simulate(config: &Config) -> anyhow::Result<()> {
    let sim = DeviceSimulator::from_config(config);

    println!("QuickSpeak device simulator");
    println!("Type to get suggestions. Commands: :pack <scenario>, :say <n>, :pick <n>,");
    println!(":speak <text>, :grid, :quit\n");
    print_grid(&sim);

    // Print suggestions whenever they settle
    let mut suggestions = sim.subscribe_suggestions();
    let printer = tokio::spawn(async move {
        while suggestions.changed().await.is_ok() {
            let state = suggestions.borrow_and_update().clone();
            if state.in_flight || state.query.trim().is_empty() {
                continue;
            }
            println!("suggestions for \"{}\" ({}):", state.query, state.route);
            print_phrases(&state.suggestions);
        }
    });

    let mut playback = sim.subscribe_playback();
    let indicator = tokio::spawn(async move {
        while playback.changed().await.is_ok() {
            let state = *playback.borrow_and_update();
            if state != PlaybackState::Idle {
                println!("[{}]", format!("{state:?}").to_lowercase());
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, arg) = line.split_once(' ').map_or((line, ""), |(c, a)| (c, a.trim()));

        match cmd {
            ":quit" | ":q" => break,
            ":grid" => print_grid(&sim),
            ":pack" => {
                if let Some(pack) = sim.push_context_pack(arg).await {
                    println!("context pack \"{}\":", pack.name);
                    print_phrases(&pack.phrases);
                } else {
                    println!("usage: :pack <scenario>");
                }
            }
            ":say" => match parse_index(arg) {
                Some(i) => report(sim.speak_grid(i).await),
                None => println!("usage: :say <n>"),
            },
            ":pick" => match parse_index(arg) {
                Some(i) => report(sim.speak_suggestion(i).await),
                None => println!("usage: :pick <n>"),
            },
            ":speak" if arg.is_empty() => println!("usage: :speak <text>"),
            ":speak" => report(Some(sim.speak(arg).await)),
            _ if cmd.starts_with(':') => println!("unknown command: {cmd}"),
            _ => {
                sim.type_query(line);
            }
        }
    }

    sim.speech_finished().await;
    printer.abort();
    indicator.abort();

    Ok(())
}

fn print_grid(sim: &DeviceSimulator) {
    let grid = sim.snapshot().grid;
    println!("grid \"{}\":", grid.pack.name);
    print_phrases(&grid.pack.phrases);
}

/// 1-based index from user input
fn parse_index(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

fn report(outcome: Option<SpeakOutcome>) {
    match outcome {
        None => println!("no phrase at that position"),
        Some(SpeakOutcome::Rejected) => println!("busy, try again"),
        Some(SpeakOutcome::Remote | SpeakOutcome::Fallback) => {}
    }
}

/// Route a query once
async fn suggest(config: &Config, text: &str) -> anyhow::Result<()> {
    let client = Arc::new(GeminiClient::new(&config.api, &config.speech.voice));
    let router = SuggestionRouter::new(client);

    let result = router.suggest(text).await;
    println!("route: {}", result.route);
    print_phrases(&result.phrases);

    Ok(())
}

/// Generate a context pack once
async fn pack(config: &Config, scenario: &str) -> anyhow::Result<()> {
    let client = Arc::new(GeminiClient::new(&config.api, &config.speech.voice));
    let packs = ContextPackGenerator::new(client);

    let pack = packs
        .generate(scenario)
        .await
        .ok_or_else(|| anyhow::anyhow!("scenario must not be empty"))?;

    println!("context pack \"{}\":", pack.name);
    print_phrases(&pack.phrases);

    Ok(())
}

/// Speak a phrase, or write it to a WAV file
async fn speak(config: &Config, text: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let client = Arc::new(GeminiClient::new(&config.api, &config.speech.voice));

    if let Some(path) = output {
        let payload = client.generate_speech(text).await?;
        let buffer = decode_payload(&payload)?;
        let wav = buffer_to_wav(&buffer)?;
        tokio::fs::write(&path, wav).await?;
        println!(
            "wrote {:.1}s of audio to {}",
            buffer.duration().as_secs_f32(),
            path.display()
        );
        return Ok(());
    }

    let adapter = SpeechAdapter::new(
        client,
        Arc::new(AudioPlayback::new()),
        Arc::new(LocalSynthesizer::from_config(
            config.speech.fallback_command.as_deref(),
        )),
        config.speech.reset_delay,
    );

    match adapter.speak(text).await {
        SpeakOutcome::Rejected => anyhow::bail!("nothing to speak"),
        SpeakOutcome::Fallback => println!("remote speech unavailable, used local synthesizer"),
        SpeakOutcome::Remote => {}
    }
    adapter.finish().await;

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new();
    let device = playback
        .device_name()
        .ok_or_else(|| anyhow::anyhow!("no audio output device available"))?;
    println!("Output device: {device}");

    let frequency = 440.0_f32;
    let num_samples = usize::try_from(PCM_SAMPLE_RATE)? * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PCM_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    let buffer = AudioBuffer::new(samples, PCM_SAMPLE_RATE, PCM_CHANNELS);
    println!(
        "Playing {} samples at {} Hz...",
        buffer.samples().len(),
        PCM_SAMPLE_RATE
    );

    tokio::task::spawn_blocking(move || playback.play(&buffer)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Check the key and a real generation round trip
async fn check(config: &Config) -> anyhow::Result<()> {
    if config.has_api_key() {
        println!("API key: configured");
    } else {
        anyhow::bail!("API key: missing (set GEMINI_API_KEY)");
    }

    let client = GeminiClient::new(&config.api, &config.speech.voice);
    let phrases = client
        .generate_phrases(&pack_prompt("Ordering Pizza"))
        .await?;

    if phrases.is_empty() {
        anyhow::bail!("remote generation returned no phrases");
    }

    println!("Remote generation: ok ({} phrases)", phrases.len());
    for phrase in &phrases {
        println!("  - {phrase}");
    }

    Ok(())
}

// Keysync CLI
// Replays recorded native key events through the embedder responder

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;

use keysync_core::config::Config;
use keysync_core::{
    parse_trace, parse_trace_path, EmbedderResponder, KeyEventSink, KeyResponder, KeyboardManager,
    NativeKeyEvent, RecordingSink, Redispatcher, ResponderConfig, ResponseCallback,
};

/// Native key event replay with modifier and lock synchronization
#[derive(Parser, Debug)]
#[command(name = "keysync")]
#[command(version)]
#[command(about = "Replay native key events through the key state synchronizer", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to ~/.config/keysync/keysync.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Trace file to replay (reads stdin when absent)
    #[arg(short, long, value_name = "TRACE")]
    trace: Option<PathBuf>,

    /// Answer every forwarded event as unhandled, so it gets redispatched
    #[arg(short, long)]
    unhandled: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Lets the replay read the responder's records after handing it to the manager
struct SharedResponder(Arc<Mutex<EmbedderResponder>>);

impl KeyResponder for SharedResponder {
    fn handle_event(&mut self, event: &NativeKeyEvent, callback: ResponseCallback) {
        self.0.lock().handle_event(event, callback);
    }
}

#[derive(Debug, Default)]
struct ReplayStats {
    native: usize,
    forwarded: usize,
    synthesized: usize,
    dropped: usize,
    redispatched: usize,
}

struct Replay {
    manager: KeyboardManager,
    responder: Arc<Mutex<EmbedderResponder>>,
    sink: Arc<RecordingSink>,
    redispatched: Arc<Mutex<Vec<NativeKeyEvent>>>,
    stats: ReplayStats,
}

impl Replay {
    fn new(config: ResponderConfig, unhandled: bool) -> Self {
        let sink = Arc::new(RecordingSink::auto_respond(!unhandled));
        let engine: Arc<dyn KeyEventSink> = sink.clone();
        let responder = Arc::new(Mutex::new(EmbedderResponder::new(
            Arc::downgrade(&engine),
            config,
        )));

        let redispatched = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::clone(&redispatched);
        let redispatcher: Redispatcher = Arc::new(move |event: &NativeKeyEvent| queue.lock().push(*event));

        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(Box::new(SharedResponder(Arc::clone(&responder))));

        Self {
            manager,
            responder,
            sink,
            redispatched,
            stats: ReplayStats::default(),
        }
    }

    fn run(&mut self, events: &[NativeKeyEvent]) {
        for event in events {
            self.stats.native += 1;
            println!(
                "> {} code={:#x} value={:#x} state={:#x} time={}",
                if event.is_press { "press" } else { "release" },
                event.native_code,
                event.native_value,
                event.state,
                event.time
            );
            self.manager.handle_event(*event);
            self.print_forwarded();

            // The platform hands redispatched events straight back
            let redispatched: Vec<NativeKeyEvent> = std::mem::take(&mut *self.redispatched.lock());
            for event in redispatched {
                self.stats.redispatched += 1;
                let claimed = self.manager.handle_event(event);
                println!(
                    "  redispatched code={:#x} ({})",
                    event.native_code,
                    if claimed { "claimed again" } else { "handled natively" }
                );
            }
        }
    }

    fn print_forwarded(&mut self) {
        for key_event in self.sink.take_events() {
            if key_event.is_empty() {
                self.stats.dropped += 1;
                println!("  dropped (duplicate or stale)");
                continue;
            }
            if key_event.synthesized {
                self.stats.synthesized += 1;
            } else {
                self.stats.forwarded += 1;
            }
            println!("  {}", key_event);
        }
    }

    fn print_summary(&self) {
        let responder = self.responder.lock();
        println!();
        println!("=== REPLAY SUMMARY ===");
        println!("Native events:      {}", self.stats.native);
        println!("Forwarded events:   {}", self.stats.forwarded);
        println!("Synthesized events: {}", self.stats.synthesized);
        println!("Dropped events:     {}", self.stats.dropped);
        println!("Redispatched:       {}", self.stats.redispatched);

        let mut pressed: Vec<_> = responder.pressing_record().iter().collect();
        pressed.sort();
        println!("Pressed keys:       {}", pressed.len());
        for (physical, logical) in pressed {
            println!("  physical={} logical={}", physical, logical);
        }
        println!("Lock bits:          {:#x}", responder.lock_record().bits());
        println!("CapsLock logic:     {}", responder.caps_lock_state_logic());
        println!("Manager state clear: {}", self.manager.is_state_clear());
    }
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::from_toml_path(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load_default().context("failed to load default config"),
    }
}

fn read_trace(args: &Args) -> Result<Vec<NativeKeyEvent>> {
    match &args.trace {
        Some(path) => parse_trace_path(path)
            .with_context(|| format!("failed to read trace {}", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("failed to read trace from stdin")?;
            parse_trace(&content).context("failed to parse trace from stdin")
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = load_config(&args)?;
    let responder_config = config.to_responder_config();
    log::info!(
        "platform {}: {} modifier bit(s), {} lock bit(s)",
        config.platform,
        responder_config.modifiers.len(),
        responder_config.locks.len()
    );

    if args.check_config {
        println!("Configuration is valid");
        for (bit, key) in responder_config.modifiers.iter() {
            println!("  modifier {:#x}: {:?}", bit, key);
        }
        for (bit, key) in responder_config.locks.iter() {
            println!("  lock {:#x}: {:?}", bit, key);
        }
        return Ok(());
    }

    let events = read_trace(&args)?;
    let mut replay = Replay::new(responder_config, args.unhandled);
    replay.run(&events);
    replay.print_summary();
    Ok(())
}

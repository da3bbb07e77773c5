mod commands;
mod config;
mod console;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    export::save_png, Canvas, PresentationSink, SessionController, SessionSettings,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{drag_path, parse_command, Command, HELP},
    config::{load_settings, Settings},
    console::{budget_reached, status_label, status_report, ConsoleSink, UiEvent},
};

#[derive(Parser, Debug)]
#[command(name = "remote-render", about = "Drive a remote renderer from the terminal")]
struct Args {
    #[arg(long, default_value = "client.toml")]
    config: PathBuf,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    max_spp: Option<String>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Export the canvas once the sample budget is reached.
    #[arg(long)]
    save_on_complete: bool,
    /// Start a session right away.
    #[arg(long)]
    autostart: bool,
}

impl Args {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(max_spp) = &self.max_spp {
            settings.max_spp = max_spp.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
        settings.save_on_complete |= self.save_on_complete;
        settings
    }
}

struct App {
    session: Arc<SessionController>,
    sink: Arc<ConsoleSink>,
    settings: Settings,
    pending_start: Option<JoinHandle<()>>,
    exported: bool,
}

impl App {
    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start => {
                self.settle_start().await;
                self.exported = false;
                let session = Arc::clone(&self.session);
                self.pending_start = Some(tokio::spawn(async move {
                    if let Err(err) = session.start().await {
                        warn!(error = %err, "start failed");
                        println!("start failed: {err}");
                    }
                }));
            }
            Command::End => {
                if !self.session.end().await {
                    println!("no session to end");
                }
                self.settle_start().await;
            }
            Command::Drag {
                button,
                from,
                to,
                steps,
            } => {
                self.settle_start().await;
                self.session.pointer_down(button, from.0, from.1).await;
                for (x, y) in drag_path(from, to, steps) {
                    self.session.pointer_move(x, y).await;
                }
                self.session.pointer_up().await;
            }
            Command::Endpoint(url) => self.sink.canvas().set_endpoint_url(url),
            Command::MaxSpp(raw) => {
                self.sink.canvas().set_max_spp_input(&raw);
                println!("max spp: '{}'", self.sink.canvas().max_spp_input());
            }
            Command::Save => self.save().await,
            Command::Status => self.print_status().await,
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    async fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::StatusChanged(status) => println!("[{}]", status_label(status)),
            UiEvent::FrameDrawn { width, height } => debug!(width, height, "frame drawn"),
            UiEvent::SampleCount(sample_count) => {
                println!("samples: {sample_count}");
                if self.settings.save_on_complete
                    && !self.exported
                    && budget_reached(&self.session.render_config().await, sample_count)
                {
                    self.exported = true;
                    self.save().await;
                }
            }
        }
    }

    /// Waits for an in-flight `start` so later commands see its outcome.
    async fn settle_start(&mut self) {
        if let Some(pending) = self.pending_start.take() {
            if let Err(err) = pending.await {
                warn!(error = %err, "start task failed");
            }
        }
    }

    async fn save(&self) {
        let sink = Arc::clone(&self.sink);
        let dir = self.settings.output_dir.clone();
        match tokio::task::spawn_blocking(move || save_png(sink.canvas(), &dir)).await {
            Ok(Ok(path)) => println!("saved {}", path.display()),
            Ok(Err(err)) => println!("export failed: {err}"),
            Err(err) => warn!(error = %err, "export task failed"),
        }
    }

    async fn print_status(&self) {
        let camera = self.session.camera().await;
        let phase = self.session.phase().await;
        println!("{}", status_report(&camera, phase, self.sink.canvas()));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.apply(load_settings(&args.config)?);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!(endpoint = %settings.endpoint, config = %args.config.display(), "remote-render starting");

    let (sink, mut events): (ConsoleSink, mpsc::UnboundedReceiver<UiEvent>) =
        ConsoleSink::new(Canvas::new(settings.endpoint.clone(), &settings.max_spp));
    let sink = Arc::new(sink);
    let session = SessionController::new(
        sink.clone(),
        SessionSettings {
            connect_timeout: settings.connect_timeout(),
        },
    );

    let mut app = App {
        session,
        sink,
        settings,
        pending_start: None,
        exported: false,
    };

    println!("type 'help' for commands");
    if args.autostart {
        app.handle(Command::Start).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => app.handle(command).await,
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
            }
            Some(event) = events.recv() => app.on_event(event).await,
        }
    }

    app.settle_start().await;
    app.session.end().await;
    while let Ok(event) = events.try_recv() {
        app.on_event(event).await;
    }
    info!("remote-render stopped");
    Ok(())
}

use moodwall::{
    logger::{self, LoggerConfig},
    session::NoticeKind,
    BatchOrchestrator, Config, GeminiClient, ImageGenerator, Session, SessionError,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a mood to generate wallpapers, or one of:
  :list          show the gallery (newest first)
  :remix <n>     remix wallpaper n with your next prompt
  :cancel        leave remix mode
  :save <n>      save wallpaper n to the output directory
  :help          show this help
  :quit          exit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(LoggerConfig::from(&config))?;

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    let client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let orchestrator = BatchOrchestrator::with_config(
        Arc::new(client.into_image()),
        config.batch.clone(),
    );
    let mut session = Session::new(orchestrator);

    println!("{}", HELP);
    prompt_marker(&session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt_marker(&session)?;
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) | (":q", _) => break,
            (":help", _) => println!("{}", HELP),
            (":list", _) => print_gallery(&session),
            (":cancel", _) => {
                session.cancel_remix();
                println!("Remix cancelled.");
            }
            (":remix", arg) => match wallpaper_id(&session, arg) {
                Some(id) => match session.request_remix(&id) {
                    Ok(target) => println!(
                        "Remix mode: describe the new style for \"{}\".",
                        target.prompt
                    ),
                    Err(e) => println!("{}", e),
                },
                None => println!("No wallpaper #{}", arg.trim()),
            },
            (":save", arg) => match wallpaper_id(&session, arg) {
                Some(id) => match session.save_wallpaper(&id, &config.output_dir).await {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("Could not save: {}", e),
                },
                None => println!("No wallpaper #{}", arg.trim()),
            },
            (command, _) if command.starts_with(':') => {
                println!("Unknown command {}. Type :help.", command)
            }
            _ => submit(&mut session, line).await,
        }

        prompt_marker(&session)?;
    }

    log::info!("👋 Bye");
    Ok(())
}

async fn submit<G: ImageGenerator + ?Sized>(session: &mut Session<G>, prompt: &str) {
    let remixing = session.state().is_remix_mode();
    println!(
        "{} \"{}\"... (usually 10-20 seconds)",
        if remixing { "Remixing with" } else { "Painting" },
        prompt
    );

    match session.submit(prompt).await {
        Ok(added) => {
            for wallpaper in added {
                let size = wallpaper
                    .image
                    .dimensions()
                    .map(|(w, h)| format!("{}x{}", w, h))
                    .unwrap_or_else(|_| "?".to_string());
                println!("  + {} ({}, {} bytes)", wallpaper.id, size, wallpaper.image.len());
            }
        }
        Err(SessionError::Batch(_)) => {}
        Err(e) => println!("{}", e),
    }

    if let Some(notice) = session.state().notice() {
        let marker = match notice.kind {
            NoticeKind::Success => "✅",
            NoticeKind::Error => "❌",
            NoticeKind::Info => "💡",
        };
        println!("{} {}", marker, notice.message);
    }
}

fn print_gallery<G: ImageGenerator + ?Sized>(session: &Session<G>) {
    let wallpapers = session.state().wallpapers();
    if wallpapers.is_empty() {
        println!("The gallery is empty.");
        return;
    }
    for (index, wallpaper) in wallpapers.iter().enumerate() {
        println!(
            "{:>3}. {}  \"{}\"  {}",
            index + 1,
            wallpaper.created_at.format("%H:%M:%S"),
            wallpaper.prompt,
            wallpaper.id
        );
    }
}

/// Resolve a 1-based gallery position to a wallpaper id.
fn wallpaper_id<G: ImageGenerator + ?Sized>(session: &Session<G>, arg: &str) -> Option<String> {
    let position: usize = arg.trim().parse().ok()?;
    session
        .state()
        .wallpapers()
        .get(position.checked_sub(1)?)
        .map(|w| w.id.clone())
}

fn prompt_marker<G: ImageGenerator + ?Sized>(session: &Session<G>) -> std::io::Result<()> {
    match session.state().remix_prompt_hint() {
        Some(hint) => print!("remix [{}]> ", hint),
        None => print!("mood> "),
    }
    std::io::stdout().flush()
}

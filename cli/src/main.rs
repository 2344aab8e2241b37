use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use meadow_core::contact::{
    ContactForm, MailSettings, OutgoingMail, ValidContact, DEFAULT_RECIPIENT, DEFAULT_SENDER,
};
use meadow_core::geometry::ImageSize;
use meadow_core::headless::{
    HeadlessImageLoader, HeadlessScheduler, HeadlessSurface, HeadlessViewport,
};
use meadow_core::keywords::{self, SECRET_KEYWORDS};
use meadow_core::{
    BackgroundHooks, BackgroundParallax, BackgroundPhase, ElementParallax, ParallaxHost,
};

#[derive(Parser)]
#[command(name = "meadow-cli", version, about = "Developer tools for the meadow site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Keywords {
        #[command(subcommand)]
        command: KeywordCommand,
    },
    Parallax {
        #[command(subcommand)]
        command: ParallaxCommand,
    },
    Contact {
        #[command(subcommand)]
        command: ContactCommand,
    },
}

#[derive(Subcommand)]
enum KeywordCommand {
    /// Print every secret keyword.
    List,
    /// Show whether a search query would reveal anything.
    Check { query: String },
    /// Fail if a keyword shows up in page copy.
    Audit {
        #[arg(long, env = "MEADOW_SRC_DIR", default_value = "src")]
        root: PathBuf,
        #[arg(long = "allow", default_values_t = [String::from("search.rs"), String::from("keyword_sections.rs")])]
        allow: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ParallaxCommand {
    /// Replay the background easing frame by frame after a scroll jump.
    Trace {
        #[arg(long, value_parser = parse_size, default_value = "1920x1080")]
        image: (f64, f64),
        #[arg(long, value_parser = parse_size, default_value = "1600x900")]
        viewport: (f64, f64),
        #[arg(long)]
        scroll: f64,
        #[arg(long, default_value_t = 600)]
        max_frames: usize,
        #[arg(long, default_value_t = 1)]
        every: usize,
    },
    /// Offset an element would get at a given layout position.
    Element {
        #[arg(long)]
        top: f64,
        #[arg(long)]
        height: f64,
        #[arg(long, value_parser = parse_size, default_value = "1600x900")]
        viewport: (f64, f64),
        #[arg(long, default_value_t = meadow_core::DEFAULT_ELEMENT_MULTIPLIER)]
        multiplier: f64,
    },
}

#[derive(Subcommand)]
enum ContactCommand {
    /// Validate a submission and print the mail it would send.
    Preview {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        note: String,
        #[arg(long, env = "RECIPIENT_EMAIL", default_value = DEFAULT_RECIPIENT)]
        recipient: String,
        #[arg(long, env = "SENDER_EMAIL", default_value = DEFAULT_SENDER)]
        sender: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keywords { command } => match command {
            KeywordCommand::List => {
                for keyword in SECRET_KEYWORDS {
                    println!("{} ({} bytes)", keyword.key, keyword.content_html.len());
                }
            }
            KeywordCommand::Check { query } => match keywords::lookup(&query) {
                Some(keyword) => println!("reveals: {}", keyword.key),
                None => println!("no match"),
            },
            KeywordCommand::Audit { root, allow } => {
                let leaks = audit_sources(&root, &allow)?;
                if leaks.is_empty() {
                    println!("no secret keywords in page copy under {}", root.display());
                    return Ok(());
                }
                for (path, found) in &leaks {
                    for keyword in found {
                        eprintln!("  - \"{keyword}\" found in {}", path.display());
                    }
                }
                return Err(format!("{} file(s) leak secret keywords", leaks.len()).into());
            }
        },
        Commands::Parallax { command } => match command {
            ParallaxCommand::Trace {
                image,
                viewport,
                scroll,
                max_frames,
                every,
            } => {
                trace_background(image, viewport, scroll, max_frames, every.max(1))?;
            }
            ParallaxCommand::Element {
                top,
                height,
                viewport,
                multiplier,
            } => {
                let (used, offset) = element_at(top, height, viewport, multiplier);
                println!("multiplier: {used}");
                match offset {
                    Some(offset) => println!("offset: {offset:.3}px"),
                    None => println!("offset: none"),
                }
            }
        },
        Commands::Contact { command } => match command {
            ContactCommand::Preview {
                name,
                email,
                note,
                recipient,
                sender,
                json,
            } => {
                let contact = ContactForm { name, email, note }.validate()?;
                let settings = MailSettings {
                    api_key: String::new(),
                    recipient,
                    sender,
                    expose_details: true,
                };
                let mail = OutgoingMail::compose(&contact, &settings);
                if json {
                    println!("{:#}", mail.to_sendgrid_json());
                } else {
                    for line in preview_lines(&contact, &mail) {
                        println!("{line}");
                    }
                }
            }
        },
    }

    Ok(())
}

const TRACE_IMAGE_PATH: &str = "trace.jpg";

/// Binds an element at `top` in a headless page scrolled to the top and
/// returns the multiplier in use with the offset applied on bind.
fn element_at(
    top: f64,
    height: f64,
    viewport: (f64, f64),
    multiplier: f64,
) -> (f64, Option<f64>) {
    let scheduler = Rc::new(HeadlessScheduler::new());
    let view = Rc::new(HeadlessViewport::new(viewport.0, viewport.1));
    let surface = Rc::new(HeadlessSurface::new(&view, top, height));
    let host = ParallaxHost::new(scheduler, view);
    let binding = ElementParallax::bind(host, surface, multiplier);
    let result = (binding.options().multiplier, binding.last_offset());
    binding.teardown();
    result
}

fn preview_lines(contact: &ValidContact, mail: &OutgoingMail) -> Vec<String> {
    vec![
        format!("name: {}", contact.name()),
        format!("email: {}", contact.email()),
        format!("note: {} chars", contact.note().chars().count()),
        format!("to: {}", mail.to),
        format!("from: {}", mail.from),
        format!("subject: {}", mail.subject),
        String::new(),
        mail.text.clone(),
    ]
}

fn trace_background(
    image: (f64, f64),
    viewport: (f64, f64),
    scroll: f64,
    max_frames: usize,
    every: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Rc::new(HeadlessScheduler::new());
    let view = Rc::new(HeadlessViewport::new(viewport.0, viewport.1));
    let surface = Rc::new(HeadlessSurface::new(&view, 0.0, viewport.1));
    let loader = HeadlessImageLoader::new();
    let host = ParallaxHost::new(scheduler.clone(), view.clone());
    let binding = BackgroundParallax::bind(
        host,
        &loader,
        surface.clone(),
        TRACE_IMAGE_PATH,
        BackgroundHooks::empty(),
    );
    println!("image: {}", binding.image_path());

    loader.complete_next(ImageSize::new(image.0, image.1));
    if binding.phase() != BackgroundPhase::Ready {
        return Err(format!("background did not load: {:?}", binding.phase()).into());
    }
    scheduler.run_until_idle(max_frames);

    println!("max offset: {:.3}px", binding.max_offset());
    if let Some(height) = surface.style_height() {
        println!("background height: {height:.3}px");
    }
    view.scroll_to(scroll);
    println!("target offset: {:.3}px", binding.target_offset());

    let mut frame = 0;
    while frame < max_frames && scheduler.run_frame() > 0 {
        frame += 1;
        if frame % every == 0 || !binding.is_animating() {
            println!(
                "frame {frame:>4} t={:>8.1}ms offset={:.4}",
                scheduler.clock_ms(),
                binding.current_offset()
            );
        }
    }
    if binding.is_animating() {
        println!("still easing after {frame} frames");
    } else {
        println!("settled after {frame} frames");
    }
    Ok(())
}

fn parse_size(raw: &str) -> Result<(f64, f64), String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: f64 = width.trim().parse().map_err(|err| format!("bad width: {err}"))?;
    let height: f64 = height.trim().parse().map_err(|err| format!("bad height: {err}"))?;
    if !(width > 0.0 && height > 0.0) {
        return Err(format!("size must be positive, got '{raw}'"));
    }
    Ok((width, height))
}

fn audit_sources(
    root: &Path,
    allow: &[String],
) -> Result<Vec<(PathBuf, Vec<&'static str>)>, std::io::Error> {
    let mut files = Vec::new();
    collect_rust_files(root, &mut files)?;
    files.sort();
    let mut leaks = Vec::new();
    for path in files {
        let allowed = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| allow.iter().any(|entry| entry == name));
        if allowed {
            continue;
        }
        let source = fs::read_to_string(&path)?;
        let found = keywords::find_leaks(&source);
        if !found.is_empty() {
            leaks.push((path, found));
        }
    }
    Ok(leaks)
}

fn collect_rust_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rust_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080"), Ok((1920.0, 1080.0)));
        assert_eq!(parse_size(" 800 X 600 "), Ok((800.0, 600.0)));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn audit_skips_allowed_files_and_flags_the_rest() {
        let dir = std::env::temp_dir().join(format!("meadow-audit-{}", std::process::id()));
        let nested = dir.join("pages");
        fs::create_dir_all(&nested).unwrap();
        let key = SECRET_KEYWORDS[0].key;
        fs::write(dir.join("search.rs"), format!("const Q: &str = \"{key}\";")).unwrap();
        fs::write(nested.join("about.rs"), format!("html! {{ <p>{{ \"{key}\" }}</p> }}")).unwrap();
        fs::write(nested.join("home.rs"), "html! { <p>{ \"hello\" }</p> }").unwrap();

        let leaks = audit_sources(&dir, &["search.rs".to_string()]).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(leaks.len(), 1);
        assert!(leaks[0].0.ends_with("pages/about.rs"));
        assert_eq!(leaks[0].1, vec![key]);
    }

    #[test]
    fn element_command_uses_the_bound_offset() {
        let (multiplier, offset) = element_at(1000.0, 300.0, (1600.0, 900.0), 0.1);
        assert_eq!(multiplier, 0.1);
        let expected = (1000.0 + 150.0 - 450.0) * 0.1;
        assert!((offset.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn contact_preview_lists_trimmed_fields() {
        let contact = ContactForm {
            name: " Ada ".to_string(),
            email: "ada@example.com ".to_string(),
            note: " hello ".to_string(),
        }
        .validate()
        .unwrap();
        let settings = MailSettings {
            api_key: String::new(),
            recipient: DEFAULT_RECIPIENT.to_string(),
            sender: DEFAULT_SENDER.to_string(),
            expose_details: true,
        };
        let mail = OutgoingMail::compose(&contact, &settings);
        let lines = preview_lines(&contact, &mail);
        assert_eq!(lines[0], "name: Ada");
        assert_eq!(lines[1], "email: ada@example.com");
        assert_eq!(lines[2], "note: 5 chars");
        assert_eq!(lines[3], format!("to: {DEFAULT_RECIPIENT}"));
        assert_eq!(lines.last(), Some(&mail.text));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

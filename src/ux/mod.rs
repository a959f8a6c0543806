use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::config::Config;
use crate::map::MapView;
use crate::render::{Tile, TourBoard};
use crate::wizard::{LocationStatus, Screen, Wizard};

pub fn print_banner(cfg: &Config, provider: &str) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━ AI Tour Generator ━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!("  {}: http://{}", "Listening".green().bold(), cfg.bind_addr());
    println!("  {}: {} ({})", "Provider".cyan().bold(), provider, cfg.model);
    println!(
        "  {}: username {} | password {}",
        "Test credentials".yellow().bold(),
        cfg.demo_username,
        cfg.demo_password
    );
    if cfg.save_transcripts {
        println!("  {}: {}", "Transcripts".magenta().bold(), cfg.transcript_dir.display());
    }
    println!(
        "{}\n",
        "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold()
    );
}

/// Reads one trimmed line; `None` on end of input.
pub fn ask(prompt: &str) -> Option<String> {
    print!("{} ", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().lock().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_string()),
    }
}

pub fn alert(message: &str) {
    println!("\n{} {}\n", "!!".red().bold(), message.red());
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Heading and any inline status for the screen the wizard is on.
pub fn show_screen(w: &Wizard) {
    let title = match w.screen {
        Screen::Login => "Sign in",
        Screen::Location => "Where are you?",
        Screen::Interests => "What are you interested in?",
        Screen::StopCount => "How many stops?",
        Screen::Loading => "Creating your tour",
        Screen::Results => "Your tour",
        Screen::Map => "Tour map",
    };
    println!("\n=== {} ===", title.bold());

    if w.screen == Screen::Location {
        match &w.location_status {
            LocationStatus::Idle => println!("(type a place, or @lat,lon to use coordinates)"),
            LocationStatus::Locating => println!("{}", "Finding your address...".dimmed()),
            LocationStatus::Detected(name) => {
                println!("{} {}  (press enter to use it)", "Location detected:".green(), name)
            }
            LocationStatus::Failed(msg) => {
                println!("{} {}", "Could not get your location.".red(), msg)
            }
        }
    }
    if let Some(err) = &w.error {
        println!("{}", err.red());
    }
}

pub fn show_tour(board: &TourBoard) {
    println!("{}", "Tour Details".bold());
    println!("  Location: {}", board.location);
    println!("  Interests: {}", board.interests);
    println!("  Number of Stops: {}", board.tiles.len());
    if board.tiles.is_empty() {
        println!("\n{}", "No matching places were found. Try broader interests.".yellow());
    }
    for tile in &board.tiles {
        show_tile(tile);
    }
    println!(
        "\n{}",
        "[r <n>] refresh stop  [i <n>] image failed  [> <n>] next image  [m] map  [n] new tour  [q] quit".dimmed()
    );
}

pub fn show_tile(tile: &Tile) {
    let heading = format!("{}. {}", tile.index + 1, tile.stop.name);
    println!("\n{}", heading.green().bold());
    println!("{}", indent(&tile.stop.description, 3));
    for (label, value) in tile.detail_lines() {
        println!("   {}: {}", label.bold(), value);
    }

    let c = &tile.carousel;
    if let Some(url) = c.active_url() {
        if c.shows_navigation() {
            let dots: String = c.indicators().iter().map(|on| if *on { '●' } else { '○' }).collect();
            println!("   {} {}  {}", "Image:".bold(), url, dots);
        } else {
            println!("   {} {}", "Image:".bold(), url);
        }
    }

    if tile.refreshing {
        println!("   {}", "refreshing...".dimmed());
    }
    if let Some(err) = &tile.error {
        println!("   {}", err.red());
    }
}

pub fn show_map(view: Option<&MapView>, board: Option<&TourBoard>) {
    let Some(view) = view else {
        println!("{}", "Loading map...".dimmed());
        return;
    };
    if let Some(center) = view.center {
        println!("Center: {:.5}, {:.5}", center.lat, center.lon);
    }
    for m in &view.markers {
        println!(
            "  {} {}  ({:.5}, {:.5})  {}",
            format!("[{}]", m.index + 1).cyan().bold(),
            m.name,
            m.at.lat,
            m.at.lon,
            m.address.dimmed()
        );
    }
    if let Some(board) = board {
        for i in &view.unplaced {
            if let Some(tile) = board.tiles.get(*i) {
                println!("  {} {} (address not found)", format!("[{}]", i + 1).yellow(), tile.stop.name);
            }
        }
    }
    println!("\n{}", "[b] back to tour".dimmed());
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}

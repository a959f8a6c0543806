use anyhow::Result;
use std::collections::VecDeque;
use std::time::Duration;

use crate::cli::WalkArgs;
use crate::client::ApiClient;
use crate::config::Config;
use crate::errors::TourError;
use crate::geocode::{Coordinates, Geocoder, Nominatim};
use crate::map::plot_stops;
use crate::render::CarouselEvent;
use crate::ux;
use crate::wizard::{Command, Effect, Screen, Wizard};

#[derive(Debug, PartialEq)]
pub enum Input {
    Command(Command),
    Quit,
    Unknown(String),
}

/// 1-based stop number in `arg` to a tile index.
fn stop_index(arg: &str) -> Option<usize> {
    arg.trim().parse::<usize>().ok().filter(|n| *n >= 1).map(|n| n - 1)
}

/// Maps one line typed on the current screen to a wizard command.
pub fn parse_line(w: &Wizard, line: &str) -> Input {
    let line = line.trim();
    if line == ":q" {
        return Input::Quit;
    }
    match w.screen {
        Screen::Login | Screen::Loading => Input::Unknown(line.to_string()),
        Screen::Location if line.starts_with('@') => match Coordinates::parse(line) {
            Some(at) => Input::Command(Command::DetectLocation(at)),
            None => Input::Unknown(line.to_string()),
        },
        Screen::Location => Input::Command(Command::SubmitLocation(line.to_string())),
        Screen::Interests => Input::Command(Command::SubmitInterests(line.to_string())),
        Screen::StopCount => Input::Command(Command::SubmitStopCount(line.to_string())),
        Screen::Results | Screen::Map => {
            let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));
            let tile = |event: fn(&Wizard, usize) -> Option<CarouselEvent>| {
                let index = stop_index(arg)?;
                Some(Command::Carousel { index, event: event(w, index)? })
            };
            let cmd = match (w.screen, verb) {
                (_, "q") => return Input::Quit,
                (_, "n") => Some(Command::NewTour),
                (_, "r") => stop_index(arg).map(Command::RefreshStop),
                (Screen::Results, "m") => Some(Command::ShowMap),
                (Screen::Results, ">") => tile(|_, _| Some(CarouselEvent::Next)),
                (Screen::Results, "<") => tile(|_, _| Some(CarouselEvent::Prev)),
                (Screen::Results, "i") => tile(|w, i| {
                    let url = w.board.as_ref()?.tiles.get(i)?.carousel.active_url()?;
                    Some(CarouselEvent::ImageFailed(url.to_string()))
                }),
                (Screen::Map, "b") => Some(Command::CloseMap),
                _ => None,
            };
            cmd.map(Input::Command).unwrap_or_else(|| Input::Unknown(line.to_string()))
        }
    }
}

fn user_message(err: TourError) -> String {
    match err {
        TourError::InvalidCredentials => "Invalid credentials".into(),
        other => other.details(),
    }
}

async fn execute(effect: Effect, api: &ApiClient, geocoder: &dyn Geocoder) -> Option<Command> {
    match effect {
        Effect::Login { username, password } => {
            let result = api.login(&username, &password).await.map_err(|e| match e {
                TourError::InvalidCredentials => "Invalid credentials".to_string(),
                other => format!("Connection error. Please try again. ({})", other.details()),
            });
            Some(Command::LoginFinished(result))
        }
        Effect::ReverseGeocode(at) => {
            let result = geocoder.reverse(at).await.map_err(user_message);
            Some(Command::LocationDetected(result))
        }
        Effect::GenerateTour(req) => {
            let pb = ux::spinner(&format!("Creating a {}-stop tour of {}...", req.number_of_stops, req.location));
            let result = api.generate_tour(&req).await;
            pb.finish_and_clear();
            Some(Command::TourFinished(result.map_err(user_message)))
        }
        Effect::RefreshStop { index, generation, request } => {
            let pb = ux::spinner(&format!("Finding a replacement for stop {}...", index + 1));
            let result = api.refresh_stop(&request).await;
            pb.finish_and_clear();
            Some(Command::StopRefreshed { index, generation, result: result.map_err(user_message) })
        }
        Effect::PlotMap(stops) => Some(Command::MapReady(plot_stops(&stops, geocoder).await)),
        Effect::Alert(message) => {
            ux::alert(&message);
            None
        }
    }
}

/// Runs `cmd` and every command its effects produce, until the wizard is idle.
pub async fn dispatch(w: &mut Wizard, cmd: Command, api: &ApiClient, geocoder: &dyn Geocoder) {
    let mut queue = VecDeque::from([cmd]);
    while let Some(cmd) = queue.pop_front() {
        for effect in w.handle(cmd) {
            if let Some(next) = execute(effect, api, geocoder).await {
                queue.push_back(next);
            }
        }
    }
}

fn prompt_for(screen: Screen) -> &'static str {
    match screen {
        Screen::Location => "Location:",
        Screen::Interests => "Interests:",
        Screen::StopCount => "Number of stops:",
        _ => ">",
    }
}

pub async fn run(args: &WalkArgs, cfg: &Config) -> Result<()> {
    let api = ApiClient::new(&args.server, Duration::from_secs(args.timeout_secs))?;
    let geocoder = Nominatim::new(
        cfg.nominatim_url.clone(),
        &cfg.geocoder_user_agent,
        Duration::from_secs(cfg.timeout_secs),
    )?;
    let mut wizard = Wizard::new();
    tracing::debug!(server = %args.server, "starting terminal wizard");

    loop {
        ux::show_screen(&wizard);
        let cmd = match wizard.screen {
            Screen::Login => {
                let Some(username) = ux::ask("Username:") else { break };
                let Some(password) = ux::ask("Password:") else { break };
                Command::SubmitLogin { username, password }
            }
            screen => {
                match screen {
                    Screen::Results => {
                        if let Some(board) = &wizard.board {
                            ux::show_tour(board);
                        }
                    }
                    Screen::Map => ux::show_map(wizard.map.as_ref(), wizard.board.as_ref()),
                    _ => {}
                }
                let Some(line) = ux::ask(prompt_for(screen)) else { break };
                match parse_line(&wizard, &line) {
                    Input::Command(cmd) => cmd,
                    Input::Quit => break,
                    Input::Unknown(text) => {
                        ux::alert(&format!("Unrecognized input: {text}"));
                        continue;
                    }
                }
            }
        };
        dispatch(&mut wizard, cmd, &api, &geocoder).await;
    }
    println!("Goodbye!");
    Ok(())
}

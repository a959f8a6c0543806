//! The tour wizard as a unidirectional state machine.
//!
//! Every user action or finished side effect is a [`Command`]; [`Wizard::handle`]
//! moves to the next state and returns the [`Effect`]s the driver must run.
//! Each effect's outcome comes back as another command.

use crate::geocode::Coordinates;
use crate::map::MapView;
use crate::render::{CarouselEvent, TourBoard};
use crate::wire::{RefreshRequest, StopRecord, TourRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Location,
    Interests,
    StopCount,
    Loading,
    Results,
    Map,
}

/// What the user has entered so far for the tour being built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub location: String,
    pub interests: String,
    pub stop_count: Option<i64>,
    /// Place name from device coordinates; survives "new tour".
    pub detected_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LocationStatus {
    #[default]
    Idle,
    Locating,
    Detected(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SubmitLogin { username: String, password: String },
    LoginFinished(Result<(), String>),
    DetectLocation(Coordinates),
    LocationDetected(Result<String, String>),
    SubmitLocation(String),
    SubmitInterests(String),
    SubmitStopCount(String),
    TourFinished(Result<Vec<StopRecord>, String>),
    RefreshStop(usize),
    StopRefreshed { index: usize, generation: u64, result: Result<StopRecord, String> },
    Carousel { index: usize, event: CarouselEvent },
    ShowMap,
    MapReady(MapView),
    CloseMap,
    NewTour,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Login { username: String, password: String },
    ReverseGeocode(Coordinates),
    GenerateTour(TourRequest),
    RefreshStop { index: usize, generation: u64, request: RefreshRequest },
    PlotMap(Vec<StopRecord>),
    /// Blocking, user-visible failure message.
    Alert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wizard {
    pub screen: Screen,
    pub session: Session,
    pub location_status: LocationStatus,
    /// Inline message for the current screen.
    pub error: Option<String>,
    pub board: Option<TourBoard>,
    pub map: Option<MapView>,
    login_pending: bool,
    /// Boards built so far; each new board takes the next value as its generation.
    tours: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            session: Session::default(),
            location_status: LocationStatus::Idle,
            error: None,
            board: None,
            map: None,
            login_pending: false,
            tours: 0,
        }
    }

    fn go(&mut self, screen: Screen) {
        self.screen = screen;
        self.error = None;
    }

    pub fn handle(&mut self, cmd: Command) -> Vec<Effect> {
        match (self.screen, cmd) {
            (Screen::Login, Command::SubmitLogin { username, password }) => {
                if self.login_pending {
                    return vec![];
                }
                self.login_pending = true;
                self.error = None;
                vec![Effect::Login { username, password }]
            }
            (Screen::Login, Command::LoginFinished(result)) => {
                self.login_pending = false;
                match result {
                    Ok(()) => self.go(Screen::Location),
                    Err(message) => self.error = Some(message),
                }
                vec![]
            }

            (Screen::Location, Command::DetectLocation(at)) => {
                if self.location_status == LocationStatus::Locating {
                    return vec![];
                }
                self.location_status = LocationStatus::Locating;
                vec![Effect::ReverseGeocode(at)]
            }
            // Detection may finish after the user already moved on; keep the result.
            (_, Command::LocationDetected(result)) => {
                self.location_status = match result {
                    Ok(name) => {
                        self.session.detected_location = Some(name.clone());
                        LocationStatus::Detected(name)
                    }
                    Err(message) => LocationStatus::Failed(message),
                };
                vec![]
            }
            (Screen::Location, Command::SubmitLocation(text)) => {
                let typed = text.trim();
                let chosen = if typed.is_empty() {
                    self.session.detected_location.clone()
                } else {
                    Some(typed.to_string())
                };
                match chosen {
                    Some(location) => {
                        self.session.location = location;
                        self.go(Screen::Interests);
                    }
                    None => self.error = Some("Please enter a location".into()),
                }
                vec![]
            }
            (Screen::Interests, Command::SubmitInterests(text)) => {
                let interests = text.trim();
                if interests.is_empty() {
                    self.error = Some("Please tell us what you're interested in".into());
                } else {
                    self.session.interests = interests.to_string();
                    self.go(Screen::StopCount);
                }
                vec![]
            }
            (Screen::StopCount, Command::SubmitStopCount(text)) => {
                match text.trim().parse::<i64>() {
                    Ok(n) if n >= 1 => {
                        self.session.stop_count = Some(n);
                        self.go(Screen::Loading);
                        vec![Effect::GenerateTour(TourRequest {
                            location: self.session.location.clone(),
                            interests: self.session.interests.clone(),
                            number_of_stops: n,
                        })]
                    }
                    _ => {
                        self.error = Some("Number of stops must be a whole number of at least 1".into());
                        vec![]
                    }
                }
            }
            (Screen::Loading, Command::TourFinished(result)) => match result {
                Ok(stops) => {
                    self.tours += 1;
                    let board = TourBoard::new(
                        self.session.location.clone(),
                        self.session.interests.clone(),
                        stops,
                    );
                    self.board = Some(board.with_generation(self.tours));
                    self.go(Screen::Results);
                    vec![]
                }
                Err(message) => {
                    self.go(Screen::StopCount);
                    self.error = Some(message.clone());
                    vec![Effect::Alert(format!("Error generating tour: {message}"))]
                }
            },

            (Screen::Results | Screen::Map, Command::RefreshStop(index)) => self
                .board
                .as_mut()
                .and_then(|b| {
                    let generation = b.generation;
                    b.begin_refresh(index).map(|request| Effect::RefreshStop { index, generation, request })
                })
                .into_iter()
                .collect(),
            (Screen::Results | Screen::Map, Command::StopRefreshed { index, generation, result }) => {
                let Some(board) = self.board.as_mut().filter(|b| b.generation == generation) else {
                    tracing::debug!(index, generation, "refresh finished for a previous tour; dropped");
                    return vec![];
                };
                let alert = result.as_ref().err().map(|m| Effect::Alert(format!("Error refreshing stop: {m}")));
                if !board.complete_refresh(index, result) {
                    tracing::debug!(index, "refresh finished for a tile that was not refreshing; dropped");
                    return vec![];
                }
                alert.into_iter().collect()
            }
            (Screen::Results | Screen::Map, Command::Carousel { index, event }) => {
                if let Some(board) = self.board.as_mut() {
                    board.carousel_event(index, event);
                }
                vec![]
            }

            (Screen::Results, Command::ShowMap) => match &self.board {
                Some(board) => {
                    let stops = board.stops();
                    self.map = None;
                    self.go(Screen::Map);
                    vec![Effect::PlotMap(stops)]
                }
                None => vec![],
            },
            (Screen::Map, Command::MapReady(view)) => {
                self.map = Some(view);
                vec![]
            }
            (Screen::Map, Command::CloseMap) => {
                self.go(Screen::Results);
                vec![]
            }

            (Screen::Results | Screen::Map, Command::NewTour) => {
                let detected = self.session.detected_location.take();
                self.session = Session { detected_location: detected, ..Session::default() };
                self.board = None;
                self.map = None;
                self.go(Screen::Location);
                vec![]
            }

            (screen, cmd) => {
                tracing::debug!(?screen, ?cmd, "command ignored in current screen");
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(name: &str) -> StopRecord {
        StopRecord { name: name.into(), description: "d".into(), ..Default::default() }
    }

    fn logged_in() -> Wizard {
        let mut w = Wizard::new();
        w.handle(Command::SubmitLogin { username: "demo".into(), password: "tour123".into() });
        w.handle(Command::LoginFinished(Ok(())));
        w
    }

    fn at_results(stops: Vec<StopRecord>) -> Wizard {
        let mut w = logged_in();
        w.handle(Command::SubmitLocation("Paris".into()));
        w.handle(Command::SubmitInterests("art".into()));
        w.handle(Command::SubmitStopCount("3".into()));
        w.handle(Command::TourFinished(Ok(stops)));
        w
    }

    #[test]
    fn happy_path_walks_every_screen_in_order() {
        let mut w = Wizard::new();
        let fx = w.handle(Command::SubmitLogin { username: "demo".into(), password: "tour123".into() });
        assert_eq!(fx, [Effect::Login { username: "demo".into(), password: "tour123".into() }]);
        assert_eq!(w.screen, Screen::Login);

        w.handle(Command::LoginFinished(Ok(())));
        assert_eq!(w.screen, Screen::Location);
        w.handle(Command::SubmitLocation("  Paris ".into()));
        assert_eq!(w.screen, Screen::Interests);
        w.handle(Command::SubmitInterests("art museums".into()));
        assert_eq!(w.screen, Screen::StopCount);

        let fx = w.handle(Command::SubmitStopCount("3".into()));
        assert_eq!(w.screen, Screen::Loading);
        assert_eq!(
            fx,
            [Effect::GenerateTour(TourRequest {
                location: "Paris".into(),
                interests: "art museums".into(),
                number_of_stops: 3,
            })]
        );

        w.handle(Command::TourFinished(Ok(vec![stop("Louvre"), stop("Orsay")])));
        assert_eq!(w.screen, Screen::Results);
        assert_eq!(w.board.as_ref().unwrap().tiles.len(), 2);
    }

    #[test]
    fn login_failure_stays_inline() {
        let mut w = Wizard::new();
        w.handle(Command::SubmitLogin { username: "x".into(), password: "y".into() });
        let again = w.handle(Command::SubmitLogin { username: "x".into(), password: "y".into() });
        assert!(again.is_empty(), "second submit while pending is ignored");
        w.handle(Command::LoginFinished(Err("Invalid credentials".into())));
        assert_eq!(w.screen, Screen::Login);
        assert_eq!(w.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn generation_failure_returns_to_stop_count_with_data_kept() {
        let mut w = logged_in();
        w.handle(Command::SubmitLocation("Paris".into()));
        w.handle(Command::SubmitInterests("art".into()));
        w.handle(Command::SubmitStopCount("4".into()));
        let fx = w.handle(Command::TourFinished(Err("Failed to generate tour".into())));

        assert_eq!(w.screen, Screen::StopCount);
        assert_eq!(fx, [Effect::Alert("Error generating tour: Failed to generate tour".into())]);
        assert_eq!(w.session.location, "Paris");
        assert_eq!(w.session.interests, "art");
        assert_eq!(w.session.stop_count, Some(4));
        assert!(w.board.is_none());
    }

    #[test]
    fn invalid_stop_counts_never_generate() {
        let mut w = logged_in();
        w.handle(Command::SubmitLocation("Paris".into()));
        w.handle(Command::SubmitInterests("art".into()));
        for bad in ["0", "-2", "three", ""] {
            assert!(w.handle(Command::SubmitStopCount(bad.into())).is_empty(), "{bad}");
            assert_eq!(w.screen, Screen::StopCount);
            assert!(w.error.is_some());
        }
    }

    #[test]
    fn typed_location_beats_detected_one() {
        let mut w = logged_in();
        let at = Coordinates { lat: 48.85, lon: 2.35 };
        assert_eq!(w.handle(Command::DetectLocation(at)), [Effect::ReverseGeocode(at)]);
        assert!(w.handle(Command::DetectLocation(at)).is_empty());
        w.handle(Command::LocationDetected(Ok("Paris, Île-de-France, France".into())));
        assert_eq!(w.location_status, LocationStatus::Detected("Paris, Île-de-France, France".into()));

        w.handle(Command::SubmitLocation("Lyon".into()));
        assert_eq!(w.session.location, "Lyon");
    }

    #[test]
    fn detected_location_fills_an_empty_entry_and_survives_reset() {
        let mut w = logged_in();
        w.handle(Command::DetectLocation(Coordinates { lat: 48.85, lon: 2.35 }));
        w.handle(Command::LocationDetected(Ok("Paris, France".into())));
        w.handle(Command::SubmitLocation("".into()));
        assert_eq!(w.session.location, "Paris, France");
        w.handle(Command::SubmitInterests("food".into()));
        w.handle(Command::SubmitStopCount("2".into()));
        w.handle(Command::TourFinished(Ok(vec![stop("A")])));

        w.handle(Command::NewTour);
        assert_eq!(w.screen, Screen::Location);
        assert_eq!(w.session.location, "");
        assert_eq!(w.session.stop_count, None);
        assert_eq!(w.session.detected_location.as_deref(), Some("Paris, France"));
        assert!(w.board.is_none());
    }

    #[test]
    fn empty_location_without_detection_is_refused() {
        let mut w = logged_in();
        w.handle(Command::SubmitLocation("  ".into()));
        assert_eq!(w.screen, Screen::Location);
        assert!(w.error.is_some());
    }

    #[test]
    fn refresh_round_trip_through_effects() {
        let mut w = at_results(vec![stop("Louvre"), stop("Orsay")]);
        let fx = w.handle(Command::RefreshStop(0));
        let [Effect::RefreshStop { index, generation, request }] = fx.as_slice() else { panic!("{fx:?}") };
        assert_eq!(*index, 0);
        let generation = *generation;
        assert_eq!(request.current_stops, ["Orsay"]);

        let fx = w.handle(Command::StopRefreshed {
            index: 0,
            generation,
            result: Err("Failed to refresh stop".into()),
        });
        assert_eq!(fx, [Effect::Alert("Error refreshing stop: Failed to refresh stop".into())]);
        assert_eq!(w.board.as_ref().unwrap().tiles[0].stop.name, "Louvre");

        w.handle(Command::RefreshStop(0));
        w.handle(Command::StopRefreshed { index: 0, generation, result: Ok(stop("Orangerie")) });
        assert_eq!(w.board.as_ref().unwrap().tiles[0].stop.name, "Orangerie");
    }

    #[test]
    fn refresh_from_a_previous_tour_does_not_touch_the_new_one() {
        let mut w = at_results(vec![stop("Louvre"), stop("Orsay")]);
        let fx = w.handle(Command::RefreshStop(0));
        let [Effect::RefreshStop { generation, .. }] = fx.as_slice() else { panic!("{fx:?}") };
        let stale = *generation;

        w.handle(Command::NewTour);
        w.handle(Command::SubmitLocation("Tokyo".into()));
        w.handle(Command::SubmitInterests("food".into()));
        w.handle(Command::SubmitStopCount("2".into()));
        w.handle(Command::TourFinished(Ok(vec![stop("Tsukiji"), stop("Ramen Alley")])));
        assert_eq!(w.screen, Screen::Results);

        let fx = w.handle(Command::StopRefreshed {
            index: 0,
            generation: stale,
            result: Ok(stop("Musée de l'Orangerie")),
        });
        assert!(fx.is_empty());
        let names: Vec<_> = w.board.as_ref().unwrap().stops().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Tsukiji", "Ramen Alley"]);

        let fx = w.handle(Command::StopRefreshed { index: 1, generation: stale, result: Err("late".into()) });
        assert!(fx.is_empty(), "stale failures raise no alert");
        assert!(w.board.as_ref().unwrap().tiles[1].error.is_none());
    }

    #[test]
    fn completion_without_a_pending_refresh_is_dropped() {
        let mut w = at_results(vec![stop("Louvre")]);
        let generation = w.board.as_ref().unwrap().generation;
        let fx = w.handle(Command::StopRefreshed { index: 0, generation, result: Ok(stop("Orangerie")) });
        assert!(fx.is_empty());
        assert_eq!(w.board.as_ref().unwrap().tiles[0].stop.name, "Louvre");
    }

    #[test]
    fn map_opens_with_current_stops_and_closes_back() {
        let mut w = at_results(vec![stop("Louvre")]);
        let fx = w.handle(Command::ShowMap);
        assert_eq!(w.screen, Screen::Map);
        assert_eq!(fx, [Effect::PlotMap(vec![stop("Louvre")])]);
        w.handle(Command::MapReady(MapView::default()));
        assert!(w.map.is_some());
        w.handle(Command::CloseMap);
        assert_eq!(w.screen, Screen::Results);
    }

    #[test]
    fn late_tour_result_after_leaving_loading_is_dropped() {
        let mut w = logged_in();
        let fx = w.handle(Command::TourFinished(Ok(vec![stop("A")])));
        assert!(fx.is_empty());
        assert_eq!(w.screen, Screen::Location);
        assert!(w.board.is_none());
    }
}

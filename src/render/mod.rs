//! Stop tiles and the image carousel inside each one.
//!
//! Everything here is a pure reducer over plain data; whatever draws the tiles
//! re-derives its view from the current state after each event.

use crate::wire::{RefreshRequest, StopRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEvent {
    Next,
    Prev,
    Show(usize),
    /// The image at this URL failed to load.
    ImageFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carousel {
    urls: Vec<String>,
    active: usize,
}

impl Carousel {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls, active: 0 }
    }

    pub fn reduce(mut self, event: CarouselEvent) -> Self {
        let len = self.urls.len();
        match event {
            _ if len == 0 => {}
            CarouselEvent::Next => self.active = (self.active + 1) % len,
            CarouselEvent::Prev => self.active = (self.active + len - 1) % len,
            CarouselEvent::Show(i) if i < len => self.active = i,
            CarouselEvent::Show(_) => {}
            CarouselEvent::ImageFailed(url) => {
                if let Some(pos) = self.urls.iter().position(|u| *u == url) {
                    self.urls.remove(pos);
                    // The following image slides into the failed one's slot.
                    if pos < self.active {
                        self.active -= 1;
                    }
                    self.active = self.active.min(self.urls.len().saturating_sub(1));
                }
            }
        }
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_url(&self) -> Option<&str> {
        self.urls.get(self.active).map(String::as_str)
    }

    /// No loadable image left: the region is not drawn at all.
    pub fn is_collapsed(&self) -> bool {
        self.urls.is_empty()
    }

    /// Arrows and indicator dots only make sense with something to move to.
    pub fn shows_navigation(&self) -> bool {
        self.urls.len() > 1
    }

    /// One flag per image, `true` for the active one.
    pub fn indicators(&self) -> Vec<bool> {
        (0..self.urls.len()).map(|i| i == self.active).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub index: usize,
    pub stop: StopRecord,
    pub carousel: Carousel,
    /// Refresh in flight; the refresh control is disabled.
    pub refreshing: bool,
    pub error: Option<String>,
}

impl Tile {
    /// Labelled details that are actually present; absent phone/website are left out.
    pub fn detail_lines(&self) -> Vec<(&'static str, &str)> {
        let s = &self.stop;
        [
            ("Duration", Some(s.duration.as_str())),
            ("Address", Some(s.address.as_str())),
            ("Phone", s.phone.as_deref()),
            ("Website", s.website.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, v)| v.filter(|v| !v.trim().is_empty()).map(|v| (label, v)))
        .collect()
    }
}

pub fn render_stop(stop: StopRecord, index: usize) -> Tile {
    let carousel = Carousel::new(stop.images.clone());
    Tile { index, stop, carousel, refreshing: false, error: None }
}

/// The tiles of one generated tour plus the inputs needed to refresh them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourBoard {
    pub location: String,
    pub interests: String,
    pub tiles: Vec<Tile>,
    /// Distinguishes this tour from earlier ones, so refreshes started on a
    /// previous board can be recognised when they finish.
    pub generation: u64,
}

impl TourBoard {
    pub fn new(location: impl Into<String>, interests: impl Into<String>, stops: Vec<StopRecord>) -> Self {
        Self {
            location: location.into(),
            interests: interests.into(),
            tiles: stops.into_iter().enumerate().map(|(i, s)| render_stop(s, i)).collect(),
            generation: 0,
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn stops(&self) -> Vec<StopRecord> {
        self.tiles.iter().map(|t| t.stop.clone()).collect()
    }

    /// Every displayed name except the one at `index`.
    pub fn exclusions_for(&self, index: usize) -> Vec<String> {
        self.tiles
            .iter()
            .filter(|t| t.index != index)
            .map(|t| t.stop.name.clone())
            .collect()
    }

    /// Marks the tile busy and returns the request to send, or `None` when the
    /// index is unknown or that tile is already refreshing. Other tiles may
    /// refresh at the same time.
    pub fn begin_refresh(&mut self, index: usize) -> Option<RefreshRequest> {
        let exclude = self.exclusions_for(index);
        let tile = self.tiles.get_mut(index)?;
        if tile.refreshing {
            return None;
        }
        tile.refreshing = true;
        tile.error = None;
        Some(RefreshRequest {
            location: self.location.clone(),
            interests: self.interests.clone(),
            current_stops: exclude,
        })
    }

    /// Swaps in a freshly rendered tile on success. On failure the old tile
    /// stays in place with the error attached. Only `index` is touched, and
    /// only while it is refreshing; anything else is a stale completion.
    pub fn complete_refresh(&mut self, index: usize, outcome: Result<StopRecord, String>) -> bool {
        let Some(tile) = self.tiles.get_mut(index).filter(|t| t.refreshing) else {
            return false;
        };
        match outcome {
            Ok(stop) => *tile = render_stop(stop, index),
            Err(message) => {
                tile.refreshing = false;
                tile.error = Some(message);
            }
        }
        true
    }

    pub fn carousel_event(&mut self, index: usize, event: CarouselEvent) {
        if let Some(tile) = self.tiles.get_mut(index) {
            tile.carousel = std::mem::take(&mut tile.carousel).reduce(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://img.example/{i}.jpg")).collect()
    }

    fn stop(name: &str) -> StopRecord {
        StopRecord { name: name.into(), description: "d".into(), ..Default::default() }
    }

    #[test]
    fn failed_first_image_promotes_the_second() {
        let c = Carousel::new(urls(3)).reduce(CarouselEvent::ImageFailed(urls(1)[0].clone()));
        assert_eq!(c.active_url(), Some("https://img.example/2.jpg"));
        assert!(!c.urls().contains(&urls(1)[0]));
        assert_eq!(c.urls().len(), 2);
    }

    #[test]
    fn failure_before_active_keeps_the_same_image_showing() {
        let c = Carousel::new(urls(3))
            .reduce(CarouselEvent::Show(2))
            .reduce(CarouselEvent::ImageFailed(urls(3)[0].clone()));
        assert_eq!(c.active_url(), Some("https://img.example/3.jpg"));
    }

    #[test]
    fn failed_last_active_image_falls_back() {
        let c = Carousel::new(urls(2))
            .reduce(CarouselEvent::Next)
            .reduce(CarouselEvent::ImageFailed(urls(2)[1].clone()));
        assert_eq!(c.active_url(), Some("https://img.example/1.jpg"));
        assert!(!c.shows_navigation());
        assert!(!c.is_collapsed());
    }

    #[test]
    fn all_images_failing_collapses_the_carousel() {
        let c = urls(2)
            .into_iter()
            .fold(Carousel::new(urls(2)), |c, u| c.reduce(CarouselEvent::ImageFailed(u)));
        assert!(c.is_collapsed());
        assert_eq!(c.active_url(), None);
        assert!(c.indicators().is_empty());
        assert_eq!(c.clone().reduce(CarouselEvent::Next), c);
    }

    #[test]
    fn navigation_wraps() {
        let c = Carousel::new(urls(3)).reduce(CarouselEvent::Prev);
        assert_eq!(c.active_index(), 2);
        let c = c.reduce(CarouselEvent::Next);
        assert_eq!(c.active_index(), 0);
        assert_eq!(c.indicators(), [true, false, false]);
        assert_eq!(c.clone().reduce(CarouselEvent::Show(9)), c);
    }

    #[test]
    fn unknown_failed_url_is_ignored() {
        let c = Carousel::new(urls(2));
        assert_eq!(c.clone().reduce(CarouselEvent::ImageFailed("nope".into())), c);
    }

    #[test]
    fn detail_lines_skip_missing_contact_fields() {
        let tile = render_stop(
            StopRecord {
                duration: "1 hour".into(),
                address: "1 Main St".into(),
                phone: Some(" ".into()),
                ..stop("Cafe")
            },
            0,
        );
        assert_eq!(tile.detail_lines(), [("Duration", "1 hour"), ("Address", "1 Main St")]);
    }

    #[test]
    fn refresh_excludes_every_other_name_and_swaps_in_place() {
        let mut board = TourBoard::new("Paris", "art", vec![stop("Louvre"), stop("Orsay"), stop("Rodin")]);
        let req = board.begin_refresh(1).unwrap();
        assert_eq!(req.current_stops, ["Louvre", "Rodin"]);
        assert_eq!(req.location, "Paris");
        assert!(board.tiles[1].refreshing);
        assert!(board.begin_refresh(1).is_none(), "same tile cannot refresh twice at once");

        assert!(board.complete_refresh(1, Ok(stop("Orangerie"))));
        let names: Vec<_> = board.tiles.iter().map(|t| t.stop.name.as_str()).collect();
        assert_eq!(names, ["Louvre", "Orangerie", "Rodin"]);
        assert!(!board.tiles[1].refreshing);
        assert_eq!(board.tiles[1].index, 1);
    }

    #[test]
    fn failed_refresh_keeps_the_old_tile() {
        let mut board = TourBoard::new("Paris", "art", vec![stop("Louvre"), stop("Orsay")]);
        board.begin_refresh(0).unwrap();
        board.complete_refresh(0, Err("Failed to refresh stop".into()));
        assert_eq!(board.tiles[0].stop.name, "Louvre");
        assert_eq!(board.tiles[0].error.as_deref(), Some("Failed to refresh stop"));
        assert!(!board.tiles[0].refreshing);
    }

    #[test]
    fn concurrent_refreshes_complete_in_any_order() {
        let mut board = TourBoard::new("Paris", "art", vec![stop("A"), stop("B"), stop("C")]);
        board.begin_refresh(0).unwrap();
        board.begin_refresh(2).unwrap();
        board.complete_refresh(2, Ok(stop("Z")));
        board.complete_refresh(0, Ok(stop("X")));
        let names: Vec<_> = board.stops().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["X", "B", "Z"]);
        assert!(!board.complete_refresh(7, Ok(stop("nope"))));
    }

    #[test]
    fn completion_for_an_idle_tile_is_ignored() {
        let mut board = TourBoard::new("Paris", "art", vec![stop("Louvre"), stop("Orsay")]);
        assert!(!board.complete_refresh(0, Ok(stop("Orangerie"))));
        assert!(!board.complete_refresh(1, Err("late".into())));
        assert_eq!(board.tiles[0].stop.name, "Louvre");
        assert!(board.tiles[1].error.is_none());
    }

    #[test]
    fn carousel_events_are_scoped_to_one_tile() {
        let with_images = |name: &str| StopRecord { images: urls(2), ..stop(name) };
        let mut board = TourBoard::new("Paris", "art", vec![with_images("A"), with_images("B")]);
        board.carousel_event(0, CarouselEvent::ImageFailed(urls(1)[0].clone()));
        assert_eq!(board.tiles[0].carousel.urls().len(), 1);
        assert_eq!(board.tiles[1].carousel.urls().len(), 2);
    }
}

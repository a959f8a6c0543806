use futures::future::join_all;

use crate::geocode::{Coordinates, Geocoder};
use crate::wire::StopRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position of the stop in the tour.
    pub index: usize,
    pub name: String,
    pub address: String,
    pub at: Coordinates,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapView {
    pub markers: Vec<Marker>,
    pub center: Option<Coordinates>,
    /// Stops that could not be placed (empty address, unknown, or lookup failed).
    pub unplaced: Vec<usize>,
}

/// Geocodes every stop's address independently; one failed lookup never
/// hides the others. Markers keep tour order and the view centers on the first.
pub async fn plot_stops(stops: &[StopRecord], geocoder: &dyn Geocoder) -> MapView {
    let lookups = stops.iter().enumerate().map(|(index, stop)| async move {
        let address = stop.address.trim();
        if address.is_empty() {
            return (index, None);
        }
        match geocoder.forward(address).await {
            Ok(found) => (index, found),
            Err(e) => {
                tracing::warn!(stop = %stop.name, error = %e, "could not geocode stop");
                (index, None)
            }
        }
    });

    let mut view = MapView::default();
    for (index, found) in join_all(lookups).await {
        match found {
            Some(at) => view.markers.push(Marker {
                index,
                name: stops[index].name.clone(),
                address: stops[index].address.clone(),
                at,
            }),
            None => view.unplaced.push(index),
        }
    }
    view.center = view.markers.first().map(|m| m.at);
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TourError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedGeocoder(HashMap<&'static str, Coordinates>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn reverse(&self, _at: Coordinates) -> Result<String, TourError> {
            Ok("Paris, France".into())
        }

        async fn forward(&self, address: &str) -> Result<Option<Coordinates>, TourError> {
            if address == "boom" {
                return Err(TourError::Provider("nominatim API error (503)".into()));
            }
            Ok(self.0.get(address).copied())
        }
    }

    fn stop(name: &str, address: &str) -> StopRecord {
        StopRecord { name: name.into(), description: "d".into(), address: address.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn each_stop_is_placed_independently() {
        let louvre = Coordinates { lat: 48.8606, lon: 2.3376 };
        let orsay = Coordinates { lat: 48.86, lon: 2.3266 };
        let geo = FixedGeocoder(HashMap::from([("Rue de Rivoli", louvre), ("Rue de Lille", orsay)]));
        let stops = [
            stop("Louvre", "Rue de Rivoli"),
            stop("Nowhere", "Unknown Street"),
            stop("Broken", "boom"),
            stop("Blank", "  "),
            stop("Orsay", "Rue de Lille"),
        ];

        let view = plot_stops(&stops, &geo).await;
        let placed: Vec<_> = view.markers.iter().map(|m| (m.index, m.name.as_str())).collect();
        assert_eq!(placed, [(0, "Louvre"), (4, "Orsay")]);
        assert_eq!(view.unplaced, [1, 2, 3]);
        assert_eq!(view.center, Some(louvre));
    }

    #[tokio::test]
    async fn empty_tour_has_no_center() {
        let view = plot_stops(&[], &FixedGeocoder(HashMap::new())).await;
        assert_eq!(view, MapView::default());
    }
}

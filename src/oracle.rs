use chrono::{Duration, NaiveDateTime};

use crate::clock::isoformat;

/// Oracle data-feed status board
///
/// Fixed list of the providers a resolver would read from. Every feed is
/// reported fresh except grubhub, which has been in maintenance for two hours.
pub fn data_feeds(now: NaiveDateTime) -> serde_json::Value {
    let fresh = isoformat(now);
    let feed = |status: &str, last_update: &str| {
        serde_json::json!({ "status": status, "last_update": last_update })
    };

    serde_json::json!({
        "delivery_apis": {
            "doordash": feed("active", &fresh),
            "ubereats": feed("active", &fresh),
            "grubhub": feed("maintenance", &isoformat(now - Duration::hours(2))),
        },
        "transit_apis": {
            "gtfs": feed("active", &fresh),
            "mta": feed("active", &fresh),
        },
        "flight_apis": {
            "flightaware": feed("active", &fresh),
            "aviationstack": feed("active", &fresh),
        },
        "weather_apis": {
            "noaa": feed("active", &fresh),
            "openweather": feed("active", &fresh),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};

    #[test]
    fn test_feed_board() {
        let feeds = data_feeds(FixedClock::at_hour(10).now());
        assert_eq!(feeds["delivery_apis"]["doordash"]["status"], "active");
        assert_eq!(feeds["delivery_apis"]["grubhub"]["status"], "maintenance");
        assert_eq!(feeds["delivery_apis"]["grubhub"]["last_update"], "2024-06-01T08:00:00.000000");
        assert_eq!(feeds["flight_apis"]["aviationstack"]["last_update"], "2024-06-01T10:00:00.000000");
        assert_eq!(feeds["weather_apis"].as_object().unwrap().len(), 2);
    }
}

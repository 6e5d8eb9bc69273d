use rand::{Rng, seq::SliceRandom};

use crate::models::{Driver, RideOption};

pub fn ride_options() -> Vec<RideOption> {
    vec![
        RideOption {
            id: "swiftgo".into(),
            name: "SwiftGo".into(),
            description: "Affordable, everyday rides".into(),
            multiplier: 1.0,
            capacity: 4,
        },
        RideOption {
            id: "swiftcomfort".into(),
            name: "SwiftComfort".into(),
            description: "Newer cars with extra legroom".into(),
            multiplier: 1.3,
            capacity: 4,
        },
        RideOption {
            id: "swiftxl".into(),
            name: "SwiftXL".into(),
            description: "Affordable rides for groups up to 6".into(),
            multiplier: 1.8,
            capacity: 6,
        },
    ]
}

pub fn find_ride(id: &str) -> Option<RideOption> {
    ride_options().into_iter().find(|ride| ride.id == id)
}

pub fn default_driver() -> Driver {
    Driver {
        name: "David L.".into(),
        rating: 4.9,
        vehicle_model: "Toyota Prius".into(),
        license_plate: "5XYZ123".into(),
        avatar_url: "https://picsum.photos/id/1005/200/200".into(),
        eta_minutes: 3,
        total_trips: 1_284,
        member_since: "2019".into(),
    }
}

fn roster() -> Vec<Driver> {
    vec![
        default_driver(),
        Driver {
            name: "Priya S.".into(),
            rating: 4.8,
            vehicle_model: "Hyundai Verna".into(),
            license_plate: "KA01AB4321".into(),
            avatar_url: "https://picsum.photos/id/1011/200/200".into(),
            eta_minutes: 4,
            total_trips: 862,
            member_since: "2021".into(),
        },
        Driver {
            name: "Marcus T.".into(),
            rating: 4.7,
            vehicle_model: "Honda Civic".into(),
            license_plate: "7ABC889".into(),
            avatar_url: "https://picsum.photos/id/1012/200/200".into(),
            eta_minutes: 2,
            total_trips: 2_315,
            member_since: "2017".into(),
        },
    ]
}

/// Assigns one of the mock drivers.
pub fn pick_driver<R: Rng + ?Sized>(rng: &mut R) -> Driver {
    roster()
        .choose(rng)
        .cloned()
        .unwrap_or_else(default_driver)
}

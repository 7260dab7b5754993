//! Hotel reservation argument generators.
use super::registry::{ArgGenerator, Encoding, Params};
use rand::{Rng, RngCore};

pub(crate) const GENERATORS: &[(&str, ArgGenerator)] = &[
    ("hotel_SearchHandler", search),
    ("hotel_RecommendHandler", recommend),
    ("hotel_UserHandler", user),
    ("hotel_ReservationHandler", reservation),
];

const REQUIRES: &[&str] = &["dis", "rate", "price"];

fn coordinates(rng: &mut dyn RngCore) -> (f64, f64) {
    (
        38.0235 + (rng.gen_range(0..=481) as f64 - 240.5) / 1000.0,
        -122.095 + (rng.gen_range(0..=325) as f64 - 157.0) / 1000.0,
    )
}

/// Check-in day in April 2015 and the day after it.
fn stay(rng: &mut dyn RngCore) -> (String, String) {
    let day = rng.gen_range(9..=23);
    let nights = rng.gen_range(1..=5);
    (
        format!("2015-04-{day:02}"),
        format!("2015-04-{:02}", day + nights),
    )
}

fn customer(rng: &mut dyn RngCore) -> (String, String) {
    let id = rng.gen_range(0..=500);
    let password = id.to_string().repeat(10);
    (format!("Cornell_{id}"), password)
}

fn search(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let (lat, lon) = coordinates(rng);
    let (in_date, out_date) = stay(rng);
    vec![
        ("customerName", enc.text("Vaastav")),
        ("inDate", enc.text(&in_date)),
        ("outDate", enc.text(&out_date)),
        ("lat", enc.value(&lat)),
        ("lon", enc.value(&lon)),
        ("locale", enc.text("en")),
    ]
}

fn recommend(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let (lat, lon) = coordinates(rng);
    let require = REQUIRES[rng.gen_range(0..REQUIRES.len())];
    vec![
        ("lat", enc.value(&lat)),
        ("lon", enc.value(&lon)),
        ("require", enc.text(require)),
        ("locale", enc.text("en")),
    ]
}

fn user(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let (username, password) = customer(rng);
    vec![
        ("username", enc.text(&username)),
        ("password", enc.text(&password)),
    ]
}

fn reservation(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let (in_date, out_date) = stay(rng);
    let (username, password) = customer(rng);
    let hotel = rng.gen_range(1..=80);
    vec![
        ("inDate", enc.text(&in_date)),
        ("outDate", enc.text(&out_date)),
        ("hotelId", enc.text(&hotel.to_string())),
        ("customerName", enc.text(&username)),
        ("username", enc.text(&username)),
        ("password", enc.text(&password)),
        ("number", enc.value(&1)),
    ]
}

// 🌱 Seed Data - a small, complete rental dataset
//
// Used by `bike-reports seed` to populate an empty database, and by the
// tests as a shared fixture. Shape:
//   bikes:       mountain ×3, road ×3, hybrid ×2, electric ×2
//   customers:   6, one (Michael Davis) with no rentals and no memberships
//   rentals:     11 / 6 / 5 / 2 / 0 / 1 per customer, 2022 and 2023
//   memberships: both monthly plans sold in every month of Q1 2023

use crate::entities::{Bike, BikeStatus, Customer, Membership, MembershipType, Rental};
use crate::store::Snapshot;
use crate::value::round_currency;
use chrono::{NaiveDate, NaiveDateTime};

/// Rentals per customer id
const RENTAL_PLAN: [(i64, i64); 5] = [(1, 11), (2, 6), (3, 5), (4, 2), (6, 1)];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("seed dates are valid calendar dates")
}

fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, 0, 0).expect("seed hours are within 0..24")
}

pub fn customers() -> Vec<Customer> {
    vec![
        Customer::new(1, "John Smith", "john.smith@example.com"),
        Customer::new(2, "Alice Johnson", "alice.johnson@example.com"),
        Customer::new(3, "Bob Williams", "bob.williams@example.com"),
        Customer::new(4, "Emma Brown", "emma.brown@example.com"),
        Customer::new(5, "Michael Davis", "michael.davis@example.com"),
        Customer::new(6, "Olivia Miller", "olivia.miller@example.com"),
    ]
}

pub fn bikes() -> Vec<Bike> {
    use BikeStatus::*;
    vec![
        Bike::new(1, "Trek Marlin 5", "mountain bike", 8.00, 40.00, Available),
        Bike::new(2, "Giant Talon 1", "mountain bike", 9.50, 45.00, Rented),
        Bike::new(3, "Specialized Rockhopper", "mountain bike", 10.00, 50.00, OutOfService),
        Bike::new(4, "Cannondale Synapse", "road bike", 12.00, 60.00, Available),
        Bike::new(5, "Trek Domane AL 2", "road bike", 11.00, 55.00, Available),
        Bike::new(6, "Giant Contend 3", "road bike", 10.50, 52.50, Rented),
        Bike::new(7, "Cube Nature", "hybrid", 7.00, 35.00, Available),
        Bike::new(8, "Marin Fairfax", "hybrid", 6.50, 32.00, OutOfService),
        Bike::new(9, "Rad Power RadCity", "electric", 15.00, 75.00, Rented),
        Bike::new(10, "Gazelle Ultimate C380", "electric", 18.00, 90.00, Available),
    ]
}

pub fn rentals(bikes: &[Bike]) -> Vec<Rental> {
    let mut rentals = Vec::new();
    let mut id = 0;

    for (customer_id, count) in RENTAL_PLAN {
        for n in 0..count {
            id += 1;
            let bike = &bikes[(id as usize * 3) % bikes.len()];
            let year = if id % 4 == 0 { 2022 } else { 2023 };
            let month = (id % 6 + 1) as u32;
            let start = at(date(year, month, (n % 27 + 1) as u32), 9 + (n % 8) as u32);
            let duration = 30 * (id % 5 + 1);
            let total_paid = round_currency(bike.price_per_hour * duration as f64 / 60.0);

            rentals.push(Rental::new(id, customer_id, bike.id, start, duration, total_paid));
        }
    }

    rentals
}

pub fn membership_types() -> Vec<MembershipType> {
    vec![
        MembershipType::new(1, "Basic Monthly", "Unlimited 30-minute rides for a month", 50.00),
        MembershipType::new(2, "Premium Monthly", "Unlimited rides of any length for a month", 90.00),
        MembershipType::new(3, "Annual", "Unlimited rides for a year", 500.00),
    ]
}

pub fn memberships() -> Vec<Membership> {
    vec![
        Membership::new(1, 1, 1, date(2022, 11, 1), date(2022, 11, 30), 50.00),
        Membership::new(2, 3, 2, date(2022, 6, 1), date(2023, 5, 31), 500.00),
        Membership::new(3, 1, 1, date(2023, 1, 1), date(2023, 1, 31), 50.00),
        Membership::new(4, 2, 3, date(2023, 1, 5), date(2023, 2, 4), 90.00),
        Membership::new(5, 1, 4, date(2023, 2, 1), date(2023, 2, 28), 50.00),
        Membership::new(6, 2, 1, date(2023, 2, 10), date(2023, 3, 9), 90.00),
        Membership::new(7, 1, 2, date(2023, 3, 1), date(2023, 3, 31), 45.50),
        Membership::new(8, 2, 3, date(2023, 3, 15), date(2023, 4, 14), 90.00),
        Membership::new(9, 2, 6, date(2022, 12, 1), date(2022, 12, 31), 90.00),
    ]
}

/// The complete seed dataset.
pub fn sample_snapshot() -> Snapshot {
    let bikes = bikes();
    Snapshot {
        customers: customers(),
        rentals: rentals(&bikes),
        bikes,
        membership_types: membership_types(),
        memberships: memberships(),
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weekday index, Monday-first: 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekday(u8);

impl Weekday {
    pub const COUNT: u8 = 7;

    const NAMES: [&'static str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];

    pub fn new(index: i32) -> Option<Weekday> {
        if (0..7).contains(&index) {
            Some(Weekday(index as u8))
        } else {
            None
        }
    }

    pub fn index(&self) -> i32 {
        self.0 as i32
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES[self.0 as usize]
    }

    pub fn all() -> impl Iterator<Item = Weekday> {
        (0..Self::COUNT).map(Weekday)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }
}

/// Who holds a seat on a given weekday. Keyed by seat id in
/// [`BookedSeatMap`] so the floor plan can look occupancy up directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub user_name: String,
    pub user_email: Option<String>,
    pub status: String,
}

pub type BookedSeatMap = HashMap<String, Occupant>;

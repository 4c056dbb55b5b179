//! Floor-plan controller: the state machine behind the seat-map canvas.
//!
//! Pure and rendering-free. A view layer feeds pointer events in and draws
//! from the exposed state; nothing here performs I/O. The controller owns
//! seat geometry, the pan/zoom view transform, the view/edit mode machine,
//! both selection sets, per-weekday occupancy, and undo/redo history.

pub mod geometry;
pub mod history;

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{BookedSeatMap, Seat, UserRole, Weekday};
use geometry::{Point, ViewTransform, CANVAS_HEIGHT, CANVAS_WIDTH};
use history::History;

pub const MIN_SEAT_RADIUS: f64 = 5.0;
pub const MAX_SEAT_RADIUS: f64 = 30.0;
pub const DEFAULT_SEAT_RADIUS: f64 = 10.0;
pub const DEFAULT_LABEL_PREFIX: &str = "A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Edit,
}

#[derive(Error, Debug, PartialEq)]
pub enum SeatMapError {
    #[error("Please select a weekday first")]
    WeekdayRequired,

    #[error("Seat booked by {occupant}")]
    SeatBooked { occupant: String },

    #[error("Only a superadmin can switch the layout mode")]
    ModeForbidden,

    #[error("Seat '{label}' lies outside the 0-100 coordinate range")]
    OutOfBounds { label: String },

    #[error("Duplicate seat id '{id}'")]
    DuplicateId { id: String },

    #[error("Duplicate seat label '{label}'")]
    DuplicateLabel { label: String },
}

/// What a pointer click did, for the view layer to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Edit mode, empty space: a seat was placed. Carries the new id.
    SeatAdded(String),
    /// Edit mode, existing seat: toggled in/out of the deletion set.
    DeletionToggled(String),
    /// View mode, unbooked seat: toggled in/out of the booking set.
    SelectionToggled(String),
    /// Click hit nothing actionable.
    Ignored,
}

pub struct SeatMap {
    seats: Vec<Seat>,
    mode: Mode,
    view: ViewTransform,
    weekday: Option<Weekday>,
    booked: BookedSeatMap,
    selected: Vec<String>,
    marked_for_deletion: Vec<String>,
    history: History,
    prefix: String,
    seat_radius: f64,
}

impl Default for SeatMap {
    fn default() -> Self {
        SeatMap::new()
    }
}

impl SeatMap {
    pub fn new() -> SeatMap {
        SeatMap {
            seats: Vec::new(),
            mode: Mode::View,
            view: ViewTransform::default(),
            weekday: None,
            booked: BookedSeatMap::new(),
            selected: Vec::new(),
            marked_for_deletion: Vec::new(),
            history: History::new(Vec::new()),
            prefix: DEFAULT_LABEL_PREFIX.to_string(),
            seat_radius: DEFAULT_SEAT_RADIUS,
        }
    }

    /// Replace the whole layout, e.g. after fetching it from the backend.
    /// Resets history to the new baseline and drops all selections.
    pub fn load(&mut self, seats: Vec<Seat>) {
        self.history.reset(seats.clone());
        self.seats = seats;
        self.selected.clear();
        self.marked_for_deletion.clear();
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.weekday
    }

    pub fn booking_selection(&self) -> &[String] {
        &self.selected
    }

    pub fn deletion_selection(&self) -> &[String] {
        &self.marked_for_deletion
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /* ---------- configuration ---------- */

    pub fn set_label_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.trim().to_uppercase();
    }

    pub fn set_seat_radius(&mut self, radius: f64) {
        self.seat_radius = radius.clamp(MIN_SEAT_RADIUS, MAX_SEAT_RADIUS);
    }

    pub fn seat_radius(&self) -> f64 {
        self.seat_radius
    }

    /* ---------- mode & weekday ---------- */

    /// Switch between view and edit mode. Only the privileged role may
    /// switch; any switch clears both selection sets.
    pub fn set_mode(&mut self, mode: Mode, role: UserRole) -> Result<(), SeatMapError> {
        if role != UserRole::Superadmin {
            return Err(SeatMapError::ModeForbidden);
        }
        self.mode = mode;
        self.selected.clear();
        self.marked_for_deletion.clear();
        Ok(())
    }

    /// Choosing a weekday resets the booking selection: the occupancy map
    /// it was validated against no longer applies.
    pub fn set_weekday(&mut self, weekday: Weekday) {
        self.weekday = Some(weekday);
        self.selected.clear();
    }

    /// Install the occupancy map fetched for the current weekday.
    pub fn set_booked(&mut self, booked: BookedSeatMap) {
        self.booked = booked;
    }

    /* ---------- view transform ---------- */

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
    }

    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        self.view.zoom_at(anchor, factor);
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    /* ---------- pointer input ---------- */

    /// Handle a click at a screen-space position.
    pub fn click(&mut self, screen: Point) -> Result<ClickOutcome, SeatMapError> {
        match self.mode {
            Mode::Edit => Ok(self.click_edit(screen)),
            Mode::View => self.click_view(screen),
        }
    }

    fn click_edit(&mut self, screen: Point) -> ClickOutcome {
        if let Some(seat) = geometry::hit_test(&self.seats, screen, &self.view, self.seat_radius) {
            let id = seat.id.clone();
            if self.marked_for_deletion.contains(&id) {
                self.marked_for_deletion.retain(|s| s != &id);
            } else {
                self.marked_for_deletion.push(id.clone());
            }
            return ClickOutcome::DeletionToggled(id);
        }

        let canvas = self.view.to_canvas(screen);
        if !(0.0..=CANVAS_WIDTH).contains(&canvas.x) || !(0.0..=CANVAS_HEIGHT).contains(&canvas.y) {
            return ClickOutcome::Ignored;
        }

        let (x, y) = geometry::canvas_to_percent(canvas);
        let label = format!("{}{}", self.prefix, self.next_number());
        let seat = Seat {
            id: Uuid::new_v4().to_string(),
            label,
            x,
            y,
        };
        let id = seat.id.clone();
        self.seats.push(seat);
        self.history.record(self.seats.clone());
        ClickOutcome::SeatAdded(id)
    }

    fn click_view(&mut self, screen: Point) -> Result<ClickOutcome, SeatMapError> {
        if self.weekday.is_none() {
            return Err(SeatMapError::WeekdayRequired);
        }

        let Some(seat) = geometry::hit_test(&self.seats, screen, &self.view, self.seat_radius)
        else {
            return Ok(ClickOutcome::Ignored);
        };
        let id = seat.id.clone();

        if let Some(occupant) = self.booked.get(&id) {
            return Err(SeatMapError::SeatBooked {
                occupant: occupant.user_name.clone(),
            });
        }

        if self.selected.contains(&id) {
            self.selected.retain(|s| s != &id);
        } else {
            self.selected.push(id.clone());
        }
        Ok(ClickOutcome::SelectionToggled(id))
    }

    /// Lowest unused integer suffix for the configured prefix, starting
    /// at 1. Freed suffixes are reused.
    fn next_number(&self) -> u32 {
        let taken: HashSet<u32> = self
            .seats
            .iter()
            .filter_map(|s| s.label.strip_prefix(&self.prefix))
            .filter_map(|rest| rest.parse().ok())
            .collect();
        let mut n = 1;
        while taken.contains(&n) {
            n += 1;
        }
        n
    }

    /* ---------- structural edits ---------- */

    /// Remove every deletion-selected seat in one step. One history entry
    /// regardless of how many seats go.
    pub fn delete_selected(&mut self) -> usize {
        if self.marked_for_deletion.is_empty() {
            return 0;
        }
        let before = self.seats.len();
        let doomed: HashSet<&String> = self.marked_for_deletion.iter().collect();
        self.seats.retain(|s| !doomed.contains(&s.id));
        let removed = before - self.seats.len();
        self.marked_for_deletion.clear();
        self.history.record(self.seats.clone());
        removed
    }

    /// Drop every seat from the layout.
    pub fn clear_all(&mut self) {
        self.seats.clear();
        self.selected.clear();
        self.marked_for_deletion.clear();
        self.history.record(Vec::new());
    }

    /* ---------- history ---------- */

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(seats) => {
                self.seats = seats;
                self.prune_selections();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(seats) => {
                self.seats = seats;
                self.prune_selections();
                true
            }
            None => false,
        }
    }

    // Selections are not versioned, but after a restore they may reference
    // seats that no longer exist; drop those ids.
    fn prune_selections(&mut self) {
        let ids: HashSet<&String> = self.seats.iter().map(|s| &s.id).collect();
        self.selected.retain(|id| ids.contains(id));
        self.marked_for_deletion.retain(|id| ids.contains(id));
    }
}

/// Validate a seat list before it replaces the stored layout: coordinates
/// within the 0-100 percentage range, ids and labels unique.
pub fn validate_seats(seats: &[Seat]) -> Result<(), SeatMapError> {
    let mut ids = HashSet::new();
    let mut labels = HashSet::new();
    for seat in seats {
        if !(0.0..=100.0).contains(&seat.x) || !(0.0..=100.0).contains(&seat.y) {
            return Err(SeatMapError::OutOfBounds {
                label: seat.label.clone(),
            });
        }
        if !ids.insert(seat.id.as_str()) {
            return Err(SeatMapError::DuplicateId {
                id: seat.id.clone(),
            });
        }
        if !labels.insert(seat.label.as_str()) {
            return Err(SeatMapError::DuplicateLabel {
                label: seat.label.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Occupant;
    use proptest::prelude::*;

    fn seat(id: &str, label: &str, x: f64, y: f64) -> Seat {
        Seat {
            id: id.to_string(),
            label: label.to_string(),
            x,
            y,
        }
    }

    fn edit_map() -> SeatMap {
        let mut map = SeatMap::new();
        map.set_mode(Mode::Edit, UserRole::Superadmin).unwrap();
        map
    }

    /// Screen point over the canvas center of a seat at (x%, y%).
    fn over(x_pct: f64, y_pct: f64) -> Point {
        Point::new(x_pct / 100.0 * CANVAS_WIDTH, y_pct / 100.0 * CANVAS_HEIGHT)
    }

    #[test]
    fn only_superadmin_switches_mode() {
        let mut map = SeatMap::new();
        assert_eq!(
            map.set_mode(Mode::Edit, UserRole::User),
            Err(SeatMapError::ModeForbidden)
        );
        assert_eq!(map.mode(), Mode::View);
        assert!(map.set_mode(Mode::Edit, UserRole::Superadmin).is_ok());
        assert_eq!(map.mode(), Mode::Edit);
    }

    #[test]
    fn mode_switch_clears_both_selection_sets() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(60.0, 60.0)).unwrap();
        // Mark the first seat for deletion
        map.click(over(10.0, 10.0)).unwrap();
        assert_eq!(map.deletion_selection().len(), 1);

        map.set_mode(Mode::View, UserRole::Superadmin).unwrap();
        assert!(map.deletion_selection().is_empty());
        assert!(map.booking_selection().is_empty());

        // And the other direction, with a booking selection in place
        map.set_weekday(Weekday::new(0).unwrap());
        map.click(over(10.0, 10.0)).unwrap();
        assert_eq!(map.booking_selection().len(), 1);
        map.set_mode(Mode::Edit, UserRole::Superadmin).unwrap();
        assert!(map.booking_selection().is_empty());
        assert!(map.deletion_selection().is_empty());
    }

    #[test]
    fn labels_use_lowest_unused_suffix() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(30.0, 30.0)).unwrap();
        let labels: Vec<_> = map.seats().iter().map(|s| s.label.clone()).collect();
        assert_eq!(labels, vec!["A1", "A2"]);

        map.click(over(50.0, 50.0)).unwrap();
        assert_eq!(map.seats()[2].label, "A3");

        // Remove A2; the freed suffix is reused by the next placement
        map.click(over(30.0, 30.0)).unwrap();
        map.delete_selected();
        map.click(over(70.0, 70.0)).unwrap();
        assert_eq!(map.seats().last().unwrap().label, "A2");
    }

    #[test]
    fn prefix_scopes_label_allocation() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.set_label_prefix("b");
        map.click(over(30.0, 30.0)).unwrap();
        let labels: Vec<_> = map.seats().iter().map(|s| s.label.clone()).collect();
        assert_eq!(labels, vec!["A1", "B1"]);
    }

    #[test]
    fn view_mode_requires_weekday_before_selection() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.set_mode(Mode::View, UserRole::Superadmin).unwrap();

        assert_eq!(
            map.click(over(10.0, 10.0)),
            Err(SeatMapError::WeekdayRequired)
        );
        map.set_weekday(Weekday::new(3).unwrap());
        assert!(matches!(
            map.click(over(10.0, 10.0)),
            Ok(ClickOutcome::SelectionToggled(_))
        ));
    }

    #[test]
    fn booked_seats_are_rejected_for_every_weekday() {
        for weekday in Weekday::all() {
            let mut map = edit_map();
            map.click(over(10.0, 10.0)).unwrap();
            let id = map.seats()[0].id.clone();
            map.set_mode(Mode::View, UserRole::Superadmin).unwrap();
            map.set_weekday(weekday);

            let mut booked = BookedSeatMap::new();
            booked.insert(
                id,
                Occupant {
                    user_name: "Alice".to_string(),
                    user_email: Some("alice@example.com".to_string()),
                    status: "approved".to_string(),
                },
            );
            map.set_booked(booked);

            assert_eq!(
                map.click(over(10.0, 10.0)),
                Err(SeatMapError::SeatBooked {
                    occupant: "Alice".to_string()
                })
            );
            assert!(map.booking_selection().is_empty());
        }
    }

    #[test]
    fn selection_toggles_on_repeated_clicks() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.set_mode(Mode::View, UserRole::Superadmin).unwrap();
        map.set_weekday(Weekday::new(0).unwrap());

        map.click(over(10.0, 10.0)).unwrap();
        assert_eq!(map.booking_selection().len(), 1);
        map.click(over(10.0, 10.0)).unwrap();
        assert!(map.booking_selection().is_empty());
    }

    #[test]
    fn changing_weekday_clears_booking_selection() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.set_mode(Mode::View, UserRole::Superadmin).unwrap();
        map.set_weekday(Weekday::new(0).unwrap());
        map.click(over(10.0, 10.0)).unwrap();
        assert_eq!(map.booking_selection().len(), 1);

        map.set_weekday(Weekday::new(1).unwrap());
        assert!(map.booking_selection().is_empty());
    }

    #[test]
    fn bulk_delete_is_one_history_entry() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(30.0, 30.0)).unwrap();
        map.click(over(50.0, 50.0)).unwrap();
        // Mark two of the three
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(30.0, 30.0)).unwrap();

        assert_eq!(map.delete_selected(), 2);
        assert_eq!(map.seats().len(), 1);

        // One undo restores all deleted seats at once
        assert!(map.undo());
        assert_eq!(map.seats().len(), 3);
    }

    #[test]
    fn clear_all_is_undoable() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(30.0, 30.0)).unwrap();
        map.clear_all();
        assert!(map.seats().is_empty());
        assert!(map.undo());
        assert_eq!(map.seats().len(), 2);
    }

    #[test]
    fn mutation_after_undo_invalidates_redo() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(30.0, 30.0)).unwrap();
        assert!(map.undo());
        assert!(map.can_redo());
        map.click(over(50.0, 50.0)).unwrap();
        assert!(!map.can_redo());
        assert!(!map.redo());
    }

    #[test]
    fn undo_preserves_view_transform() {
        let mut map = edit_map();
        map.pan_by(25.0, -10.0);
        map.zoom_at(Point::new(0.0, 0.0), 2.0);
        let view = *map.view();
        map.click(map.view().to_screen(over(10.0, 10.0))).unwrap();
        map.undo();
        assert_eq!(map.view(), &view);
    }

    #[test]
    fn load_resets_history_and_selections() {
        let mut map = edit_map();
        map.click(over(10.0, 10.0)).unwrap();
        map.click(over(10.0, 10.0)).unwrap(); // mark for deletion
        map.load(vec![seat("s1", "A1", 20.0, 20.0)]);
        assert!(!map.can_undo());
        assert!(map.deletion_selection().is_empty());
        assert_eq!(map.seats().len(), 1);
    }

    #[test]
    fn clicks_outside_canvas_are_ignored() {
        let mut map = edit_map();
        let outcome = map.click(Point::new(-5.0, 10.0)).unwrap();
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert!(map.seats().is_empty());
    }

    #[test]
    fn seat_radius_is_clamped() {
        let mut map = SeatMap::new();
        map.set_seat_radius(1.0);
        assert_eq!(map.seat_radius(), MIN_SEAT_RADIUS);
        map.set_seat_radius(100.0);
        assert_eq!(map.seat_radius(), MAX_SEAT_RADIUS);
    }

    #[test]
    fn validate_seats_catches_bad_layouts() {
        assert!(validate_seats(&[seat("a", "A1", 5.0, 5.0)]).is_ok());
        assert_eq!(
            validate_seats(&[seat("a", "A1", 101.0, 5.0)]),
            Err(SeatMapError::OutOfBounds {
                label: "A1".to_string()
            })
        );
        assert_eq!(
            validate_seats(&[seat("a", "A1", 5.0, 5.0), seat("a", "A2", 6.0, 6.0)]),
            Err(SeatMapError::DuplicateId {
                id: "a".to_string()
            })
        );
        assert_eq!(
            validate_seats(&[seat("a", "A1", 5.0, 5.0), seat("b", "A1", 6.0, 6.0)]),
            Err(SeatMapError::DuplicateLabel {
                label: "A1".to_string()
            })
        );
    }

    proptest! {
        /// Undo then redo restores the exact seat list, for any sequence
        /// of add and bulk-delete actions driven through the controller.
        #[test]
        fn controller_undo_redo_round_trips(
            ops in proptest::collection::vec(any::<(u8, u8, bool)>(), 1..25)
        ) {
            let mut map = edit_map();
            for (xi, yi, delete) in ops {
                let x = f64::from(xi % 100);
                let y = f64::from(yi % 100);
                if delete && !map.seats().is_empty() {
                    // Mark whatever sits at the first seat's position
                    let first = map.seats()[0].clone();
                    map.click(over(first.x, first.y)).unwrap();
                    map.delete_selected();
                } else {
                    map.click(over(x, y)).unwrap();
                }

                let before = map.seats().to_vec();
                if map.undo() {
                    prop_assert!(map.redo());
                    prop_assert_eq!(map.seats(), &before[..]);
                }
            }
        }
    }
}

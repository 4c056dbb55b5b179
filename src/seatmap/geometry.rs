//! Coordinate model for the floor plan. Seats store positions as
//! percentages of a fixed logical canvas; rendering maps percentage to
//! logical pixels and then applies the pan/zoom view transform. Hit-testing
//! runs the same pipeline in reverse.

use crate::models::Seat;

pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

/// Percentage position of a seat to logical canvas pixels.
pub fn percent_to_canvas(seat: &Seat) -> Point {
    Point::new(
        seat.x / 100.0 * CANVAS_WIDTH,
        seat.y / 100.0 * CANVAS_HEIGHT,
    )
}

/// Logical canvas pixels back to the percentage pair stored on a seat.
pub fn canvas_to_percent(point: Point) -> (f64, f64) {
    (
        point.x / CANVAS_WIDTH * 100.0,
        point.y / CANVAS_HEIGHT * 100.0,
    )
}

/// Pan/zoom applied on top of the logical canvas for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        ViewTransform {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.zoom + self.pan_x,
            canvas.y * self.zoom + self.pan_y,
        )
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Scale the zoom by `factor`, keeping the canvas point under the
    /// screen-space `anchor` stationary.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let fixed = self.to_canvas(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan_x = anchor.x - fixed.x * self.zoom;
        self.pan_y = anchor.y - fixed.y * self.zoom;
    }

    pub fn reset(&mut self) {
        *self = ViewTransform::default();
    }
}

/// Find the seat under a screen-space pointer position. The pointer is
/// mapped back to canvas space and compared by Euclidean distance against
/// `radius` (logical pixels). When seats overlap, the first one in
/// placement order wins.
pub fn hit_test<'a>(
    seats: &'a [Seat],
    screen: Point,
    view: &ViewTransform,
    radius: f64,
) -> Option<&'a Seat> {
    let pointer = view.to_canvas(screen);
    seats.iter().find(|seat| {
        let center = percent_to_canvas(seat);
        let dx = pointer.x - center.x;
        let dy = pointer.y - center.y;
        (dx * dx + dy * dy).sqrt() < radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: &str, x: f64, y: f64) -> Seat {
        Seat {
            id: id.to_string(),
            label: id.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn percent_pixel_round_trip() {
        let s = seat("A1", 25.0, 50.0);
        let px = percent_to_canvas(&s);
        assert_eq!(px, Point::new(200.0, 300.0));
        let (x, y) = canvas_to_percent(px);
        assert!((x - 25.0).abs() < 1e-9);
        assert!((y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn transform_inverse_round_trip() {
        let mut view = ViewTransform::default();
        view.pan_by(40.0, -15.0);
        view.zoom_at(Point::new(100.0, 100.0), 1.5);

        let p = Point::new(123.0, 456.0);
        let back = view.to_canvas(view.to_screen(p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        view.zoom_at(Point::new(0.0, 0.0), 100.0);
        assert_eq!(view.zoom, MAX_ZOOM);
        view.zoom_at(Point::new(0.0, 0.0), 1e-6);
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewTransform::default();
        view.pan_by(10.0, 20.0);
        let anchor = Point::new(400.0, 300.0);
        let before = view.to_canvas(anchor);
        view.zoom_at(anchor, 2.0);
        let after = view.to_canvas(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn hit_test_respects_transform() {
        let seats = vec![seat("A1", 50.0, 50.0)]; // canvas (400, 300)
        let mut view = ViewTransform::default();
        view.pan_by(100.0, 0.0);

        let hit = hit_test(&seats, Point::new(500.0, 300.0), &view, 10.0);
        assert_eq!(hit.map(|s| s.id.as_str()), Some("A1"));

        // Same screen point without the pan misses
        let miss = hit_test(&seats, Point::new(500.0, 300.0), &ViewTransform::default(), 10.0);
        assert!(miss.is_none());
    }

    #[test]
    fn overlapping_seats_resolve_to_first_placed() {
        let seats = vec![seat("A1", 50.0, 50.0), seat("A2", 50.0, 50.0)];
        let hit = hit_test(&seats, Point::new(400.0, 300.0), &ViewTransform::default(), 10.0);
        assert_eq!(hit.map(|s| s.id.as_str()), Some("A1"));
    }

    #[test]
    fn hit_requires_distance_strictly_within_radius() {
        let seats = vec![seat("A1", 50.0, 50.0)];
        let view = ViewTransform::default();
        assert!(hit_test(&seats, Point::new(410.0, 300.0), &view, 10.0).is_none());
        assert!(hit_test(&seats, Point::new(409.0, 300.0), &view, 10.0).is_some());
    }
}

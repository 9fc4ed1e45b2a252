/// Inclusive integer pixel bounds of a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox<T> {
    pub min_x: T,
    pub min_y: T,
    pub max_x: T,
    pub max_y: T,
}

impl BBox<i32> {
    /// Bounds of a set of screen-space points: `floor` of the minimum and `ceil` of the maximum,
    /// clamped to the `size` of the render target.
    pub fn from_points(points: &[crate::vec::Vec2], size: Size<usize>) -> Self {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let last_x = size.width as i32 - 1;
        let last_y = size.height as i32 - 1;
        BBox {
            min_x: (min_x.floor() as i32).clamp(0, last_x),
            min_y: (min_y.floor() as i32).clamp(0, last_y),
            max_x: (max_x.ceil() as i32).clamp(0, last_x),
            max_y: (max_y.ceil() as i32).clamp(0, last_y),
        }
    }

    /// Restricts the rows of the box to `rows` (half-open). Returns `None` if nothing is left.
    pub fn clip_rows(self, rows: std::ops::Range<i32>) -> Option<Self> {
        let min_y = self.min_y.max(rows.start);
        let max_y = self.max_y.min(rows.end - 1);
        (min_y <= max_y).then_some(BBox { min_y, max_y, ..self })
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn bbox_floors_min_and_ceils_max() {
        let points = [
            Vec2::from([1.5, 2.2]),
            Vec2::from([7.1, 3.0]),
            Vec2::from([4.0, 9.9]),
        ];
        let bbox = BBox::from_points(&points, Size::new(100, 100));
        assert_eq!(
            bbox,
            BBox {
                min_x: 1,
                min_y: 2,
                max_x: 8,
                max_y: 10
            }
        );
    }

    #[test]
    fn bbox_is_clamped_to_target() {
        let points = [
            Vec2::from([-3.0, -1.0]),
            Vec2::from([15.0, 2.0]),
            Vec2::from([2.0, 40.0]),
        ];
        let bbox = BBox::from_points(&points, Size::new(10, 20));
        assert_eq!((bbox.min_x, bbox.min_y), (0, 0));
        assert_eq!((bbox.max_x, bbox.max_y), (9, 19));
    }

    #[test]
    fn clip_rows_drops_disjoint_bands() {
        let bbox = BBox {
            min_x: 0,
            min_y: 4,
            max_x: 3,
            max_y: 8,
        };
        assert_eq!(bbox.clip_rows(0..4), None);
        let clipped = bbox.clip_rows(6..12).unwrap();
        assert_eq!((clipped.min_y, clipped.max_y), (6, 8));
    }
}

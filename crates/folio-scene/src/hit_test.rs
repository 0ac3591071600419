//! Point-in-shape predicates shared by overlay hit-testing.

use crate::scene::*;

impl Rect {
    /// Inclusive on the leading edges and exclusive on the trailing ones, so
    /// two rects that abut never both claim the shared edge.
    pub fn contains(&self, p: [f32; 2]) -> bool {
        self.contains_with_tolerance(p, 0.0)
    }

    /// Containment after growing the rect by `tolerance` on every side.
    pub fn contains_with_tolerance(&self, p: [f32; 2], tolerance: f32) -> bool {
        let [x, y] = p;
        self.top() <= y + tolerance
            && self.left() <= x + tolerance
            && self.bottom() > y - tolerance
            && self.right() > x - tolerance
    }
}

impl Transform2D {
    /// Containment of a world-space point in a rect given in this transform's local space.
    pub fn local_rect_contains(&self, rect: Rect, world: [f32; 2]) -> bool {
        match self.inverse_apply(world) {
            Some(p) => rect.contains(p),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_extends_every_edge() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains([10.0, 10.0]));
        assert!(!r.contains([30.0, 15.0]), "trailing edge is exclusive");
        assert!(!r.contains([6.0, 15.0]));
        assert!(r.contains_with_tolerance([6.0, 15.0], 5.0));
        assert!(r.contains_with_tolerance([34.0, 24.0], 5.0));
        assert!(!r.contains_with_tolerance([35.0, 15.0], 5.0));
    }

    #[test]
    fn local_rect_test_inverts_transform() {
        let t = Transform2D::translate(100.0, 0.0);
        assert!(t.local_rect_contains(Rect::new(0.0, 0.0, 10.0, 10.0), [105.0, 5.0]));
        assert!(!t.local_rect_contains(Rect::new(0.0, 0.0, 10.0, 10.0), [5.0, 5.0]));
    }

    #[test]
    fn degenerate_transform_never_contains() {
        let t = Transform2D::scale(0.0, 1.0);
        assert!(!t.local_rect_contains(Rect::new(0.0, 0.0, 10.0, 10.0), [0.0, 0.0]));
    }
}

//! Spread planning: pairing sections into the pages shown together.

use crate::book::{Direction, PageSpread, Side, SpreadMode};

/// One page view, holding section indices.
///
/// Either `center` alone, or any combination of `left` and `right`; an absent
/// side is rendered blank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spread {
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub center: Option<usize>,
}

impl Spread {
    pub fn center(section: usize) -> Self {
        Self {
            center: Some(section),
            ..Default::default()
        }
    }

    pub fn pair(left: Option<usize>, right: Option<usize>) -> Self {
        Self {
            left,
            right,
            center: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.center.is_none()
    }

    pub fn is_center(&self) -> bool {
        self.center.is_some()
    }

    /// Section shown on `side`.
    pub fn section(&self, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
            Side::Center => self.center,
        }
    }

    /// Section that has focus when `side` is active, falling back to the
    /// other half when the requested one is blank.
    pub fn focused_section(&self, side: Option<Side>) -> Option<usize> {
        self.center.or(match side {
            Some(Side::Left) => self.left.or(self.right),
            _ => self.right.or(self.left),
        })
    }
}

/// Where a section ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpreadPosition {
    pub index: usize,
    pub side: Side,
}

/// Inputs to [`plan_spreads`] besides the per-section hints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanOptions {
    pub mode: SpreadMode,
    pub dir: Direction,
    /// Put the first unhinted section on the trailing side, leaving the first
    /// leading page blank.
    pub first_page_blank: bool,
}

/// Group sections into spreads.
///
/// `hints` holds each section's `page_spread` in reading order. Unhinted
/// sections fill the leading side then the trailing side of each spread.
/// A `center` section always gets a spread of its own, and a `left` or
/// `right` hint forces a new spread when its side is taken.
pub fn plan_spreads(hints: &[Option<PageSpread>], options: PlanOptions) -> Vec<Spread> {
    if options.mode.is_none() {
        return (0..hints.len()).map(Spread::center).collect();
    }

    let (leading, trailing) = match options.dir {
        Direction::Ltr => (Side::Left, Side::Right),
        Direction::Rtl => (Side::Right, Side::Left),
    };

    let mut spreads = Vec::new();
    let mut current = Spread::default();
    for (i, hint) in hints.iter().enumerate() {
        let needs_new = match hint {
            Some(PageSpread::Center) => !current.is_empty(),
            Some(PageSpread::Left) => {
                current.center.is_some()
                    || current.left.is_some()
                    || (options.dir == Direction::Ltr && i > 0)
            }
            Some(PageSpread::Right) => {
                current.center.is_some()
                    || current.right.is_some()
                    || (options.dir == Direction::Rtl && i > 0)
            }
            None => current.center.is_some() || current.section(trailing).is_some(),
        };
        if needs_new && !current.is_empty() {
            spreads.push(std::mem::take(&mut current));
        }
        let side = match hint {
            Some(PageSpread::Center) => Side::Center,
            Some(PageSpread::Left) => Side::Left,
            Some(PageSpread::Right) => Side::Right,
            None if current.section(leading).is_some() => trailing,
            None if options.first_page_blank && i == 0 => trailing,
            None => leading,
        };
        match side {
            Side::Left => current.left = Some(i),
            Side::Right => current.right = Some(i),
            Side::Center => current.center = Some(i),
        }
    }
    if !current.is_empty() {
        spreads.push(current);
    }
    spreads
}

/// Linear scan for the spread holding `section`.
pub fn spread_of(spreads: &[Spread], section: usize) -> Option<SpreadPosition> {
    spreads.iter().enumerate().find_map(|(index, spread)| {
        let side = if spread.left == Some(section) {
            Side::Left
        } else if spread.right == Some(section) {
            Side::Right
        } else if spread.center == Some(section) {
            Side::Center
        } else {
            return None;
        };
        Some(SpreadPosition { index, side })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(dir: Direction) -> PlanOptions {
        PlanOptions {
            mode: SpreadMode::Portrait,
            dir,
            first_page_blank: false,
        }
    }

    #[test]
    fn unhinted_ltr_pairs_from_the_left() {
        let spreads = plan_spreads(&[None; 5], paired(Direction::Ltr));
        assert_eq!(
            spreads,
            vec![
                Spread::pair(Some(0), Some(1)),
                Spread::pair(Some(2), Some(3)),
                Spread::pair(Some(4), None),
            ]
        );
    }

    #[test]
    fn unhinted_rtl_pairs_from_the_right() {
        let spreads = plan_spreads(&[None; 4], paired(Direction::Rtl));
        assert_eq!(
            spreads,
            vec![Spread::pair(Some(1), Some(0)), Spread::pair(Some(3), Some(2))]
        );
    }

    #[test]
    fn mode_none_centers_every_section() {
        let options = PlanOptions {
            mode: SpreadMode::None,
            ..paired(Direction::Ltr)
        };
        let spreads = plan_spreads(&[None, Some(PageSpread::Left), None], options);
        assert_eq!(spreads, vec![Spread::center(0), Spread::center(1), Spread::center(2)]);
    }

    #[test]
    fn center_hint_occupies_a_spread_alone() {
        let hints = [
            None,
            Some(PageSpread::Center),
            Some(PageSpread::Center),
            None,
            None,
        ];
        let spreads = plan_spreads(&hints, paired(Direction::Ltr));
        assert_eq!(
            spreads,
            vec![
                Spread::pair(Some(0), None),
                Spread::center(1),
                Spread::center(2),
                Spread::pair(Some(3), Some(4)),
            ]
        );
        for spread in spreads.iter().filter(|s| s.is_center()) {
            assert!(spread.left.is_none() && spread.right.is_none());
        }
    }

    #[test]
    fn side_hints_force_a_new_spread() {
        // A second `right` in a row cannot share the spread.
        let hints = [
            Some(PageSpread::Right),
            Some(PageSpread::Right),
            Some(PageSpread::Left),
            None,
        ];
        let spreads = plan_spreads(&hints, paired(Direction::Ltr));
        assert_eq!(
            spreads,
            vec![
                Spread::pair(None, Some(0)),
                Spread::pair(None, Some(1)),
                Spread::pair(Some(2), Some(3)),
            ]
        );
    }

    #[test]
    fn first_page_blank_opens_on_the_trailing_side() {
        let options = PlanOptions {
            first_page_blank: true,
            ..paired(Direction::Ltr)
        };
        let spreads = plan_spreads(&[None; 4], options);
        assert_eq!(
            spreads,
            vec![
                Spread::pair(None, Some(0)),
                Spread::pair(Some(1), Some(2)),
                Spread::pair(Some(3), None),
            ]
        );
    }

    #[test]
    fn empty_book_has_no_spreads() {
        assert!(plan_spreads(&[], paired(Direction::Ltr)).is_empty());
    }

    #[test]
    fn spread_of_reports_index_and_side() {
        let spreads = plan_spreads(&[None; 5], paired(Direction::Ltr));
        assert_eq!(spread_of(&spreads, 3), Some(SpreadPosition { index: 1, side: Side::Right }));
        assert_eq!(spread_of(&spreads, 4), Some(SpreadPosition { index: 2, side: Side::Left }));
        assert_eq!(spread_of(&spreads, 9), None);
    }

    #[test]
    fn focused_section_falls_back_across_blank_sides() {
        let spread = Spread::pair(None, Some(7));
        assert_eq!(spread.focused_section(Some(Side::Left)), Some(7));
        assert_eq!(Spread::center(2).focused_section(Some(Side::Right)), Some(2));
    }
}

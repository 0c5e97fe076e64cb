//! Tile grid: 5x5 mood tokens, adjacent swaps, triple matching and in-place refill.

use crate::mood::Mood;
use rand::Rng;
use std::collections::BTreeSet;

/// Rows and columns.
pub const GRID_SIDE: usize = 5;
pub const CELL_COUNT: usize = GRID_SIDE * GRID_SIDE;
/// Points per matched cell.
pub const POINTS_PER_CELL: u32 = 10;

/// One cell's contents. `id` only tells the renderer a cell was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub mood: Mood,
    pub id: u64,
}

/// Which index pairs count as neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjacencyRule {
    /// index ± 1 or ± 5, including ±1 across a row boundary (4 and 5 are neighbours).
    #[default]
    Naive,
    /// Same as Naive but ±1 must stay in the same row.
    Strict,
}

impl AdjacencyRule {
    pub fn is_adjacent(self, a: usize, b: usize) -> bool {
        if a >= CELL_COUNT || b >= CELL_COUNT {
            return false;
        }
        let diff = a.abs_diff(b);
        match (self, diff) {
            (_, GRID_SIDE) => true,
            (Self::Naive, 1) => true,
            (Self::Strict, 1) => a / GRID_SIDE == b / GRID_SIDE,
            _ => false,
        }
    }
}

/// Result of one swap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    OutOfBounds,
    NotAdjacent,
    /// Swapped, found nothing, swapped back.
    NoMatch,
    /// Matched cells (ascending) were refilled; `points` = 10 per cell.
    Matched { cells: Vec<usize>, points: u32 },
}

impl SwapOutcome {
    pub fn points(&self) -> u32 {
        match self {
            Self::Matched { points, .. } => *points,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    cells: [Token; CELL_COUNT],
    next_id: u64,
}

impl Grid {
    /// Every cell independently random. The starting grid may already contain triples.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut moods = [Mood::Happy; CELL_COUNT];
        for m in &mut moods {
            *m = Mood::random(rng);
        }
        Self::from_moods(moods)
    }

    pub fn from_moods(moods: [Mood; CELL_COUNT]) -> Self {
        let mut next_id = 0u64;
        let cells = moods.map(|mood| {
            let id = next_id;
            next_id += 1;
            Token { mood, id }
        });
        Self { cells, next_id }
    }

    #[inline]
    pub fn cells(&self) -> &[Token; CELL_COUNT] {
        &self.cells
    }

    #[cfg(test)]
    pub fn moods(&self) -> [Mood; CELL_COUNT] {
        self.cells.map(|t| t.mood)
    }

    /// All cells belonging to a horizontal or vertical same-mood triple.
    pub fn find_matches(&self) -> BTreeSet<usize> {
        let mut matched = BTreeSet::new();
        let mood = |row: usize, col: usize| self.cells[row * GRID_SIDE + col].mood;

        for row in 0..GRID_SIDE {
            for col in 0..=GRID_SIDE - 3 {
                let m = mood(row, col);
                if mood(row, col + 1) == m && mood(row, col + 2) == m {
                    let start = row * GRID_SIDE + col;
                    matched.extend(start..start + 3);
                }
            }
        }
        for col in 0..GRID_SIDE {
            for row in 0..=GRID_SIDE - 3 {
                let m = mood(row, col);
                if mood(row + 1, col) == m && mood(row + 2, col) == m {
                    let start = row * GRID_SIDE + col;
                    matched.extend([start, start + GRID_SIDE, start + 2 * GRID_SIDE]);
                }
            }
        }
        matched
    }

    /// Swap two neighbours; keep the swap only if it makes at least one triple.
    /// Matched cells get new random moods in place. The refill is not re-scanned.
    pub fn attempt_swap<R: Rng + ?Sized>(
        &mut self,
        selected: usize,
        target: usize,
        rule: AdjacencyRule,
        rng: &mut R,
    ) -> SwapOutcome {
        if selected >= CELL_COUNT || target >= CELL_COUNT {
            return SwapOutcome::OutOfBounds;
        }
        if !rule.is_adjacent(selected, target) {
            return SwapOutcome::NotAdjacent;
        }

        self.cells.swap(selected, target);
        let matched = self.find_matches();
        if matched.is_empty() {
            self.cells.swap(selected, target);
            return SwapOutcome::NoMatch;
        }

        for &index in &matched {
            self.refill(index, rng);
        }
        let points = POINTS_PER_CELL * matched.len() as u32;
        SwapOutcome::Matched {
            cells: matched.into_iter().collect(),
            points,
        }
    }

    fn refill<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) {
        self.cells[index] = Token {
            mood: Mood::random(rng),
            id: self.next_id,
        };
        self.next_id += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Pattern (row + 2*col) % 5: no horizontal or vertical triple anywhere.
    pub(crate) fn match_free() -> [Mood; CELL_COUNT] {
        std::array::from_fn(|i| {
            let (row, col) = (i / GRID_SIDE, i % GRID_SIDE);
            Mood::ALL[(row + 2 * col) % 5]
        })
    }

    /// Row 0 = [Happy, Happy, Angry, ..] with Happy at index 7 below index 2.
    pub(crate) fn one_swap_from_row_triple() -> [Mood; CELL_COUNT] {
        let mut moods = match_free();
        moods[1] = Mood::Happy;
        assert_eq!(moods[0], Mood::Happy);
        assert_eq!(moods[2], Mood::Angry);
        assert_eq!(moods[7], Mood::Happy);
        moods
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn match_free_pattern_has_no_matches() {
        assert!(Grid::from_moods(match_free()).find_matches().is_empty());
        assert!(Grid::from_moods(one_swap_from_row_triple()).find_matches().is_empty());
    }

    #[test]
    fn random_grid_has_unique_ids() {
        let grid = Grid::random(&mut rng());
        let ids: BTreeSet<u64> = grid.cells().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), CELL_COUNT);
    }

    #[test]
    fn naive_adjacency_wraps_rows() {
        let rule = AdjacencyRule::Naive;
        assert!(rule.is_adjacent(4, 5));
        assert!(rule.is_adjacent(12, 7));
        assert!(rule.is_adjacent(12, 17));
        assert!(rule.is_adjacent(12, 11));
        assert!(!rule.is_adjacent(12, 12));
        assert!(!rule.is_adjacent(0, 6));
        assert!(!rule.is_adjacent(0, 2));
        assert!(!rule.is_adjacent(24, 25));
    }

    #[test]
    fn strict_adjacency_rejects_row_wrap() {
        let rule = AdjacencyRule::Strict;
        assert!(!rule.is_adjacent(4, 5));
        assert!(!rule.is_adjacent(10, 9));
        assert!(rule.is_adjacent(3, 4));
        assert!(rule.is_adjacent(4, 9));
    }

    #[test]
    fn non_adjacent_swap_is_a_no_op() {
        let mut grid = Grid::from_moods(one_swap_from_row_triple());
        let before = grid.cells().to_owned();
        let out = grid.attempt_swap(2, 8, AdjacencyRule::Naive, &mut rng());
        assert_eq!(out, SwapOutcome::NotAdjacent);
        assert_eq!(grid.cells(), &before);
    }

    #[test]
    fn out_of_bounds_swap_is_a_no_op() {
        let mut grid = Grid::from_moods(match_free());
        let before = grid.cells().to_owned();
        let out = grid.attempt_swap(24, 29, AdjacencyRule::Naive, &mut rng());
        assert_eq!(out, SwapOutcome::OutOfBounds);
        assert_eq!(grid.cells(), &before);
    }

    #[test]
    fn swap_without_match_reverts() {
        let mut grid = Grid::from_moods(match_free());
        let before = grid.cells().to_owned();
        let out = grid.attempt_swap(0, 1, AdjacencyRule::Naive, &mut rng());
        assert_eq!(out, SwapOutcome::NoMatch);
        assert_eq!(out.points(), 0);
        assert_eq!(grid.cells(), &before);
    }

    #[test]
    fn vertical_swap_completes_row_triple() {
        let mut grid = Grid::from_moods(one_swap_from_row_triple());
        let before = grid.cells().to_owned();
        let out = grid.attempt_swap(2, 7, AdjacencyRule::Naive, &mut rng());
        assert_eq!(
            out,
            SwapOutcome::Matched {
                cells: vec![0, 1, 2],
                points: 30
            }
        );
        for i in [0, 1, 2] {
            assert_ne!(grid.cells()[i].id, before[i].id);
            assert!(grid.cells()[i].id >= CELL_COUNT as u64);
        }
        // 7 kept the token that used to be at 2.
        assert_eq!(grid.cells()[7], before[2]);
        assert_eq!(grid.cells().len(), CELL_COUNT);
    }

    #[test]
    fn vertical_triple_is_detected() {
        let mut moods = match_free();
        // column 3: rows 1..=3 all Calm
        moods[8] = Mood::Calm;
        moods[13] = Mood::Calm;
        moods[18] = Mood::Calm;
        let grid = Grid::from_moods(moods);
        let matched = grid.find_matches();
        assert!([8, 13, 18].iter().all(|i| matched.contains(i)));
    }

    #[test]
    fn diagonals_do_not_match() {
        let mut moods = match_free();
        moods[6] = Mood::Happy;
        moods[12] = Mood::Happy;
        assert_eq!(moods[0], Mood::Happy);
        assert!(Grid::from_moods(moods).find_matches().is_empty());
    }

    #[test]
    fn overlapping_triples_are_deduplicated() {
        let mut moods = match_free();
        for i in [0, 1, 2, 3, 5, 10] {
            moods[i] = Mood::Neutral;
        }
        let matched = Grid::from_moods(moods).find_matches();
        assert_eq!(matched.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 5, 10]);
    }

    #[test]
    fn cell_count_survives_many_swaps() {
        let mut r = rng();
        let mut grid = Grid::random(&mut r);
        for i in 0..200usize {
            let a = i % CELL_COUNT;
            let b = (a + if i % 2 == 0 { 1 } else { GRID_SIDE }) % CELL_COUNT;
            let out = grid.attempt_swap(a, b, AdjacencyRule::Naive, &mut r);
            if let SwapOutcome::Matched { cells, points } = out {
                assert_eq!(points, POINTS_PER_CELL * cells.len() as u32);
                assert!(cells.len() >= 3);
            }
            assert_eq!(grid.cells().len(), CELL_COUNT);
        }
    }
}

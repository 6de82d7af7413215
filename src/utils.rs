// Precomputed leaper attack masks and bit iteration helpers for move generation

use crate::board::Square;
use std::sync::OnceLock;

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

// Bit operations
#[inline]
pub fn pop_lsb(bb: &mut u64) -> Option<usize> {
    if *bb == 0 {
        return None;
    }
    let lsb = bb.trailing_zeros() as usize;
    *bb &= *bb - 1;
    Some(lsb)
}

pub struct SquareIter {
    bb: u64,
}

impl Iterator for SquareIter {
    type Item = Square;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        pop_lsb(&mut self.bb).map(Square::from_index)
    }
}

#[inline]
pub fn iter_squares(bb: u64) -> SquareIter {
    SquareIter { bb }
}

static KNIGHT_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();
static KING_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();

fn leaper_table(offsets: &[(i8, i8); 8]) -> [u64; 64] {
    let mut attacks = [0u64; 64];
    for sq in Square::all() {
        let mut mask = 0u64;
        for &(dr, df) in offsets {
            if let Some(target) = sq.offset(dr, df) {
                mask |= 1u64 << target.index();
            }
        }
        attacks[sq.index()] = mask;
    }
    attacks
}

pub fn init_attack_tables() {
    KNIGHT_ATTACKS.get_or_init(|| leaper_table(&KNIGHT_OFFSETS));
    KING_ATTACKS.get_or_init(|| leaper_table(&KING_OFFSETS));
}

#[inline]
pub fn knight_attacks(sq: Square) -> u64 {
    KNIGHT_ATTACKS.get_or_init(|| leaper_table(&KNIGHT_OFFSETS))[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> u64 {
    KING_ATTACKS.get_or_init(|| leaper_table(&KING_OFFSETS))[sq.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_corner_and_center() {
        assert_eq!(knight_attacks(Square::new(0, 0)).count_ones(), 2);
        assert_eq!(knight_attacks(Square::new(3, 3)).count_ones(), 8);
    }

    #[test]
    fn king_edge() {
        assert_eq!(king_attacks(Square::new(0, 4)).count_ones(), 5);
        let targets: Vec<Square> = iter_squares(king_attacks(Square::new(0, 0))).collect();
        assert_eq!(
            targets,
            vec![Square::new(0, 1), Square::new(1, 0), Square::new(1, 1)]
        );
    }
}

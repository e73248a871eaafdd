use minesweeper_common::models::Pos;

use crate::grid::{Content, Grid};

/// Number of bombs among the neighbors of `pos`.
pub fn count_adjacent(grid: &Grid, pos: Pos) -> u8 {
    grid.neighbors(pos)
        .filter(|&neighbor| grid.get(neighbor).is_some_and(|cell| cell.is_bomb()))
        .count() as u8
}

/// Writes the neighbor-bomb count into every safe cell. Bombs are untouched.
pub fn label(grid: &mut Grid) {
    for index in 0..grid.len() {
        if grid.cells[index].is_bomb() {
            continue;
        }
        let adjacent = count_adjacent(grid, grid.pos_of(index));
        grid.cells[index].content = Content::Safe(adjacent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_with;
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn safe_count_at(grid: &Grid, x: usize, y: usize) -> u8 {
        match grid.get(Pos { x, y }).unwrap().content {
            Content::Safe(adjacent) => adjacent,
            Content::Bomb => panic!("({x}, {y}) is a bomb"),
        }
    }

    #[test]
    fn labels_diagonal_fixture() {
        let mut grid = Grid::with_bombs(3, 3, &[Pos { x: 0, y: 0 }, Pos { x: 2, y: 2 }]).unwrap();
        label(&mut grid);

        assert_eq!(safe_count_at(&grid, 1, 1), 2);
        assert_eq!(safe_count_at(&grid, 2, 0), 0);
        assert_eq!(safe_count_at(&grid, 0, 2), 0);
        assert_eq!(safe_count_at(&grid, 1, 0), 1);
        assert_eq!(safe_count_at(&grid, 2, 1), 1);
        assert!(grid.get(Pos { x: 0, y: 0 }).unwrap().is_bomb());
    }

    #[test]
    fn surrounded_cell_counts_eight() {
        let bombs: Vec<Pos> = Grid::new(3, 3)
            .unwrap()
            .positions()
            .filter(|&pos| pos != Pos { x: 1, y: 1 })
            .collect();
        let mut grid = Grid::with_bombs(3, 3, &bombs).unwrap();
        label(&mut grid);
        assert_eq!(safe_count_at(&grid, 1, 1), 8);
    }

    #[test]
    fn relabeling_is_stable() {
        let mut grid = generate_with(&mut StdRng::seed_from_u64(3), 9, 9, 10).unwrap();
        label(&mut grid);
        let once = grid.clone();
        label(&mut grid);
        assert_eq!(once, grid);
    }

    proptest! {
        #[test]
        fn labels_match_brute_force(rows in 1..25usize, cols in 1..25usize, seed in any::<u64>()) {
            let bombs = (rows * cols) / 5;
            let mut grid = generate_with(&mut StdRng::seed_from_u64(seed), rows, cols, bombs).unwrap();
            label(&mut grid);

            for pos in grid.positions() {
                let cell = grid.get(pos).unwrap();
                if let Content::Safe(adjacent) = cell.content {
                    let mut expected = 0u8;
                    for y in pos.y.saturating_sub(1)..=(pos.y + 1).min(rows - 1) {
                        for x in pos.x.saturating_sub(1)..=(pos.x + 1).min(cols - 1) {
                            if (Pos { x, y }) != pos && grid.get(Pos { x, y }).unwrap().is_bomb() {
                                expected += 1;
                            }
                        }
                    }
                    prop_assert_eq!(adjacent, expected);
                    prop_assert!(adjacent <= 8);
                }
            }
        }
    }
}

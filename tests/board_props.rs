use bomb_gomoku::{Axis, Board, Cell, Position, Role, BOARD_SIZE, WIN_LENGTH};
use proptest::prelude::*;

fn delta(axis: Axis) -> (isize, isize) {
    match axis {
        Axis::Horizontal => (0, 1),
        Axis::Vertical => (1, 0),
        Axis::DiagonalDown => (1, 1),
        Axis::DiagonalUp => (-1, 1),
    }
}

/// `len` cells from `start` along `axis`, or `None` if the run leaves the board.
fn run(start: (usize, usize), axis: Axis, len: usize) -> Option<Vec<Position>> {
    let (dr, dc) = delta(axis);
    (0..len as isize)
        .map(|i| {
            let row = start.0.checked_add_signed(dr * i)?;
            let col = start.1.checked_add_signed(dc * i)?;
            let pos = Position::new(row, col);
            pos.is_valid().then_some(pos)
        })
        .collect()
}

fn axis_strategy() -> impl Strategy<Value = Axis> {
    prop::sample::select(Axis::ALL.to_vec())
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::PlayerOne), Just(Role::PlayerTwo)]
}

/// A board filled from a flat list of cell codes (0 empty, 1 / 2 a stone).
fn board_from(codes: &[u8]) -> Board {
    let mut board = Board::new();
    for (i, code) in codes.iter().enumerate() {
        if let Ok(role) = Role::try_from(*code) {
            let pos = Position::new(i / BOARD_SIZE, i % BOARD_SIZE);
            board.apply_mark(pos, role).unwrap();
        }
    }
    board
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn isolated_run_wins_iff_long_enough(
        row in 0..BOARD_SIZE,
        col in 0..BOARD_SIZE,
        axis in axis_strategy(),
        len in 1..=BOARD_SIZE,
        pick in any::<prop::sample::Index>(),
        role in role_strategy(),
    ) {
        let cells = run((row, col), axis, len);
        prop_assume!(cells.is_some());
        let cells = cells.unwrap();

        let mut board = Board::new();
        for pos in &cells {
            board.apply_mark(*pos, role).unwrap();
        }
        let origin = cells[pick.index(cells.len())];

        match board.detect_win(origin, role) {
            Some(line) => {
                prop_assert!(len >= WIN_LENGTH);
                prop_assert_eq!(line.axis, axis);
                prop_assert_eq!(line.cells, cells);
            }
            None => prop_assert!(len < WIN_LENGTH),
        }
    }

    #[test]
    fn reported_line_is_contiguous_and_owned(
        codes in prop::collection::vec(0u8..=2, BOARD_SIZE * BOARD_SIZE),
        row in 0..BOARD_SIZE,
        col in 0..BOARD_SIZE,
        role in role_strategy(),
    ) {
        let board = board_from(&codes);
        let origin = Position::new(row, col);

        if let Some(line) = board.detect_win(origin, role) {
            prop_assert!(line.len() >= WIN_LENGTH);
            prop_assert!(line.contains(origin));

            let (dr, dc) = delta(line.axis);
            for pair in line.cells.windows(2) {
                prop_assert_eq!(pair[0].row.checked_add_signed(dr), Some(pair[1].row));
                prop_assert_eq!(pair[0].col.checked_add_signed(dc), Some(pair[1].col));
            }
            for pos in &line.cells {
                prop_assert_eq!(board.get(*pos), Some(Cell::Stone(role)));
            }

            // Maximal: the cells just past either end are not ours.
            let first = line.cells[0];
            let last = line.cells[line.len() - 1];
            for (pos, (sr, sc)) in [(first, (-dr, -dc)), (last, (dr, dc))] {
                let beyond = pos
                    .row
                    .checked_add_signed(sr)
                    .zip(pos.col.checked_add_signed(sc))
                    .map(|(r, c)| Position::new(r, c));
                if let Some(beyond) = beyond {
                    prop_assert_ne!(board.get(beyond), Some(Cell::Stone(role)));
                }
            }
        }
    }

    #[test]
    fn no_win_reported_without_five(
        codes in prop::collection::vec(0u8..=2, BOARD_SIZE * BOARD_SIZE),
        row in 0..BOARD_SIZE,
        col in 0..BOARD_SIZE,
        role in role_strategy(),
    ) {
        let board = board_from(&codes);
        let origin = Position::new(row, col);

        let longest = Axis::ALL
            .iter()
            .map(|axis| {
                let (dr, dc) = delta(*axis);
                let count = |sign: isize| {
                    let mut n = 0;
                    let mut pos = origin;
                    while let Some(next) = pos
                        .row
                        .checked_add_signed(dr * sign)
                        .zip(pos.col.checked_add_signed(dc * sign))
                        .map(|(r, c)| Position::new(r, c))
                        .filter(|p| board.get(*p) == Some(Cell::Stone(role)))
                    {
                        n += 1;
                        pos = next;
                    }
                    n
                };
                1 + count(1) + count(-1)
            })
            .max()
            .unwrap_or(0);

        let owns_origin = board.get(origin) == Some(Cell::Stone(role));
        prop_assert_eq!(
            board.detect_win(origin, role).is_some(),
            owns_origin && longest >= WIN_LENGTH
        );
    }
}

//! Tests for the board model.

use turnstile_board::{Board, Cell, Mark, MoveError, Outcome, Position};

fn play(board: &mut Board, moves: &[(usize, Mark)]) {
    for &(index, mark) in moves {
        board.apply_move(index, mark).expect("Valid move");
    }
}

#[test]
fn test_apply_move_sets_cell() {
    let mut board = Board::new();
    board.apply_move(4, Mark::X).expect("Valid move");
    assert_eq!(board.get(4), Some(Cell::Occupied(Mark::X)));
    assert_eq!(board.evaluate(), Outcome::InProgress);
}

#[test]
fn test_out_of_range_rejected() {
    let mut board = Board::new();
    assert_eq!(board.apply_move(9, Mark::X), Err(MoveError::OutOfRange(9)));
    assert_eq!(
        board.apply_move(usize::MAX, Mark::O),
        Err(MoveError::OutOfRange(usize::MAX))
    );
    assert_eq!(board, Board::new());
}

#[test]
fn test_occupied_cell_never_overwritten() {
    let mut board = Board::new();
    let order = [4, 0, 8, 2, 6, 1, 3, 5, 7];
    let mut mark = Mark::X;
    for index in order {
        board.apply_move(index, mark).expect("Empty cell");
        for other in [Mark::X, Mark::O] {
            assert_eq!(
                board.apply_move(index, other),
                Err(MoveError::CellOccupied(index))
            );
        }
        assert_eq!(board.get(index), Some(Cell::Occupied(mark)));
        mark = mark.opponent();
    }
}

#[test]
fn test_full_board_without_line_is_draw() {
    // X O X / O X X / O X O
    let mut board = Board::new();
    play(
        &mut board,
        &[
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::X),
            (5, Mark::X),
            (6, Mark::O),
            (7, Mark::X),
            (8, Mark::O),
        ],
    );
    assert_eq!(board.evaluate(), Outcome::Draw);
}

#[test]
fn test_full_board_with_line_is_win() {
    // X X X / O O X / X O O
    let mut board = Board::new();
    play(
        &mut board,
        &[
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::O),
            (5, Mark::X),
            (6, Mark::X),
            (7, Mark::O),
            (8, Mark::O),
        ],
    );
    assert_eq!(board.evaluate(), Outcome::Win(Mark::X));
}

#[test]
fn test_three_of_a_kind_off_line_is_not_win() {
    // X at 4, 6, 8 covers no line of the table.
    let mut board = Board::new();
    play(&mut board, &[(4, Mark::X), (6, Mark::X), (8, Mark::X)]);
    assert_eq!(board.evaluate(), Outcome::InProgress);
}

#[test]
fn test_position_index_mapping() {
    for (index, pos) in Position::ALL.iter().enumerate() {
        assert_eq!(pos.to_index(), index);
        assert_eq!(pos.row(), index / 3);
        assert_eq!(pos.col(), index % 3);
    }
    assert_eq!(Position::from_index(9), None);
    assert_eq!(Position::from_coords(2, 1), Some(Position::MiddleRight));
    assert_eq!(Position::from_coords(3, 0), None);
}

#[test]
fn test_valid_moves_filters_occupied() {
    let mut board = Board::new();
    play(&mut board, &[(0, Mark::X), (4, Mark::O)]);

    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 7);
    assert!(!valid.contains(&Position::TopLeft));
    assert!(!valid.contains(&Position::Center));
}

#[test]
fn test_board_serializes_cells() {
    let mut board = Board::new();
    board.apply_move(0, Mark::O).unwrap();
    let json = serde_json::to_value(&board).unwrap();
    assert_eq!(json["cells"][0], serde_json::json!({ "Occupied": "O" }));
    assert_eq!(json["cells"][1], serde_json::json!("Empty"));
}

//! Tests for the client-side projection.

use turnstile::{
    pick_move, Cell, ClientMessage, ErrorCode, ErrorNotice, LocalResult, Mark, PlayerId,
    Presenter, Projection, ServerMessage, Slot, TerminalResult, WinCause,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    JoinComplete,
    Turn(bool),
    Countdown(u8),
    Ended(LocalResult),
    Rejected(ErrorCode),
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
}

impl Presenter for Recorder {
    fn on_join_complete(&mut self) {
        self.events.push(Event::JoinComplete);
    }

    fn on_turn_changed(&mut self, is_local_player_turn: bool) {
        self.events.push(Event::Turn(is_local_player_turn));
    }

    fn on_countdown_tick(&mut self, value: u8) {
        self.events.push(Event::Countdown(value));
    }

    fn on_game_ended(&mut self, result: LocalResult) {
        self.events.push(Event::Ended(result));
    }

    fn on_error(&mut self, notice: &ErrorNotice) {
        self.events.push(Event::Rejected(notice.code));
    }
}

fn welcomed_as_second() -> (Projection, Recorder) {
    let mut projection = Projection::new();
    let mut recorder = Recorder::default();
    for message in [
        ServerMessage::Welcome {
            player_id: PlayerId::from("bob"),
            slot: Slot::Second,
            mark: Mark::O,
        },
        ServerMessage::PlayerJoined {
            slot: Slot::First,
            player_id: PlayerId::from("alice"),
        },
        ServerMessage::PlayerJoined {
            slot: Slot::Second,
            player_id: PlayerId::from("bob"),
        },
    ] {
        projection.apply(&message, &mut recorder);
    }
    (projection, recorder)
}

#[test]
fn test_join_complete_fires_on_second_player() {
    let mut projection = Projection::new();
    let mut recorder = Recorder::default();

    projection.apply(
        &ServerMessage::Welcome {
            player_id: PlayerId::from("alice"),
            slot: Slot::First,
            mark: Mark::X,
        },
        &mut recorder,
    );
    projection.apply(
        &ServerMessage::PlayerJoined {
            slot: Slot::First,
            player_id: PlayerId::from("alice"),
        },
        &mut recorder,
    );
    assert!(recorder.events.is_empty());
    assert_eq!(projection.joined(), 1);

    projection.apply(
        &ServerMessage::PlayerJoined {
            slot: Slot::Second,
            player_id: PlayerId::from("bob"),
        },
        &mut recorder,
    );
    assert_eq!(recorder.events, vec![Event::JoinComplete]);
    assert_eq!(projection.local_mark(), Some(Mark::X));
    assert_eq!(projection.local_player(), Some(&PlayerId::from("alice")));
}

#[test]
fn test_turn_notifications_are_relative_to_local_player() {
    let (mut projection, mut recorder) = welcomed_as_second();
    recorder.events.clear();

    projection.apply(
        &ServerMessage::TurnChanged {
            player_id: PlayerId::from("alice"),
        },
        &mut recorder,
    );
    assert!(!projection.is_local_turn());

    projection.apply(
        &ServerMessage::TurnChanged {
            player_id: PlayerId::from("bob"),
        },
        &mut recorder,
    );
    assert!(projection.is_local_turn());
    assert_eq!(recorder.events, vec![Event::Turn(false), Event::Turn(true)]);
}

#[test]
fn test_cells_and_countdown_mirror_server() {
    let (mut projection, mut recorder) = welcomed_as_second();
    recorder.events.clear();

    projection.apply(
        &ServerMessage::CellChanged {
            index: 4,
            mark: Mark::X,
        },
        &mut recorder,
    );
    projection.apply(&ServerMessage::CountdownChanged { value: 7 }, &mut recorder);

    assert_eq!(projection.cells()[4], Cell::Occupied(Mark::X));
    assert_eq!(projection.countdown(), 7);
    assert_eq!(recorder.events, vec![Event::Countdown(7)]);
    assert_eq!(pick_move(&projection), Some(0));
}

#[test]
fn test_move_intent_leaves_mirror_untouched() {
    let (projection, _) = welcomed_as_second();
    let before = projection.clone();

    let intent = projection.move_intent(6);

    assert_eq!(intent, ClientMessage::action(6));
    assert_eq!(projection, before);
    assert_eq!(projection.cells()[6], Cell::Empty);
}

#[test]
fn test_results_relative_to_local_player() {
    let cases = [
        (
            TerminalResult::Win {
                winner: PlayerId::from("bob"),
                cause: WinCause::Line,
            },
            LocalResult::Won,
        ),
        (
            TerminalResult::Win {
                winner: PlayerId::from("alice"),
                cause: WinCause::Forfeit,
            },
            LocalResult::Lost,
        ),
        (TerminalResult::Draw, LocalResult::Draw),
    ];

    for (outcome, expected) in cases {
        let (mut projection, mut recorder) = welcomed_as_second();
        recorder.events.clear();
        projection.apply(&ServerMessage::GameEnded { outcome }, &mut recorder);
        assert_eq!(projection.local_result(), Some(expected));
        assert_eq!(recorder.events, vec![Event::Ended(expected)]);
    }
}

#[test]
fn test_error_notice_forwarded() {
    let (mut projection, mut recorder) = welcomed_as_second();
    recorder.events.clear();
    let before = projection.clone();

    projection.apply(
        &ServerMessage::Error {
            code: ErrorCode::CellOccupied,
            message: "cell 4 is already occupied".to_string(),
        },
        &mut recorder,
    );

    assert_eq!(recorder.events, vec![Event::Rejected(ErrorCode::CellOccupied)]);
    assert_eq!(projection, before);
}

#[test]
fn test_pick_move_on_full_board() {
    let mut projection = Projection::new();
    let mut recorder = Recorder::default();
    for index in 0..9 {
        projection.apply(
            &ServerMessage::CellChanged {
                index,
                mark: if index % 2 == 0 { Mark::X } else { Mark::O },
            },
            &mut recorder,
        );
    }
    assert_eq!(pick_move(&projection), None);
}

#[test]
fn test_pick_move_follows_mirrored_board() {
    let (mut projection, mut recorder) = welcomed_as_second();
    for (index, mark) in [(0, Mark::X), (1, Mark::O)] {
        projection.apply(&ServerMessage::CellChanged { index, mark }, &mut recorder);
    }
    assert_eq!(pick_move(&projection), Some(2));

    // A conflicting update for a marked cell leaves the mirror as it was.
    let before = projection.clone();
    projection.apply(
        &ServerMessage::CellChanged {
            index: 0,
            mark: Mark::O,
        },
        &mut recorder,
    );
    assert_eq!(projection, before);
    assert_eq!(projection.board().get(0), Some(Cell::Occupied(Mark::X)));
}

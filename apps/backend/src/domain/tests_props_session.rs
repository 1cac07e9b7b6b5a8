use proptest::prelude::*;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::{Identity, Role};
use crate::domain::pairing::PairingMode;
use crate::domain::session::{ClockTick, MatchSession, SideId, TimeControl};

fn fresh_session(white_a: bool, initial_secs: u32) -> MatchSession {
    MatchSession::new(
        Uuid::new_v4(),
        Identity::new("coach-p", "Avery", Role::Coach),
        Identity::new("learner-p", "Sam", Role::Learner),
        if white_a { SideId::A } else { SideId::B },
        PairingMode::Friendly,
        TimeControl { initial_secs },
        OffsetDateTime::now_utc(),
    )
}

proptest! {
    /// Move-log parity determines the turn after every accepted move,
    /// whichever side was dealt white.
    #[test]
    fn parity_matches_turn_for_any_move_count(white_a: bool, moves in 0usize..60) {
        let mut s = fresh_session(white_a, 600);
        for i in 0..moves {
            let side = s.turn;
            s.apply_move(side, format!("m{i}"), format!("pos{i}"), OffsetDateTime::now_utc())
                .unwrap();
            prop_assert!(s.turn_matches_parity());
        }
        prop_assert_eq!(s.move_log.len(), moves);
    }

    /// For any interleaving of moves and ticks: a move changes no clock,
    /// a tick changes exactly one clock (the side to move's) by one unit.
    #[test]
    fn exactly_one_clock_changes_per_tick(white_a: bool, events in proptest::collection::vec(any::<bool>(), 0..80)) {
        let mut s = fresh_session(white_a, 600);
        for (i, is_tick) in events.into_iter().enumerate() {
            let before = s.clocks;
            if is_tick {
                let ticked = s.turn;
                prop_assert_eq!(s.tick(), ClockTick::Running);
                prop_assert_eq!(s.clocks[ticked.index()], before[ticked.index()] - 1);
                prop_assert_eq!(
                    s.clocks[ticked.other().index()],
                    before[ticked.other().index()]
                );
            } else {
                let side = s.turn;
                s.apply_move(side, format!("m{i}"), format!("pos{i}"), OffsetDateTime::now_utc())
                    .unwrap();
                prop_assert_eq!(s.clocks, before);
            }
        }
    }
}

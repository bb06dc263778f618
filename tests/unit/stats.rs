//! Unit tests for derived battle statistics

use battle_stats_etl::stats::{
    total_battles, validate_ledger, win_ranking, win_rate, BattleCount, BattleStats, WinCount,
};
use battle_stats_etl::Battle;

#[test]
fn test_round_robin_is_even() {
    let ledger = [Battle::new(1, 2, 1), Battle::new(1, 3, 3), Battle::new(2, 3, 2)];

    let stats = BattleStats::from_ledger(&ledger);

    assert!(stats.total_battles.iter().all(|t| t.total_battles == 2));
    assert!(stats.win_ranking.iter().all(|w| w.wins == 1));
    assert_eq!(stats.win_rate.len(), 3);
    for row in &stats.win_rate {
        assert_eq!(row.win_rate_percent, 50.0);
    }
}

#[test]
fn test_participant_without_wins_gets_zero() {
    let ledger = [Battle::new(1, 2, 1), Battle::new(1, 2, 1)];

    let stats = BattleStats::from_ledger(&ledger);

    let loser = stats.win_rate.iter().find(|r| r.pokemon == 2).unwrap();
    assert_eq!(loser.wins, 0);
    assert_eq!(loser.total_battles, 2);
    assert_eq!(loser.win_rate_percent, 0.0);

    let winner = stats.win_rate.iter().find(|r| r.pokemon == 1).unwrap();
    assert_eq!(winner.win_rate_percent, 100.0);
}

#[test]
fn test_sums_are_consistent() {
    let ledger: Vec<Battle> = (0..200)
        .map(|i| Battle::new(i % 7, (i * 3) % 11 + 7, if i % 2 == 0 { i % 7 } else { (i * 3) % 11 + 7 }))
        .collect();

    let stats = BattleStats::from_ledger(&ledger);

    let wins: u64 = stats.win_ranking.iter().map(|w| w.wins).sum();
    let totals: u64 = stats.total_battles.iter().map(|t| t.total_battles).sum();
    assert_eq!(wins, ledger.len() as u64);
    assert_eq!(totals, 2 * ledger.len() as u64);
    for row in &stats.win_rate {
        assert!((0.0..=100.0).contains(&row.win_rate_percent));
        assert!(row.wins <= row.total_battles);
    }
}

#[test]
fn test_empty_ledger() {
    let stats = BattleStats::from_ledger(&[]);

    assert!(stats.win_ranking.is_empty());
    assert!(stats.total_battles.is_empty());
    assert!(stats.win_rate.is_empty());
}

#[test]
fn test_ranking_is_descending_with_id_tiebreak() {
    let ledger = [
        Battle::new(8, 1, 8),
        Battle::new(8, 2, 2),
        Battle::new(8, 3, 8),
        Battle::new(5, 4, 5),
    ];

    assert_eq!(
        win_ranking(&ledger),
        vec![
            WinCount { pokemon: 8, wins: 2 },
            WinCount { pokemon: 2, wins: 1 },
            WinCount { pokemon: 5, wins: 1 },
        ]
    );
    assert_eq!(
        total_battles(&ledger).first(),
        Some(&BattleCount { pokemon: 8, total_battles: 3 })
    );
}

#[test]
fn test_win_rate_follows_totals_order() {
    let totals = [
        BattleCount { pokemon: 4, total_battles: 4 },
        BattleCount { pokemon: 1, total_battles: 2 },
    ];
    let ranking = [WinCount { pokemon: 1, wins: 1 }, WinCount { pokemon: 4, wins: 3 }];

    let rates = win_rate(&totals, &ranking);

    assert_eq!(rates[0].pokemon, 4);
    assert_eq!(rates[0].win_rate_percent, 75.0);
    assert_eq!(rates[1].pokemon, 1);
    assert_eq!(rates[1].win_rate_percent, 50.0);
}

#[test]
fn test_validate_ledger_reports_foreign_winner() {
    let ledger = [Battle::new(1, 2, 1), Battle::new(3, 4, 9), Battle::new(5, 6, 6)];

    let anomalies = validate_ledger(&ledger);

    assert!(!anomalies.is_empty());
    assert_eq!(anomalies.foreign_winners, vec![(1, Battle::new(3, 4, 9))]);
}

#[test]
fn test_clean_ledger_has_no_anomalies() {
    assert!(validate_ledger(&[Battle::new(1, 2, 2)]).is_empty());
}

//! 国士無双と十三面待ちの判定シナリオ

use riichi_engine::tile::parse_tiles;
use riichi_engine::{
    yakuman, Category, DrawSource, DrawnTile, PlayerHand, RuleConfig, ScoreAggregator, Tile,
    TurnContext, WinContext, Wind, Yakuman,
};

fn hand(concealed: &str, win: &str, source: DrawSource) -> PlayerHand {
    PlayerHand::from_parts(
        1,
        Wind::S,
        parse_tiles(concealed).unwrap(),
        Some(DrawnTile {
            tile: Tile::from_code(win).unwrap(),
            source,
        }),
        vec![],
        None,
    )
}

const ALL_ORPHANS: &str = "1m 9m 1p 9p 1s 9s E S W N P F C";

#[test]
fn thirteen_wait_when_all_kinds_were_held() {
    for win in ["1m", "9s", "E", "C"] {
        let h = hand(ALL_ORPHANS, win, DrawSource::SelfDraw);
        assert_eq!(yakuman::evaluate(&h), vec![Yakuman::Kokushi13], "win on {}", win);
    }
}

#[test]
fn single_wait_when_the_missing_kind_arrives() {
    let h = hand("1m 1m 9m 1p 9p 1s 9s E S W N P F", "C", DrawSource::Claimed);
    assert_eq!(yakuman::evaluate(&h), vec![Yakuman::Kokushi]);
}

#[test]
fn never_both_variants() {
    let orphans = parse_tiles(ALL_ORPHANS).unwrap();
    for (i, missing) in orphans.iter().enumerate() {
        let mut concealed = orphans.clone();
        // 欠けた1種の代わりに隣の么九牌を重ねる
        concealed[i] = orphans[(i + 1) % orphans.len()];
        let h = PlayerHand::from_parts(
            0,
            Wind::E,
            concealed,
            Some(DrawnTile {
                tile: *missing,
                source: DrawSource::SelfDraw,
            }),
            vec![],
            None,
        );
        let found = yakuman::evaluate(&h);
        assert!(found.contains(&Yakuman::Kokushi));
        assert!(!found.contains(&Yakuman::Kokushi13));
    }
}

#[test]
fn simple_tile_breaks_the_shape() {
    let h = hand("1m 5m 1p 9p 1s 9s E S W N P F C", "C", DrawSource::SelfDraw);
    let found = yakuman::evaluate(&h);
    assert!(!found.contains(&Yakuman::Kokushi));
    assert!(!found.contains(&Yakuman::Kokushi13));

    let h = hand(ALL_ORPHANS, "5p", DrawSource::SelfDraw);
    assert!(yakuman::evaluate(&h).is_empty());
}

#[test]
fn thirteen_wait_scores_double() {
    let rules = RuleConfig::default();
    let agg = ScoreAggregator::new(&rules);
    let later = TurnContext::default();

    let out = agg.evaluate(
        &hand(ALL_ORPHANS, "N", DrawSource::Claimed),
        None,
        later,
        WinContext::ron(Wind::E),
    );
    assert_eq!(out.categories, vec![Category::Yakuman(Yakuman::Kokushi13)]);
    assert_eq!(out.fan, 26);

    let out = agg.evaluate(
        &hand("1m 1m 9m 1p 9p 1s 9s E S W N P F", "C", DrawSource::Claimed),
        None,
        later,
        WinContext::ron(Wind::E),
    );
    assert_eq!(out.categories, vec![Category::Yakuman(Yakuman::Kokushi)]);
    assert_eq!(out.fan, 13);
}

#[test]
fn multiplier_comes_from_rules() {
    let rules = RuleConfig::from_json(r#"{ "yakuman_multiplier": { "kokushi_13": 1 } }"#).unwrap();
    let out = ScoreAggregator::new(&rules).evaluate(
        &hand(ALL_ORPHANS, "P", DrawSource::SelfDraw),
        None,
        TurnContext::default(),
        WinContext::tsumo(Wind::E),
    );
    assert_eq!(out.fan, 13);
}

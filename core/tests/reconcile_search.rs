use std::path::{Path, PathBuf};

use ccdict_core::{
    CantoDict, DictError, DictField, DictSources, FormatOptions, OutputFormat, ReconcileStats, SearchExpr,
    SearchOptions, SearchTerm,
};

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn sources() -> DictSources {
    let dir = data_dir();
    DictSources {
        canto: dir.join("cccanto.txt"),
        cedict: dir.join("cedict.txt"),
        cedict_canto: dir.join("cedict_canto.txt"),
        max_lines: None,
    }
}

fn loaded() -> CantoDict {
    let mut dict = CantoDict::in_memory().unwrap();
    dict.reconcile(&sources(), true).unwrap();
    assert!(dict.load_input_codes(data_dir().join("cangjie.txt"), true).unwrap());
    dict
}

fn by_traditional(dict: &CantoDict, trad: &str) -> Vec<ccdict_core::GroupedResult> {
    let expr = SearchExpr::Terms(vec![SearchTerm::new(DictField::Traditional, trad)]);
    dict.search(&expr, &SearchOptions::default()).unwrap()
}

#[test]
fn reconcile_phase_counts() {
    let dict = CantoDict::in_memory().unwrap();
    let stats = dict.reconcile(&sources(), false).unwrap().unwrap();
    assert_eq!(
        stats,
        ReconcileStats {
            seeded: 16,
            joined: 22,
            cedict_orphans: 4,
            cedict_canto_orphans: 1,
        }
    );
    assert_eq!(dict.store().entry_count().unwrap(), 43);
    assert_eq!(dict.store().reconcile_stats().unwrap().unwrap().stats, stats);
}

#[test]
fn rebuild_is_skipped_unless_forced() {
    let dict = CantoDict::in_memory().unwrap();
    let first = dict.reconcile(&sources(), false).unwrap().unwrap();
    assert!(dict.reconcile(&sources(), false).unwrap().is_none());
    let again = dict.reconcile(&sources(), true).unwrap().unwrap();
    assert_eq!(first, again);
    assert_eq!(dict.store().entry_count().unwrap() as usize, again.total());
}

#[test]
fn max_lines_caps_each_source() {
    let dict = CantoDict::in_memory().unwrap();
    let capped = sources().with_max_lines(Some(1));
    let stats = dict.reconcile(&capped, true).unwrap().unwrap();
    // first lines: 吼 {haau1} (4 glosses), 吼 from CC-CEDICT, 吼 {haau1} bridge
    assert_eq!(stats.seeded, 4);
    assert_eq!(stats.joined, 2);
    assert_eq!(dict.store().reconcile_stats().unwrap().unwrap().max_source_lines, Some(1));
}

#[test]
fn warship_lookup() {
    let dict = loaded();
    let results = by_traditional(&dict, "艦");
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.simplified, "舰");
    assert_eq!(r.jyutping, ["laam6"]);
    assert_eq!(r.english, ["naval vessel", "warship"]);
    assert_eq!(r.cjcode, ["hysit", "hysmt"]);
    assert_eq!(r.pinyin, ["jian4"]);

    let text = dict.format(r, &FormatOptions::default()).unwrap();
    assert_eq!(text, "艦\n\t竹卜尸戈廿 竹卜尸一廿\n\t[laam6]\n\tnaval vessel\n\twarship");
}

#[test]
fn roar_groups_per_reading_set() {
    let dict = loaded();
    let results = by_traditional(&dict, "吼");
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].jyutping, ["haau1", "hau2", "hau3"]);
    assert_eq!(results[0].english, ["bellow of rage", "roar or howl of an animal"]);

    assert_eq!(results[1].jyutping, ["haau1"]);
    assert_eq!(
        results[1].english,
        [
            "(verb) watch closely on something because of great interest",
            "to howl",
            "to roar",
            "to shriek",
        ]
    );

    assert_eq!(results[2].jyutping, ["hau1", "hau4"]);
    assert_eq!(
        results[2].english,
        [
            "to keep an eye on",
            "to long for",
            "to lust after",
            "to target",
            "to watch closely",
        ]
    );
    assert!(results.iter().all(|r| r.cjcode == ["rndu"]));
}

#[test]
fn combined_regex_terms() {
    let dict = loaded();
    let expr = SearchExpr::Terms(vec![
        SearchTerm::regex(DictField::Jyutping, "jyun."),
        SearchTerm::regex(DictField::English, "surname"),
    ]);
    let results = dict.search(&expr, &SearchOptions::default()).unwrap();
    let heads: Vec<_> = results.iter().map(|r| r.traditional.as_str()).collect();
    assert_eq!(heads, ["元", "小淵", "阮"]);
    assert_eq!(results[0].english, ["a surname", "surname Yuan"]);
    assert_eq!(results[2].jyutping, ["jyun2", "jyun5"]);
    assert_eq!(results[2].english, ["surname Ruan"]);
}

#[test]
fn orphans_are_searchable() {
    let dict = loaded();
    let percent = by_traditional(&dict, "%");
    assert_eq!(percent.len(), 1);
    assert!(percent[0].jyutping.is_empty());
    assert_eq!(percent[0].english, ["percent (Tw)"]);

    let unflattened = SearchOptions {
        flatten_pinyin: false,
        ..Default::default()
    };
    let expr = SearchExpr::Terms(vec![SearchTerm::new(DictField::Traditional, "樂")]);
    let music = dict.search(&expr, &unflattened).unwrap();
    let yao = music.iter().find(|r| r.pinyin == ["yao4"]).unwrap();
    assert_eq!(yao.jyutping, ["ngaau6"]);
    assert!(yao.english.is_empty());
}

#[test]
fn text_search_picks_fields() {
    let dict = loaded();
    let options = SearchOptions::default();

    let by_jyutping = dict.search(&SearchExpr::Text("laam6".into()), &options).unwrap();
    assert_eq!(by_jyutping[0].traditional, "艦");

    let by_code = dict.search(&SearchExpr::Text("hjd".into()), &options).unwrap();
    assert_eq!(by_code[0].traditional, "朱");

    let by_simplified = dict.search(&SearchExpr::Text("舰".into()), &options).unwrap();
    assert_eq!(by_simplified[0].traditional, "艦");
}

#[test]
fn json_rendering() {
    let dict = loaded();
    let results = by_traditional(&dict, "艦");
    let options = FormatOptions {
        output_format: OutputFormat::Json,
        ..Default::default()
    };
    let text = dict.format(&results[0], &options).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["traditional"], "艦");
    assert_eq!(value["cjcode"], "hysit; hysmt");
    assert_eq!(value["english"], "naval vessel; warship");
    assert!(value.get("simplified").is_none());
}

#[test]
fn query_errors_surface() {
    let dict = loaded();
    let expr = SearchExpr::Terms(vec![SearchTerm::regex(DictField::English, "[unclosed")]);
    let err = dict.search(&expr, &SearchOptions::default()).unwrap_err();
    assert!(matches!(err, DictError::InvalidPattern { .. }));
    assert!(err.is_query_error());
}

#[test]
fn file_database_reopens_with_codes() {
    let path = std::env::temp_dir().join(format!("ccdict_it_{}.redb", std::process::id()));
    let _ = std::fs::remove_file(&path);
    {
        let mut dict = CantoDict::open(&path).unwrap();
        dict.reconcile(&sources(), false).unwrap();
        dict.load_input_codes(data_dir().join("cangjie.txt"), false).unwrap();
    }
    {
        let mut dict = CantoDict::open(&path).unwrap();
        assert!(!dict.load_input_codes(data_dir().join("cangjie.txt"), false).unwrap());
        assert_eq!(dict.translate_codes("hysit"), "竹卜尸戈廿");
        assert_eq!(by_traditional(&dict, "艦")[0].cjcode, ["hysit", "hysmt"]);
    }
    std::fs::remove_file(&path).ok();
}

//! Unit tests for label normalization

#[path = "../common/mod.rs"]
mod common;

use common::{test_normalizer, IRRELEVANT};
use label_zoo_gateway::response::NormalizedLabel;

fn label(prediction: &str, color: &str) -> NormalizedLabel {
    NormalizedLabel {
        prediction: prediction.to_string(),
        color: color.to_string(),
    }
}

fn raw(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_multilabel_and_irrelevant_lines() {
    let result = test_normalizer().normalize(&[raw(&["class1;class2"]), raw(&[IRRELEVANT])]);

    assert_eq!(
        result,
        vec![
            vec![label("mapped_class1", "#FF0000"), label("mapped_class2", "#00FF00")],
            vec![label(IRRELEVANT, "#CCCCCC")],
        ]
    );
}

#[test]
fn test_irrelevant_dropped_next_to_relevant_label() {
    let result = test_normalizer().normalize(&[
        raw(&[format!("class2;{}", IRRELEVANT).as_str()]),
        raw(&[IRRELEVANT, "class1"]),
    ]);

    assert_eq!(
        result,
        vec![
            vec![label("mapped_class2", "#00FF00")],
            vec![label("mapped_class1", "#FF0000")],
        ]
    );
}

#[test]
fn test_unknown_labels_never_surface() {
    let normalizer = test_normalizer();

    assert_eq!(
        normalizer.normalize_one(&raw(&["class1;classX"])),
        vec![label("mapped_class1", "#FF0000")]
    );
    assert_eq!(
        normalizer.normalize_one(&raw(&["classX", "classY;classZ"])),
        vec![label(IRRELEVANT, "#CCCCCC")]
    );
}

#[test]
fn test_order_follows_backend_output() {
    let result = test_normalizer().normalize_one(&raw(&["class2", "class1"]));
    assert_eq!(
        result,
        vec![label("mapped_class2", "#00FF00"), label("mapped_class1", "#FF0000")]
    );
}

#[test]
fn test_repeated_irrelevant_collapses_to_one() {
    let result =
        test_normalizer().normalize_one(&raw(&[IRRELEVANT, format!("{0};{0}", IRRELEVANT).as_str()]));
    assert_eq!(result, vec![label(IRRELEVANT, "#CCCCCC")]);
}

#[test]
fn test_never_empty_and_never_mixed() {
    let normalizer = test_normalizer();
    let irrelevant = label(IRRELEVANT, "#CCCCCC");

    let cases = vec![
        raw(&[]),
        raw(&[""]),
        raw(&[";;"]),
        raw(&["class1"]),
        raw(&["classX;class2"]),
        raw(&[IRRELEVANT, "class2", IRRELEVANT]),
        raw(&["class1;class1"]),
    ];

    for case in &cases {
        let labels = normalizer.normalize_one(case);
        assert!(!labels.is_empty(), "empty output for {:?}", case);

        let irrelevant_count = labels.iter().filter(|l| **l == irrelevant).count();
        assert!(
            irrelevant_count == 0 || labels.len() == 1,
            "irrelevant mixed with other labels for {:?}",
            case
        );
    }
}

#[test]
fn test_normalization_is_deterministic() {
    let normalizer = test_normalizer();
    let input = vec![raw(&["class1;class2", "classX"]), raw(&[IRRELEVANT])];

    assert_eq!(normalizer.normalize(&input), normalizer.normalize(&input));
}

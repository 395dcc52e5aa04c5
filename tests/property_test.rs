//! Property tests for segmentation and batching

use proptest::prelude::*;
use uqureader_core::annotation::BatchPolicy;
use uqureader_core::morphology;

fn feature_strategy() -> impl Strategy<Value = String> {
    (
        "[A-Z]{0,4}",
        prop::collection::vec("[а-яәөүҗңһa-z]{0,4}", 0..4),
    )
        .prop_map(|(code, variants)| {
            if variants.is_empty() {
                code
            } else {
                format!("{}({})", code, variants.join("/"))
            }
        })
}

fn tag_strategy() -> impl Strategy<Value = String> {
    (
        "[а-яәөүҗңһ]{1,8}",
        "[A-Z]{1,4}",
        prop::collection::vec(feature_strategy(), 0..6),
    )
        .prop_map(|(lemma, pos, features)| {
            let mut tag = format!("{}+{}", lemma, pos);
            for feature in features {
                tag.push('+');
                tag.push_str(&feature);
            }
            tag.push(';');
            tag
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_segments_reproduce_surface(
        surface in "[А-Яа-яӘәӨөҮүҖҗҢңҺһ]{0,16}",
        tag in tag_strategy(),
    ) {
        let morph = morphology::parse(&surface, &tag);
        prop_assert!(morph.is_some());
        let morph = morph.unwrap();
        prop_assert_eq!(morph.segments.concat(), surface);
    }

    #[test]
    fn prop_malformed_tags_never_panic(surface in "\\PC{0,12}", tag in "\\PC{0,24}") {
        if let Some(morph) = morphology::parse(&surface, &tag) {
            prop_assert_eq!(morph.segments.concat(), surface);
        }
    }

    #[test]
    fn prop_batches_preserve_tokens(
        text in "[а-яa-z0-9.!?»,\"]{1,12}([ \n]{1,3}[а-яa-z0-9.!?»,\"]{1,12}){0,40}",
        budget in 1usize..80,
    ) {
        let policy = BatchPolicy::new(budget).unwrap();
        let batches = policy.split(&text);

        let flattened: Vec<&str> = batches.iter().flat_map(|b| b.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        prop_assert_eq!(flattened, original);

        for batch in &batches {
            let len = batch.chars().count();
            // Only a single token longer than the budget may overflow it
            prop_assert!(len <= budget || batch.split_whitespace().count() == 1);
            prop_assert!(!batch.trim().is_empty());
        }
    }
}

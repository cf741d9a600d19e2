use proptest::prelude::*;
use recipe_core::{recommend, CorpusIndex, RecipeId, RecipeRecord};

fn corpus(texts: &[&str]) -> Vec<RecipeRecord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| RecipeRecord::new(i as RecipeId, format!("Recipe {i}"), t))
        .collect()
}

fn pantry_index() -> CorpusIndex {
    CorpusIndex::build(corpus(&[
        "chicken rice garlic onion",
        "beef noodles soy sauce",
        "chicken soup carrot celery",
        "tomato pasta garlic basil olive oil",
        "low-fat yogurt honey oats",
        "salmon rice soy sauce ginger",
    ]))
    .unwrap()
}

#[test]
fn end_to_end_chicken_broth() {
    let index = CorpusIndex::build(corpus(&["chicken rice", "beef noodles", "chicken soup"])).unwrap();
    let results = recommend(&index, "chicken broth", 2).unwrap();
    assert_eq!(results.len(), 2);
    let ids: Vec<RecipeId> = results.iter().map(|r| r.recipe_id).collect();
    assert!(ids.contains(&0) && ids.contains(&2));
    assert!(!ids.contains(&1));
    assert!(results.iter().all(|r| r.similarity > 0.0));
}

#[test]
fn result_carries_record_fields() {
    let index = pantry_index();
    let top = &recommend(&index, "salmon ginger", 1).unwrap()[0];
    assert_eq!(top.recipe_id, 5);
    assert_eq!(top.title, "Recipe 5");
    assert_eq!(top.ingredients_text, "salmon rice soy sauce ginger");
}

#[test]
fn self_similarity_is_one_and_maximal() {
    let index = pantry_index();
    for record in index.records() {
        let results = recommend(&index, &record.ingredients_text, index.len() as i64).unwrap();
        let own = results.iter().find(|r| r.recipe_id == record.id).unwrap();
        assert!((own.similarity - 1.0).abs() < 1e-5, "{} scored {}", record.id, own.similarity);
        assert!(results.iter().all(|r| r.similarity <= own.similarity + 1e-6));
        assert_eq!(results[0].recipe_id, record.id);
    }
}

#[test]
fn unknown_query_returns_corpus_order_with_zero_scores() {
    let index = pantry_index();
    let results = recommend(&index, "dragonfruit quinoa kale", 4).unwrap();
    let ids: Vec<RecipeId> = results.iter().map(|r| r.recipe_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert!(results.iter().all(|r| r.similarity == 0.0));
}

#[test]
fn empty_query_is_not_an_error() {
    let index = pantry_index();
    let results = recommend(&index, "", 3).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.similarity == 0.0));
}

#[test]
fn identical_texts_tie_in_corpus_order() {
    let index = CorpusIndex::build(corpus(&["lentil cumin", "apple cinnamon", "lentil cumin", "pear"])).unwrap();

    let unrelated = recommend(&index, "whiskey", 4).unwrap();
    let ids: Vec<RecipeId> = unrelated.iter().map(|r| r.recipe_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    let related = recommend(&index, "lentil", 2).unwrap();
    assert_eq!(related[0].recipe_id, 0);
    assert_eq!(related[1].recipe_id, 2);
    assert_eq!(related[0].similarity, related[1].similarity);
}

#[test]
fn out_of_vocabulary_queries_do_not_refit() {
    let index = pantry_index();
    let terms = index.vocabulary().len();
    let before = recommend(&index, "chicken garlic", 3).unwrap();
    recommend(&index, "saffron chicken mango", 3).unwrap();
    assert_eq!(index.vocabulary().len(), terms);
    assert_eq!(recommend(&index, "chicken garlic", 3).unwrap(), before);
}

proptest! {
    #[test]
    fn top_k_is_clamped_to_corpus(k in any::<i64>()) {
        let index = pantry_index();
        let results = recommend(&index, "garlic rice", k).unwrap();
        prop_assert_eq!(results.len(), k.clamp(1, index.len() as i64) as usize);
    }

    #[test]
    fn similarities_descend_and_repeat(query in "[a-z ]{0,40}", k in -3i64..10) {
        let index = pantry_index();
        let first = recommend(&index, &query, k).unwrap();
        for pair in first.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
        for r in &first {
            prop_assert!((0.0..=1.0).contains(&r.similarity));
        }
        prop_assert_eq!(recommend(&index, &query, k).unwrap(), first);
    }
}

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::Question;

/// Uniform random permutation of `items` (Fisher-Yates).
pub fn shuffle<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.as_mut_slice().shuffle(rng);
    items
}

/// Shuffle within categories, keeping categories contiguous.
///
/// Questions are bucketed by category label (`"Uncategorized"` when absent),
/// buckets are ordered by label, and each bucket is shuffled independently.
pub fn grouped_shuffle<R: Rng + ?Sized>(
    questions: Vec<Arc<Question>>,
    rng: &mut R,
) -> Vec<Arc<Question>> {
    let mut buckets: BTreeMap<&'static str, Vec<Arc<Question>>> = BTreeMap::new();
    for question in questions {
        buckets
            .entry(question.group_label())
            .or_default()
            .push(question);
    }

    let mut ordered = Vec::new();
    for (_, bucket) in buckets {
        ordered.extend(shuffle(bucket, &mut *rng));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerMode, AnswerOption, Category, OptionId, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn question(id: u64, category: Option<Category>) -> Arc<Question> {
        Arc::new(
            Question::new(
                QuestionId::new(id),
                category,
                format!("Q{id}"),
                AnswerMode::Single,
                vec![
                    AnswerOption {
                        id: OptionId::new("a"),
                        text: "A".into(),
                    },
                    AnswerOption {
                        id: OptionId::new("b"),
                        text: "B".into(),
                    },
                ],
                vec![OptionId::new("a")],
                None,
            )
            .unwrap(),
        )
    }

    fn mixed_catalog() -> Vec<Arc<Question>> {
        let categories = [
            Some(Category::SecurityAndCompliance),
            None,
            Some(Category::CloudConcepts),
            Some(Category::BillingPricingAndSupport),
            Some(Category::CloudTechnologyAndServices),
        ];
        (0..25)
            .map(|i| question(i, categories[(i % 5) as usize]))
            .collect()
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = shuffle((0..50).collect::<Vec<u32>>(), &mut rng);
        let mut sorted = out.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn grouped_shuffle_keeps_every_question_once() {
        let mut rng = StdRng::seed_from_u64(11);
        let input = mixed_catalog();
        let out = grouped_shuffle(input.clone(), &mut rng);

        assert_eq!(out.len(), input.len());
        let ids: HashSet<_> = out.iter().map(|q| q.id()).collect();
        assert_eq!(ids.len(), input.len());
    }

    #[test]
    fn grouped_shuffle_orders_categories_by_label() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = grouped_shuffle(mixed_catalog(), &mut rng);
            let labels: Vec<&str> = out.iter().map(|q| q.group_label()).collect();

            // Contiguous and non-decreasing means every earlier category precedes every later one.
            assert!(labels.windows(2).all(|w| w[0] <= w[1]), "seed {seed}: {labels:?}");
            assert_eq!(labels.first(), Some(&"Billing, Pricing, and Support"));
            assert_eq!(labels.last(), Some(&"Uncategorized"));
        }
    }

    #[test]
    fn grouped_shuffle_randomizes_within_category() {
        let orders: HashSet<Vec<QuestionId>> = (0..10)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                grouped_shuffle(mixed_catalog(), &mut rng)
                    .iter()
                    .map(|q| q.id())
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }
}

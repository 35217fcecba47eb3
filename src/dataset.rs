use crate::error::GestureError;
use crate::feature_extractor::interface::Embedding;
use crate::label::{ExampleCounts, Label, NUM_CLASSES};
use crate::library::channel::Channel;
use ndarray::{concatenate, Array2, ArrayD, Axis};

/// Labeled embeddings stored as two row-aligned tensors.
///
/// `xs` holds every embedding concatenated along the batch axis in insertion
/// order, `ys` the matching one-hot rows. Both stay `None` until the first
/// example arrives.
pub struct Dataset {
    xs: Option<ArrayD<f32>>,
    ys: Option<Array2<f32>>,
    example_counts: ExampleCounts,
    example_count_channel: Channel<ExampleCounts>,
}

impl Dataset {
    pub fn new(example_count_channel: Channel<ExampleCounts>) -> Self {
        Self {
            xs: None,
            ys: None,
            example_counts: Label::empty_counts(),
            example_count_channel,
        }
    }

    /// Appends one example and publishes the updated counts.
    ///
    /// Nothing is modified when the label or the embedding shape is rejected.
    pub fn add_example(&mut self, embedding: Embedding, label: usize) -> Result<(), GestureError> {
        let label = Label::from_index(label).ok_or_else(|| {
            GestureError::validation(format!(
                "label {} is outside [0, {})",
                label, NUM_CLASSES
            ))
        })?;

        if let Some(xs) = &self.xs {
            if &xs.shape()[1..] != embedding.example_shape() {
                return Err(GestureError::shape(format!(
                    "embedding shape {:?} does not match stored examples {:?}",
                    embedding.example_shape(),
                    &xs.shape()[1..]
                )));
            }
        }

        let y = one_hot(label);

        let combined = match (&self.xs, &self.ys) {
            (Some(xs), Some(ys)) => Some((
                concatenate(Axis(0), &[xs.view(), embedding.view()])?,
                concatenate(Axis(0), &[ys.view(), y.view()])?,
            )),
            _ => None,
        };

        match combined {
            // The previous tensors are dropped on assignment, `embedding` and
            // `y` at the end of this call.
            Some((xs, ys)) => {
                self.xs = Some(xs);
                self.ys = Some(ys);
            }
            None => {
                self.xs = Some(embedding.into_array());
                self.ys = Some(y);
            }
        }

        *self.example_counts.entry(label).or_insert(0) += 1;
        self.example_count_channel.publish(&self.example_counts);

        Ok(())
    }

    pub fn xs(&self) -> Option<&ArrayD<f32>> {
        self.xs.as_ref()
    }

    pub fn ys(&self) -> Option<&Array2<f32>> {
        self.ys.as_ref()
    }

    pub fn rows(&self) -> usize {
        self.xs.as_ref().map_or(0, |xs| xs.shape()[0])
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_none()
    }

    pub fn example_counts(&self) -> &ExampleCounts {
        &self.example_counts
    }
}

fn one_hot(label: Label) -> Array2<f32> {
    Array2::from_shape_fn((1, NUM_CLASSES), |(_, class)| {
        if class == label.index() {
            1.0
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn embedding(value: f32) -> Embedding {
        Embedding::new(ArrayD::from_elem(IxDyn(&[1, 2, 2, 3]), value)).unwrap()
    }

    #[test]
    fn test_starts_empty() {
        let dataset = Dataset::new(Channel::new());

        assert!(dataset.is_empty());
        assert!(dataset.xs().is_none());
        assert!(dataset.ys().is_none());
        assert_eq!(dataset.rows(), 0);
        assert_eq!(dataset.example_counts(), &Label::empty_counts());
    }

    #[test]
    fn test_rock_and_paper_scenario() {
        let channel = Channel::new();
        let subscription = channel.subscribe();
        let mut dataset = Dataset::new(channel);

        let labels = [Label::Rock, Label::Rock, Label::Rock, Label::Paper, Label::Paper];
        for (i, label) in labels.iter().enumerate() {
            dataset.add_example(embedding(i as f32), label.index()).unwrap();
        }

        let expected: ExampleCounts = [
            (Label::Neutral, 0),
            (Label::Paper, 2),
            (Label::Rock, 3),
            (Label::Scissors, 0),
        ]
        .into_iter()
        .collect();
        assert_eq!(dataset.example_counts(), &expected);
        assert_eq!(dataset.rows(), 5);
        assert_eq!(dataset.ys().unwrap().nrows(), 5);

        let emissions = subscription.drain();
        assert_eq!(emissions.len(), 5);
        for (i, counts) in emissions.iter().enumerate() {
            assert_eq!(counts.values().sum::<usize>(), i + 1);
            for (label, count) in counts {
                assert!(count <= &expected[label]);
            }
        }
        assert_eq!(emissions.last(), Some(&expected));
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut dataset = Dataset::new(Channel::new());
        for i in 0..4 {
            dataset.add_example(embedding(i as f32), i % NUM_CLASSES).unwrap();
        }

        let xs = dataset.xs().unwrap();
        for i in 0..4 {
            assert!(xs.index_axis(Axis(0), i).iter().all(|v| *v == i as f32));
        }
    }

    #[test]
    fn test_one_hot_rows() {
        let mut dataset = Dataset::new(Channel::new());
        let labels = [2, 0, 3, 1, 2];
        for label in labels {
            dataset.add_example(embedding(0.5), label).unwrap();
        }

        let ys = dataset.ys().unwrap();
        for (row, label) in ys.rows().into_iter().zip(labels) {
            assert_eq!(row.sum(), 1.0);
            for (class, value) in row.iter().enumerate() {
                let expected = if class == label { 1.0 } else { 0.0 };
                assert_eq!(*value, expected);
            }
        }
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        let channel = Channel::new();
        let subscription = channel.subscribe();
        let mut dataset = Dataset::new(channel);

        let result = dataset.add_example(embedding(1.0), NUM_CLASSES);

        assert!(matches!(result, Err(GestureError::Validation(_))));
        assert!(dataset.is_empty());
        assert_eq!(dataset.example_counts(), &Label::empty_counts());
        assert!(subscription.drain().is_empty());
    }

    #[test]
    fn test_mismatched_shape_leaves_dataset_untouched() {
        let mut dataset = Dataset::new(Channel::new());
        dataset.add_example(embedding(1.0), Label::Rock.index()).unwrap();

        let other = Embedding::new(ArrayD::zeros(IxDyn(&[1, 3, 3, 3]))).unwrap();
        let result = dataset.add_example(other, Label::Paper.index());

        assert!(matches!(result, Err(GestureError::Shape(_))));
        assert_eq!(dataset.rows(), 1);
        assert_eq!(dataset.example_counts()[&Label::Paper], 0);
    }
}

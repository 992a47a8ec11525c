use anyhow::Result;
use mnist::{MnistData, Split};
use std::path::Path;
use training::{check_accuracy, Trainer, TrainingConfig};

fn main() -> Result<()> {
    let cache_dir = Path::new("dataset");

    println!("Loading MNIST dataset...");
    let train_data = MnistData::load(cache_dir, Split::Train)?;
    let test_data = MnistData::load(cache_dir, Split::Test)?;
    println!(
        "\nLoaded {} training and {} test examples",
        train_data.len(),
        test_data.len()
    );

    let config = TrainingConfig::default();
    let batch_size = config.batch_size;
    let mut trainer = Trainer::new(config);

    println!("\nInitializing neural network...");
    trainer.train(&train_data)?;

    check_accuracy(trainer.model_mut(), &train_data, Split::Train, batch_size)?;
    check_accuracy(trainer.model_mut(), &test_data, Split::Test, batch_size)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnist::PIXELS_PER_IMAGE;
    use training::evaluate;

    #[test]
    fn test_end_to_end_on_synthetic_data() -> Result<()> {
        // A minimal dataset exercising the whole train-then-evaluate flow
        let images = (0..8)
            .map(|i| vec![f64::from(i) / 8.0; PIXELS_PER_IMAGE])
            .collect();
        let labels = (0..8).map(|i| i % 2).collect();
        let data = MnistData::new(images, labels)?;

        let config = TrainingConfig {
            hidden_size: 6,
            learning_rate: 0.01,
            batch_size: 4,
            epochs: 1,
            seed: 3,
        };
        let batch_size = config.batch_size;
        let mut trainer = Trainer::new(config);
        trainer.train(&data)?;

        let evaluation = evaluate(trainer.model_mut(), &data, batch_size)?;
        assert_eq!(evaluation.total, 8);
        assert!(evaluation.correct <= evaluation.total);

        Ok(())
    }
}

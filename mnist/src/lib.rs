// Modules
mod dataset;
mod download;

pub use dataset::{
    MnistData, MnistError, Split, IMAGE_MAGIC_NUMBER, LABEL_MAGIC_NUMBER, NUM_CLASSES,
    PIXELS_PER_IMAGE,
};

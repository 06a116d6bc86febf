pub mod augmented_writer;

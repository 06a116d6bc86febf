pub mod annotated_image_loader;

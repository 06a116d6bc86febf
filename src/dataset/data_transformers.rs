pub mod pascal_voc;
pub mod pascal_voc_struct;

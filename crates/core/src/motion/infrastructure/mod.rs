pub mod background_difference_gate;
pub mod gaussian;
pub mod mask_ops;

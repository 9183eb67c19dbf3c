// Pipeline processing: title normalization and date classification

pub mod dates;
pub mod normalize;

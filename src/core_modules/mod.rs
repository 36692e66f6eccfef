// The analysis layers, bottom-up: data containers, geometry and the composition
// catalogue, the three independent analyzers, then the two recommenders.

pub mod pixel;
pub mod frame;
pub mod geometry;
pub mod composition;
pub mod subject_detector;
pub mod line_detector;
pub mod characteristics;
pub mod recommender;
pub mod frame_recommender;

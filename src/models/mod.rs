/// Binary module grid
pub mod matrix;
/// Float and integer image coordinates
pub mod point;
/// Candidate quadrilaterals, rotated rectangles and rectified ROIs
pub mod region;
/// Decoded marker payload
pub mod token;

pub use matrix::BitMatrix;
pub use point::{Point, PointI};
pub use region::{CandidateRegion, RectifiedRoi, RotatedRect};
pub use token::Token;

use super::ModelError;
use nalgebra::Point3;

/// An ordered batch of coordinate frames [Å], all with the same particle count.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformers {
    frames: Vec<Vec<Point3<f64>>>,
}

impl Conformers {
    pub fn new(frames: Vec<Vec<Point3<f64>>>) -> Result<Self, ModelError> {
        let expected = frames.first().ok_or(ModelError::EmptyBatch)?.len();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.len() != expected)
        {
            return Err(ModelError::RaggedBatch {
                index,
                expected,
                found: frame.len(),
            });
        }
        Ok(Self { frames })
    }

    pub fn single(frame: Vec<Point3<f64>>) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    pub fn from_arrays(frames: &[Vec<[f64; 3]>]) -> Result<Self, ModelError> {
        Self::new(
            frames
                .iter()
                .map(|frame| frame.iter().map(|&p| Point3::from(p)).collect())
                .collect(),
        )
    }

    #[inline]
    pub fn n_conformers(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn n_particles(&self) -> usize {
        self.frames[0].len()
    }

    #[inline]
    pub fn frames(&self) -> &[Vec<Point3<f64>>] {
        &self.frames
    }

    #[inline]
    pub fn frame(&self, index: usize) -> &[Point3<f64>] {
        &self.frames[index]
    }
}

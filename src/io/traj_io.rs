// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Traits and structures for reading trajectories frame by frame.

use crate::errors::ReadTrajError;
use crate::structures::{frame::Frame, simbox::SimBox, vector3d::Vector3D};

/**************************/
/*  READING TRAJECTORIES  */
/**************************/

/// Any source of trajectory frames must implement this trait.
///
/// The source owns a single `Frame` which is reused for the whole trajectory:
/// topology (atoms, connectivity, molecules) is constructed from the first frame
/// and only positions, velocities and the simulation box change afterwards.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// ## Returns
    /// - `Some(Ok(&mut Frame))` if the frame has been successfully read.
    /// - `Some(Err(ReadTrajError))` if the frame could not be read.
    /// - `None` if the end of the trajectory has been reached.
    fn next_frame(&mut self) -> Option<Result<&mut Frame, ReadTrajError>>;
}

/// Trajectory stored in memory. Useful for testing and for trajectories
/// constructed programmatically.
///
/// ## Example
/// ```
/// # use trajan_rs::prelude::*;
/// let atoms = vec![
///     Atom::new(1, "CA", [1.0, 1.0, 1.0].into()),
///     Atom::new(2, "CB", [2.0, 1.0, 1.0].into()),
/// ];
/// let topology = Frame::new("dimer", atoms, None).unwrap();
///
/// let mut trajectory = MemoryTrajectory::new(
///     topology,
///     vec![
///         vec![[1.0, 1.0, 1.0].into(), [2.0, 1.0, 1.0].into()],
///         vec![[1.0, 1.0, 1.0].into(), [3.0, 1.0, 1.0].into()],
///     ],
/// );
///
/// let mut distances = Vec::new();
/// while let Some(frame) = trajectory.next_frame() {
///     let frame = frame.unwrap();
///     distances.push(frame.distance(1, 2).unwrap());
/// }
///
/// assert_eq!(distances, vec![1.0, 2.0]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTrajectory {
    frame: Frame,
    positions: Vec<Vec<Vector3D>>,
    boxes: Option<Vec<SimBox>>,
    current: usize,
}

impl MemoryTrajectory {
    /// Create a new in-memory trajectory from a topology frame and per-frame positions.
    pub fn new(topology: Frame, positions: Vec<Vec<Vector3D>>) -> Self {
        MemoryTrajectory {
            frame: topology,
            positions,
            boxes: None,
            current: 0,
        }
    }

    /// Assign a simulation box to every frame of the trajectory.
    /// Frames without a corresponding box keep the box of the previous frame.
    pub fn with_boxes(mut self, boxes: Vec<SimBox>) -> Self {
        self.boxes = Some(boxes);
        self
    }

    /// Get the number of frames in the trajectory.
    pub fn n_frames(&self) -> usize {
        self.positions.len()
    }

    /// Start reading the trajectory from the first frame again.
    pub fn rewind(&mut self) {
        self.current = 0;
    }
}

impl FrameSource for MemoryTrajectory {
    fn next_frame(&mut self) -> Option<Result<&mut Frame, ReadTrajError>> {
        let positions = self.positions.get(self.current)?;

        if let Err(e) = self.frame.set_positions(positions) {
            return Some(Err(e.into()));
        }

        if let Some(simbox) = self
            .boxes
            .as_ref()
            .and_then(|boxes| boxes.get(self.current))
        {
            self.frame.set_box(Some(simbox.clone()));
        }

        self.current += 1;
        Some(Ok(&mut self.frame))
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TopologyError;
    use crate::test_utilities::utilities::{compare_vectors, linear_triatomic};
    use float_cmp::assert_approx_eq;

    fn shifted(frame: &Frame, dx: f64) -> Vec<Vector3D> {
        frame
            .atoms()
            .iter()
            .map(|atom| *atom.get_position() + Vector3D::new(dx, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn read_all() {
        let topology = linear_triatomic();
        let positions = vec![
            shifted(&topology, 0.0),
            shifted(&topology, 1.0),
            shifted(&topology, 2.0),
        ];

        let mut trajectory = MemoryTrajectory::new(topology, positions);
        assert_eq!(trajectory.n_frames(), 3);

        let mut n_read = 0;
        while let Some(frame) = trajectory.next_frame() {
            let frame = frame.unwrap();
            compare_vectors(
                frame.get_atom(2).unwrap().get_position(),
                &Vector3D::new(10.0 + n_read as f64, 10.0, 10.0),
                1e-12,
            );

            // topology is kept
            assert_eq!(frame.molecules().len(), 1);
            n_read += 1;
        }

        assert_eq!(n_read, 3);
        assert!(trajectory.next_frame().is_none());

        trajectory.rewind();
        assert!(trajectory.next_frame().is_some());
    }

    #[test]
    fn read_with_boxes() {
        let topology = linear_triatomic();
        let positions = vec![shifted(&topology, 0.0), shifted(&topology, 0.0)];

        let mut trajectory = MemoryTrajectory::new(topology, positions)
            .with_boxes(vec![
                SimBox::orthogonal([20.0, 20.0, 20.0].into()),
                SimBox::orthogonal([30.0, 30.0, 30.0].into()),
            ]);

        let frame = trajectory.next_frame().unwrap().unwrap();
        assert_approx_eq!(f64, frame.distance(1, 3).unwrap(), 1.0);

        let frame = trajectory.next_frame().unwrap().unwrap();
        assert_approx_eq!(f64, frame.distance(1, 3).unwrap(), 11.0);
    }

    #[test]
    fn read_inconsistent() {
        let topology = linear_triatomic();
        let positions = vec![vec![Vector3D::default(); 2]];

        let mut trajectory = MemoryTrajectory::new(topology, positions);
        match trajectory.next_frame() {
            Some(Err(ReadTrajError::Topology(TopologyError::InconsistentAtomCount(3, 2)))) => (),
            other => panic!("Unexpected result {:?}", other.map(|r| r.map(|_| ()))),
        }
    }
}

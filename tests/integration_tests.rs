//! Integration tests for the public chanbuf API.
//!
//! This test suite exercises the crate the way a consumer would, from buffer
//! adoption through windowed processing, with **13 integration tests**:
//!
//! ## Adoption Tests (3 tests)
//! - `test_nested_vectors_are_adopted_in_place`: Zero-copy adoption of a
//!   `Vec<Vec<T>>` with channel independence
//! - `test_foreign_plane_rows_become_channels`: Rank-2 descriptor adoption
//!   with per-row pointer aliasing
//! - `test_low_rank_arrays_normalize_their_shape`: Rank-1 and rank-0
//!   descriptors mapping to single-channel data
//!
//! ## Validation Tests (3 tests)
//! - `test_contiguity_is_checked_before_rank`: Error precedence for
//!   descriptors that are wrong in more than one way
//! - `test_unsupported_rank_is_rejected`: Rank-3 rejection for contiguous
//!   descriptors
//! - `test_shape_validation_rejects_bad_nested_input`: Empty and ragged
//!   nested input errors
//!
//! ## Ownership Tests (3 tests)
//! - `test_descriptor_is_released_exactly_once`: Drop accounting across
//!   moves of the owner
//! - `test_rejected_descriptor_is_still_released`: Drop accounting on the
//!   construction error path
//! - `test_take_transfers_the_allocation`: `take` moving the allocation and
//!   leaving an empty owner behind
//!
//! ## View Tests (1 test)
//! - `test_window_algebra_over_adopted_data`: Nested windows, trail
//!   tracking, range errors, the depth cap, and exclusive writes
//!
//! ## Processing Tests (2 tests)
//! - `test_multiply_then_add_kernel`: In-place processing through views
//! - `test_pointer_table_kernel`: In-place processing through the raw
//!   pointer table
//!
//! ## Introspection Tests (1 test)
//! - `test_storage_reports_the_adopted_type`: Type identity of the erased
//!   backing storage

use std::{cell::Cell, rc::Rc};

use chanbuf::{ChannelData, Error, ForeignArray, MAX_WINDOW_DEPTH, Window};

/// A C-contiguous rank-2 sample plane, standing in for a descriptor handed
/// over an FFI boundary.
struct Plane {
    samples: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Plane {
    fn new(rows: usize, cols: usize, mut fill: impl FnMut(usize, usize) -> f64) -> Self {
        let mut samples = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                samples.push(fill(row, col));
            }
        }
        Self {
            samples,
            rows,
            cols,
        }
    }
}

// SAFETY: the extents describe `samples` exactly, the sample buffer lives on
// the heap so its address survives moves of the descriptor, and dropping the
// descriptor frees it.
unsafe impl ForeignArray for Plane {
    type Elem = f64;

    fn rank(&self) -> usize {
        2
    }

    fn extent(&self, axis: usize) -> usize {
        [self.rows, self.cols][axis]
    }

    fn is_c_contiguous(&self) -> bool {
        true
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.samples.as_mut_ptr()
    }
}

/// A plane that counts how many times it has been dropped and can claim to
/// be non-contiguous.
struct TrackedPlane {
    plane: Plane,
    contiguous: bool,
    drops: Rc<Cell<u32>>,
}

impl TrackedPlane {
    fn new(rows: usize, cols: usize, drops: &Rc<Cell<u32>>) -> Self {
        Self {
            plane: Plane::new(rows, cols, |row, col| (row * cols + col) as f64),
            contiguous: true,
            drops: Rc::clone(drops),
        }
    }
}

impl Drop for TrackedPlane {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

// SAFETY: shape and buffer handling are delegated to the inner plane. A
// `false` contiguity claim only makes adoption reject the descriptor.
unsafe impl ForeignArray for TrackedPlane {
    type Elem = f64;

    fn rank(&self) -> usize {
        self.plane.rank()
    }

    fn extent(&self, axis: usize) -> usize {
        self.plane.extent(axis)
    }

    fn is_c_contiguous(&self) -> bool {
        self.contiguous
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.plane.as_mut_ptr()
    }
}

/// A rank-3 descriptor, beyond what adoption supports.
struct Cube {
    samples: Vec<f64>,
    contiguous: bool,
}

// SAFETY: the two-per-axis extents describe `samples` exactly and the buffer
// is heap-allocated. Adoption rejects the rank before touching the pointer.
unsafe impl ForeignArray for Cube {
    type Elem = f64;

    fn rank(&self) -> usize {
        3
    }

    fn extent(&self, _axis: usize) -> usize {
        2
    }

    fn is_c_contiguous(&self) -> bool {
        self.contiguous
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.samples.as_mut_ptr()
    }
}

/// A rank-0 descriptor holding a single sample.
struct Scalar(Vec<f64>);

// SAFETY: a rank-0 array has exactly one element, which `0` holds on the
// heap and frees on drop.
unsafe impl ForeignArray for Scalar {
    type Elem = f64;

    fn rank(&self) -> usize {
        0
    }

    fn extent(&self, _axis: usize) -> usize {
        unreachable!("rank 0 arrays have no axes")
    }

    fn is_c_contiguous(&self) -> bool {
        true
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.0.as_mut_ptr()
    }
}

#[test]
fn test_nested_vectors_are_adopted_in_place() {
    let channels = vec![vec![1i32, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10, 11, 12]];
    let expected_ptrs: Vec<*const i32> = channels.iter().map(|channel| channel.as_ptr()).collect();

    let mut data = ChannelData::from_vecs(channels).unwrap();
    assert_eq!(data.channel_count(), 3);
    assert_eq!(data.channel_len(), 4);

    // The inner vectors were adopted, not copied
    assert_eq!(data.read_ptrs(), &expected_ptrs[..]);

    // Writing one channel leaves the others untouched
    data.channel_mut(1).fill(0);
    assert_eq!(data.channel(0), &[1, 2, 3, 4]);
    assert_eq!(data.channel(1), &[0, 0, 0, 0]);
    assert_eq!(data.channel(2), &[9, 10, 11, 12]);
}

#[test]
fn test_foreign_plane_rows_become_channels() {
    let plane = Plane::new(3, 5, |row, col| (row * 100 + col) as f64);
    let base = plane.samples.as_ptr();

    let data = ChannelData::from_foreign(plane).unwrap();
    assert_eq!(data.channel_count(), 3);
    assert_eq!(data.channel_len(), 5);

    for row in 0..3 {
        // SAFETY: every row starts within the 15-element buffer
        let expected = unsafe { base.add(row * 5) };
        assert_eq!(data.read_ptrs()[row], expected);

        let samples: Vec<f64> = (0..5).map(|col| (row * 100 + col) as f64).collect();
        assert_eq!(data.channel(row), &samples[..]);
    }
}

#[test]
fn test_low_rank_arrays_normalize_their_shape() {
    // Rank 1 becomes a single channel
    let values = vec![1.0f64, 2.0, 3.0];
    let base = values.as_ptr();
    let data = ChannelData::from_foreign(values).unwrap();
    assert_eq!(data.channel_count(), 1);
    assert_eq!(data.channel_len(), 3);
    assert_eq!(data.read_ptrs()[0], base);
    assert_eq!(data.channel(0), &[1.0, 2.0, 3.0]);

    // Rank 0 becomes a single one-element channel
    let data = ChannelData::from_foreign(Scalar(vec![42.0])).unwrap();
    assert_eq!(data.channel_count(), 1);
    assert_eq!(data.channel_len(), 1);
    assert_eq!(data.channel(0), &[42.0]);
}

#[test]
fn test_contiguity_is_checked_before_rank() {
    // Wrong in two ways: the contiguity failure must win
    let cube = Cube {
        samples: vec![0.0; 8],
        contiguous: false,
    };
    let err = ChannelData::from_foreign(cube).unwrap_err();
    assert_eq!(err, Error::NotCContiguous);
    assert_eq!(err.to_string(), "foreign array is not C-contiguous");
}

#[test]
fn test_unsupported_rank_is_rejected() {
    let cube = Cube {
        samples: vec![0.0; 8],
        contiguous: true,
    };
    assert_eq!(
        ChannelData::from_foreign(cube).unwrap_err(),
        Error::UnsupportedRank { rank: 3 }
    );
}

#[test]
fn test_shape_validation_rejects_bad_nested_input() {
    assert_eq!(
        ChannelData::<f32>::from_vecs(vec![]).unwrap_err(),
        Error::EmptyChannels
    );
    assert_eq!(
        ChannelData::from_vecs(vec![vec![1, 2, 3], vec![4, 5]]).unwrap_err(),
        Error::RaggedChannels {
            channel: 1,
            expected: 3,
            found: 2
        }
    );

    // Zero-length channels are a valid shape
    let data = ChannelData::<u8>::from_vecs(vec![vec![], vec![]]).unwrap();
    assert_eq!(data.channel_count(), 2);
    assert_eq!(data.channel_len(), 0);
}

#[test]
fn test_descriptor_is_released_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    let mut data = ChannelData::from_foreign(TrackedPlane::new(2, 6, &drops)).unwrap();
    data.channel_mut(0)[0] = -1.0;

    // Shuffle the owner around without dropping it
    let mut holder = Vec::new();
    holder.push(data);
    let data = holder.pop().unwrap();
    assert_eq!(drops.get(), 0);
    assert_eq!(data.channel(0)[0], -1.0);

    drop(data);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_rejected_descriptor_is_still_released() {
    let drops = Rc::new(Cell::new(0));
    let mut plane = TrackedPlane::new(2, 6, &drops);
    plane.contiguous = false;

    assert_eq!(
        ChannelData::from_foreign(plane).unwrap_err(),
        Error::NotCContiguous
    );
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_take_transfers_the_allocation() {
    let drops = Rc::new(Cell::new(0));
    let mut data = ChannelData::from_foreign(TrackedPlane::new(2, 3, &drops)).unwrap();
    let base = data.read_ptrs()[0];

    let taken = data.take();

    // The source is empty but still a valid owner
    assert_eq!(data.channel_count(), 0);
    assert_eq!(data.channel_len(), 0);
    assert!(data.is_empty());
    assert!(data.storage().is_none());

    // The destination kept the original allocation
    assert_eq!(taken.read_ptrs()[0], base);
    assert_eq!(drops.get(), 0);

    drop(taken);
    assert_eq!(drops.get(), 1);
    drop(data);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_window_algebra_over_adopted_data() {
    let mut data = ChannelData::from_vecs(vec![(0i64..12).collect::<Vec<i64>>()]).unwrap();

    let outer = data.view().sub_view(2, 8).unwrap();
    let inner = outer.sub_view(2, 4).unwrap();
    assert_eq!(inner.channel(0), &[4, 5, 6, 7]);
    assert_eq!(
        inner.windows(),
        &[Window { start: 2, len: 8 }, Window { start: 4, len: 4 }]
    );

    // Copies narrow independently
    let left = inner.sub_view(0, 2).unwrap();
    let right = inner.sub_view(2, 2).unwrap();
    assert_eq!(left.channel(0), &[4, 5]);
    assert_eq!(right.channel(0), &[6, 7]);

    assert_eq!(
        inner.sub_view(3, 2).unwrap_err(),
        Error::WindowOutOfRange {
            start: 3,
            len: 2,
            parent_len: 4
        }
    );

    // The trail caps out after MAX_WINDOW_DEPTH narrowings
    let mut view = data.view();
    for _ in 0..MAX_WINDOW_DEPTH {
        view = view.sub_view(1, view.channel_len() - 1).unwrap();
    }
    assert_eq!(view.windows().len(), MAX_WINDOW_DEPTH);
    // Narrowing by one each step leaves the full trail with room to spare
    assert_eq!(view.channel_len(), 6);
    assert_eq!(
        view.sub_view(0, 1).unwrap_err(),
        Error::WindowDepthExceeded {
            max: MAX_WINDOW_DEPTH
        }
    );

    // Exclusive windows write through to the owner
    let mut view = data.view_mut();
    let mut window = view.sub_view(4, 2).unwrap();
    window.channel_mut(0).fill(0);
    drop(window);
    assert_eq!(data.channel(0), &[0, 1, 2, 3, 0, 0, 6, 7, 8, 9, 10, 11]);
}

#[test]
fn test_multiply_then_add_kernel() {
    let plane = Plane::new(2, 4, |row, col| (row * 4 + col) as f64);
    let mut data = ChannelData::from_foreign(plane).unwrap();

    // Gain stage through an exclusive view
    let mut view = data.view_mut();
    for channel in 0..view.channel_count() {
        for sample in view.channel_mut(channel) {
            *sample *= 2.0;
        }
    }

    // Offset stage directly on the owner
    for channel in 0..data.channel_count() {
        for sample in data.channel_mut(channel) {
            *sample += 3.0;
        }
    }

    assert_eq!(data.channel(0), &[3.0, 5.0, 7.0, 9.0]);
    assert_eq!(data.channel(1), &[11.0, 13.0, 15.0, 17.0]);

    // A shared window sees the processed samples
    let window = data.view().sub_view(1, 2).unwrap();
    assert_eq!(window.channel(0), &[5.0, 7.0]);
    assert_eq!(window.channel(1), &[13.0, 15.0]);
}

#[test]
fn test_pointer_table_kernel() {
    let mut data =
        ChannelData::from_vecs(vec![vec![0i32; 4], vec![0i32; 4], vec![0i32; 4]]).unwrap();
    let len = data.channel_len();
    let table = data.write_ptrs().to_vec();

    // Process through the raw table, the way a C callback would
    for (channel, &ptr) in table.iter().enumerate() {
        for i in 0..len {
            // SAFETY: `ptr` is valid for `len` elements while `data` is alive,
            // and nothing else accesses them during this loop
            unsafe {
                *ptr.add(i) = (channel * 10 + i) as i32;
            }
        }
    }

    assert_eq!(data.channel(0), &[0, 1, 2, 3]);
    assert_eq!(data.channel(1), &[10, 11, 12, 13]);
    assert_eq!(data.channel(2), &[20, 21, 22, 23]);
}

#[test]
fn test_storage_reports_the_adopted_type() {
    let data = ChannelData::from_vecs(vec![vec![1u16, 2]]).unwrap();
    assert_eq!(
        data.storage_type_id(),
        Some(std::any::TypeId::of::<Vec<Vec<u16>>>())
    );

    let data = ChannelData::from_foreign(Plane::new(1, 2, |_, _| 0.0)).unwrap();
    let name = data.storage_type_name().unwrap();
    assert!(name.contains("Plane"), "unexpected type name: {name}");

    let empty = ChannelData::<u16>::default();
    assert_eq!(empty.storage_type_id(), None);
    assert_eq!(empty.storage_type_name(), None);
}

// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of numeric ranges with a stride used in selections.

use std::fmt;

/// Inclusive range of integers with an optional stride.
///
/// The range matches every integer `i` with `start <= i <= end` and `(i - start) % stride == 0`.
/// Bounds are normalized on construction so that `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRange {
    start: usize,
    end: usize,
    stride: usize,
}

impl NumberRange {
    /// Create a range containing a single number.
    pub fn single(number: usize) -> Self {
        NumberRange {
            start: number,
            end: number,
            stride: 1,
        }
    }

    /// Create a new range. Bounds may be provided in any order.
    ///
    /// ## Returns
    /// `None` if `stride` is zero.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::select::NumberRange;
    /// let range = NumberRange::new(10, 1, 2).unwrap();
    ///
    /// let matching: Vec<usize> = (0..=12).filter(|&n| range.contains(n)).collect();
    /// assert_eq!(matching, vec![1, 3, 5, 7, 9]);
    ///
    /// assert!(NumberRange::new(1, 10, 0).is_none());
    /// ```
    pub fn new(first: usize, second: usize, stride: usize) -> Option<Self> {
        if stride == 0 {
            return None;
        }

        Some(NumberRange {
            start: first.min(second),
            end: first.max(second),
            stride,
        })
    }

    /// Check whether the number is part of the range.
    #[inline(always)]
    pub fn contains(&self, number: usize) -> bool {
        number >= self.start && number <= self.end && (number - self.start) % self.stride == 0
    }

    #[inline(always)]
    pub fn get_start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub fn get_end(&self) -> usize {
        self.end
    }

    #[inline(always)]
    pub fn get_stride(&self) -> usize {
        self.stride
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else if self.stride == 1 {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}-{}#{}", self.start, self.end, self.stride)
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

//! Breakpoint list: the persisted contract of a segmentation run
//!
//! A JSON integer array that starts at 0, ends at the series length and
//! never decreases. Zero-length segments are tolerated when reading.

use crate::error::{Result, SegmentError};
use crate::segmentation::scanner::Segment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Breakpoints(Vec<usize>);

impl Breakpoints {
    /// Validate a raw index list
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        match indices.first() {
            None => {
                return Err(SegmentError::MalformedInput(
                    "breakpoint list is empty".to_string(),
                ))
            }
            Some(&first) if first != 0 => {
                return Err(SegmentError::MalformedInput(format!(
                    "breakpoint list must start at 0, starts at {}",
                    first
                )))
            }
            Some(_) => {}
        }

        if let Some(pair) = indices.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(SegmentError::MalformedInput(format!(
                "breakpoint list decreases from {} to {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self(indices))
    }

    /// Boundaries of a global segment list covering `0..series_len`
    pub fn from_segments(segments: &[Segment], series_len: usize) -> Self {
        let mut indices = Vec::with_capacity(segments.len() + 1);
        indices.push(0);
        indices.extend(segments.iter().map(|s| s.end));
        if indices.last() != Some(&series_len) {
            indices.push(series_len);
        }
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of boundaries (segments + 1)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the series the list was computed for
    pub fn series_len(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    /// Interior breakpoints, excluding 0 and the series length
    pub fn interior(&self) -> &[usize] {
        match self.0.len() {
            0..=2 => &[],
            n => &self.0[1..n - 1],
        }
    }

    /// Half-open ranges between consecutive boundaries
    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.0.windows(2).map(|pair| pair[0]..pair[1])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a JSON integer array
    pub fn from_json(input: &str) -> Result<Self> {
        let indices: Vec<usize> = serde_json::from_str(input)?;
        Self::new(indices)
    }
}

impl TryFrom<Vec<usize>> for Breakpoints {
    type Error = SegmentError;

    fn try_from(indices: Vec<usize>) -> Result<Self> {
        Self::new(indices)
    }
}

impl From<Breakpoints> for Vec<usize> {
    fn from(breakpoints: Breakpoints) -> Self {
        breakpoints.0
    }
}

impl fmt::Display for Breakpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
